//! Client address and agent of public requests, for access logs.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use backstage_services::presskit::ClientInfo;

/// Caller details recorded by the public presskit and booking endpoints.
///
/// The address comes from the first `X-Forwarded-For` hop when a proxy sets
/// it, else from the socket. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct ClientContext(pub ClientInfo);

impl<S: Send + Sync> FromRequestParts<S> for ClientContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let ip_address = forwarded.or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });

        let user_agent = parts
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(ClientContext(ClientInfo {
            ip_address,
            user_agent,
        }))
    }
}
