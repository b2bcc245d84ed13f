//! Route definitions for presskit share links.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::presskit;
use crate::state::AppState;

/// Routes mounted at `/presskits` (staff only).
///
/// ```text
/// POST   /{id}/generate-link              -> generate_link
/// GET    /{id}/links                      -> list_links
/// PATCH  /{id}/links/{link_id}/revoke     -> revoke_link
/// GET    /{id}/links/{link_id}/logs       -> access_log
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/generate-link", post(presskit::generate_link))
        .route("/{id}/links", get(presskit::list_links))
        .route("/{id}/links/{link_id}/revoke", patch(presskit::revoke_link))
        .route("/{id}/links/{link_id}/logs", get(presskit::access_log))
}

/// Routes mounted at `/public/presskits` (capability token only).
///
/// ```text
/// GET    /{token}             -> view
/// GET    /{token}/download    -> download
/// POST   /{token}/track       -> track
/// ```
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/{token}", get(presskit::view))
        .route("/{token}/download", get(presskit::download))
        .route("/{token}/track", post(presskit::track))
}
