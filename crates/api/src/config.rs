use backstage_core::booking::TransitionPolicy;
use backstage_core::capability::{DEFAULT_CONTRACT_TTL_HOURS, DEFAULT_PRESSKIT_TTL_HOURS};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Staff session token configuration.
    pub jwt: JwtConfig,
    /// HMAC secret for contract and presskit capability tokens.
    pub capability_secret: String,
    /// Public site base used in signing and presskit URLs.
    pub public_base_url: String,
    pub contract_link_ttl_hours: i64,
    pub presskit_link_ttl_hours: i64,
    pub transition_policy: TransitionPolicy,
    /// Root directory of the local file store.
    pub file_store_root: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `3000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `CAPABILITY_SECRET`       | **required**            |
    /// | `PUBLIC_BASE_URL`         | `http://localhost:5173` |
    /// | `CONTRACT_LINK_TTL_HOURS` | `168`                   |
    /// | `PRESSKIT_LINK_TTL_HOURS` | `720`                   |
    /// | `BOOKING_TRANSITIONS`     | `permissive`            |
    /// | `FILE_STORE_ROOT`         | `./storage`             |
    ///
    /// # Panics
    ///
    /// Panics on a missing secret or an unparsable value; misconfiguration
    /// should stop the server at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let capability_secret = std::env::var("CAPABILITY_SECRET")
            .expect("CAPABILITY_SECRET must be set in the environment");
        assert!(
            !capability_secret.is_empty(),
            "CAPABILITY_SECRET must not be empty"
        );

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .trim_end_matches('/')
            .to_string();

        let contract_link_ttl_hours: i64 = std::env::var("CONTRACT_LINK_TTL_HOURS")
            .unwrap_or_else(|_| DEFAULT_CONTRACT_TTL_HOURS.to_string())
            .parse()
            .expect("CONTRACT_LINK_TTL_HOURS must be a valid i64");

        let presskit_link_ttl_hours: i64 = std::env::var("PRESSKIT_LINK_TTL_HOURS")
            .unwrap_or_else(|_| DEFAULT_PRESSKIT_TTL_HOURS.to_string())
            .parse()
            .expect("PRESSKIT_LINK_TTL_HOURS must be a valid i64");

        let transition_policy: TransitionPolicy = std::env::var("BOOKING_TRANSITIONS")
            .unwrap_or_else(|_| "permissive".into())
            .parse()
            .expect("BOOKING_TRANSITIONS must be 'permissive' or 'strict'");

        let file_store_root =
            std::env::var("FILE_STORE_ROOT").unwrap_or_else(|_| "./storage".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            capability_secret,
            public_base_url,
            contract_link_ttl_hours,
            presskit_link_ttl_hours,
            transition_policy,
            file_store_root,
        }
    }
}
