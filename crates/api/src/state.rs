use std::sync::Arc;

use backstage_core::capability::CapabilitySigner;
use backstage_core::collaborators::{
    ArtistDirectory, AuditRecorder, FileStore, NotificationDispatcher,
};
use backstage_services::presskit::PresskitIssuer;
use backstage_services::store::{BookingStore, PresskitStore};
use backstage_services::{
    BookingLifecycle, BookingLifecycleConfig, PresskitAccessController, PresskitConfig,
};
use chrono::Duration;

use crate::config::ServerConfig;

/// Storage and collaborator implementations the services run on.
///
/// Production wires PostgreSQL, SMTP and the local disk; tests wire the
/// in-memory fakes.
pub struct Collaborators {
    pub booking_store: Arc<dyn BookingStore>,
    pub presskit_store: Arc<dyn PresskitStore>,
    pub artists: Arc<dyn ArtistDirectory>,
    pub files: Arc<dyn FileStore>,
    pub notifier: Arc<dyn NotificationDispatcher>,
    pub audit: Arc<dyn AuditRecorder>,
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used by the health check.
    pub pool: backstage_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub bookings: Arc<BookingLifecycle>,
    pub presskits: Arc<PresskitAccessController>,
}

impl AppState {
    /// Build the services from configuration and collaborators.
    pub fn new(pool: backstage_db::DbPool, config: ServerConfig, deps: Collaborators) -> Self {
        let signer = CapabilitySigner::new(&config.capability_secret);

        let presskits = Arc::new(PresskitAccessController::new(
            deps.presskit_store,
            Arc::clone(&deps.artists),
            deps.files,
            Arc::clone(&deps.notifier),
            Arc::clone(&deps.audit),
            signer.clone(),
            PresskitConfig {
                public_base_url: config.public_base_url.clone(),
                default_link_ttl: Duration::hours(config.presskit_link_ttl_hours),
            },
        ));

        let issuer: Arc<dyn PresskitIssuer> = presskits.clone();
        let bookings = Arc::new(BookingLifecycle::new(
            deps.booking_store,
            deps.artists,
            deps.notifier,
            deps.audit,
            issuer,
            signer,
            BookingLifecycleConfig {
                public_base_url: config.public_base_url.clone(),
                contract_link_ttl: Duration::hours(config.contract_link_ttl_hours),
                transition_policy: config.transition_policy,
            },
        ));

        Self {
            pool,
            config: Arc::new(config),
            bookings,
            presskits,
        }
    }
}
