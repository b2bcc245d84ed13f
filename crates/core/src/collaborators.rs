//! Narrow interfaces to systems outside the booking and sharing core.
//!
//! Implementations live in `backstage-db` (artist lookup), `backstage-events`
//! (email) and `backstage-services` (files, audit).

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Artist directory
// ---------------------------------------------------------------------------

/// What the booking core needs to know about an artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistProfile {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub fee_min: Option<i64>,
    pub fee_max: Option<i64>,
    /// Staff user who manages the artist; new bookings are assigned to them.
    pub manager_id: Option<DbId>,
    pub manager_email: Option<String>,
    /// Email of the user account linked to the artist, if one exists.
    pub account_email: Option<String>,
}

#[async_trait]
pub trait ArtistDirectory: Send + Sync {
    async fn find_by_id(&self, id: DbId) -> Result<Option<ArtistProfile>, CoreError>;
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Unknown notification template: {0}")]
    UnknownTemplate(String),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Sends a templated message. Callers treat failures as non-fatal.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(
        &self,
        template: &str,
        to: &str,
        data: &serde_json::Value,
    ) -> Result<(), NotificationError>;
}

// ---------------------------------------------------------------------------
// File storage
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("File store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Binary object storage addressed by bucket and key.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), FileStoreError>;

    /// Returns `None` when the object does not exist.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, FileStoreError>;

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), FileStoreError>;
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// One auditable action.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Acting user, `None` for capability-token and public requests.
    pub actor_user_id: Option<DbId>,
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: DbId,
    pub details: serde_json::Value,
}

/// Records audit entries. Fire-and-forget: recording never fails the caller.
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    async fn record(&self, entry: AuditEntry);
}
