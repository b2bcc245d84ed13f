//! Storage seam for the booking and presskit services.
//!
//! Each method maps to one repository call (and so to at most one database
//! transaction). Conditional writes return `None` when their condition did
//! not hold; the service decides what that means to the caller.

use async_trait::async_trait;
use backstage_core::contract::ContractDocument;
use backstage_core::error::CoreError;
use backstage_core::types::DbId;
use backstage_db::models::booking::{
    Booking, BookingComment, BookingContract, BookingFilter, BookingStatusHistory, NewBooking,
    NewComment, QuoteUpdate, SignatureRecord, StatusChange,
};
use backstage_db::models::presskit::{
    NewAccessLog, NewPresskitLink, Presskit, PresskitAccessLog, PresskitLink,
};

/// Unique constraint on `bookings.reference_code`.
pub const REFERENCE_CODE_CONSTRAINT: &str = "uq_bookings_reference_code";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {constraint}")]
    Conflict { constraint: String },

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match backstage_db::unique_violation(&err) {
            Some(constraint) => StoreError::Conflict { constraint },
            None => StoreError::Database(err),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { constraint } => {
                CoreError::Conflict(format!("Duplicate value violates {constraint}"))
            }
            StoreError::Database(e) => {
                tracing::error!(error = %e, "Store operation failed");
                CoreError::Internal(format!("Database error: {e}"))
            }
        }
    }
}

/// Persistence for bookings, their ledger, comments and contracts.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Reserve the next per-year reference sequence number.
    async fn next_reference_sequence(&self, year: i32) -> Result<i64, StoreError>;

    async fn count_bookings_by_email(&self, email: &str) -> Result<i64, StoreError>;

    /// Insert with status `new` plus the initial history row.
    async fn create_booking(
        &self,
        input: &NewBooking,
        created_by: Option<DbId>,
    ) -> Result<Booking, StoreError>;

    async fn find_booking(&self, id: DbId) -> Result<Option<Booking>, StoreError>;

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
    ) -> Result<(Vec<Booking>, i64), StoreError>;

    /// `None` if missing or the expected version is stale.
    async fn change_status(&self, change: &StatusChange) -> Result<Option<Booking>, StoreError>;

    /// `None` if missing or already signed.
    async fn record_quote(&self, quote: &QuoteUpdate) -> Result<Option<Booking>, StoreError>;

    /// `None` if missing or already signed.
    async fn record_signature(
        &self,
        record: &SignatureRecord,
    ) -> Result<Option<Booking>, StoreError>;

    async fn delete_booking(&self, id: DbId) -> Result<bool, StoreError>;

    async fn list_history(&self, booking_id: DbId)
        -> Result<Vec<BookingStatusHistory>, StoreError>;

    async fn add_comment(&self, input: &NewComment) -> Result<BookingComment, StoreError>;

    async fn list_comments(
        &self,
        booking_id: DbId,
        include_internal: bool,
    ) -> Result<Vec<BookingComment>, StoreError>;

    async fn find_contract(&self, booking_id: DbId)
        -> Result<Option<BookingContract>, StoreError>;

    /// `None` if `expected_version` no longer matches the stored row.
    async fn save_contract(
        &self,
        booking_id: DbId,
        document: &ContractDocument,
        expected_version: Option<i32>,
    ) -> Result<Option<BookingContract>, StoreError>;
}

/// Persistence for presskits, links and the access log.
#[async_trait]
pub trait PresskitStore: Send + Sync {
    async fn find_presskit(&self, id: DbId) -> Result<Option<Presskit>, StoreError>;

    async fn find_primary_presskit(&self, artist_id: DbId)
        -> Result<Option<Presskit>, StoreError>;

    /// Insert a link and activate its presskit.
    async fn create_link(&self, input: &NewPresskitLink) -> Result<PresskitLink, StoreError>;

    async fn find_link_by_token(&self, token: &str) -> Result<Option<PresskitLink>, StoreError>;

    async fn find_link(&self, id: DbId) -> Result<Option<PresskitLink>, StoreError>;

    async fn list_links(&self, presskit_id: DbId) -> Result<Vec<PresskitLink>, StoreError>;

    /// `None` if the link is revoked, expired or at its quota.
    async fn increment_views(&self, id: DbId) -> Result<Option<PresskitLink>, StoreError>;

    /// `None` if the link does not belong to `presskit_id`.
    async fn revoke_link(
        &self,
        presskit_id: DbId,
        id: DbId,
    ) -> Result<Option<PresskitLink>, StoreError>;

    async fn log_access(&self, input: &NewAccessLog) -> Result<PresskitAccessLog, StoreError>;

    async fn list_access_logs(
        &self,
        link_id: DbId,
        limit: i64,
    ) -> Result<Vec<PresskitAccessLog>, StoreError>;
}
