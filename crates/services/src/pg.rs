//! PostgreSQL implementation of the storage traits.

use async_trait::async_trait;
use backstage_core::contract::ContractDocument;
use backstage_core::types::DbId;
use backstage_db::models::booking::{
    Booking, BookingComment, BookingContract, BookingFilter, BookingStatusHistory, NewBooking,
    NewComment, QuoteUpdate, SignatureRecord, StatusChange,
};
use backstage_db::models::presskit::{
    NewAccessLog, NewPresskitLink, Presskit, PresskitAccessLog, PresskitLink,
};
use backstage_db::repositories::{
    BookingCommentRepo, BookingContractRepo, BookingRepo, BookingStatusHistoryRepo,
    PresskitAccessLogRepo, PresskitLinkRepo, PresskitRepo,
};
use backstage_db::DbPool;

use crate::store::{BookingStore, PresskitStore, StoreError};

/// Storage over a shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn next_reference_sequence(&self, year: i32) -> Result<i64, StoreError> {
        Ok(BookingRepo::next_reference_sequence(&self.pool, year).await?)
    }

    async fn count_bookings_by_email(&self, email: &str) -> Result<i64, StoreError> {
        Ok(BookingRepo::count_by_requester_email(&self.pool, email).await?)
    }

    async fn create_booking(
        &self,
        input: &NewBooking,
        created_by: Option<DbId>,
    ) -> Result<Booking, StoreError> {
        Ok(BookingRepo::create(&self.pool, input, created_by).await?)
    }

    async fn find_booking(&self, id: DbId) -> Result<Option<Booking>, StoreError> {
        Ok(BookingRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
    ) -> Result<(Vec<Booking>, i64), StoreError> {
        Ok(BookingRepo::list(&self.pool, filter).await?)
    }

    async fn change_status(&self, change: &StatusChange) -> Result<Option<Booking>, StoreError> {
        Ok(BookingRepo::change_status(&self.pool, change).await?)
    }

    async fn record_quote(&self, quote: &QuoteUpdate) -> Result<Option<Booking>, StoreError> {
        Ok(BookingRepo::record_quote(&self.pool, quote).await?)
    }

    async fn record_signature(
        &self,
        record: &SignatureRecord,
    ) -> Result<Option<Booking>, StoreError> {
        Ok(BookingRepo::record_signature(&self.pool, record).await?)
    }

    async fn delete_booking(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(BookingRepo::delete(&self.pool, id).await?)
    }

    async fn list_history(
        &self,
        booking_id: DbId,
    ) -> Result<Vec<BookingStatusHistory>, StoreError> {
        Ok(BookingStatusHistoryRepo::list_by_booking(&self.pool, booking_id).await?)
    }

    async fn add_comment(&self, input: &NewComment) -> Result<BookingComment, StoreError> {
        Ok(BookingCommentRepo::create(&self.pool, input).await?)
    }

    async fn list_comments(
        &self,
        booking_id: DbId,
        include_internal: bool,
    ) -> Result<Vec<BookingComment>, StoreError> {
        Ok(BookingCommentRepo::list_by_booking(&self.pool, booking_id, include_internal).await?)
    }

    async fn find_contract(
        &self,
        booking_id: DbId,
    ) -> Result<Option<BookingContract>, StoreError> {
        Ok(BookingContractRepo::find_by_booking(&self.pool, booking_id).await?)
    }

    async fn save_contract(
        &self,
        booking_id: DbId,
        document: &ContractDocument,
        expected_version: Option<i32>,
    ) -> Result<Option<BookingContract>, StoreError> {
        Ok(BookingContractRepo::save(&self.pool, booking_id, document, expected_version).await?)
    }
}

#[async_trait]
impl PresskitStore for PgStore {
    async fn find_presskit(&self, id: DbId) -> Result<Option<Presskit>, StoreError> {
        Ok(PresskitRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_primary_presskit(
        &self,
        artist_id: DbId,
    ) -> Result<Option<Presskit>, StoreError> {
        Ok(PresskitRepo::find_primary_for_artist(&self.pool, artist_id).await?)
    }

    async fn create_link(&self, input: &NewPresskitLink) -> Result<PresskitLink, StoreError> {
        Ok(PresskitLinkRepo::create(&self.pool, input).await?)
    }

    async fn find_link_by_token(&self, token: &str) -> Result<Option<PresskitLink>, StoreError> {
        Ok(PresskitLinkRepo::find_by_token(&self.pool, token).await?)
    }

    async fn find_link(&self, id: DbId) -> Result<Option<PresskitLink>, StoreError> {
        Ok(PresskitLinkRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_links(&self, presskit_id: DbId) -> Result<Vec<PresskitLink>, StoreError> {
        Ok(PresskitLinkRepo::list_by_presskit(&self.pool, presskit_id).await?)
    }

    async fn increment_views(&self, id: DbId) -> Result<Option<PresskitLink>, StoreError> {
        Ok(PresskitLinkRepo::increment_views(&self.pool, id).await?)
    }

    async fn revoke_link(
        &self,
        presskit_id: DbId,
        id: DbId,
    ) -> Result<Option<PresskitLink>, StoreError> {
        Ok(PresskitLinkRepo::revoke(&self.pool, presskit_id, id).await?)
    }

    async fn log_access(&self, input: &NewAccessLog) -> Result<PresskitAccessLog, StoreError> {
        Ok(PresskitAccessLogRepo::create(&self.pool, input).await?)
    }

    async fn list_access_logs(
        &self,
        link_id: DbId,
        limit: i64,
    ) -> Result<Vec<PresskitAccessLog>, StoreError> {
        Ok(PresskitAccessLogRepo::list_by_link(&self.pool, link_id, limit).await?)
    }
}
