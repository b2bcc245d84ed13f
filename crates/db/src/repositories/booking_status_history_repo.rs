//! Repository for the `booking_status_history` table.
//!
//! Rows are written by [`BookingRepo`](super::BookingRepo) inside its status
//! transactions; this repository only reads.

use backstage_core::types::DbId;
use sqlx::PgPool;

use crate::models::booking::BookingStatusHistory;

const COLUMNS: &str = "id, booking_id, from_status, to_status, changed_by, note, created_at";

pub struct BookingStatusHistoryRepo;

impl BookingStatusHistoryRepo {
    /// All history rows for a booking, oldest first.
    pub async fn list_by_booking(
        pool: &PgPool,
        booking_id: DbId,
    ) -> Result<Vec<BookingStatusHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM booking_status_history \
             WHERE booking_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, BookingStatusHistory>(&query)
            .bind(booking_id)
            .fetch_all(pool)
            .await
    }
}
