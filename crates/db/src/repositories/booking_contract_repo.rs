//! Repository for the `booking_contracts` table.

use backstage_core::contract::ContractDocument;
use backstage_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::booking::BookingContract;

const COLUMNS: &str = "booking_id, document, version, updated_at";

/// Stores the negotiated contract document, one row per booking.
pub struct BookingContractRepo;

impl BookingContractRepo {
    pub async fn find_by_booking(
        pool: &PgPool,
        booking_id: DbId,
    ) -> Result<Option<BookingContract>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM booking_contracts WHERE booking_id = $1");
        sqlx::query_as::<_, BookingContract>(&query)
            .bind(booking_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace the stored document.
    ///
    /// `expected_version` is the version the caller read: `None` means no row
    /// existed. Returns `None` when that no longer holds.
    pub async fn save(
        pool: &PgPool,
        booking_id: DbId,
        document: &ContractDocument,
        expected_version: Option<i32>,
    ) -> Result<Option<BookingContract>, sqlx::Error> {
        match expected_version {
            None => {
                let query = format!(
                    "INSERT INTO booking_contracts (booking_id, document) VALUES ($1, $2) \
                     ON CONFLICT (booking_id) DO NOTHING \
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, BookingContract>(&query)
                    .bind(booking_id)
                    .bind(Json(document))
                    .fetch_optional(pool)
                    .await
            }
            Some(version) => {
                let query = format!(
                    "UPDATE booking_contracts \
                     SET document = $2, version = version + 1, updated_at = NOW() \
                     WHERE booking_id = $1 AND version = $3 \
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, BookingContract>(&query)
                    .bind(booking_id)
                    .bind(Json(document))
                    .bind(version)
                    .fetch_optional(pool)
                    .await
            }
        }
    }
}
