//! Repository for the `booking_comments` table.

use backstage_core::types::DbId;
use sqlx::PgPool;

use crate::models::booking::{BookingComment, NewComment};

const COLUMNS: &str = "id, booking_id, author_id, author_role, body, is_internal, created_at";

/// Append-only comment thread storage.
pub struct BookingCommentRepo;

impl BookingCommentRepo {
    pub async fn create(pool: &PgPool, input: &NewComment) -> Result<BookingComment, sqlx::Error> {
        let query = format!(
            "INSERT INTO booking_comments (booking_id, author_id, author_role, body, is_internal) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BookingComment>(&query)
            .bind(input.booking_id)
            .bind(input.author_id)
            .bind(&input.author_role)
            .bind(&input.body)
            .bind(input.is_internal)
            .fetch_one(pool)
            .await
    }

    /// Comments on a booking, oldest first. Internal comments are omitted
    /// unless `include_internal` is set.
    pub async fn list_by_booking(
        pool: &PgPool,
        booking_id: DbId,
        include_internal: bool,
    ) -> Result<Vec<BookingComment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM booking_comments \
             WHERE booking_id = $1 AND ($2 OR NOT is_internal) \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, BookingComment>(&query)
            .bind(booking_id)
            .bind(include_internal)
            .fetch_all(pool)
            .await
    }
}
