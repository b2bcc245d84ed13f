//! Repository for the `bookings` table.
//!
//! Every status write goes through a transaction that also appends one
//! `booking_status_history` row.

use backstage_core::booking::BookingStatus;
use backstage_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::booking::{
    Booking, BookingFilter, NewBooking, QuoteUpdate, SignatureRecord, StatusChange,
};

/// Column list for `bookings` queries.
const COLUMNS: &str = "\
    id, reference_code, artist_id, status, score, score_breakdown, \
    requester_name, requester_email, requester_phone, requester_company, \
    event_date, event_type, event_city, event_country, event_venue, \
    expected_attendance, budget_min, budget_max, currency, message, \
    quoted_amount, quote_pdf_url, quote_sent_at, digital_signature, signed_at, \
    assigned_to, source_ip, version, created_at, updated_at";

/// Provides persistence for bookings and their status ledger.
pub struct BookingRepo;

impl BookingRepo {
    /// Reserve the next reference sequence number for `year`.
    ///
    /// Atomic: concurrent callers always receive distinct values.
    pub async fn next_reference_sequence(pool: &PgPool, year: i32) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO booking_reference_counters (year, last_value) VALUES ($1, 1) \
             ON CONFLICT (year) DO UPDATE \
                SET last_value = booking_reference_counters.last_value + 1 \
             RETURNING last_value",
        )
        .bind(year)
        .fetch_one(pool)
        .await
    }

    /// Count earlier bookings from the same requester email (case-insensitive).
    pub async fn count_by_requester_email(pool: &PgPool, email: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookings WHERE lower(requester_email) = lower($1)",
        )
        .bind(email)
        .fetch_one(pool)
        .await
    }

    /// Insert a booking with status `new` and its initial history row.
    pub async fn create(
        pool: &PgPool,
        input: &NewBooking,
        created_by: Option<DbId>,
    ) -> Result<Booking, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO bookings \
                (reference_code, artist_id, status, score, score_breakdown, \
                 requester_name, requester_email, requester_phone, requester_company, \
                 event_date, event_type, event_city, event_country, event_venue, \
                 expected_attendance, budget_min, budget_max, currency, message, \
                 assigned_to, source_ip) \
             VALUES ($1, $2, 'new', $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, \
                     $14, $15, $16, $17, $18, $19, $20) \
             RETURNING {COLUMNS}"
        );
        let booking = sqlx::query_as::<_, Booking>(&insert_query)
            .bind(&input.reference_code)
            .bind(input.artist_id)
            .bind(input.score_breakdown.total as i32)
            .bind(Json(input.score_breakdown))
            .bind(&input.requester_name)
            .bind(&input.requester_email)
            .bind(&input.requester_phone)
            .bind(&input.requester_company)
            .bind(input.event_date)
            .bind(&input.event_type)
            .bind(&input.event_city)
            .bind(&input.event_country)
            .bind(&input.event_venue)
            .bind(input.expected_attendance)
            .bind(input.budget_min)
            .bind(input.budget_max)
            .bind(&input.currency)
            .bind(&input.message)
            .bind(input.assigned_to)
            .bind(&input.source_ip)
            .fetch_one(&mut *tx)
            .await?;

        Self::append_history(
            &mut tx,
            booking.id,
            None,
            BookingStatus::New,
            created_by,
            Some("Booking submitted"),
        )
        .await?;

        tx.commit().await?;
        Ok(booking)
    }

    /// Find a booking by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List bookings matching `filter`, newest first, with the total match count.
    pub async fn list(
        pool: &PgPool,
        filter: &BookingFilter,
    ) -> Result<(Vec<Booking>, i64), sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx: usize = 1;

        if filter.status.is_some() {
            conditions.push(format!("status = ${param_idx}"));
            param_idx += 1;
        }
        if filter.artist_id.is_some() {
            conditions.push(format!("artist_id = ${param_idx}"));
            param_idx += 1;
        }
        if filter.requester_email.is_some() {
            conditions.push(format!("lower(requester_email) = lower(${param_idx})"));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let list_query = format!(
            "SELECT {COLUMNS} FROM bookings {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );
        let count_query = format!("SELECT COUNT(*) FROM bookings {where_clause}");

        let mut q = sqlx::query_as::<_, Booking>(&list_query);
        let mut c = sqlx::query_scalar::<_, i64>(&count_query);

        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
            c = c.bind(status.as_str());
        }
        if let Some(artist_id) = filter.artist_id {
            q = q.bind(artist_id);
            c = c.bind(artist_id);
        }
        if let Some(email) = &filter.requester_email {
            q = q.bind(email);
            c = c.bind(email);
        }
        q = q.bind(filter.limit).bind(filter.offset);

        let items = q.fetch_all(pool).await?;
        let total = c.fetch_one(pool).await?;
        Ok((items, total))
    }

    /// Write a new status and append the matching history row.
    ///
    /// Returns `None` when the booking does not exist or, if
    /// `expected_version` is set, when it has moved on since.
    pub async fn change_status(
        pool: &PgPool,
        change: &StatusChange,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(from_status) = Self::lock_status(&mut tx, change.booking_id).await? else {
            return Ok(None);
        };

        let update_query = format!(
            "UPDATE bookings SET status = $2, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND ($3::INTEGER IS NULL OR version = $3) \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Booking>(&update_query)
            .bind(change.booking_id)
            .bind(change.to_status.as_str())
            .bind(change.expected_version)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(booking) = updated else {
            return Ok(None);
        };

        Self::append_history(
            &mut tx,
            booking.id,
            Some(from_status.as_str()),
            change.to_status,
            change.changed_by,
            change.note.as_deref(),
        )
        .await?;

        tx.commit().await?;
        Ok(Some(booking))
    }

    /// Stamp quote fields and move the booking to `quoted`.
    ///
    /// Only applies while `signed_at` is still NULL; returns `None` otherwise
    /// (or when the booking does not exist) and writes nothing.
    pub async fn record_quote(
        pool: &PgPool,
        quote: &QuoteUpdate,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(from_status) = Self::lock_status(&mut tx, quote.booking_id).await? else {
            return Ok(None);
        };

        let update_query = format!(
            "UPDATE bookings SET \
                quoted_amount = COALESCE($2, quoted_amount), \
                quote_pdf_url = COALESCE($3, quote_pdf_url), \
                quote_sent_at = $4, \
                status = 'quoted', \
                version = version + 1, \
                updated_at = NOW() \
             WHERE id = $1 AND signed_at IS NULL \
             RETURNING {COLUMNS}"
        );
        let quoted = sqlx::query_as::<_, Booking>(&update_query)
            .bind(quote.booking_id)
            .bind(quote.quoted_amount)
            .bind(&quote.quote_pdf_url)
            .bind(quote.quote_sent_at)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(booking) = quoted else {
            return Ok(None);
        };

        Self::append_history(
            &mut tx,
            booking.id,
            Some(from_status.as_str()),
            BookingStatus::Quoted,
            quote.changed_by,
            quote.note.as_deref(),
        )
        .await?;

        tx.commit().await?;
        Ok(Some(booking))
    }

    /// Record a signature and move the booking to `confirmed`.
    ///
    /// Only applies while `signed_at` is still NULL; returns `None` otherwise
    /// (or when the booking does not exist) and writes nothing.
    pub async fn record_signature(
        pool: &PgPool,
        record: &SignatureRecord,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(from_status) = Self::lock_status(&mut tx, record.booking_id).await? else {
            return Ok(None);
        };

        let update_query = format!(
            "UPDATE bookings SET \
                digital_signature = $2, \
                signed_at = $3, \
                status = 'confirmed', \
                version = version + 1, \
                updated_at = NOW() \
             WHERE id = $1 AND signed_at IS NULL \
             RETURNING {COLUMNS}"
        );
        let signed = sqlx::query_as::<_, Booking>(&update_query)
            .bind(record.booking_id)
            .bind(&record.signature)
            .bind(record.signed_at)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(booking) = signed else {
            return Ok(None);
        };

        Self::append_history(
            &mut tx,
            booking.id,
            Some(from_status.as_str()),
            BookingStatus::Confirmed,
            record.changed_by,
            record.note.as_deref(),
        )
        .await?;

        tx.commit().await?;
        Ok(Some(booking))
    }

    /// Delete a booking. Comments, history and contract cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- transaction helpers --

    async fn lock_status(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Option<BookingStatus>, sqlx::Error> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM bookings WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        status
            .map(|s| {
                s.parse::<BookingStatus>()
                    .map_err(|e| sqlx::Error::Decode(Box::new(e)))
            })
            .transpose()
    }

    async fn append_history(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: DbId,
        from_status: Option<&str>,
        to_status: BookingStatus,
        changed_by: Option<DbId>,
        note: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO booking_status_history \
                (booking_id, from_status, to_status, changed_by, note) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(booking_id)
        .bind(from_status)
        .bind(to_status.as_str())
        .bind(changed_by)
        .bind(note)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
