//! Booking, status history, comment and contract models.

use backstage_core::booking::BookingStatus;
use backstage_core::contract::{ContractDocument, ContractPatch};
use backstage_core::scoring::ScoreBreakdown;
use backstage_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

/// A row from the `bookings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: DbId,
    pub reference_code: String,
    pub artist_id: DbId,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub score: i32,
    pub score_breakdown: Json<ScoreBreakdown>,
    pub requester_name: String,
    pub requester_email: String,
    pub requester_phone: Option<String>,
    pub requester_company: Option<String>,
    pub event_date: NaiveDate,
    pub event_type: String,
    pub event_city: String,
    pub event_country: Option<String>,
    pub event_venue: Option<String>,
    pub expected_attendance: Option<i64>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub currency: String,
    pub message: Option<String>,
    pub quoted_amount: Option<i64>,
    pub quote_pdf_url: Option<String>,
    pub quote_sent_at: Option<Timestamp>,
    pub digital_signature: Option<String>,
    pub signed_at: Option<Timestamp>,
    pub assigned_to: Option<DbId>,
    #[serde(skip_serializing)]
    pub source_ip: Option<String>,
    /// Incremented on every write; used for optimistic status updates.
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    /// `signed_at` and `digital_signature` are set together, once.
    pub fn is_signed(&self) -> bool {
        self.signed_at.is_some()
    }
}

/// Insert DTO for a new booking. Status is always `new`.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub reference_code: String,
    pub artist_id: DbId,
    pub score_breakdown: ScoreBreakdown,
    pub requester_name: String,
    pub requester_email: String,
    pub requester_phone: Option<String>,
    pub requester_company: Option<String>,
    pub event_date: NaiveDate,
    pub event_type: String,
    pub event_city: String,
    pub event_country: Option<String>,
    pub event_venue: Option<String>,
    pub expected_attendance: Option<i64>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub currency: String,
    pub message: Option<String>,
    pub assigned_to: Option<DbId>,
    pub source_ip: Option<String>,
}

/// Listing filter. Role scoping is expressed through `artist_id` and
/// `requester_email`.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub artist_id: Option<DbId>,
    pub requester_email: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// One status write. The ledger row's `from_status` is read by the store
/// under the same lock as the write.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub booking_id: DbId,
    pub to_status: BookingStatus,
    pub changed_by: Option<DbId>,
    pub note: Option<String>,
    /// When set, the write only applies if the booking is still at this version.
    pub expected_version: Option<i32>,
}

/// Quote fields stamped by `send-contract`. Also moves the booking to `quoted`.
#[derive(Debug, Clone)]
pub struct QuoteUpdate {
    pub booking_id: DbId,
    /// `None` keeps the current amount.
    pub quoted_amount: Option<i64>,
    /// `None` keeps the current URL.
    pub quote_pdf_url: Option<String>,
    pub quote_sent_at: Timestamp,
    pub changed_by: Option<DbId>,
    pub note: Option<String>,
}

/// A signature write. Applies only while the booking is unsigned and moves
/// it to `confirmed`.
#[derive(Debug, Clone)]
pub struct SignatureRecord {
    pub booking_id: DbId,
    pub signature: String,
    pub signed_at: Timestamp,
    pub changed_by: Option<DbId>,
    pub note: Option<String>,
}

/// A row from the `booking_status_history` table. Append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatusHistory {
    pub id: DbId,
    pub booking_id: DbId,
    pub from_status: Option<String>,
    pub to_status: String,
    pub changed_by: Option<DbId>,
    pub note: Option<String>,
    pub created_at: Timestamp,
}

/// A row from the `booking_comments` table. Append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingComment {
    pub id: DbId,
    pub booking_id: DbId,
    pub author_id: Option<DbId>,
    pub author_role: String,
    pub body: String,
    pub is_internal: bool,
    pub created_at: Timestamp,
}

/// Insert DTO for a comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub booking_id: DbId,
    pub author_id: Option<DbId>,
    pub author_role: String,
    pub body: String,
    pub is_internal: bool,
}

/// A row from the `booking_contracts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingContract {
    pub booking_id: DbId,
    pub document: Json<ContractDocument>,
    pub version: i32,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /public/bookings` and `POST /bookings`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBookingRequest {
    pub artist_id: DbId,
    #[validate(length(min = 1, max = 200))]
    pub requester_name: String,
    #[validate(email)]
    pub requester_email: String,
    #[validate(length(max = 50))]
    pub requester_phone: Option<String>,
    #[validate(length(max = 200))]
    pub requester_company: Option<String>,
    pub event_date: NaiveDate,
    #[validate(length(min = 1, max = 50))]
    pub event_type: String,
    #[validate(length(min = 1, max = 120))]
    pub event_city: String,
    #[validate(length(max = 120))]
    pub event_country: Option<String>,
    #[validate(length(max = 200))]
    pub event_venue: Option<String>,
    #[validate(range(min = 0))]
    pub expected_attendance: Option<i64>,
    #[validate(range(min = 0i64, max = 1_000_000_000_000i64))]
    pub budget_min: Option<i64>,
    #[validate(range(min = 0i64, max = 1_000_000_000_000i64))]
    pub budget_max: Option<i64>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[validate(length(max = 5000))]
    pub message: Option<String>,
}

/// Body of `PATCH /bookings/{id}/status`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
    pub expected_version: Option<i32>,
}

/// Body of `POST /bookings/{id}/send-contract`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendContractRequest {
    #[validate(range(min = 0))]
    pub quoted_amount: Option<i64>,
    #[validate(url)]
    pub quote_pdf_url: Option<String>,
    #[validate(length(max = 5000))]
    pub custom_message: Option<String>,
    /// Link lifetime; defaults to seven days.
    #[validate(range(min = 1, max = 2160))]
    pub expires_in_hours: Option<i64>,
}

/// Body of the two signing endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SignContractRequest {
    pub signature: String,
}

/// Body of `PATCH /bookings/{id}/contract`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContractRequest {
    #[serde(flatten)]
    pub patch: ContractPatch,
    pub expected_version: Option<i32>,
}

/// Body of `POST /bookings/{id}/comments`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 5000))]
    pub body: String,
    #[serde(default)]
    pub is_internal: bool,
}
