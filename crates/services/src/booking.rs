//! Booking lifecycle: intake and scoring, staff status changes, contract
//! issuance, signature redemption and contract negotiation.

use std::sync::Arc;

use backstage_core::booking::{
    format_reference_code, normalize_signature, BookingStatus, TransitionPolicy,
    REQUIRED_FORM_FIELDS,
};
use backstage_core::capability::{
    Capability, CapabilitySigner, Purpose, DEFAULT_CONTRACT_TTL_HOURS, INVALID_TOKEN_MESSAGE,
};
use backstage_core::collaborators::{
    ArtistDirectory, ArtistProfile, AuditEntry, AuditRecorder, NotificationDispatcher,
};
use backstage_core::contract::{
    ArtistSection, ContractDocument, ContractEditor, FinancialSection, OrganizerSection,
    PerformanceSection, SignaturesSection, WorkflowSection,
};
use backstage_core::error::CoreError;
use backstage_core::hashing::token_fingerprint;
use backstage_core::pagination::{clamp_limit, clamp_offset, Page, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use backstage_core::roles::{emails_match, ensure_booking_access, ensure_staff, Actor};
use backstage_core::scoring::{self, form_completeness_ratio, ScoreInput};
use backstage_core::templates;
use backstage_core::types::{DbId, Timestamp};
use backstage_db::models::booking::{
    Booking, BookingComment, BookingContract, BookingFilter, BookingStatusHistory,
    CreateCommentRequest, NewBooking, NewComment, QuoteUpdate, SendContractRequest,
    SignatureRecord, StatusChange, SubmitBookingRequest, UpdateContractRequest,
    UpdateStatusRequest,
};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::notify::notify;
use crate::presskit::PresskitIssuer;
use crate::store::{BookingStore, StoreError, REFERENCE_CODE_CONSTRAINT};
use crate::validate_input;

/// Attempts at a fresh reference code before giving up on unique conflicts.
const MAX_REFERENCE_ATTEMPTS: usize = 5;

/// Currency assumed when a submission names none.
pub const DEFAULT_CURRENCY: &str = "AUD";

const STALE_BOOKING_MESSAGE: &str = "Booking was modified by another request; reload and retry";
const ALREADY_SIGNED_MESSAGE: &str = "Contract has already been signed";

// ---------------------------------------------------------------------------
// Configuration and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BookingLifecycleConfig {
    /// Base of the public site; signing URLs are `{base}/contracts/{token}`.
    pub public_base_url: String,
    /// Lifetime of a signing link when the caller does not choose one.
    pub contract_link_ttl: Duration,
    pub transition_policy: TransitionPolicy,
}

impl Default for BookingLifecycleConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:3000".to_string(),
            contract_link_ttl: Duration::hours(DEFAULT_CONTRACT_TTL_HOURS),
            transition_policy: TransitionPolicy::default(),
        }
    }
}

/// Query parameters of `GET /bookings`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
    pub artist_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Result of `send-contract`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningLink {
    pub signing_url: String,
    pub expires_at: Timestamp,
    pub booking: Booking,
}

/// Result of either signature path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedContract {
    pub booking_id: DbId,
    pub reference_code: String,
    pub status: BookingStatus,
    pub signed_at: Timestamp,
}

/// What the public signing page shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSummary {
    pub reference_code: String,
    pub artist_name: Option<String>,
    pub requester_name: String,
    pub event_date: NaiveDate,
    pub event_type: String,
    pub event_city: String,
    pub quoted_amount: Option<i64>,
    pub currency: String,
    pub quote_pdf_url: Option<String>,
    pub is_signed: bool,
    pub signed_at: Option<Timestamp>,
    pub contract: ContractDocument,
}

/// The assembled contract of a booking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractView {
    pub booking_id: DbId,
    /// Version of the stored edits; 0 when nothing has been edited yet.
    pub version: i32,
    pub editable: bool,
    pub document: ContractDocument,
}

// ---------------------------------------------------------------------------
// BookingLifecycle
// ---------------------------------------------------------------------------

/// Owns every state change of a booking.
pub struct BookingLifecycle {
    store: Arc<dyn BookingStore>,
    artists: Arc<dyn ArtistDirectory>,
    notifier: Arc<dyn NotificationDispatcher>,
    audit: Arc<dyn AuditRecorder>,
    presskits: Arc<dyn PresskitIssuer>,
    signer: CapabilitySigner,
    config: BookingLifecycleConfig,
}

impl BookingLifecycle {
    pub fn new(
        store: Arc<dyn BookingStore>,
        artists: Arc<dyn ArtistDirectory>,
        notifier: Arc<dyn NotificationDispatcher>,
        audit: Arc<dyn AuditRecorder>,
        presskits: Arc<dyn PresskitIssuer>,
        signer: CapabilitySigner,
        config: BookingLifecycleConfig,
    ) -> Self {
        Self {
            store,
            artists,
            notifier,
            audit,
            presskits,
            signer,
            config,
        }
    }

    // -- intake --------------------------------------------------------------

    /// Score and store a new booking request.
    ///
    /// `submitted_by` is `None` for the public form. Organizers and promoters
    /// may only submit under their own email; artists may not submit.
    pub async fn submit(
        &self,
        request: SubmitBookingRequest,
        source_ip: Option<String>,
        submitted_by: Option<&Actor>,
    ) -> Result<Booking, CoreError> {
        validate_input(&request)?;
        if let (Some(min), Some(max)) = (request.budget_min, request.budget_max) {
            if min > max {
                return Err(CoreError::Validation(
                    "budgetMin must not exceed budgetMax".into(),
                ));
            }
        }
        let today = Utc::now().date_naive();
        if request.event_date < today {
            return Err(CoreError::Validation("eventDate must not be in the past".into()));
        }
        match submitted_by {
            Some(Actor::Artist { .. }) => {
                return Err(CoreError::Forbidden(
                    "Artist accounts cannot submit booking requests".into(),
                ));
            }
            Some(actor) => {
                if let Some(email) = actor.requester_email() {
                    if !emails_match(email, &request.requester_email) {
                        return Err(CoreError::BadRequest(
                            "requesterEmail must match your account email".into(),
                        ));
                    }
                }
            }
            None => {}
        }

        let artist = self
            .artists
            .find_by_id(request.artist_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Artist", request.artist_id))?;

        let previous = self
            .store
            .count_bookings_by_email(&request.requester_email)
            .await?;
        let breakdown = scoring::score(&ScoreInput {
            budget_min: request.budget_min,
            budget_max: request.budget_max,
            artist_fee_min: artist.fee_min,
            artist_fee_max: artist.fee_max,
            event_type: Some(request.event_type.clone()),
            days_until_event: Some((request.event_date - today).num_days()),
            expected_attendance: request.expected_attendance,
            form_completeness: form_completeness(&request),
            is_repeat_booker: previous > 0,
        });

        let mut new_booking = NewBooking {
            reference_code: String::new(),
            artist_id: artist.id,
            score_breakdown: breakdown,
            requester_name: request.requester_name.trim().to_string(),
            requester_email: request.requester_email.trim().to_string(),
            requester_phone: request.requester_phone,
            requester_company: request.requester_company,
            event_date: request.event_date,
            event_type: request.event_type.trim().to_ascii_lowercase(),
            event_city: request.event_city.trim().to_string(),
            event_country: request.event_country,
            event_venue: request.event_venue,
            expected_attendance: request.expected_attendance,
            budget_min: request.budget_min,
            budget_max: request.budget_max,
            currency: request
                .currency
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            message: request.message,
            assigned_to: artist.manager_id,
            source_ip,
        };

        let created_by = submitted_by.map(Actor::user_id);
        let year = Utc::now().year();
        let mut attempt = 0;
        let booking = loop {
            attempt += 1;
            let sequence = self.store.next_reference_sequence(year).await?;
            new_booking.reference_code = format_reference_code(year, sequence);

            match self.store.create_booking(&new_booking, created_by).await {
                Ok(booking) => break booking,
                Err(StoreError::Conflict { constraint })
                    if constraint == REFERENCE_CODE_CONSTRAINT
                        && attempt < MAX_REFERENCE_ATTEMPTS =>
                {
                    tracing::warn!(
                        reference_code = %new_booking.reference_code,
                        attempt,
                        "Reference code collision, retrying",
                    );
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(
            booking_id = booking.id,
            reference_code = %booking.reference_code,
            artist_id = booking.artist_id,
            score = booking.score,
            "Booking submitted",
        );

        notify(
            self.notifier.as_ref(),
            templates::BOOKING_RECEIVED,
            &booking.requester_email,
            &json!({
                "requesterName": booking.requester_name,
                "referenceCode": booking.reference_code,
                "artistName": artist.name,
                "eventDate": booking.event_date,
                "eventCity": booking.event_city,
            }),
        )
        .await;
        self.record_audit(created_by, "booking.submitted", booking.id, json!({
            "referenceCode": booking.reference_code,
            "score": booking.score,
        }))
        .await;

        Ok(booking)
    }

    // -- reads ---------------------------------------------------------------

    pub async fn get(&self, id: DbId, actor: &Actor) -> Result<Booking, CoreError> {
        self.load_accessible(id, actor).await
    }

    /// List bookings visible to `actor`.
    pub async fn list(
        &self,
        query: BookingListQuery,
        actor: &Actor,
    ) -> Result<Page<Booking>, CoreError> {
        let limit = clamp_limit(query.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
        let offset = clamp_offset(query.offset);
        let mut filter = BookingFilter {
            status: query.status,
            artist_id: query.artist_id,
            requester_email: None,
            limit,
            offset,
        };
        match actor {
            Actor::Admin { .. } | Actor::Manager { .. } => {}
            Actor::Organizer { email, .. } | Actor::Promoter { email, .. } => {
                filter.requester_email = Some(email.clone());
            }
            Actor::Artist { artist_id, .. } => filter.artist_id = Some(*artist_id),
        }

        let (items, total) = self.store.list_bookings(&filter).await?;
        Ok(Page {
            items,
            total,
            limit,
            offset,
        })
    }

    /// Status ledger of a booking, oldest first.
    pub async fn history(
        &self,
        id: DbId,
        actor: &Actor,
    ) -> Result<Vec<BookingStatusHistory>, CoreError> {
        self.load_accessible(id, actor).await?;
        Ok(self.store.list_history(id).await?)
    }

    // -- staff status changes ------------------------------------------------

    /// Write a staff-directed status change.
    ///
    /// The configured [`TransitionPolicy`] decides which targets are
    /// accepted; `confirmed` never is.
    pub async fn update_status(
        &self,
        id: DbId,
        request: UpdateStatusRequest,
        actor: &Actor,
    ) -> Result<Booking, CoreError> {
        ensure_staff(actor)?;
        validate_input(&request)?;
        let booking = self.load(id).await?;
        self.config
            .transition_policy
            .check(booking.status, request.status)?;

        let change = StatusChange {
            booking_id: id,
            to_status: request.status,
            changed_by: Some(actor.user_id()),
            note: request.note.clone(),
            expected_version: request.expected_version,
        };
        let updated = match self.store.change_status(&change).await? {
            Some(updated) => updated,
            None if request.expected_version.is_some() => {
                return Err(CoreError::Conflict(STALE_BOOKING_MESSAGE.into()));
            }
            None => return Err(CoreError::not_found("Booking", id)),
        };

        tracing::info!(
            booking_id = id,
            from = %booking.status,
            to = %updated.status,
            user_id = actor.user_id(),
            "Booking status changed",
        );

        notify(
            self.notifier.as_ref(),
            templates::BOOKING_STATUS_CHANGED,
            &updated.requester_email,
            &json!({
                "requesterName": updated.requester_name,
                "referenceCode": updated.reference_code,
                "fromStatus": booking.status,
                "toStatus": updated.status,
                "note": request.note,
            }),
        )
        .await;
        self.record_audit(Some(actor.user_id()), "booking.status_changed", id, json!({
            "from": booking.status,
            "to": updated.status,
        }))
        .await;

        Ok(updated)
    }

    // -- contract issuance and signature -------------------------------------

    /// Record the quote, move the booking to `quoted` and email a signing link.
    pub async fn send_contract(
        &self,
        id: DbId,
        request: SendContractRequest,
        actor: &Actor,
    ) -> Result<SigningLink, CoreError> {
        ensure_staff(actor)?;
        validate_input(&request)?;
        let booking = self.load(id).await?;
        if booking.is_signed() {
            return Err(CoreError::BadRequest(ALREADY_SIGNED_MESSAGE.into()));
        }
        if booking.status != BookingStatus::Quoted {
            self.config
                .transition_policy
                .check(booking.status, BookingStatus::Quoted)?;
        }
        let artist = self.artists.find_by_id(booking.artist_id).await?;

        let ttl = request
            .expires_in_hours
            .map(Duration::hours)
            .unwrap_or(self.config.contract_link_ttl);
        let issued = self
            .signer
            .issue(
                &Capability::BookingContract {
                    booking_id: booking.id,
                    requester_email: booking.requester_email.clone(),
                },
                ttl,
            )
            .map_err(CoreError::from)?;

        let quote = QuoteUpdate {
            booking_id: id,
            quoted_amount: request.quoted_amount,
            quote_pdf_url: request.quote_pdf_url.clone(),
            quote_sent_at: Utc::now(),
            changed_by: Some(actor.user_id()),
            note: Some("Contract sent for signature".to_string()),
        };
        let updated = self
            .store
            .record_quote(&quote)
            .await?
            .ok_or_else(|| CoreError::BadRequest(ALREADY_SIGNED_MESSAGE.into()))?;

        let signing_url = format!(
            "{}/contracts/{}",
            self.config.public_base_url.trim_end_matches('/'),
            issued.token
        );

        tracing::info!(
            booking_id = id,
            token = %token_fingerprint(&issued.token),
            expires_at = %issued.expires_at,
            "Contract sent for signature",
        );

        let artist_name = artist.as_ref().map(|a| a.name.clone());
        notify(
            self.notifier.as_ref(),
            templates::CONTRACT_SIGNATURE_REQUEST,
            &updated.requester_email,
            &json!({
                "requesterName": updated.requester_name,
                "referenceCode": updated.reference_code,
                "artistName": artist_name,
                "quotedAmount": updated.quoted_amount,
                "currency": updated.currency,
                "signingUrl": signing_url,
                "expiresAt": issued.expires_at,
                "customMessage": request.custom_message,
            }),
        )
        .await;
        if let Some(email) = artist.as_ref().and_then(|a| a.account_email.as_deref()) {
            notify(
                self.notifier.as_ref(),
                templates::CONTRACT_ARTIST_NOTICE,
                email,
                &json!({
                    "artistName": artist_name,
                    "referenceCode": updated.reference_code,
                    "requesterName": updated.requester_name,
                    "eventDate": updated.event_date,
                    "signingUrl": signing_url,
                }),
            )
            .await;
        }
        self.record_audit(Some(actor.user_id()), "booking.contract_sent", id, json!({
            "quotedAmount": updated.quoted_amount,
            "expiresAt": issued.expires_at,
        }))
        .await;

        Ok(SigningLink {
            signing_url,
            expires_at: issued.expires_at,
            booking: updated,
        })
    }

    /// Contract details for the public signing page.
    pub async fn contract_summary(&self, token: &str) -> Result<ContractSummary, CoreError> {
        let booking = self.redeem_contract_token(token).await?;
        let artist = self.artists.find_by_id(booking.artist_id).await?;
        let stored = self.store.find_contract(booking.id).await?;
        let contract = assemble_contract(&booking, artist.as_ref(), stored.as_ref());

        Ok(ContractSummary {
            reference_code: booking.reference_code,
            artist_name: artist.map(|a| a.name),
            requester_name: booking.requester_name,
            event_date: booking.event_date,
            event_type: booking.event_type,
            event_city: booking.event_city,
            quoted_amount: booking.quoted_amount,
            currency: booking.currency,
            quote_pdf_url: booking.quote_pdf_url,
            is_signed: booking.signed_at.is_some(),
            signed_at: booking.signed_at,
            contract,
        })
    }

    /// Redeem a signing link.
    pub async fn sign_by_token(
        &self,
        token: &str,
        signature: &str,
    ) -> Result<SignedContract, CoreError> {
        let booking = self.redeem_contract_token(token).await?;
        let signature = normalize_signature(signature)?;
        if booking.is_signed() {
            return Err(CoreError::BadRequest(ALREADY_SIGNED_MESSAGE.into()));
        }

        tracing::info!(
            booking_id = booking.id,
            token = %token_fingerprint(token),
            "Contract signature via link",
        );
        self.sign(booking, signature, None, "Signed via contract link")
            .await
    }

    /// Sign from an authenticated dashboard session.
    pub async fn sign_direct(
        &self,
        id: DbId,
        signature: &str,
        actor: &Actor,
    ) -> Result<SignedContract, CoreError> {
        let booking = self.load_accessible(id, actor).await?;
        let signature = normalize_signature(signature)?;
        if booking.is_signed() {
            return Err(CoreError::BadRequest(ALREADY_SIGNED_MESSAGE.into()));
        }

        self.sign(
            booking,
            signature,
            Some(actor.user_id()),
            "Signed from dashboard",
        )
        .await
    }

    async fn sign(
        &self,
        booking: Booking,
        signature: String,
        signed_by: Option<DbId>,
        note: &str,
    ) -> Result<SignedContract, CoreError> {
        let record = SignatureRecord {
            booking_id: booking.id,
            signature,
            signed_at: Utc::now(),
            changed_by: signed_by,
            note: Some(note.to_string()),
        };
        // `None` here means another request signed first.
        let signed = self
            .store
            .record_signature(&record)
            .await?
            .ok_or_else(|| CoreError::BadRequest(ALREADY_SIGNED_MESSAGE.into()))?;

        let signed_at = signed.signed_at.unwrap_or(record.signed_at);
        tracing::info!(
            booking_id = signed.id,
            reference_code = %signed.reference_code,
            "Booking confirmed by signature",
        );
        self.after_confirmation(&signed, signed_by).await;

        Ok(SignedContract {
            booking_id: signed.id,
            reference_code: signed.reference_code,
            status: signed.status,
            signed_at,
        })
    }

    /// Side effects of confirmation. Failures are logged, never returned.
    async fn after_confirmation(&self, booking: &Booking, signed_by: Option<DbId>) {
        notify(
            self.notifier.as_ref(),
            templates::CONTRACT_SIGNED,
            &booking.requester_email,
            &json!({
                "requesterName": booking.requester_name,
                "referenceCode": booking.reference_code,
                "signature": booking.digital_signature,
                "signedAt": booking.signed_at,
            }),
        )
        .await;

        match self.artists.find_by_id(booking.artist_id).await {
            Ok(Some(ArtistProfile {
                name,
                account_email: Some(email),
                ..
            })) => {
                notify(
                    self.notifier.as_ref(),
                    templates::BOOKING_CONFIRMED_ARTIST,
                    &email,
                    &json!({
                        "artistName": name,
                        "referenceCode": booking.reference_code,
                        "eventDate": booking.event_date,
                        "eventCity": booking.event_city,
                    }),
                )
                .await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(booking_id = booking.id, error = %e, "Artist lookup failed after signing");
            }
        }

        match self.presskits.issue_for_booking(booking).await {
            Ok(Some(link_id)) => {
                tracing::info!(booking_id = booking.id, link_id, "Presskit link issued on confirmation");
            }
            Ok(None) => {
                tracing::debug!(booking_id = booking.id, "No presskit to share on confirmation");
            }
            Err(e) => {
                tracing::warn!(booking_id = booking.id, error = %e, "Presskit issuance failed");
            }
        }

        self.record_audit(signed_by, "booking.contract_signed", booking.id, json!({
            "signedAt": booking.signed_at,
        }))
        .await;
    }

    /// Verify a signing token and load the booking it names.
    ///
    /// Every failure (bad token, wrong purpose, unknown booking, requester
    /// email changed since issue) is the same generic `Forbidden`.
    async fn redeem_contract_token(&self, token: &str) -> Result<Booking, CoreError> {
        let capability = self
            .signer
            .verify_purpose(token, Purpose::BookingContract)
            .map_err(|e| {
                tracing::debug!(token = %token_fingerprint(token), "Contract token rejected");
                CoreError::from(e)
            })?;
        let Capability::BookingContract {
            booking_id,
            requester_email,
        } = capability
        else {
            return Err(invalid_token());
        };

        let booking = self.store.find_booking(booking_id).await?.ok_or_else(|| {
            tracing::debug!(booking_id, "Contract token names a missing booking");
            invalid_token()
        })?;
        if !emails_match(&booking.requester_email, &requester_email) {
            tracing::warn!(booking_id, "Contract token requester email no longer matches");
            return Err(invalid_token());
        }
        Ok(booking)
    }

    // -- contract negotiation ------------------------------------------------

    /// The assembled contract document of a booking.
    pub async fn contract(&self, id: DbId, actor: &Actor) -> Result<ContractView, CoreError> {
        let booking = self.load_accessible(id, actor).await?;
        let artist = self.artists.find_by_id(booking.artist_id).await?;
        let stored = self.store.find_contract(id).await?;
        Ok(contract_view(&booking, artist.as_ref(), stored.as_ref()))
    }

    /// Apply a contract edit from staff or the requesting organizer.
    pub async fn update_contract(
        &self,
        id: DbId,
        request: UpdateContractRequest,
        actor: &Actor,
    ) -> Result<ContractView, CoreError> {
        let booking = self.load_accessible(id, actor).await?;
        let editor = match actor {
            Actor::Admin { .. } | Actor::Manager { .. } => ContractEditor::Agency,
            Actor::Organizer { .. } | Actor::Promoter { .. } => ContractEditor::Organizer,
            Actor::Artist { .. } => {
                return Err(CoreError::Forbidden(
                    "Artist accounts cannot edit contract terms".into(),
                ));
            }
        };
        if booking.is_signed() {
            return Err(CoreError::BadRequest(
                "Contract cannot be edited after signing".into(),
            ));
        }
        if request.patch.is_empty() {
            return Err(CoreError::Validation("No contract changes supplied".into()));
        }

        let stored = self.store.find_contract(id).await?;
        let stored_version = stored.as_ref().map(|c| c.version);
        if let Some(expected) = request.expected_version {
            if expected != stored_version.unwrap_or(0) {
                return Err(CoreError::Conflict(
                    "Contract was modified by another request; reload and retry".into(),
                ));
            }
        }

        let mut document = stored.map(|c| c.document.0).unwrap_or_default();
        document.apply(request.patch, editor, Utc::now());
        let saved = self
            .store
            .save_contract(id, &document, stored_version)
            .await?
            .ok_or_else(|| {
                CoreError::Conflict("Contract was modified by another request; reload and retry".into())
            })?;

        tracing::info!(
            booking_id = id,
            version = saved.version,
            editor = editor.as_str(),
            "Contract updated",
        );
        self.record_audit(Some(actor.user_id()), "booking.contract_updated", id, json!({
            "version": saved.version,
            "editor": editor.as_str(),
        }))
        .await;

        let artist = self.artists.find_by_id(booking.artist_id).await?;
        Ok(contract_view(&booking, artist.as_ref(), Some(&saved)))
    }

    // -- comments ------------------------------------------------------------

    pub async fn add_comment(
        &self,
        id: DbId,
        request: CreateCommentRequest,
        actor: &Actor,
    ) -> Result<BookingComment, CoreError> {
        validate_input(&request)?;
        self.load_accessible(id, actor).await?;
        if request.is_internal && !actor.is_staff() {
            return Err(CoreError::Forbidden(
                "Only agency staff can post internal comments".into(),
            ));
        }

        let comment = self
            .store
            .add_comment(&NewComment {
                booking_id: id,
                author_id: Some(actor.user_id()),
                author_role: actor.role().to_string(),
                body: request.body.trim().to_string(),
                is_internal: request.is_internal,
            })
            .await?;
        tracing::debug!(booking_id = id, comment_id = comment.id, "Comment added");
        Ok(comment)
    }

    /// Comments visible to `actor`; internal ones only for staff.
    pub async fn list_comments(
        &self,
        id: DbId,
        actor: &Actor,
    ) -> Result<Vec<BookingComment>, CoreError> {
        self.load_accessible(id, actor).await?;
        Ok(self.store.list_comments(id, actor.is_staff()).await?)
    }

    // -- removal -------------------------------------------------------------

    /// Delete a booking with its comments, history and contract. Admin only.
    pub async fn delete(&self, id: DbId, actor: &Actor) -> Result<(), CoreError> {
        if !matches!(actor, Actor::Admin { .. }) {
            return Err(CoreError::Forbidden("Admin role required".into()));
        }
        if !self.store.delete_booking(id).await? {
            return Err(CoreError::not_found("Booking", id));
        }
        tracing::info!(booking_id = id, user_id = actor.user_id(), "Booking deleted");
        self.record_audit(Some(actor.user_id()), "booking.deleted", id, json!({}))
            .await;
        Ok(())
    }

    // -- helpers -------------------------------------------------------------

    async fn load(&self, id: DbId) -> Result<Booking, CoreError> {
        self.store
            .find_booking(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Booking", id))
    }

    async fn load_accessible(&self, id: DbId, actor: &Actor) -> Result<Booking, CoreError> {
        let booking = self.load(id).await?;
        ensure_booking_access(actor, booking.artist_id, &booking.requester_email)?;
        Ok(booking)
    }

    async fn record_audit(
        &self,
        actor_user_id: Option<DbId>,
        action: &'static str,
        booking_id: DbId,
        details: serde_json::Value,
    ) {
        self.audit
            .record(AuditEntry {
                actor_user_id,
                action,
                entity_type: "booking",
                entity_id: booking_id,
                details,
            })
            .await;
    }
}

fn invalid_token() -> CoreError {
    CoreError::Forbidden(INVALID_TOKEN_MESSAGE.into())
}

/// Share of the form filled in: required fields plus the seven optional ones.
fn form_completeness(request: &SubmitBookingRequest) -> f64 {
    let filled = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
    form_completeness_ratio(
        REQUIRED_FORM_FIELDS,
        &[
            filled(&request.requester_phone),
            filled(&request.requester_company),
            filled(&request.event_country),
            filled(&request.event_venue),
            request.expected_attendance.is_some(),
            request.budget_min.is_some() || request.budget_max.is_some(),
            filled(&request.message),
        ],
    )
}

/// Contract defaults derived from the booking and artist, overlaid with
/// stored edits. Signature fields always come from the booking.
pub fn assemble_contract(
    booking: &Booking,
    artist: Option<&ArtistProfile>,
    stored: Option<&BookingContract>,
) -> ContractDocument {
    let defaults = ContractDocument {
        organizer: OrganizerSection {
            name: Some(booking.requester_name.clone()),
            company: booking.requester_company.clone(),
            email: Some(booking.requester_email.clone()),
            phone: booking.requester_phone.clone(),
            ..Default::default()
        },
        artist: ArtistSection {
            name: artist.map(|a| a.name.clone()),
            email: artist.and_then(|a| a.account_email.clone()),
            ..Default::default()
        },
        performance: PerformanceSection {
            event_date: Some(booking.event_date),
            event_type: Some(booking.event_type.clone()),
            venue: booking.event_venue.clone(),
            city: Some(booking.event_city.clone()),
            country: booking.event_country.clone(),
            expected_attendance: booking.expected_attendance,
            ..Default::default()
        },
        financial: FinancialSection {
            fee: booking.quoted_amount,
            currency: Some(booking.currency.clone()),
            ..Default::default()
        },
        signatures: SignaturesSection {
            organizer_signature: booking.digital_signature.clone(),
            organizer_signed_at: booking.signed_at,
        },
        workflow: WorkflowSection {
            sent_for_signature_at: booking.quote_sent_at,
            ..Default::default()
        },
        ..Default::default()
    };

    match stored {
        Some(contract) => defaults.overlay(contract.document.0.clone()),
        None => defaults,
    }
}

fn contract_view(
    booking: &Booking,
    artist: Option<&ArtistProfile>,
    stored: Option<&BookingContract>,
) -> ContractView {
    ContractView {
        booking_id: booking.id,
        version: stored.map_or(0, |c| c.version),
        editable: !booking.is_signed(),
        document: assemble_contract(booking, artist, stored),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use backstage_core::contract::{ContractPatch, FinancialSection, LegalSection};
    use backstage_db::models::presskit::PresskitSection;

    use super::*;
    use crate::memory::{
        MemoryArtistDirectory, MemoryFileStore, MemoryStore, RecordingAuditRecorder,
        RecordingDispatcher,
    };
    use crate::presskit::{PresskitAccessController, PresskitConfig};

    const SECRET: &str = "booking-test-secret";
    const ARTIST_ID: DbId = 1;
    const OTHER_ARTIST_ID: DbId = 2;
    const REQUESTER: &str = "booker@festival.test";

    struct Harness {
        store: Arc<MemoryStore>,
        artists: Arc<MemoryArtistDirectory>,
        notifier: Arc<RecordingDispatcher>,
        audit: Arc<RecordingAuditRecorder>,
        lifecycle: BookingLifecycle,
    }

    fn harness_with_policy(transition_policy: TransitionPolicy) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let artists = Arc::new(MemoryArtistDirectory::new());
        let notifier = Arc::new(RecordingDispatcher::new());
        let audit = Arc::new(RecordingAuditRecorder::new());
        artists.insert(ArtistProfile {
            id: ARTIST_ID,
            name: "Night Owls".to_string(),
            slug: "night-owls".to_string(),
            fee_min: Some(2000),
            fee_max: Some(2000),
            manager_id: Some(7),
            manager_email: Some("manager@agency.test".to_string()),
            account_email: Some("owls@band.test".to_string()),
        });
        artists.insert(ArtistProfile {
            id: OTHER_ARTIST_ID,
            name: "Low Tide".to_string(),
            slug: "low-tide".to_string(),
            fee_min: None,
            fee_max: None,
            manager_id: None,
            manager_email: None,
            account_email: None,
        });

        let presskits = Arc::new(PresskitAccessController::new(
            store.clone(),
            artists.clone(),
            Arc::new(MemoryFileStore::new()),
            notifier.clone(),
            audit.clone(),
            CapabilitySigner::new(SECRET),
            PresskitConfig::default(),
        ));
        let lifecycle = BookingLifecycle::new(
            store.clone(),
            artists.clone(),
            notifier.clone(),
            audit.clone(),
            presskits,
            CapabilitySigner::new(SECRET),
            BookingLifecycleConfig {
                public_base_url: "https://backstage.test".to_string(),
                transition_policy,
                ..BookingLifecycleConfig::default()
            },
        );
        Harness {
            store,
            artists,
            notifier,
            audit,
            lifecycle,
        }
    }

    fn harness() -> Harness {
        harness_with_policy(TransitionPolicy::Permissive)
    }

    fn manager() -> Actor {
        Actor::Manager { user_id: 7 }
    }

    fn admin() -> Actor {
        Actor::Admin { user_id: 1 }
    }

    fn organizer() -> Actor {
        Actor::Organizer {
            user_id: 20,
            email: "Booker@Festival.test".to_string(),
        }
    }

    fn request() -> SubmitBookingRequest {
        SubmitBookingRequest {
            artist_id: ARTIST_ID,
            requester_name: "Sam Rivers".to_string(),
            requester_email: REQUESTER.to_string(),
            requester_phone: Some("+61 400 000 000".to_string()),
            requester_company: Some("Harbour Festival Pty".to_string()),
            event_date: Utc::now().date_naive() + Duration::days(100),
            event_type: "festival".to_string(),
            event_city: "Hobart".to_string(),
            event_country: Some("Australia".to_string()),
            event_venue: Some("Princes Wharf".to_string()),
            expected_attendance: Some(12_000),
            budget_min: Some(1000),
            budget_max: Some(3000),
            currency: None,
            message: Some("Headline slot on Saturday".to_string()),
        }
    }

    async fn submitted(h: &Harness) -> Booking {
        h.lifecycle.submit(request(), None, None).await.unwrap()
    }

    fn contract_request() -> SendContractRequest {
        SendContractRequest {
            quoted_amount: Some(2500),
            ..SendContractRequest::default()
        }
    }

    async fn signing_token(h: &Harness, booking_id: DbId) -> String {
        let link = h
            .lifecycle
            .send_contract(booking_id, contract_request(), &manager())
            .await
            .unwrap();
        link.signing_url.rsplit('/').next().unwrap().to_string()
    }

    // -- submission ----------------------------------------------------------

    #[tokio::test]
    async fn repeat_booker_with_full_form_scores_85() {
        let h = harness();
        let first = submitted(&h).await;
        assert_eq!(first.score, 75);
        assert_eq!(first.score_breakdown.repeat_booker, 0);

        let second = submitted(&h).await;
        assert_eq!(second.score, 85);
        assert_eq!(second.score_breakdown.budget, 25);
        assert_eq!(second.score_breakdown.form_completeness, 10);
        assert_eq!(second.score_breakdown.total, 85);
    }

    #[tokio::test]
    async fn submit_sets_defaults_and_notifies_requester() {
        let h = harness();
        let booking = h
            .lifecycle
            .submit(request(), Some("198.51.100.4".to_string()), None)
            .await
            .unwrap();

        let year = Utc::now().year();
        assert_eq!(booking.reference_code, format!("SAU-{year}-0001"));
        assert_eq!(booking.status, BookingStatus::New);
        assert_eq!(booking.currency, DEFAULT_CURRENCY);
        assert_eq!(booking.assigned_to, Some(7));
        assert_eq!(booking.source_ip.as_deref(), Some("198.51.100.4"));

        let received = h.notifier.sent_with(templates::BOOKING_RECEIVED);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].to, REQUESTER);
        assert_eq!(received[0].data["artistName"], "Night Owls");
        assert_eq!(h.audit.actions(), vec!["booking.submitted"]);
    }

    #[tokio::test]
    async fn concurrent_submissions_get_distinct_reference_codes() {
        let h = harness();
        let results =
            futures::future::join_all((0..20).map(|_| h.lifecycle.submit(request(), None, None)))
                .await;

        let mut codes: Vec<String> = results
            .into_iter()
            .map(|r| r.unwrap().reference_code)
            .collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 20);
    }

    #[tokio::test]
    async fn reference_code_collision_is_retried() {
        let h = harness();
        let first = submitted(&h).await;
        h.store.reset_reference_counter(Utc::now().year());

        let second = submitted(&h).await;
        assert_ne!(second.reference_code, first.reference_code);
        assert!(second.reference_code.ends_with("-0002"));
    }

    #[tokio::test]
    async fn submit_unknown_artist_is_not_found() {
        let h = harness();
        let result = h
            .lifecycle
            .submit(
                SubmitBookingRequest {
                    artist_id: 404,
                    ..request()
                },
                None,
                None,
            )
            .await;
        assert_matches!(result, Err(CoreError::NotFound { entity: "Artist", id: 404 }));
    }

    #[tokio::test]
    async fn submit_rejects_inverted_budget() {
        let h = harness();
        let result = h
            .lifecycle
            .submit(
                SubmitBookingRequest {
                    budget_min: Some(5000),
                    budget_max: Some(1000),
                    ..request()
                },
                None,
                None,
            )
            .await;
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn organizer_submits_only_under_own_email() {
        let h = harness();
        let other = Actor::Organizer {
            user_id: 21,
            email: "someone@else.test".to_string(),
        };
        assert_matches!(
            h.lifecycle.submit(request(), None, Some(&other)).await,
            Err(CoreError::BadRequest(_))
        );

        let booking = h
            .lifecycle
            .submit(request(), None, Some(&organizer()))
            .await
            .unwrap();
        let history = h.lifecycle.history(booking.id, &organizer()).await.unwrap();
        assert_eq!(history[0].changed_by, Some(20));
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_submission() {
        let h = harness();
        h.notifier.set_failing(true);
        assert!(h.lifecycle.submit(request(), None, None).await.is_ok());
    }

    // -- status and history --------------------------------------------------

    #[tokio::test]
    async fn history_has_one_row_per_status_write() {
        let h = harness();
        let booking = submitted(&h).await;

        for status in [
            BookingStatus::Reviewing,
            BookingStatus::Scored,
            BookingStatus::Reviewing,
        ] {
            h.lifecycle
                .update_status(
                    booking.id,
                    UpdateStatusRequest {
                        status,
                        note: None,
                        expected_version: None,
                    },
                    &manager(),
                )
                .await
                .unwrap();
        }

        let history = h.lifecycle.history(booking.id, &manager()).await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].from_status, None);
        assert_eq!(history[0].to_status, "new");
        assert_eq!(history[3].from_status.as_deref(), Some("scored"));
        assert_eq!(history[3].to_status, "reviewing");
        assert_eq!(h.notifier.sent_with(templates::BOOKING_STATUS_CHANGED).len(), 3);
    }

    #[tokio::test]
    async fn status_update_never_confirms() {
        let h = harness();
        let booking = submitted(&h).await;
        let result = h
            .lifecycle
            .update_status(
                booking.id,
                UpdateStatusRequest {
                    status: BookingStatus::Confirmed,
                    note: None,
                    expected_version: None,
                },
                &manager(),
            )
            .await;
        assert_matches!(result, Err(CoreError::BadRequest(_)));
        assert_eq!(h.lifecycle.history(booking.id, &manager()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn strict_policy_rejects_unlisted_edges() {
        let h = harness_with_policy(TransitionPolicy::Strict);
        let booking = submitted(&h).await;
        let result = h
            .lifecycle
            .update_status(
                booking.id,
                UpdateStatusRequest {
                    status: BookingStatus::Negotiating,
                    note: None,
                    expected_version: None,
                },
                &manager(),
            )
            .await;
        assert_matches!(result, Err(CoreError::BadRequest(_)));
    }

    #[tokio::test]
    async fn stale_expected_version_conflicts() {
        let h = harness();
        let booking = submitted(&h).await;
        let update = |expected_version| UpdateStatusRequest {
            status: BookingStatus::Reviewing,
            note: Some("Looking at dates".to_string()),
            expected_version,
        };

        let updated = h
            .lifecycle
            .update_status(booking.id, update(Some(booking.version)), &manager())
            .await
            .unwrap();
        assert_eq!(updated.version, booking.version + 1);

        let stale = h
            .lifecycle
            .update_status(booking.id, update(Some(booking.version)), &manager())
            .await;
        assert_matches!(stale, Err(CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn status_update_requires_staff() {
        let h = harness();
        let booking = submitted(&h).await;
        let result = h
            .lifecycle
            .update_status(
                booking.id,
                UpdateStatusRequest {
                    status: BookingStatus::Declined,
                    note: None,
                    expected_version: None,
                },
                &organizer(),
            )
            .await;
        assert_matches!(result, Err(CoreError::Forbidden(_)));
    }

    // -- visibility ----------------------------------------------------------

    #[tokio::test]
    async fn artist_sees_only_own_bookings() {
        let h = harness();
        let own = submitted(&h).await;
        let foreign = h
            .lifecycle
            .submit(
                SubmitBookingRequest {
                    artist_id: OTHER_ARTIST_ID,
                    ..request()
                },
                None,
                None,
            )
            .await
            .unwrap();
        let artist = Actor::Artist {
            user_id: 30,
            artist_id: ARTIST_ID,
        };

        assert!(h.lifecycle.get(own.id, &artist).await.is_ok());
        assert!(h
            .lifecycle
            .add_comment(
                own.id,
                CreateCommentRequest {
                    body: "Available that weekend".to_string(),
                    is_internal: false,
                },
                &artist,
            )
            .await
            .is_ok());

        assert_matches!(
            h.lifecycle.get(foreign.id, &artist).await,
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            h.lifecycle.list_comments(foreign.id, &artist).await,
            Err(CoreError::Forbidden(_))
        );

        let page = h
            .lifecycle
            .list(BookingListQuery::default(), &artist)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, own.id);
    }

    #[tokio::test]
    async fn list_is_scoped_and_paginated() {
        let h = harness();
        for _ in 0..3 {
            submitted(&h).await;
        }
        h.lifecycle
            .submit(
                SubmitBookingRequest {
                    requester_email: "other@venue.test".to_string(),
                    ..request()
                },
                None,
                None,
            )
            .await
            .unwrap();

        let all = h
            .lifecycle
            .list(
                BookingListQuery {
                    limit: Some(2),
                    ..BookingListQuery::default()
                },
                &manager(),
            )
            .await
            .unwrap();
        assert_eq!(all.total, 4);
        assert_eq!(all.items.len(), 2);

        let mine = h
            .lifecycle
            .list(BookingListQuery::default(), &organizer())
            .await
            .unwrap();
        assert_eq!(mine.total, 3);
    }

    #[tokio::test]
    async fn internal_comments_are_staff_only() {
        let h = harness();
        let booking = submitted(&h).await;
        let comment = |body: &str, is_internal| CreateCommentRequest {
            body: body.to_string(),
            is_internal,
        };

        h.lifecycle
            .add_comment(booking.id, comment("Check travel budget", true), &manager())
            .await
            .unwrap();
        h.lifecycle
            .add_comment(booking.id, comment("Any update?", false), &organizer())
            .await
            .unwrap();
        assert_matches!(
            h.lifecycle
                .add_comment(booking.id, comment("sneaky", true), &organizer())
                .await,
            Err(CoreError::Forbidden(_))
        );

        assert_eq!(h.lifecycle.list_comments(booking.id, &manager()).await.unwrap().len(), 2);
        let visible = h.lifecycle.list_comments(booking.id, &organizer()).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert!(!visible[0].is_internal);
    }

    // -- contract issuance and signing ---------------------------------------

    #[tokio::test]
    async fn send_contract_quotes_and_notifies() {
        let h = harness();
        let booking = submitted(&h).await;
        let link = h
            .lifecycle
            .send_contract(booking.id, contract_request(), &manager())
            .await
            .unwrap();

        assert!(link.signing_url.starts_with("https://backstage.test/contracts/"));
        assert_eq!(link.booking.status, BookingStatus::Quoted);
        assert_eq!(link.booking.quoted_amount, Some(2500));
        assert!(link.booking.quote_sent_at.is_some());

        let request = h.notifier.sent_with(templates::CONTRACT_SIGNATURE_REQUEST);
        assert_eq!(request[0].to, REQUESTER);
        assert_eq!(request[0].data["signingUrl"], link.signing_url);
        let notice = h.notifier.sent_with(templates::CONTRACT_ARTIST_NOTICE);
        assert_eq!(notice[0].to, "owls@band.test");
    }

    #[tokio::test]
    async fn contract_summary_by_token() {
        let h = harness();
        let booking = submitted(&h).await;
        let token = signing_token(&h, booking.id).await;

        let summary = h.lifecycle.contract_summary(&token).await.unwrap();
        assert_eq!(summary.reference_code, booking.reference_code);
        assert_eq!(summary.artist_name.as_deref(), Some("Night Owls"));
        assert_eq!(summary.quoted_amount, Some(2500));
        assert!(!summary.is_signed);
        assert_eq!(summary.contract.financial.fee, Some(2500));
        assert_eq!(summary.contract.organizer.email.as_deref(), Some(REQUESTER));
    }

    #[tokio::test]
    async fn signature_is_write_once() {
        let h = harness();
        let booking = submitted(&h).await;
        let token = signing_token(&h, booking.id).await;

        let signed = h.lifecycle.sign_by_token(&token, "  Sam Rivers ").await.unwrap();
        assert_eq!(signed.status, BookingStatus::Confirmed);

        let again = h.lifecycle.sign_by_token(&token, "Someone Else").await;
        assert_matches!(again, Err(CoreError::BadRequest(_)));
        let direct = h
            .lifecycle
            .sign_direct(booking.id, "Someone Else", &organizer())
            .await;
        assert_matches!(direct, Err(CoreError::BadRequest(_)));

        let stored = h.store.find_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.digital_signature.as_deref(), Some("Sam Rivers"));
        assert_eq!(stored.signed_at, Some(signed.signed_at));

        // new, quoted, confirmed; the rejected attempts wrote nothing.
        let history = h.lifecycle.history(booking.id, &manager()).await.unwrap();
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn concurrent_signatures_confirm_once() {
        let h = harness();
        let booking = submitted(&h).await;
        let token = signing_token(&h, booking.id).await;

        let results = futures::future::join_all(
            (0..5).map(|i| h.lifecycle.sign_by_token(&token, if i % 2 == 0 { "A" } else { "B" })),
        )
        .await;
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(h.notifier.sent_with(templates::CONTRACT_SIGNED).len(), 1);
    }

    #[tokio::test]
    async fn confirmation_notifies_and_shares_presskit() {
        let h = harness();
        h.store.insert_presskit(
            ARTIST_ID,
            "Night Owls EPK",
            vec![PresskitSection {
                id: "bio".to_string(),
                title: "Biography".to_string(),
                body: "Formed in 2019.".to_string(),
            }],
            None,
        );
        let booking = submitted(&h).await;
        let token = signing_token(&h, booking.id).await;
        h.lifecycle.sign_by_token(&token, "Sam Rivers").await.unwrap();

        assert_eq!(h.notifier.sent_with(templates::CONTRACT_SIGNED)[0].to, REQUESTER);
        assert_eq!(
            h.notifier.sent_with(templates::BOOKING_CONFIRMED_ARTIST)[0].to,
            "owls@band.test"
        );
        let shared = h.notifier.sent_with(templates::PRESSKIT_SHARED);
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].to, REQUESTER);
        assert!(h.audit.actions().contains(&"booking.contract_signed"));
    }

    #[tokio::test]
    async fn signing_survives_notification_outage() {
        let h = harness();
        let booking = submitted(&h).await;
        let token = signing_token(&h, booking.id).await;
        h.notifier.set_failing(true);

        let signed = h.lifecycle.sign_by_token(&token, "Sam Rivers").await.unwrap();
        assert_eq!(signed.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn presskit_token_cannot_sign_contract() {
        let h = harness();
        let booking = submitted(&h).await;
        let presskit_token = CapabilitySigner::new(SECRET)
            .issue(&Capability::PresskitAccess { presskit_id: 1 }, Duration::hours(1))
            .unwrap()
            .token;

        assert_matches!(
            h.lifecycle.sign_by_token(&presskit_token, "Sam Rivers").await,
            Err(CoreError::Forbidden(msg)) if msg == INVALID_TOKEN_MESSAGE
        );
        let stored = h.store.find_booking(booking.id).await.unwrap().unwrap();
        assert!(stored.signed_at.is_none());
    }

    #[tokio::test]
    async fn token_for_changed_requester_email_is_rejected() {
        let h = harness();
        let booking = submitted(&h).await;
        let forged = CapabilitySigner::new(SECRET)
            .issue(
                &Capability::BookingContract {
                    booking_id: booking.id,
                    requester_email: "attacker@evil.test".to_string(),
                },
                Duration::hours(1),
            )
            .unwrap()
            .token;

        assert_matches!(
            h.lifecycle.contract_summary(&forged).await,
            Err(CoreError::Forbidden(msg)) if msg == INVALID_TOKEN_MESSAGE
        );
    }

    #[tokio::test]
    async fn token_for_missing_booking_looks_like_bad_token() {
        let h = harness();
        let orphan = CapabilitySigner::new(SECRET)
            .issue(
                &Capability::BookingContract {
                    booking_id: 9999,
                    requester_email: REQUESTER.to_string(),
                },
                Duration::hours(1),
            )
            .unwrap()
            .token;

        assert_matches!(
            h.lifecycle.sign_by_token(&orphan, "Sam").await,
            Err(CoreError::Forbidden(msg)) if msg == INVALID_TOKEN_MESSAGE
        );
        assert_matches!(
            h.lifecycle.sign_by_token("not-a-token", "Sam").await,
            Err(CoreError::Forbidden(msg)) if msg == INVALID_TOKEN_MESSAGE
        );
    }

    #[tokio::test]
    async fn blank_signature_is_bad_request() {
        let h = harness();
        let booking = submitted(&h).await;
        let token = signing_token(&h, booking.id).await;
        assert_matches!(
            h.lifecycle.sign_by_token(&token, "   ").await,
            Err(CoreError::BadRequest(_))
        );
    }

    #[tokio::test]
    async fn send_contract_after_signing_is_rejected() {
        let h = harness();
        let booking = submitted(&h).await;
        h.lifecycle
            .sign_direct(booking.id, "Sam Rivers", &organizer())
            .await
            .unwrap();

        assert_matches!(
            h.lifecycle
                .send_contract(booking.id, contract_request(), &manager())
                .await,
            Err(CoreError::BadRequest(_))
        );
    }

    #[tokio::test]
    async fn send_contract_with_directory_down_writes_nothing() {
        let h = harness();
        let booking = submitted(&h).await;
        h.artists.set_failing(true);

        let result = h
            .lifecycle
            .send_contract(booking.id, contract_request(), &manager())
            .await;
        assert_matches!(result, Err(CoreError::Internal(_)));

        let stored = h.store.find_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::New);
        assert_eq!(stored.version, booking.version);
        assert!(stored.quote_sent_at.is_none());
        assert_eq!(h.store.list_history(booking.id).await.unwrap().len(), 1);
        assert!(h
            .notifier
            .sent_with(templates::CONTRACT_SIGNATURE_REQUEST)
            .is_empty());
    }

    #[tokio::test]
    async fn quote_never_overwrites_a_signature() {
        let h = harness();
        let booking = submitted(&h).await;
        h.lifecycle
            .sign_direct(booking.id, "Sam Rivers", &organizer())
            .await
            .unwrap();

        let quoted = h
            .store
            .record_quote(&QuoteUpdate {
                booking_id: booking.id,
                quoted_amount: Some(9999),
                quote_pdf_url: None,
                quote_sent_at: Utc::now(),
                changed_by: Some(7),
                note: None,
            })
            .await
            .unwrap();
        assert!(quoted.is_none());

        let stored = h.store.find_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
        assert_eq!(stored.quoted_amount, None);
        assert_eq!(h.store.list_history(booking.id).await.unwrap().len(), 2);
    }

    // -- contract negotiation ------------------------------------------------

    #[tokio::test]
    async fn contract_edits_merge_and_version() {
        let h = harness();
        let booking = submitted(&h).await;

        let initial = h.lifecycle.contract(booking.id, &organizer()).await.unwrap();
        assert_eq!(initial.version, 0);
        assert_eq!(initial.document.artist.name.as_deref(), Some("Night Owls"));
        assert_eq!(initial.document.performance.city.as_deref(), Some("Hobart"));

        let agency = h
            .lifecycle
            .update_contract(
                booking.id,
                UpdateContractRequest {
                    patch: ContractPatch {
                        financial: Some(FinancialSection {
                            fee: Some(2400),
                            deposit_percent: Some(50),
                            ..FinancialSection::default()
                        }),
                        ..ContractPatch::default()
                    },
                    expected_version: Some(0),
                },
                &manager(),
            )
            .await
            .unwrap();
        assert_eq!(agency.version, 1);
        assert!(agency.document.workflow.admin_edited_at.is_some());

        let organizer_edit = h
            .lifecycle
            .update_contract(
                booking.id,
                UpdateContractRequest {
                    patch: ContractPatch {
                        legal: Some(LegalSection {
                            governing_law: Some("Tasmania".to_string()),
                            ..LegalSection::default()
                        }),
                        ..ContractPatch::default()
                    },
                    expected_version: Some(1),
                },
                &organizer(),
            )
            .await
            .unwrap();
        assert_eq!(organizer_edit.version, 2);
        assert_eq!(organizer_edit.document.financial.fee, Some(2400));
        assert_eq!(organizer_edit.document.financial.deposit_percent, Some(50));
        assert_eq!(organizer_edit.document.legal.governing_law.as_deref(), Some("Tasmania"));
        assert!(organizer_edit.document.workflow.organizer_edited_at.is_some());
        assert_eq!(
            organizer_edit.document.workflow.last_edited_by.as_deref(),
            Some("organizer")
        );
    }

    #[tokio::test]
    async fn stale_contract_edit_conflicts() {
        let h = harness();
        let booking = submitted(&h).await;
        let patch = || ContractPatch {
            legal: Some(LegalSection {
                force_majeure: Some("Standard".to_string()),
                ..LegalSection::default()
            }),
            ..ContractPatch::default()
        };

        h.lifecycle
            .update_contract(
                booking.id,
                UpdateContractRequest {
                    patch: patch(),
                    expected_version: Some(0),
                },
                &manager(),
            )
            .await
            .unwrap();
        let stale = h
            .lifecycle
            .update_contract(
                booking.id,
                UpdateContractRequest {
                    patch: patch(),
                    expected_version: Some(0),
                },
                &organizer(),
            )
            .await;
        assert_matches!(stale, Err(CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn contract_edit_rules() {
        let h = harness();
        let booking = submitted(&h).await;
        let patch = UpdateContractRequest {
            patch: ContractPatch {
                legal: Some(LegalSection {
                    additional_terms: Some("No pyrotechnics".to_string()),
                    ..LegalSection::default()
                }),
                ..ContractPatch::default()
            },
            expected_version: None,
        };

        let artist = Actor::Artist {
            user_id: 30,
            artist_id: ARTIST_ID,
        };
        assert_matches!(
            h.lifecycle
                .update_contract(booking.id, patch.clone(), &artist)
                .await,
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            h.lifecycle
                .update_contract(booking.id, UpdateContractRequest::default(), &manager())
                .await,
            Err(CoreError::Validation(_))
        );

        h.lifecycle
            .sign_direct(booking.id, "Sam Rivers", &organizer())
            .await
            .unwrap();
        assert_matches!(
            h.lifecycle.update_contract(booking.id, patch, &manager()).await,
            Err(CoreError::BadRequest(_))
        );

        let view = h.lifecycle.contract(booking.id, &manager()).await.unwrap();
        assert!(!view.editable);
        assert_eq!(
            view.document.signatures.organizer_signature.as_deref(),
            Some("Sam Rivers")
        );
    }

    // -- removal -------------------------------------------------------------

    #[tokio::test]
    async fn delete_is_admin_only() {
        let h = harness();
        let booking = submitted(&h).await;

        assert_matches!(
            h.lifecycle.delete(booking.id, &manager()).await,
            Err(CoreError::Forbidden(_))
        );
        h.lifecycle.delete(booking.id, &admin()).await.unwrap();
        assert_matches!(
            h.lifecycle.get(booking.id, &admin()).await,
            Err(CoreError::NotFound { entity: "Booking", .. })
        );
        assert_matches!(
            h.lifecycle.delete(booking.id, &admin()).await,
            Err(CoreError::NotFound { .. })
        );
    }
}
