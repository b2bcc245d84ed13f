//! In-memory store and collaborator fakes.
//!
//! Mirrors the PostgreSQL semantics the services rely on: the reference-code
//! unique constraint, write-once signatures, version checks, the conditional
//! view increment and cascading deletes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use backstage_core::booking::BookingStatus;
use backstage_core::collaborators::{
    ArtistDirectory, ArtistProfile, AuditEntry, AuditRecorder, FileStore, FileStoreError,
    NotificationDispatcher, NotificationError,
};
use backstage_core::contract::ContractDocument;
use backstage_core::error::CoreError;
use backstage_core::presskit::PresskitStatus;
use backstage_core::roles::emails_match;
use backstage_core::types::{DbId, Timestamp};
use backstage_db::models::booking::{
    Booking, BookingComment, BookingContract, BookingFilter, BookingStatusHistory, NewBooking,
    NewComment, QuoteUpdate, SignatureRecord, StatusChange,
};
use backstage_db::models::presskit::{
    NewAccessLog, NewPresskitLink, Presskit, PresskitAccessLog, PresskitLink, PresskitSection,
};
use chrono::Utc;
use sqlx::types::Json;

use crate::store::{BookingStore, PresskitStore, StoreError, REFERENCE_CODE_CONSTRAINT};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    next_id: DbId,
    counters: HashMap<i32, i64>,
    bookings: Vec<Booking>,
    history: Vec<BookingStatusHistory>,
    comments: Vec<BookingComment>,
    contracts: HashMap<DbId, BookingContract>,
    presskits: Vec<Presskit>,
    links: Vec<PresskitLink>,
    access_logs: Vec<PresskitAccessLog>,
}

impl State {
    fn id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn booking_mut(&mut self, id: DbId) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    fn append_history(
        &mut self,
        booking_id: DbId,
        from_status: Option<BookingStatus>,
        to_status: BookingStatus,
        changed_by: Option<DbId>,
        note: Option<String>,
    ) {
        let id = self.id();
        self.history.push(BookingStatusHistory {
            id,
            booking_id,
            from_status: from_status.map(|s| s.as_str().to_string()),
            to_status: to_status.as_str().to_string(),
            changed_by,
            note,
            created_at: Utc::now(),
        });
    }

    fn link_mut(&mut self, id: DbId) -> Option<&mut PresskitLink> {
        self.links.iter_mut().find(|l| l.id == id)
    }
}

/// Both storage traits over plain collections behind one mutex.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a presskit directly, as the CRUD layer would.
    pub fn insert_presskit(
        &self,
        artist_id: DbId,
        title: &str,
        sections: Vec<PresskitSection>,
        document_key: Option<&str>,
    ) -> Presskit {
        let mut state = lock(&self.state);
        let now = Utc::now();
        let presskit = Presskit {
            id: state.id(),
            artist_id,
            title: title.to_string(),
            status: PresskitStatus::Draft,
            sections: Json(sections),
            document_key: document_key.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        state.presskits.push(presskit.clone());
        presskit
    }

    /// Rewind a year's reference counter, as a lost counter row would.
    pub fn reset_reference_counter(&self, year: i32) {
        lock(&self.state).counters.remove(&year);
    }

    /// Move a link's expiry, for expiry tests.
    pub fn set_link_expiry(&self, link_id: DbId, expires_at: Timestamp) {
        if let Some(link) = lock(&self.state).link_mut(link_id) {
            link.expires_at = expires_at;
        }
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn next_reference_sequence(&self, year: i32) -> Result<i64, StoreError> {
        let mut state = lock(&self.state);
        let value = state.counters.entry(year).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn count_bookings_by_email(&self, email: &str) -> Result<i64, StoreError> {
        let state = lock(&self.state);
        let count = state
            .bookings
            .iter()
            .filter(|b| emails_match(&b.requester_email, email))
            .count();
        Ok(count as i64)
    }

    async fn create_booking(
        &self,
        input: &NewBooking,
        created_by: Option<DbId>,
    ) -> Result<Booking, StoreError> {
        let mut state = lock(&self.state);
        if state
            .bookings
            .iter()
            .any(|b| b.reference_code == input.reference_code)
        {
            return Err(StoreError::Conflict {
                constraint: REFERENCE_CODE_CONSTRAINT.to_string(),
            });
        }

        let now = Utc::now();
        let booking = Booking {
            id: state.id(),
            reference_code: input.reference_code.clone(),
            artist_id: input.artist_id,
            status: BookingStatus::New,
            score: input.score_breakdown.total as i32,
            score_breakdown: Json(input.score_breakdown),
            requester_name: input.requester_name.clone(),
            requester_email: input.requester_email.clone(),
            requester_phone: input.requester_phone.clone(),
            requester_company: input.requester_company.clone(),
            event_date: input.event_date,
            event_type: input.event_type.clone(),
            event_city: input.event_city.clone(),
            event_country: input.event_country.clone(),
            event_venue: input.event_venue.clone(),
            expected_attendance: input.expected_attendance,
            budget_min: input.budget_min,
            budget_max: input.budget_max,
            currency: input.currency.clone(),
            message: input.message.clone(),
            quoted_amount: None,
            quote_pdf_url: None,
            quote_sent_at: None,
            digital_signature: None,
            signed_at: None,
            assigned_to: input.assigned_to,
            source_ip: input.source_ip.clone(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        state.bookings.push(booking.clone());
        state.append_history(
            booking.id,
            None,
            BookingStatus::New,
            created_by,
            Some("Booking submitted".to_string()),
        );
        Ok(booking)
    }

    async fn find_booking(&self, id: DbId) -> Result<Option<Booking>, StoreError> {
        let state = lock(&self.state);
        Ok(state.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
    ) -> Result<(Vec<Booking>, i64), StoreError> {
        let state = lock(&self.state);
        let mut matches: Vec<&Booking> = state
            .bookings
            .iter()
            .filter(|b| filter.status.map_or(true, |s| b.status == s))
            .filter(|b| filter.artist_id.map_or(true, |a| b.artist_id == a))
            .filter(|b| {
                filter
                    .requester_email
                    .as_deref()
                    .map_or(true, |e| emails_match(&b.requester_email, e))
            })
            .collect();
        matches.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let total = matches.len() as i64;
        let items = matches
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn change_status(&self, change: &StatusChange) -> Result<Option<Booking>, StoreError> {
        let mut state = lock(&self.state);
        let Some(booking) = state.booking_mut(change.booking_id) else {
            return Ok(None);
        };
        if change.expected_version.is_some_and(|v| v != booking.version) {
            return Ok(None);
        }

        let from_status = booking.status;
        booking.status = change.to_status;
        booking.version += 1;
        booking.updated_at = Utc::now();
        let updated = booking.clone();

        state.append_history(
            change.booking_id,
            Some(from_status),
            change.to_status,
            change.changed_by,
            change.note.clone(),
        );
        Ok(Some(updated))
    }

    async fn record_quote(&self, quote: &QuoteUpdate) -> Result<Option<Booking>, StoreError> {
        let mut state = lock(&self.state);
        let Some(booking) = state.booking_mut(quote.booking_id) else {
            return Ok(None);
        };
        if booking.signed_at.is_some() {
            return Ok(None);
        }

        let from_status = booking.status;
        if quote.quoted_amount.is_some() {
            booking.quoted_amount = quote.quoted_amount;
        }
        if quote.quote_pdf_url.is_some() {
            booking.quote_pdf_url = quote.quote_pdf_url.clone();
        }
        booking.quote_sent_at = Some(quote.quote_sent_at);
        booking.status = BookingStatus::Quoted;
        booking.version += 1;
        booking.updated_at = Utc::now();
        let updated = booking.clone();

        state.append_history(
            quote.booking_id,
            Some(from_status),
            BookingStatus::Quoted,
            quote.changed_by,
            quote.note.clone(),
        );
        Ok(Some(updated))
    }

    async fn record_signature(
        &self,
        record: &SignatureRecord,
    ) -> Result<Option<Booking>, StoreError> {
        let mut state = lock(&self.state);
        let Some(booking) = state.booking_mut(record.booking_id) else {
            return Ok(None);
        };
        if booking.signed_at.is_some() {
            return Ok(None);
        }

        let from_status = booking.status;
        booking.digital_signature = Some(record.signature.clone());
        booking.signed_at = Some(record.signed_at);
        booking.status = BookingStatus::Confirmed;
        booking.version += 1;
        booking.updated_at = Utc::now();
        let updated = booking.clone();

        state.append_history(
            record.booking_id,
            Some(from_status),
            BookingStatus::Confirmed,
            record.changed_by,
            record.note.clone(),
        );
        Ok(Some(updated))
    }

    async fn delete_booking(&self, id: DbId) -> Result<bool, StoreError> {
        let mut state = lock(&self.state);
        let before = state.bookings.len();
        state.bookings.retain(|b| b.id != id);
        if state.bookings.len() == before {
            return Ok(false);
        }
        state.history.retain(|h| h.booking_id != id);
        state.comments.retain(|c| c.booking_id != id);
        state.contracts.remove(&id);
        Ok(true)
    }

    async fn list_history(
        &self,
        booking_id: DbId,
    ) -> Result<Vec<BookingStatusHistory>, StoreError> {
        let state = lock(&self.state);
        Ok(state
            .history
            .iter()
            .filter(|h| h.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn add_comment(&self, input: &NewComment) -> Result<BookingComment, StoreError> {
        let mut state = lock(&self.state);
        let comment = BookingComment {
            id: state.id(),
            booking_id: input.booking_id,
            author_id: input.author_id,
            author_role: input.author_role.clone(),
            body: input.body.clone(),
            is_internal: input.is_internal,
            created_at: Utc::now(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(
        &self,
        booking_id: DbId,
        include_internal: bool,
    ) -> Result<Vec<BookingComment>, StoreError> {
        let state = lock(&self.state);
        Ok(state
            .comments
            .iter()
            .filter(|c| c.booking_id == booking_id && (include_internal || !c.is_internal))
            .cloned()
            .collect())
    }

    async fn find_contract(
        &self,
        booking_id: DbId,
    ) -> Result<Option<BookingContract>, StoreError> {
        Ok(lock(&self.state).contracts.get(&booking_id).cloned())
    }

    async fn save_contract(
        &self,
        booking_id: DbId,
        document: &ContractDocument,
        expected_version: Option<i32>,
    ) -> Result<Option<BookingContract>, StoreError> {
        let mut state = lock(&self.state);
        let current = state.contracts.get(&booking_id).map(|c| c.version);
        if current != expected_version {
            return Ok(None);
        }

        let contract = BookingContract {
            booking_id,
            document: Json(document.clone()),
            version: current.map_or(1, |v| v + 1),
            updated_at: Utc::now(),
        };
        state.contracts.insert(booking_id, contract.clone());
        Ok(Some(contract))
    }
}

#[async_trait]
impl PresskitStore for MemoryStore {
    async fn find_presskit(&self, id: DbId) -> Result<Option<Presskit>, StoreError> {
        let state = lock(&self.state);
        Ok(state.presskits.iter().find(|p| p.id == id).cloned())
    }

    async fn find_primary_presskit(
        &self,
        artist_id: DbId,
    ) -> Result<Option<Presskit>, StoreError> {
        let state = lock(&self.state);
        let mut candidates: Vec<&Presskit> = state
            .presskits
            .iter()
            .filter(|p| p.artist_id == artist_id && p.status != PresskitStatus::Archived)
            .collect();
        candidates.sort_by_key(|p| {
            (
                p.status == PresskitStatus::Active,
                p.updated_at,
                p.id,
            )
        });
        Ok(candidates.last().map(|p| (*p).clone()))
    }

    async fn create_link(&self, input: &NewPresskitLink) -> Result<PresskitLink, StoreError> {
        let mut state = lock(&self.state);
        if state.links.iter().any(|l| l.token == input.token) {
            return Err(StoreError::Conflict {
                constraint: "uq_presskit_links_token".to_string(),
            });
        }

        let link = PresskitLink {
            id: state.id(),
            presskit_id: input.presskit_id,
            token: input.token.clone(),
            recipient_email: input.recipient_email.clone(),
            recipient_name: input.recipient_name.clone(),
            expires_at: input.expires_at,
            max_views: input.max_views,
            current_views: 0,
            allow_download: input.allow_download,
            watermark_text: input.watermark_text.clone(),
            is_revoked: false,
            revoked_at: None,
            created_by: input.created_by,
            created_at: Utc::now(),
        };
        state.links.push(link.clone());

        if let Some(presskit) = state
            .presskits
            .iter_mut()
            .find(|p| p.id == input.presskit_id)
        {
            presskit.status = PresskitStatus::Active;
            presskit.updated_at = Utc::now();
        }
        Ok(link)
    }

    async fn find_link_by_token(&self, token: &str) -> Result<Option<PresskitLink>, StoreError> {
        let state = lock(&self.state);
        Ok(state.links.iter().find(|l| l.token == token).cloned())
    }

    async fn find_link(&self, id: DbId) -> Result<Option<PresskitLink>, StoreError> {
        let state = lock(&self.state);
        Ok(state.links.iter().find(|l| l.id == id).cloned())
    }

    async fn list_links(&self, presskit_id: DbId) -> Result<Vec<PresskitLink>, StoreError> {
        let state = lock(&self.state);
        let mut links: Vec<PresskitLink> = state
            .links
            .iter()
            .filter(|l| l.presskit_id == presskit_id)
            .cloned()
            .collect();
        links.reverse();
        Ok(links)
    }

    async fn increment_views(&self, id: DbId) -> Result<Option<PresskitLink>, StoreError> {
        let mut state = lock(&self.state);
        let Some(link) = state.link_mut(id) else {
            return Ok(None);
        };
        let open = !link.is_revoked
            && link.expires_at > Utc::now()
            && link.max_views.map_or(true, |max| link.current_views < max);
        if !open {
            return Ok(None);
        }
        link.current_views += 1;
        Ok(Some(link.clone()))
    }

    async fn revoke_link(
        &self,
        presskit_id: DbId,
        id: DbId,
    ) -> Result<Option<PresskitLink>, StoreError> {
        let mut state = lock(&self.state);
        let Some(link) = state.link_mut(id).filter(|l| l.presskit_id == presskit_id) else {
            return Ok(None);
        };
        link.is_revoked = true;
        link.revoked_at.get_or_insert_with(Utc::now);
        Ok(Some(link.clone()))
    }

    async fn log_access(&self, input: &NewAccessLog) -> Result<PresskitAccessLog, StoreError> {
        let mut state = lock(&self.state);
        let entry = PresskitAccessLog {
            id: state.id(),
            link_id: input.link_id,
            action: input.action,
            ip_address: input.ip_address.clone(),
            user_agent: input.user_agent.clone(),
            section_id: input.section_id.clone(),
            duration_secs: input.duration_secs,
            created_at: Utc::now(),
        };
        state.access_logs.push(entry.clone());
        Ok(entry)
    }

    async fn list_access_logs(
        &self,
        link_id: DbId,
        limit: i64,
    ) -> Result<Vec<PresskitAccessLog>, StoreError> {
        let state = lock(&self.state);
        Ok(state
            .access_logs
            .iter()
            .rev()
            .filter(|l| l.link_id == link_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Collaborator fakes
// ---------------------------------------------------------------------------

/// Artist lookups from a map. Can be switched to fail.
#[derive(Default)]
pub struct MemoryArtistDirectory {
    artists: Mutex<HashMap<DbId, ArtistProfile>>,
    failing: AtomicBool,
}

impl MemoryArtistDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: ArtistProfile) {
        lock(&self.artists).insert(profile.id, profile);
    }

    /// Make every subsequent lookup fail with an internal error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ArtistDirectory for MemoryArtistDirectory {
    async fn find_by_id(&self, id: DbId) -> Result<Option<ArtistProfile>, CoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CoreError::Internal("artist directory unavailable".into()));
        }
        Ok(lock(&self.artists).get(&id).cloned())
    }
}

/// One captured notification.
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub template: String,
    pub to: String,
    pub data: serde_json::Value,
}

/// Captures notifications instead of sending them. Can be switched to fail.
#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<SentNotification>>,
    failing: AtomicBool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail with a delivery error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        lock(&self.sent).clone()
    }

    /// Captured notifications using `template`.
    pub fn sent_with(&self, template: &str) -> Vec<SentNotification> {
        lock(&self.sent)
            .iter()
            .filter(|n| n.template == template)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send(
        &self,
        template: &str,
        to: &str,
        data: &serde_json::Value,
    ) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Delivery("mail server unavailable".into()));
        }
        lock(&self.sent).push(SentNotification {
            template: template.to_string(),
            to: to.to_string(),
            data: data.clone(),
        });
        Ok(())
    }
}

/// Objects in a map keyed by `(bucket, key)`.
#[derive(Default)]
pub struct MemoryFileStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), FileStoreError> {
        lock(&self.objects).insert((bucket.to_string(), key.to_string()), bytes);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, FileStoreError> {
        Ok(lock(&self.objects)
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), FileStoreError> {
        lock(&self.objects).remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

/// Captures audit entries.
#[derive(Default)]
pub struct RecordingAuditRecorder {
    entries: Mutex<Vec<AuditEntry>>,
}

impl RecordingAuditRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<&'static str> {
        lock(&self.entries).iter().map(|e| e.action).collect()
    }
}

#[async_trait]
impl AuditRecorder for RecordingAuditRecorder {
    async fn record(&self, entry: AuditEntry) {
        lock(&self.entries).push(entry);
    }
}
