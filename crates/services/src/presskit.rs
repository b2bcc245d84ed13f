//! Presskit sharing through revocable, quota-limited capability links.
//!
//! Every public operation verifies the token and the stored link before it
//! touches state. Denials are logged with their reason but reach the caller
//! as one generic `Forbidden`.

use std::sync::Arc;

use async_trait::async_trait;
use backstage_core::capability::{
    Capability, CapabilitySigner, Purpose, DEFAULT_PRESSKIT_TTL_HOURS, INVALID_TOKEN_MESSAGE,
};
use backstage_core::collaborators::{
    ArtistDirectory, ArtistProfile, AuditEntry, AuditRecorder, FileStore, NotificationDispatcher,
};
use backstage_core::error::CoreError;
use backstage_core::hashing::token_fingerprint;
use backstage_core::presskit::{check_link, remaining_views, AccessAction};
use backstage_core::roles::{ensure_staff, Actor};
use backstage_core::templates;
use backstage_core::types::{DbId, Timestamp};
use backstage_db::models::booking::Booking;
use backstage_db::models::presskit::{
    GenerateLinkRequest, NewAccessLog, NewPresskitLink, Presskit, PresskitAccessLog, PresskitLink,
    PresskitSection, TrackEventRequest,
};
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::json;

use crate::document::{render_presskit_html, HTML_CONTENT_TYPE};
use crate::notify::notify;
use crate::store::PresskitStore;
use crate::validate_input;

/// FileStore bucket holding uploaded presskit documents.
pub const PRESSKIT_BUCKET: &str = "presskits";

/// Most access-log rows returned per request.
pub const MAX_ACCESS_LOG_ROWS: i64 = 500;

// ---------------------------------------------------------------------------
// Configuration and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PresskitConfig {
    /// Base of the public site; links are `{base}/presskit/{token}`.
    pub public_base_url: String,
    pub default_link_ttl: Duration,
}

impl Default for PresskitConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:3000".to_string(),
            default_link_ttl: Duration::hours(DEFAULT_PRESSKIT_TTL_HOURS),
        }
    }
}

/// Who is on the other end of a public request.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// A new link and the public URL carrying its token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedLink {
    pub link: PresskitLink,
    pub url: String,
}

/// What a recipient sees when opening a link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresskitView {
    pub presskit_id: DbId,
    pub title: String,
    pub artist_name: Option<String>,
    pub sections: Vec<PresskitSection>,
    pub allow_download: bool,
    pub watermark_text: Option<String>,
    pub remaining_views: Option<i32>,
    pub expires_at: Timestamp,
}

/// A document ready to stream back.
#[derive(Debug, Clone)]
pub struct DownloadedDocument {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

/// Issues a presskit link to the requester of a confirmed booking.
#[async_trait]
pub trait PresskitIssuer: Send + Sync {
    /// Returns the new link id, or `None` when the artist has no presskit.
    async fn issue_for_booking(&self, booking: &Booking) -> Result<Option<DbId>, CoreError>;
}

// ---------------------------------------------------------------------------
// PresskitAccessController
// ---------------------------------------------------------------------------

pub struct PresskitAccessController {
    store: Arc<dyn PresskitStore>,
    artists: Arc<dyn ArtistDirectory>,
    files: Arc<dyn FileStore>,
    notifier: Arc<dyn NotificationDispatcher>,
    audit: Arc<dyn AuditRecorder>,
    signer: CapabilitySigner,
    config: PresskitConfig,
}

impl PresskitAccessController {
    pub fn new(
        store: Arc<dyn PresskitStore>,
        artists: Arc<dyn ArtistDirectory>,
        files: Arc<dyn FileStore>,
        notifier: Arc<dyn NotificationDispatcher>,
        audit: Arc<dyn AuditRecorder>,
        signer: CapabilitySigner,
        config: PresskitConfig,
    ) -> Self {
        Self {
            store,
            artists,
            files,
            notifier,
            audit,
            signer,
            config,
        }
    }

    // -- staff operations ----------------------------------------------------

    /// Mint a link for a presskit and activate it.
    pub async fn generate_link(
        &self,
        presskit_id: DbId,
        request: GenerateLinkRequest,
        actor: &Actor,
    ) -> Result<IssuedLink, CoreError> {
        ensure_staff(actor)?;
        validate_input(&request)?;
        let presskit = self.load_presskit(presskit_id).await?;
        self.issue(&presskit, request, Some(actor.user_id())).await
    }

    /// Revoke a link. There is no way back.
    pub async fn revoke(
        &self,
        presskit_id: DbId,
        link_id: DbId,
        actor: &Actor,
    ) -> Result<PresskitLink, CoreError> {
        ensure_staff(actor)?;
        let link = self
            .store
            .revoke_link(presskit_id, link_id)
            .await?
            .ok_or_else(|| CoreError::not_found("PresskitLink", link_id))?;

        tracing::info!(presskit_id, link_id, user_id = actor.user_id(), "Presskit link revoked");
        self.audit
            .record(AuditEntry {
                actor_user_id: Some(actor.user_id()),
                action: "presskit.link_revoked",
                entity_type: "presskit_link",
                entity_id: link_id,
                details: json!({ "presskitId": presskit_id }),
            })
            .await;
        Ok(link)
    }

    /// Links of a presskit, newest first.
    pub async fn list_links(
        &self,
        presskit_id: DbId,
        actor: &Actor,
    ) -> Result<Vec<PresskitLink>, CoreError> {
        ensure_staff(actor)?;
        self.load_presskit(presskit_id).await?;
        Ok(self.store.list_links(presskit_id).await?)
    }

    /// Access log of one link, newest first.
    pub async fn access_log(
        &self,
        presskit_id: DbId,
        link_id: DbId,
        actor: &Actor,
    ) -> Result<Vec<PresskitAccessLog>, CoreError> {
        ensure_staff(actor)?;
        let link = self
            .store
            .find_link(link_id)
            .await?
            .filter(|l| l.presskit_id == presskit_id)
            .ok_or_else(|| CoreError::not_found("PresskitLink", link_id))?;
        Ok(self
            .store
            .list_access_logs(link.id, MAX_ACCESS_LOG_ROWS)
            .await?)
    }

    // -- public redemption ---------------------------------------------------

    /// Verify `token` and load its open link.
    ///
    /// With `enforce_view_limit` unset the view quota is not checked, so
    /// follow-up telemetry from an opened page still lands.
    pub async fn resolve(
        &self,
        token: &str,
        enforce_view_limit: bool,
    ) -> Result<PresskitLink, CoreError> {
        let fingerprint = token_fingerprint(token);
        let capability = self
            .signer
            .verify_purpose(token, Purpose::PresskitAccess)
            .map_err(|e| {
                tracing::debug!(token = %fingerprint, "Presskit token rejected");
                CoreError::from(e)
            })?;
        let Capability::PresskitAccess { presskit_id } = capability else {
            return Err(denied());
        };

        let link = self
            .store
            .find_link_by_token(token)
            .await?
            .filter(|l| l.presskit_id == presskit_id)
            .ok_or_else(|| {
                tracing::debug!(token = %fingerprint, presskit_id, "No stored link for presskit token");
                denied()
            })?;

        if let Err(denial) = check_link(&link.state(), enforce_view_limit, Utc::now()) {
            tracing::info!(
                link_id = link.id,
                presskit_id,
                reason = denial.as_str(),
                "Presskit link denied",
            );
            return Err(denied());
        }
        Ok(link)
    }

    /// Open a link: count the view, log it and tell the artist's manager.
    pub async fn view(&self, token: &str, client: ClientInfo) -> Result<PresskitView, CoreError> {
        let link = self.resolve(token, true).await?;

        // The increment re-checks the link, so a concurrent view cannot
        // push it past its quota.
        let link = self.store.increment_views(link.id).await?.ok_or_else(|| {
            tracing::info!(link_id = link.id, reason = "quota_exhausted", "Presskit link denied");
            denied()
        })?;

        let presskit = self.load_presskit(link.presskit_id).await?;
        self.log(&link, AccessAction::View, &client, None, None).await?;

        let artist = self.artist_for(&presskit).await;
        if let Some(email) = artist.as_ref().and_then(|a| a.manager_email.as_deref()) {
            notify(
                self.notifier.as_ref(),
                templates::PRESSKIT_VIEWED,
                email,
                &json!({
                    "presskitTitle": presskit.title,
                    "recipientEmail": link.recipient_email,
                    "currentViews": link.current_views,
                    "ipAddress": client.ip_address,
                }),
            )
            .await;
        }

        tracing::info!(
            link_id = link.id,
            presskit_id = presskit.id,
            current_views = link.current_views,
            "Presskit viewed",
        );

        Ok(PresskitView {
            presskit_id: presskit.id,
            title: presskit.title,
            artist_name: artist.map(|a| a.name),
            sections: presskit.sections.0,
            allow_download: link.allow_download,
            watermark_text: link.watermark_text,
            remaining_views: remaining_views(link.current_views, link.max_views),
            expires_at: link.expires_at,
        })
    }

    /// Record page telemetry. Does not count against the view quota.
    pub async fn track_event(
        &self,
        token: &str,
        request: TrackEventRequest,
        client: ClientInfo,
    ) -> Result<(), CoreError> {
        let link = self.resolve(token, false).await?;
        validate_input(&request)?;
        self.log(
            &link,
            request.action,
            &client,
            request.section_id,
            request.duration,
        )
        .await?;
        tracing::debug!(link_id = link.id, action = request.action.as_str(), "Presskit event tracked");
        Ok(())
    }

    /// The downloadable document of a link, if the link allows downloads.
    pub async fn download_document(
        &self,
        token: &str,
        client: ClientInfo,
    ) -> Result<DownloadedDocument, CoreError> {
        let link = self.resolve(token, false).await?;
        if !link.allow_download {
            return Err(CoreError::Forbidden(
                "Downloads are disabled for this link".into(),
            ));
        }

        let presskit = self.load_presskit(link.presskit_id).await?;
        let artist = self.artist_for(&presskit).await;
        let document = match self.stored_document(&presskit).await {
            Some(document) => document,
            None => {
                let html = render_presskit_html(
                    &presskit,
                    artist.as_ref().map(|a| a.name.as_str()),
                    link.watermark_text.as_deref(),
                );
                DownloadedDocument {
                    bytes: html.into_bytes(),
                    content_type: HTML_CONTENT_TYPE,
                    filename: format!("presskit-{}.html", presskit.id),
                }
            }
        };

        self.log(&link, AccessAction::Download, &client, None, None)
            .await?;
        if let Some(email) = artist.as_ref().and_then(|a| a.manager_email.as_deref()) {
            notify(
                self.notifier.as_ref(),
                templates::PRESSKIT_DOWNLOADED,
                email,
                &json!({
                    "presskitTitle": presskit.title,
                    "recipientEmail": link.recipient_email,
                    "ipAddress": client.ip_address,
                }),
            )
            .await;
        }

        tracing::info!(
            link_id = link.id,
            presskit_id = presskit.id,
            bytes = document.bytes.len(),
            "Presskit downloaded",
        );
        Ok(document)
    }

    // -- helpers -------------------------------------------------------------

    async fn issue(
        &self,
        presskit: &Presskit,
        request: GenerateLinkRequest,
        created_by: Option<DbId>,
    ) -> Result<IssuedLink, CoreError> {
        let ttl = request
            .expires_in_hours
            .map(Duration::hours)
            .unwrap_or(self.config.default_link_ttl);
        let issued = self.signer.issue(
            &Capability::PresskitAccess {
                presskit_id: presskit.id,
            },
            ttl,
        )?;

        let link = self
            .store
            .create_link(&NewPresskitLink {
                presskit_id: presskit.id,
                token: issued.token.clone(),
                recipient_email: request.recipient_email,
                recipient_name: request.recipient_name,
                expires_at: issued.expires_at,
                max_views: request.max_views,
                allow_download: request.allow_download,
                watermark_text: request.watermark_text,
                created_by,
            })
            .await?;
        let url = format!(
            "{}/presskit/{}",
            self.config.public_base_url.trim_end_matches('/'),
            issued.token
        );

        tracing::info!(
            link_id = link.id,
            presskit_id = presskit.id,
            token = %token_fingerprint(&issued.token),
            expires_at = %link.expires_at,
            max_views = ?link.max_views,
            "Presskit link issued",
        );

        if let Some(email) = link.recipient_email.as_deref() {
            let artist = self.artist_for(presskit).await;
            notify(
                self.notifier.as_ref(),
                templates::PRESSKIT_SHARED,
                email,
                &json!({
                    "recipientName": link.recipient_name,
                    "artistName": artist.map(|a| a.name),
                    "presskitTitle": presskit.title,
                    "url": url,
                    "expiresAt": link.expires_at,
                }),
            )
            .await;
        }
        self.audit
            .record(AuditEntry {
                actor_user_id: created_by,
                action: "presskit.link_generated",
                entity_type: "presskit_link",
                entity_id: link.id,
                details: json!({
                    "presskitId": presskit.id,
                    "expiresAt": link.expires_at,
                    "maxViews": link.max_views,
                }),
            })
            .await;

        Ok(IssuedLink { link, url })
    }

    async fn load_presskit(&self, id: DbId) -> Result<Presskit, CoreError> {
        self.store
            .find_presskit(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Presskit", id))
    }

    /// Artist lookups on public paths are best effort.
    async fn artist_for(&self, presskit: &Presskit) -> Option<ArtistProfile> {
        match self.artists.find_by_id(presskit.artist_id).await {
            Ok(artist) => artist,
            Err(e) => {
                tracing::warn!(presskit_id = presskit.id, error = %e, "Artist lookup failed");
                None
            }
        }
    }

    /// The uploaded document, falling back to `None` when absent or unreadable.
    async fn stored_document(&self, presskit: &Presskit) -> Option<DownloadedDocument> {
        let key = presskit.document_key.as_deref()?;
        match self.files.get(PRESSKIT_BUCKET, key).await {
            Ok(Some(bytes)) => Some(DownloadedDocument {
                bytes,
                content_type: content_type_for(key),
                filename: key.rsplit('/').next().unwrap_or(key).to_string(),
            }),
            Ok(None) => {
                tracing::warn!(presskit_id = presskit.id, key, "Presskit document missing from store");
                None
            }
            Err(e) => {
                tracing::warn!(presskit_id = presskit.id, key, error = %e, "Presskit document unreadable");
                None
            }
        }
    }

    async fn log(
        &self,
        link: &PresskitLink,
        action: AccessAction,
        client: &ClientInfo,
        section_id: Option<String>,
        duration_secs: Option<i32>,
    ) -> Result<(), CoreError> {
        self.store
            .log_access(&NewAccessLog {
                link_id: link.id,
                action,
                ip_address: client.ip_address.clone(),
                user_agent: client.user_agent.clone(),
                section_id,
                duration_secs,
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PresskitIssuer for PresskitAccessController {
    async fn issue_for_booking(&self, booking: &Booking) -> Result<Option<DbId>, CoreError> {
        let Some(presskit) = self.store.find_primary_presskit(booking.artist_id).await? else {
            return Ok(None);
        };

        let shared_with = booking
            .requester_company
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(&booking.requester_name);
        let request = GenerateLinkRequest {
            expires_in_hours: None,
            max_views: None,
            allow_download: true,
            watermark_text: Some(format!("Shared with {shared_with}")),
            recipient_email: Some(booking.requester_email.clone()),
            recipient_name: Some(booking.requester_name.clone()),
        };
        let issued = self.issue(&presskit, request, None).await?;
        Ok(Some(issued.link.id))
    }
}

fn denied() -> CoreError {
    CoreError::Forbidden(INVALID_TOKEN_MESSAGE.into())
}

fn content_type_for(key: &str) -> &'static str {
    let extension = key.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "html" | "htm" => HTML_CONTENT_TYPE,
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::memory::{
        MemoryArtistDirectory, MemoryFileStore, MemoryStore, RecordingAuditRecorder,
        RecordingDispatcher,
    };

    const SECRET: &str = "presskit-test-secret";

    struct Harness {
        store: Arc<MemoryStore>,
        files: Arc<MemoryFileStore>,
        notifier: Arc<RecordingDispatcher>,
        audit: Arc<RecordingAuditRecorder>,
        controller: PresskitAccessController,
        presskit: Presskit,
    }

    fn staff() -> Actor {
        Actor::Manager { user_id: 7 }
    }

    fn client() -> ClientInfo {
        ClientInfo {
            ip_address: Some("203.0.113.9".to_string()),
            user_agent: Some("test-agent".to_string()),
        }
    }

    fn harness_with_document(document_key: Option<&str>) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let artists = Arc::new(MemoryArtistDirectory::new());
        let files = Arc::new(MemoryFileStore::new());
        let notifier = Arc::new(RecordingDispatcher::new());
        let audit = Arc::new(RecordingAuditRecorder::new());
        artists.insert(ArtistProfile {
            id: 1,
            name: "Night Owls".to_string(),
            slug: "night-owls".to_string(),
            fee_min: Some(2000),
            fee_max: Some(2000),
            manager_id: Some(7),
            manager_email: Some("manager@agency.test".to_string()),
            account_email: Some("owls@band.test".to_string()),
        });
        let presskit = store.insert_presskit(
            1,
            "Night Owls EPK",
            vec![PresskitSection {
                id: "bio".to_string(),
                title: "Biography".to_string(),
                body: "Formed in 2019.".to_string(),
            }],
            document_key,
        );

        let controller = PresskitAccessController::new(
            store.clone(),
            artists,
            files.clone(),
            notifier.clone(),
            audit.clone(),
            CapabilitySigner::new(SECRET),
            PresskitConfig {
                public_base_url: "https://backstage.test/".to_string(),
                ..PresskitConfig::default()
            },
        );
        Harness {
            store,
            files,
            notifier,
            audit,
            controller,
            presskit,
        }
    }

    fn harness() -> Harness {
        harness_with_document(None)
    }

    fn confirmed_booking(artist_id: DbId) -> Booking {
        let now = Utc::now();
        Booking {
            id: 40,
            reference_code: "SAU-2026-0040".to_string(),
            artist_id,
            status: backstage_core::booking::BookingStatus::Confirmed,
            score: 70,
            score_breakdown: sqlx::types::Json(Default::default()),
            requester_name: "Sam Rivers".to_string(),
            requester_email: "booker@festival.test".to_string(),
            requester_phone: None,
            requester_company: Some("Harbour Festival Pty".to_string()),
            event_date: now.date_naive() + Duration::days(60),
            event_type: "festival".to_string(),
            event_city: "Hobart".to_string(),
            event_country: None,
            event_venue: None,
            expected_attendance: None,
            budget_min: None,
            budget_max: None,
            currency: "AUD".to_string(),
            message: None,
            quoted_amount: Some(2000),
            quote_pdf_url: None,
            quote_sent_at: Some(now),
            digital_signature: Some("Sam Rivers".to_string()),
            signed_at: Some(now),
            assigned_to: Some(7),
            source_ip: None,
            version: 3,
            created_at: now,
            updated_at: now,
        }
    }

    fn link_request() -> GenerateLinkRequest {
        GenerateLinkRequest {
            allow_download: true,
            watermark_text: Some("Shared with Harbour Festival".to_string()),
            recipient_email: Some("booker@festival.test".to_string()),
            recipient_name: Some("Sam".to_string()),
            ..GenerateLinkRequest::default()
        }
    }

    async fn issue(h: &Harness, request: GenerateLinkRequest) -> (IssuedLink, String) {
        let issued = h
            .controller
            .generate_link(h.presskit.id, request, &staff())
            .await
            .unwrap();
        let token = issued
            .url
            .rsplit('/')
            .next()
            .unwrap()
            .to_string();
        (issued, token)
    }

    #[tokio::test]
    async fn generate_link_activates_and_emails_recipient() {
        let h = harness();
        let (issued, token) = issue(&h, link_request()).await;

        assert!(issued.url.starts_with("https://backstage.test/presskit/"));
        assert_eq!(issued.link.token, token);
        let ttl = issued.link.expires_at - issued.link.created_at;
        assert!((ttl - Duration::hours(DEFAULT_PRESSKIT_TTL_HOURS)).num_seconds().abs() < 5);

        let presskit = h.store.find_presskit(h.presskit.id).await.unwrap().unwrap();
        assert_eq!(presskit.status, backstage_core::presskit::PresskitStatus::Active);

        let shared = h.notifier.sent_with(templates::PRESSKIT_SHARED);
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].to, "booker@festival.test");
        assert_eq!(shared[0].data["url"], issued.url);
        assert_eq!(h.audit.actions(), vec!["presskit.link_generated"]);
    }

    #[tokio::test]
    async fn generate_link_requires_staff() {
        let h = harness();
        let result = h
            .controller
            .generate_link(
                h.presskit.id,
                link_request(),
                &Actor::Artist {
                    user_id: 3,
                    artist_id: 1,
                },
            )
            .await;
        assert_matches!(result, Err(CoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn generate_link_for_missing_presskit() {
        let h = harness();
        let result = h
            .controller
            .generate_link(999, link_request(), &staff())
            .await;
        assert_matches!(result, Err(CoreError::NotFound { entity: "Presskit", id: 999 }));
    }

    #[tokio::test]
    async fn view_quota_allows_exactly_max_views() {
        let h = harness();
        let (_, token) = issue(
            &h,
            GenerateLinkRequest {
                max_views: Some(2),
                ..link_request()
            },
        )
        .await;

        let first = h.controller.view(&token, client()).await.unwrap();
        assert_eq!(first.remaining_views, Some(1));
        let second = h.controller.view(&token, client()).await.unwrap();
        assert_eq!(second.remaining_views, Some(0));

        let third = h.controller.view(&token, client()).await;
        assert_matches!(third, Err(CoreError::Forbidden(msg)) if msg == INVALID_TOKEN_MESSAGE);

        let link = h.store.find_link_by_token(&token).await.unwrap().unwrap();
        assert_eq!(link.current_views, 2);
        assert_eq!(h.notifier.sent_with(templates::PRESSKIT_VIEWED).len(), 2);
    }

    #[tokio::test]
    async fn concurrent_views_never_exceed_quota() {
        let h = harness();
        let (_, token) = issue(
            &h,
            GenerateLinkRequest {
                max_views: Some(3),
                ..link_request()
            },
        )
        .await;

        let results = futures::future::join_all(
            (0..10).map(|_| h.controller.view(&token, ClientInfo::default())),
        )
        .await;
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);

        let link = h.store.find_link_by_token(&token).await.unwrap().unwrap();
        assert_eq!(link.current_views, 3);
    }

    #[tokio::test]
    async fn view_returns_sections_and_watermark() {
        let h = harness();
        let (_, token) = issue(&h, link_request()).await;

        let view = h.controller.view(&token, client()).await.unwrap();
        assert_eq!(view.title, "Night Owls EPK");
        assert_eq!(view.artist_name.as_deref(), Some("Night Owls"));
        assert_eq!(view.sections.len(), 1);
        assert_eq!(view.remaining_views, None);
        assert_eq!(view.watermark_text.as_deref(), Some("Shared with Harbour Festival"));

        let viewed = h.notifier.sent_with(templates::PRESSKIT_VIEWED);
        assert_eq!(viewed[0].to, "manager@agency.test");
        assert_eq!(viewed[0].data["currentViews"], 1);
    }

    #[tokio::test]
    async fn tracking_ignores_quota_but_is_logged() {
        let h = harness();
        let (issued, token) = issue(
            &h,
            GenerateLinkRequest {
                max_views: Some(1),
                ..link_request()
            },
        )
        .await;
        h.controller.view(&token, client()).await.unwrap();

        h.controller
            .track_event(
                &token,
                TrackEventRequest {
                    action: AccessAction::SectionView,
                    section_id: Some("bio".to_string()),
                    duration: Some(42),
                },
                client(),
            )
            .await
            .unwrap();

        let logs = h
            .controller
            .access_log(h.presskit.id, issued.link.id, &staff())
            .await
            .unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].action, AccessAction::SectionView);
        assert_eq!(logs[0].section_id.as_deref(), Some("bio"));
        assert_eq!(logs[0].duration_secs, Some(42));
        assert_eq!(logs[1].action, AccessAction::View);

        let link = h.store.find_link(issued.link.id).await.unwrap().unwrap();
        assert_eq!(link.current_views, 1);
    }

    #[tokio::test]
    async fn revocation_blocks_every_public_path() {
        let h = harness();
        let (issued, token) = issue(&h, link_request()).await;
        h.controller.view(&token, client()).await.unwrap();

        let revoked = h
            .controller
            .revoke(h.presskit.id, issued.link.id, &staff())
            .await
            .unwrap();
        assert!(revoked.is_revoked);
        assert!(revoked.revoked_at.is_some());

        assert_matches!(
            h.controller.view(&token, client()).await,
            Err(CoreError::Forbidden(_))
        );
        let track = h
            .controller
            .track_event(
                &token,
                TrackEventRequest {
                    action: AccessAction::View,
                    section_id: None,
                    duration: None,
                },
                client(),
            )
            .await;
        assert_matches!(track, Err(CoreError::Forbidden(_)));
        assert_matches!(
            h.controller.download_document(&token, client()).await,
            Err(CoreError::Forbidden(_))
        );

        // Only the view before revocation was logged.
        let logs = h
            .controller
            .access_log(h.presskit.id, issued.link.id, &staff())
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
    }

    #[tokio::test]
    async fn revoke_checks_presskit_ownership() {
        let h = harness();
        let (issued, _) = issue(&h, link_request()).await;
        let result = h
            .controller
            .revoke(h.presskit.id + 100, issued.link.id, &staff())
            .await;
        assert_matches!(result, Err(CoreError::NotFound { entity: "PresskitLink", .. }));
    }

    #[tokio::test]
    async fn expired_link_is_denied() {
        let h = harness();
        let (issued, token) = issue(&h, link_request()).await;
        h.store
            .set_link_expiry(issued.link.id, Utc::now() - Duration::minutes(1));

        assert_matches!(
            h.controller.view(&token, client()).await,
            Err(CoreError::Forbidden(msg)) if msg == INVALID_TOKEN_MESSAGE
        );
    }

    #[tokio::test]
    async fn contract_token_is_not_a_presskit_token() {
        let h = harness();
        issue(&h, link_request()).await;
        let contract_token = CapabilitySigner::new(SECRET)
            .issue(
                &Capability::BookingContract {
                    booking_id: 1,
                    requester_email: "booker@festival.test".to_string(),
                },
                Duration::hours(1),
            )
            .unwrap()
            .token;

        assert_matches!(
            h.controller.view(&contract_token, client()).await,
            Err(CoreError::Forbidden(_))
        );
    }

    #[tokio::test]
    async fn validly_signed_token_without_link_is_denied() {
        let h = harness();
        let orphan = CapabilitySigner::new(SECRET)
            .issue(
                &Capability::PresskitAccess {
                    presskit_id: h.presskit.id,
                },
                Duration::hours(1),
            )
            .unwrap()
            .token;

        assert_matches!(
            h.controller.resolve(&orphan, false).await,
            Err(CoreError::Forbidden(_))
        );
    }

    #[tokio::test]
    async fn download_disabled_is_forbidden() {
        let h = harness();
        let (_, token) = issue(
            &h,
            GenerateLinkRequest {
                allow_download: false,
                ..link_request()
            },
        )
        .await;

        assert_matches!(
            h.controller.download_document(&token, client()).await,
            Err(CoreError::Forbidden(msg)) if msg.contains("disabled")
        );
    }

    #[tokio::test]
    async fn download_renders_watermarked_html() {
        let h = harness();
        let (issued, token) = issue(&h, link_request()).await;

        let document = h.controller.download_document(&token, client()).await.unwrap();
        assert_eq!(document.content_type, HTML_CONTENT_TYPE);
        let html = String::from_utf8(document.bytes).unwrap();
        assert!(html.contains("Shared with Harbour Festival"));
        assert!(html.contains("Formed in 2019."));

        let logs = h
            .controller
            .access_log(h.presskit.id, issued.link.id, &staff())
            .await
            .unwrap();
        assert_eq!(logs[0].action, AccessAction::Download);
        assert_eq!(h.notifier.sent_with(templates::PRESSKIT_DOWNLOADED).len(), 1);
    }

    #[tokio::test]
    async fn download_prefers_stored_document() {
        let h = harness_with_document(Some("night-owls/epk.pdf"));
        h.files
            .put(PRESSKIT_BUCKET, "night-owls/epk.pdf", b"%PDF-1.7".to_vec())
            .await
            .unwrap();
        let (_, token) = issue(&h, link_request()).await;

        let document = h.controller.download_document(&token, client()).await.unwrap();
        assert_eq!(document.content_type, "application/pdf");
        assert_eq!(document.filename, "epk.pdf");
        assert_eq!(document.bytes, b"%PDF-1.7".to_vec());
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_view() {
        let h = harness();
        let (_, token) = issue(&h, link_request()).await;
        h.notifier.set_failing(true);

        assert!(h.controller.view(&token, client()).await.is_ok());
    }

    #[tokio::test]
    async fn issue_for_booking_uses_primary_presskit() {
        let h = harness();
        let booking = confirmed_booking(1);

        let link_id = h.controller.issue_for_booking(&booking).await.unwrap();
        let link = h.store.find_link(link_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(link.presskit_id, h.presskit.id);
        assert_eq!(link.recipient_email.as_deref(), Some("booker@festival.test"));
        assert_eq!(link.watermark_text.as_deref(), Some("Shared with Harbour Festival Pty"));
        assert!(link.allow_download);

        let other = confirmed_booking(2);
        assert_eq!(h.controller.issue_for_booking(&other).await.unwrap(), None);
    }
}
