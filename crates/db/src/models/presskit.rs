//! Presskit, sharing link and access-log models.

use backstage_core::presskit::{AccessAction, LinkState, PresskitStatus};
use backstage_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

/// One titled block of presskit content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresskitSection {
    pub id: String,
    pub title: String,
    pub body: String,
}

/// A row from the `presskits` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Presskit {
    pub id: DbId,
    pub artist_id: DbId,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub status: PresskitStatus,
    pub sections: Json<Vec<PresskitSection>>,
    /// FileStore key of an uploaded document, if any.
    pub document_key: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `presskit_links` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresskitLink {
    pub id: DbId,
    pub presskit_id: DbId,
    /// The signed capability string. Only ever returned inside a URL.
    #[serde(skip_serializing)]
    pub token: String,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub expires_at: Timestamp,
    pub max_views: Option<i32>,
    pub current_views: i32,
    pub allow_download: bool,
    pub watermark_text: Option<String>,
    pub is_revoked: bool,
    pub revoked_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

impl PresskitLink {
    pub fn state(&self) -> LinkState {
        LinkState {
            is_revoked: self.is_revoked,
            expires_at: self.expires_at,
            current_views: self.current_views,
            max_views: self.max_views,
        }
    }
}

/// Insert DTO for a link.
#[derive(Debug, Clone)]
pub struct NewPresskitLink {
    pub presskit_id: DbId,
    pub token: String,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub expires_at: Timestamp,
    pub max_views: Option<i32>,
    pub allow_download: bool,
    pub watermark_text: Option<String>,
    pub created_by: Option<DbId>,
}

/// A row from the `presskit_access_logs` table. Append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresskitAccessLog {
    pub id: DbId,
    pub link_id: DbId,
    #[sqlx(try_from = "String")]
    pub action: AccessAction,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub section_id: Option<String>,
    pub duration_secs: Option<i32>,
    pub created_at: Timestamp,
}

/// Insert DTO for an access-log entry.
#[derive(Debug, Clone)]
pub struct NewAccessLog {
    pub link_id: DbId,
    pub action: AccessAction,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub section_id: Option<String>,
    pub duration_secs: Option<i32>,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /presskits/{id}/generate-link`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLinkRequest {
    /// Defaults to thirty days.
    #[validate(range(min = 1, max = 8760))]
    pub expires_in_hours: Option<i64>,
    #[validate(range(min = 1))]
    pub max_views: Option<i32>,
    #[serde(default)]
    pub allow_download: bool,
    #[validate(length(max = 200))]
    pub watermark_text: Option<String>,
    #[validate(email)]
    pub recipient_email: Option<String>,
    #[validate(length(max = 200))]
    pub recipient_name: Option<String>,
}

/// Body of `POST /public/presskits/{token}/track`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventRequest {
    pub action: AccessAction,
    #[validate(length(min = 1, max = 100))]
    pub section_id: Option<String>,
    /// Seconds spent on the section.
    #[validate(range(min = 0, max = 86400))]
    pub duration: Option<i32>,
}
