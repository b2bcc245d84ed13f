//! Artist lookup row.

use backstage_core::collaborators::ArtistProfile;
use backstage_core::types::DbId;
use sqlx::FromRow;

/// An artist joined with its manager's email and linked account email.
#[derive(Debug, Clone, FromRow)]
pub struct ArtistRow {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub fee_min: Option<i64>,
    pub fee_max: Option<i64>,
    pub manager_id: Option<DbId>,
    pub manager_email: Option<String>,
    pub account_email: Option<String>,
}

impl From<ArtistRow> for ArtistProfile {
    fn from(row: ArtistRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            fee_min: row.fee_min,
            fee_max: row.fee_max,
            manager_id: row.manager_id,
            manager_email: row.manager_email,
            account_email: row.account_email,
        }
    }
}
