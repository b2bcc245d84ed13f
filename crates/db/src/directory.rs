//! [`ArtistDirectory`] backed by PostgreSQL.

use async_trait::async_trait;
use backstage_core::collaborators::{ArtistDirectory, ArtistProfile};
use backstage_core::error::CoreError;
use backstage_core::types::DbId;

use crate::repositories::ArtistRepo;
use crate::DbPool;

#[derive(Clone)]
pub struct PgArtistDirectory {
    pool: DbPool,
}

impl PgArtistDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtistDirectory for PgArtistDirectory {
    async fn find_by_id(&self, id: DbId) -> Result<Option<ArtistProfile>, CoreError> {
        let row = ArtistRepo::find_by_id(&self.pool, id).await.map_err(|e| {
            tracing::error!(artist_id = id, error = %e, "Artist lookup failed");
            CoreError::Internal(format!("Artist lookup failed: {e}"))
        })?;
        Ok(row.map(ArtistProfile::from))
    }
}
