//! Repository for the `presskits` table.

use backstage_core::types::DbId;
use sqlx::PgPool;

use crate::models::presskit::Presskit;

const COLUMNS: &str =
    "id, artist_id, title, status, sections, document_key, created_at, updated_at";

pub struct PresskitRepo;

impl PresskitRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Presskit>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM presskits WHERE id = $1");
        sqlx::query_as::<_, Presskit>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The presskit to share on an artist's behalf: active before draft,
    /// most recently updated first. Archived presskits are never chosen.
    pub async fn find_primary_for_artist(
        pool: &PgPool,
        artist_id: DbId,
    ) -> Result<Option<Presskit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM presskits \
             WHERE artist_id = $1 AND status <> 'archived' \
             ORDER BY (status = 'active') DESC, updated_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Presskit>(&query)
            .bind(artist_id)
            .fetch_optional(pool)
            .await
    }
}
