//! Repository for the `presskit_links` table.

use backstage_core::types::DbId;
use sqlx::PgPool;

use crate::models::presskit::{NewPresskitLink, PresskitLink};

/// Column list for `presskit_links` queries.
const COLUMNS: &str = "\
    id, presskit_id, token, recipient_email, recipient_name, expires_at, \
    max_views, current_views, allow_download, watermark_text, is_revoked, \
    revoked_at, created_by, created_at";

/// Provides persistence for presskit sharing links.
pub struct PresskitLinkRepo;

impl PresskitLinkRepo {
    /// Insert a link and mark its presskit `active`, atomically.
    pub async fn create(
        pool: &PgPool,
        input: &NewPresskitLink,
    ) -> Result<PresskitLink, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO presskit_links \
                (presskit_id, token, recipient_email, recipient_name, expires_at, \
                 max_views, allow_download, watermark_text, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        let link = sqlx::query_as::<_, PresskitLink>(&insert_query)
            .bind(input.presskit_id)
            .bind(&input.token)
            .bind(&input.recipient_email)
            .bind(&input.recipient_name)
            .bind(input.expires_at)
            .bind(input.max_views)
            .bind(input.allow_download)
            .bind(&input.watermark_text)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE presskits SET status = 'active', updated_at = NOW() \
             WHERE id = $1 AND status <> 'active'",
        )
        .bind(input.presskit_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(link)
    }

    /// Look a link up by the exact token string it was issued with.
    pub async fn find_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<PresskitLink>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM presskit_links WHERE token = $1");
        sqlx::query_as::<_, PresskitLink>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PresskitLink>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM presskit_links WHERE id = $1");
        sqlx::query_as::<_, PresskitLink>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Links of a presskit, newest first.
    pub async fn list_by_presskit(
        pool: &PgPool,
        presskit_id: DbId,
    ) -> Result<Vec<PresskitLink>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM presskit_links \
             WHERE presskit_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, PresskitLink>(&query)
            .bind(presskit_id)
            .fetch_all(pool)
            .await
    }

    /// Count one view, but only while the link is open and under quota.
    ///
    /// Returns `None` when the conditional increment did not apply.
    pub async fn increment_views(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PresskitLink>, sqlx::Error> {
        let query = format!(
            "UPDATE presskit_links SET current_views = current_views + 1 \
             WHERE id = $1 \
               AND NOT is_revoked \
               AND expires_at > NOW() \
               AND (max_views IS NULL OR current_views < max_views) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PresskitLink>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Latch `is_revoked`. Revoking twice keeps the first `revoked_at`.
    ///
    /// Returns `None` if the link does not belong to `presskit_id`.
    pub async fn revoke(
        pool: &PgPool,
        presskit_id: DbId,
        id: DbId,
    ) -> Result<Option<PresskitLink>, sqlx::Error> {
        let query = format!(
            "UPDATE presskit_links SET \
                is_revoked = true, \
                revoked_at = COALESCE(revoked_at, NOW()) \
             WHERE id = $1 AND presskit_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PresskitLink>(&query)
            .bind(id)
            .bind(presskit_id)
            .fetch_optional(pool)
            .await
    }
}
