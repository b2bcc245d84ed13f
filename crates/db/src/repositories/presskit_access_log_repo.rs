//! Repository for the `presskit_access_logs` table. Append-only.

use backstage_core::types::DbId;
use sqlx::PgPool;

use crate::models::presskit::{NewAccessLog, PresskitAccessLog};

const COLUMNS: &str =
    "id, link_id, action, ip_address, user_agent, section_id, duration_secs, created_at";

pub struct PresskitAccessLogRepo;

impl PresskitAccessLogRepo {
    pub async fn create(
        pool: &PgPool,
        input: &NewAccessLog,
    ) -> Result<PresskitAccessLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO presskit_access_logs \
                (link_id, action, ip_address, user_agent, section_id, duration_secs) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PresskitAccessLog>(&query)
            .bind(input.link_id)
            .bind(input.action.as_str())
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .bind(&input.section_id)
            .bind(input.duration_secs)
            .fetch_one(pool)
            .await
    }

    /// Log entries for a link, newest first.
    pub async fn list_by_link(
        pool: &PgPool,
        link_id: DbId,
        limit: i64,
    ) -> Result<Vec<PresskitAccessLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM presskit_access_logs \
             WHERE link_id = $1 ORDER BY id DESC LIMIT $2"
        );
        sqlx::query_as::<_, PresskitAccessLog>(&query)
            .bind(link_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
