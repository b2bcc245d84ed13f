//! Read-only artist lookups.

use backstage_core::types::DbId;
use sqlx::PgPool;

use crate::models::artist::ArtistRow;

pub struct ArtistRepo;

impl ArtistRepo {
    /// Find an artist together with its manager's and linked account's email.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ArtistRow>, sqlx::Error> {
        sqlx::query_as::<_, ArtistRow>(
            "SELECT a.id, a.name, a.slug, a.fee_min, a.fee_max, a.manager_id, \
                    m.email AS manager_email, \
                    (SELECT u.email FROM users u WHERE u.artist_id = a.id \
                     ORDER BY u.id LIMIT 1) AS account_email \
             FROM artists a \
             LEFT JOIN users m ON m.id = a.manager_id \
             WHERE a.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
