//! PostgreSQL content repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::ContentRow;
use crate::repo::ContentRepository;

/// PostgreSQL content repository
#[derive(Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    /// Create a new content repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ContentRow>> {
        let content = sqlx::query_as::<_, ContentRow>(
            "SELECT id, title, access_level, stream_url, active FROM content WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(content)
    }
}
