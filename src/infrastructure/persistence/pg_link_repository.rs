//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::Link;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// PostgreSQL repository for link lookups and click budget consumption.
///
/// Uses SQLx prepared statements with bound parameters.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let link = sqlx::query_as::<_, Link>(
            r#"
            SELECT id, code, long_url, is_active, expires_at, remaining_clicks, owner_id, created_at
            FROM links
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn decrement_remaining_clicks(&self, link_id: i64) -> Result<bool, AppError> {
        // Single conditional update: concurrent decrements serialize on the
        // row lock and the guard keeps the counter from going below zero.
        let result = sqlx::query(
            r#"
            UPDATE links
            SET remaining_clicks = remaining_clicks - 1
            WHERE id = $1
              AND remaining_clicks IS NOT NULL
              AND remaining_clicks > 0
            "#,
        )
        .bind(link_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
