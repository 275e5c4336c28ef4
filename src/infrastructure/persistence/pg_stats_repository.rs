//! PostgreSQL implementation of statistics repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::domain::entities::{Click, NewClick};
use crate::domain::repositories::StatsRepository;
use crate::error::AppError;

/// PostgreSQL repository for the append-only click log.
pub struct PgStatsRepository {
    pool: Arc<PgPool>,
}

impl PgStatsRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ClickRow {
    id: Uuid,
    link_id: i64,
    clicked_at: DateTime<Utc>,
    ip: Option<String>,
    user_agent: Option<String>,
    referer: Option<String>,
    country: Option<String>,
    device_type: Option<String>,
}

impl From<ClickRow> for Click {
    fn from(row: ClickRow) -> Self {
        let device_type = row.device_type.and_then(|d| match d.parse() {
            Ok(device) => Some(device),
            Err(e) => {
                warn!(click_id = %row.id, error = %e, "Ignoring unknown stored device type");
                None
            }
        });

        Click {
            id: row.id,
            link_id: row.link_id,
            clicked_at: row.clicked_at,
            ip: row.ip,
            user_agent: row.user_agent,
            referer: row.referer,
            country: row.country,
            device_type,
        }
    }
}

#[async_trait]
impl StatsRepository for PgStatsRepository {
    async fn record_click(&self, new_click: NewClick) -> Result<Click, AppError> {
        let row = sqlx::query_as::<_, ClickRow>(
            r#"
            INSERT INTO link_clicks
                (id, link_id, clicked_at, ip, user_agent, referer, country, device_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, link_id, clicked_at, ip, user_agent, referer, country, device_type
            "#,
        )
        .bind(new_click.id)
        .bind(new_click.link_id)
        .bind(new_click.clicked_at)
        .bind(new_click.ip)
        .bind(new_click.user_agent)
        .bind(new_click.referer)
        .bind(new_click.country)
        .bind(new_click.device_type.map(|d| d.as_str()))
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }
}
