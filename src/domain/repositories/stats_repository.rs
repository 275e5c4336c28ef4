//! Repository trait for click event persistence.

use crate::domain::entities::{Click, NewClick};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the append-only click stat store.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgStatsRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_stats.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Records a new click event.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on database errors, including a
    /// foreign key violation when the link was deleted after resolution.
    async fn record_click(&self, new_click: NewClick) -> Result<Click, AppError>;
}
