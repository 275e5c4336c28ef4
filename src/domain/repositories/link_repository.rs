//! Repository trait for short link lookups and click budget consumption.

use crate::domain::entities::Link;
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the link store.
///
/// The redirect core performs point lookups and consumes click budget. Link
/// creation and editing belong to the management side and are not part of
/// this contract.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_link.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Finds a link by its short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Link))` if found
    /// - `Ok(None)` if not found
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Atomically consumes one unit of a link's remaining-click budget.
    ///
    /// Must be a single conditional store operation. The counter never goes
    /// below zero and links without a budget are left untouched.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if a unit was consumed
    /// - `Ok(false)` if the link is unlimited, exhausted or gone
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on database errors.
    async fn decrement_remaining_clicks(&self, link_id: i64) -> Result<bool, AppError>;
}
