//! Short code resolution and link validity checks.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, warn};

use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::short_code::is_well_formed;

/// A link that passed every validity check.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLink {
    pub link_id: i64,
    pub destination_url: String,
    pub has_click_budget: bool,
}

/// Resolves short codes to destinations.
///
/// Resolution is read-only: it performs exactly one point lookup and never
/// touches the click budget. Consuming a click is the job of
/// [`crate::application::services::ClickAccountant`].
pub struct LinkResolver<L: LinkRepository + ?Sized> {
    link_repository: Arc<L>,
}

impl<L: LinkRepository + ?Sized> LinkResolver<L> {
    /// Creates a new resolver.
    pub fn new(link_repository: Arc<L>) -> Self {
        Self { link_repository }
    }

    /// Resolves `code` against the current time.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_at`].
    pub async fn resolve(&self, code: &str) -> Result<ResolvedLink, AppError> {
        self.resolve_at(code, Utc::now()).await
    }

    /// Resolves `code` against `now`.
    ///
    /// Checks run in a fixed order and the first failing one wins:
    ///
    /// 1. malformed code or no record → [`AppError::NotFound`]
    /// 2. inactive → [`AppError::Inactive`]
    /// 3. expired → [`AppError::Expired`]
    /// 4. click budget used up → [`AppError::BudgetExhausted`]
    ///
    /// # Errors
    ///
    /// Returns one of the outcomes above, or [`AppError::StoreUnavailable`]
    /// if the lookup itself fails.
    pub async fn resolve_at(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<ResolvedLink, AppError> {
        if !is_well_formed(code) {
            warn!(code, "Rejected malformed short code");
            return Err(AppError::NotFound);
        }

        let link = match self.link_repository.find_by_code(code).await {
            Ok(Some(link)) => link,
            Ok(None) => {
                warn!(code, "Short link not found");
                return Err(AppError::NotFound);
            }
            Err(e) => {
                error!(code, error = %e, "Failed to look up short link");
                return Err(e);
            }
        };

        if !link.is_active {
            warn!(code, link_id = link.id, "Attempted to access inactive link");
            return Err(AppError::Inactive);
        }

        if link.is_expired_at(now) {
            warn!(code, link_id = link.id, "Attempted to access expired link");
            return Err(AppError::Expired);
        }

        if link.is_budget_exhausted() {
            warn!(code, link_id = link.id, "Attempted to access link with no remaining clicks");
            return Err(AppError::BudgetExhausted);
        }

        Ok(ResolvedLink {
            link_id: link.id,
            has_click_budget: link.has_click_budget(),
            destination_url: link.long_url,
        })
    }
}
