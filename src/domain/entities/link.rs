//! Link entity representing a short code to destination mapping.

use chrono::{DateTime, Utc};

/// A short link as stored in the link store.
///
/// The redirect core only reads links. The one exception is the remaining-click
/// counter, which is consumed through
/// [`crate::domain::repositories::LinkRepository::decrement_remaining_clicks`].
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Link {
    pub id: i64,
    pub code: String,
    pub long_url: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` means the link may be used an unlimited number of times.
    pub remaining_clicks: Option<i32>,
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Creates an active, unlimited, non-expiring link.
    pub fn new(id: i64, code: impl Into<String>, long_url: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            long_url: long_url.into(),
            is_active: true,
            expires_at: None,
            remaining_clicks: None,
            owner_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_remaining_clicks(mut self, remaining: i32) -> Self {
        self.remaining_clicks = Some(remaining);
        self
    }

    /// Returns true if the link has an expiry at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e <= now)
    }

    /// Returns true if the link carries a finite click budget.
    pub fn has_click_budget(&self) -> bool {
        self.remaining_clicks.is_some()
    }

    /// Returns true if the finite click budget has been used up.
    pub fn is_budget_exhausted(&self) -> bool {
        self.remaining_clicks.is_some_and(|r| r <= 0)
    }

    /// A link is redirectable iff it is active, not expired and has budget left.
    pub fn is_redirectable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now) && !self.is_budget_exhausted()
    }
}
