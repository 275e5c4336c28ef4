//! Click job model for asynchronous click accounting.

use chrono::{DateTime, Utc};
use std::net::IpAddr;

use crate::domain::entities::DeviceType;

/// Request-derived fields captured while the inbound request is still live.
///
/// Everything is owned so the value can outlive the handler that built it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMetadata {
    pub ip: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    /// Country hint from a trusted upstream header.
    pub country: Option<String>,
    /// Device hint from a trusted header or the user agent.
    pub device_type: Option<DeviceType>,
}

impl RequestMetadata {
    /// Returns true if the enricher could still add information.
    pub fn needs_enrichment(&self) -> bool {
        self.country.is_none() || self.device_type.is_none()
    }
}

/// An in-memory click job handed from the redirect path to the click worker.
///
/// Created after a successful resolution, sent through a bounded channel
/// and consumed by [`crate::application::services::ClickAccountant`].
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub link_id: i64,
    pub code: String,
    /// Whether the link had a finite click budget when it was resolved.
    pub has_click_budget: bool,
    pub metadata: RequestMetadata,
    pub received_at: DateTime<Utc>,
}

impl ClickEvent {
    pub fn new(
        link_id: i64,
        code: impl Into<String>,
        has_click_budget: bool,
        metadata: RequestMetadata,
    ) -> Self {
        Self {
            link_id,
            code: code.into(),
            has_click_budget,
            metadata,
            received_at: Utc::now(),
        }
    }
}
