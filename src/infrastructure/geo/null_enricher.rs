//! Enricher used when lookups are disabled.

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

use crate::domain::geo::{GeoEnricher, GeoInfo};
use crate::error::AppError;

/// Never performs a lookup. Clicks are recorded with request hints only.
pub struct NullEnricher;

#[async_trait]
impl GeoEnricher for NullEnricher {
    async fn lookup(&self, _ip: IpAddr, _timeout: Duration) -> Result<GeoInfo, AppError> {
        Err(AppError::enrichment_failed("enrichment disabled"))
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}
