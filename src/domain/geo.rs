//! Geo/device enrichment contract.

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

use crate::domain::entities::DeviceType;
use crate::error::AppError;

/// Result of a successful IP lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoInfo {
    /// ISO 3166-1 alpha-2 country code.
    pub country: Option<String>,
    /// Whether the address belongs to a mobile network.
    pub is_mobile: bool,
}

impl GeoInfo {
    /// Device classification implied by the lookup.
    pub fn device_type(&self) -> DeviceType {
        if self.is_mobile {
            DeviceType::Mobile
        } else {
            DeviceType::Desktop
        }
    }
}

/// Best-effort IP to geo/device lookup.
///
/// Implementations must honor the caller-supplied timeout and must refuse
/// private, loopback and other non-routable addresses without doing any I/O.
///
/// # Implementations
///
/// - [`crate::infrastructure::geo::IpApiEnricher`] - HTTP lookup against an ip-api compatible service
/// - [`crate::infrastructure::geo::NullEnricher`] - Always fails; used when enrichment is disabled
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeoEnricher: Send + Sync {
    /// Looks up `ip`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::EnrichmentFailed`] on timeout, network failure,
    /// non-success responses and non-public addresses.
    async fn lookup(&self, ip: IpAddr, timeout: Duration) -> Result<GeoInfo, AppError>;

    /// Provider name for logs.
    fn name(&self) -> &'static str;
}
