//! Geo/device enrichment providers.
//!
//! - [`IpApiEnricher`] - HTTP lookup against ip-api.com or a compatible service
//! - [`NullEnricher`] - No-op provider when `GEO_LOOKUP_ENABLED=false`

pub mod ip_api;
pub mod null_enricher;

pub use ip_api::{DEFAULT_IP_API_URL, IpApiEnricher};
pub use null_enricher::NullEnricher;
