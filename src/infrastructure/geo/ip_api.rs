//! Geo/device enrichment against an ip-api compatible HTTP service.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use tracing::trace;

use crate::domain::geo::{GeoEnricher, GeoInfo};
use crate::error::AppError;
use crate::utils::client_ip::is_public_ip;

/// Default lookup URL. `{ip}` is replaced with the address being looked up.
pub const DEFAULT_IP_API_URL: &str =
    "http://ip-api.com/json/{ip}?fields=status,message,countryCode,mobile";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Response body of an ip-api lookup.
///
/// Only the requested fields are present; failures carry `status = "fail"`
/// and a `message` such as `"private range"` or `"reserved range"`.
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "countryCode")]
    country_code: Option<String>,
    #[serde(default)]
    mobile: bool,
}

/// HTTP enricher backed by one shared connection pool.
pub struct IpApiEnricher {
    client: Client,
    url_template: String,
}

impl IpApiEnricher {
    /// Creates an enricher for `url_template`.
    ///
    /// `max_timeout` bounds every request made by the client; callers may
    /// pass a shorter per-lookup timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::EnrichmentFailed`] if the HTTP client cannot be built.
    pub fn new(url_template: impl Into<String>, max_timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(max_timeout)
            .build()
            .map_err(|e| AppError::enrichment_failed(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url_template: url_template.into(),
        })
    }

    fn url_for(&self, ip: IpAddr) -> String {
        self.url_template.replace("{ip}", &ip.to_string())
    }
}

#[async_trait]
impl GeoEnricher for IpApiEnricher {
    async fn lookup(&self, ip: IpAddr, timeout: Duration) -> Result<GeoInfo, AppError> {
        if !is_public_ip(ip) {
            return Err(AppError::enrichment_failed("non-public address"));
        }

        let url = self.url_for(ip);
        trace!(%ip, "Looking up client address");

        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| AppError::enrichment_failed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::enrichment_failed(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let body = response
            .json::<IpApiResponse>()
            .await
            .map_err(|e| AppError::enrichment_failed(format!("invalid response: {e}")))?;

        parse_response(body)
    }

    fn name(&self) -> &'static str {
        "ip-api"
    }
}

fn parse_response(body: IpApiResponse) -> Result<GeoInfo, AppError> {
    if body.status != "success" {
        let reason = body.message.unwrap_or_else(|| body.status.clone());
        return Err(AppError::enrichment_failed(format!("lookup rejected: {reason}")));
    }

    let country = body
        .country_code
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty());

    Ok(GeoInfo {
        country,
        is_mobile: body.mobile,
    })
}
