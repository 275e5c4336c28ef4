//! Click metadata extraction from an inbound request.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

use crate::domain::click_event::RequestMetadata;
use crate::domain::entities::DeviceType;
use crate::utils::client_ip::extract_client_ip;
use crate::utils::user_agent::classify_user_agent;

/// Country hint header set by a trusted edge proxy.
pub const COUNTRY_HEADER: &str = "x-country-code";
/// Device hint header set by a trusted edge proxy.
pub const DEVICE_HEADER: &str = "x-device-type";

/// Copies everything click accounting needs out of the request headers.
///
/// Must run while the request is live; the result owns all of its data.
///
/// # Device precedence
///
/// 1. `X-Device-Type` (only when `behind_proxy`)
/// 2. Classification of `User-Agent`
///
/// The enricher may later fill the device only if both are absent.
pub fn extract_request_metadata(
    headers: &HeaderMap,
    socket_ip: IpAddr,
    behind_proxy: bool,
) -> RequestMetadata {
    let user_agent = header_string(headers, header::USER_AGENT.as_str());
    let referer = header_string(headers, header::REFERER.as_str());

    let (country, trusted_device) = if behind_proxy {
        (
            header_string(headers, COUNTRY_HEADER)
                .filter(|c| is_country_code(c))
                .map(|c| c.to_ascii_uppercase()),
            header_string(headers, DEVICE_HEADER).and_then(|d| d.parse::<DeviceType>().ok()),
        )
    } else {
        (None, None)
    };

    let device_type =
        trusted_device.or_else(|| user_agent.as_deref().and_then(classify_user_agent));

    RequestMetadata {
        ip: Some(extract_client_ip(headers, socket_ip, behind_proxy)),
        user_agent,
        referer,
        country,
        device_type,
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn is_country_code(value: &str) -> bool {
    value.len() == 2 && value.bytes().all(|b| b.is_ascii_alphabetic())
}
