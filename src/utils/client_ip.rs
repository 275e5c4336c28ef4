//! Client IP extraction and address classification.

use axum::http::HeaderMap;
use std::net::IpAddr;

const X_REAL_IP: &str = "x-real-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Extracts the client IP address for a request.
///
/// When `behind_proxy` is true the precedence is:
///
/// 1. `X-Real-IP` set by the trusted reverse proxy
/// 2. First entry of `X-Forwarded-For`
/// 3. The socket peer address
///
/// When `behind_proxy` is false forwarding headers are ignored entirely,
/// since any client can set them.
pub fn extract_client_ip(headers: &HeaderMap, socket_ip: IpAddr, behind_proxy: bool) -> IpAddr {
    if !behind_proxy {
        return socket_ip;
    }

    real_ip(headers)
        .or_else(|| first_forwarded_for(headers))
        .unwrap_or(socket_ip)
}

fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(X_REAL_IP)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

fn first_forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

/// Returns true if `ip` is a globally routable address worth looking up.
///
/// Loopback, private, link-local, unspecified, broadcast, documentation,
/// shared (CGNAT) and IPv6 unique-local addresses are all rejected.
/// IPv4-mapped IPv6 addresses are judged by their IPv4 form.
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            let shared = octets[0] == 100 && (octets[1] & 0b1100_0000) == 64;
            !(v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_multicast()
                || shared)
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_public_ip(IpAddr::V4(mapped));
            }
            !(v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || v6.is_unique_local()
                || v6.is_unicast_link_local())
        }
    }
}
