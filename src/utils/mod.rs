//! Request handling helpers.
//!
//! - [`short_code`] - Short code shape validation
//! - [`client_ip`] - Client IP precedence and public address checks
//! - [`user_agent`] - Device classification from `User-Agent`
//! - [`request_metadata`] - Click metadata extraction from request headers

pub mod client_ip;
pub mod request_metadata;
pub mod short_code;
pub mod user_agent;
