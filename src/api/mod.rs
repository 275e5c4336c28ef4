//! HTTP layer: the redirect endpoint and its middleware.
//!
//! # Modules
//!
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Request tracing

pub mod handlers;
pub mod middleware;
