//! Application layer services implementing the redirect flow.
//!
//! Services consume repository traits and provide a small API for HTTP
//! handlers and the background worker.
//!
//! # Available Services
//!
//! - [`services::LinkResolver`] - Short code lookup and validity checks
//! - [`services::RedirectService`] - Resolve then hand off click accounting
//! - [`services::ClickAccountant`] - Budget decrement and click persistence
//! - [`click_worker::run_click_worker`] - Bounded background consumer of click jobs

pub mod click_worker;
pub mod services;
