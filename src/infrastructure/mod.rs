//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`geo`] - IP geo/device enrichment providers
//! - [`persistence`] - PostgreSQL repository implementations

pub mod geo;
pub mod persistence;
