//! Repository trait definitions for the domain layer.
//!
//! These traits are the contracts of the two stores the redirect core consumes.
//! Implementations live in `crate::infrastructure::persistence`; mock
//! implementations are generated by `mockall` for unit tests.
//!
//! - [`LinkRepository`] - Point lookup by code and atomic budget decrement
//! - [`StatsRepository`] - Click event persistence

pub mod link_repository;
pub mod stats_repository;

pub use link_repository::LinkRepository;
pub use stats_repository::StatsRepository;

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use stats_repository::MockStatsRepository;
