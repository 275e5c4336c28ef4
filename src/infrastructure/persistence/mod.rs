//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx with
//! bound parameters.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link lookup and atomic click budget decrement
//! - [`PgStatsRepository`] - Click event persistence

pub mod pg_link_repository;
pub mod pg_stats_repository;

pub use pg_link_repository::PgLinkRepository;
pub use pg_stats_repository::PgStatsRepository;
