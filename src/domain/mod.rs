//! Domain layer containing entities and collaborator contracts.
//!
//! - [`entities`] - Links and click records
//! - [`repositories`] - Link store and click stat store traits
//! - [`geo`] - Geo/device enricher trait
//! - [`click_event`] - Request metadata and the click job model
//!
//! # Click Processing Flow
//!
//! 1. The redirect handler extracts [`click_event::RequestMetadata`]
//! 2. After a successful resolution a [`click_event::ClickEvent`] is queued
//! 3. [`crate::application::click_worker::run_click_worker`] picks it up
//! 4. [`crate::application::services::ClickAccountant`] consumes budget and
//!    records the click via [`repositories::LinkRepository`] and
//!    [`repositories::StatsRepository`]

pub mod click_event;
pub mod entities;
pub mod geo;
pub mod repositories;
