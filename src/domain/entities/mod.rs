//! Core domain entities.
//!
//! - [`Link`] - A short code to destination mapping with validity rules
//! - [`Click`] / [`NewClick`] - A recorded redirect and its insert form
//! - [`DeviceType`] - Device classification attached to a click

pub mod click;
pub mod link;

pub use click::{Click, DeviceType, NewClick};
pub use link::Link;
