//! HTTP request handlers.

pub mod redirect;

pub use redirect::{not_found_handler, redirect_handler};
