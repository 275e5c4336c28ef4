//! Services for the redirect path and the click accounting path.

pub mod click_accountant;
pub mod link_resolver;
pub mod redirect_service;

pub use click_accountant::ClickAccountant;
pub use link_resolver::{LinkResolver, ResolvedLink};
pub use redirect_service::RedirectService;
