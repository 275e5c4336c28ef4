//! Shared state injected into every handler.

use std::sync::Arc;

use crate::application::services::RedirectService;
use crate::domain::repositories::LinkRepository;

#[derive(Clone)]
pub struct AppState {
    pub redirect_service: Arc<RedirectService<dyn LinkRepository>>,
    /// Trust forwarding and edge hint headers.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(redirect_service: Arc<RedirectService<dyn LinkRepository>>, behind_proxy: bool) -> Self {
        Self {
            redirect_service,
            behind_proxy,
        }
    }
}
