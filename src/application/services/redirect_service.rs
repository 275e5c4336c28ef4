//! Redirect orchestration: resolve, dispatch click accounting, return.

use axum::http::HeaderValue;
use metrics::counter;
use serde_json::json;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::application::services::link_resolver::LinkResolver;
use crate::domain::click_event::{ClickEvent, RequestMetadata};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Coordinates one redirect request.
///
/// Resolution happens inline. Click accounting is handed to the click
/// worker through a bounded queue and never delays the response: if the
/// queue is full or closed the job is dropped and counted.
pub struct RedirectService<L: LinkRepository + ?Sized> {
    resolver: LinkResolver<L>,
    click_sender: mpsc::Sender<ClickEvent>,
}

impl<L: LinkRepository + ?Sized> RedirectService<L> {
    pub fn new(resolver: LinkResolver<L>, click_sender: mpsc::Sender<ClickEvent>) -> Self {
        Self {
            resolver,
            click_sender,
        }
    }

    /// Returns the `Location` value for `code`.
    ///
    /// On success exactly one click job is offered to the worker. No job is
    /// created for any failed resolution, nor for a stored destination that
    /// cannot be sent as a `Location` header.
    ///
    /// # Errors
    ///
    /// Propagates the resolver outcome unchanged. Returns
    /// [`AppError::StoreUnavailable`] for an unsendable destination.
    pub async fn handle_redirect(
        &self,
        code: &str,
        metadata: RequestMetadata,
    ) -> Result<HeaderValue, AppError> {
        let resolved = match self.resolver.resolve(code).await {
            Ok(resolved) => resolved,
            Err(e) => {
                counter!("redirects_total", "outcome" => e.outcome()).increment(1);
                return Err(e);
            }
        };

        let location = match HeaderValue::from_bytes(resolved.destination_url.as_bytes()) {
            Ok(location) => location,
            Err(e) => {
                let e = AppError::store_unavailable(
                    "Stored destination is not a valid redirect target",
                    json!({
                        "code": code,
                        "link_id": resolved.link_id,
                        "reason": e.to_string(),
                    }),
                );
                counter!("redirects_total", "outcome" => e.outcome()).increment(1);
                return Err(e);
            }
        };

        counter!("redirects_total", "outcome" => "redirected").increment(1);

        let event = ClickEvent::new(
            resolved.link_id,
            code,
            resolved.has_click_budget,
            metadata,
        );
        self.dispatch(event);

        Ok(location)
    }

    fn dispatch(&self, event: ClickEvent) {
        match self.click_sender.try_send(event) {
            Ok(()) => {
                counter!("click_events_enqueued_total").increment(1);
                debug!("Click event queued");
            }
            Err(TrySendError::Full(event)) => {
                counter!("click_events_dropped_total", "reason" => "queue_full").increment(1);
                warn!(
                    link_id = event.link_id,
                    code = %event.code,
                    "Click queue is full, dropping click event"
                );
            }
            Err(TrySendError::Closed(event)) => {
                counter!("click_events_dropped_total", "reason" => "closed").increment(1);
                warn!(
                    link_id = event.link_id,
                    code = %event.code,
                    "Click worker is gone, dropping click event"
                );
            }
        }
    }
}
