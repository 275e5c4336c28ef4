//! Background consumer of click jobs.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::application::services::ClickAccountant;
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::{LinkRepository, StatsRepository};

/// Consumes click jobs until every sender is dropped.
///
/// At most `concurrency` jobs are accounted at once. When the channel
/// closes the worker stops taking new jobs, waits for the in-flight ones
/// and returns.
pub async fn run_click_worker<L, S>(
    mut rx: mpsc::Receiver<ClickEvent>,
    accountant: Arc<ClickAccountant<L, S>>,
    concurrency: usize,
) where
    L: LinkRepository + ?Sized + 'static,
    S: StatsRepository + ?Sized + 'static,
{
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut in_flight = JoinSet::new();

    info!(concurrency, "Click worker started");

    while let Some(event) = rx.recv().await {
        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                error!(error = %e, "Click worker semaphore closed");
                break;
            }
        };

        let accountant = accountant.clone();
        in_flight.spawn(async move {
            accountant.account(event).await;
            drop(permit);
        });

        // Reap finished jobs so the set does not grow with uptime.
        while let Some(joined) = in_flight.try_join_next() {
            log_join_error(joined);
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        log_join_error(joined);
    }

    info!("Click worker drained and stopped");
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "Click accounting task failed");
    }
}
