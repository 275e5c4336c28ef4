//! HTTP server initialization and runtime setup.
//!
//! Handles the database pool, the click worker and the Axum server lifecycle.

use crate::application::click_worker::run_click_worker;
use crate::application::services::{ClickAccountant, LinkResolver, RedirectService};
use crate::config::Config;
use crate::domain::geo::GeoEnricher;
use crate::domain::repositories::{LinkRepository, StatsRepository};
use crate::infrastructure::geo::{IpApiEnricher, NullEnricher};
use crate::infrastructure::persistence::{PgLinkRepository, PgStatsRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Geo enricher (or the disabled no-op)
/// - Background click worker
/// - Axum HTTP server
///
/// On SIGINT or SIGTERM the server stops accepting connections, finishes
/// in-flight requests, then gives the click worker up to
/// `SHUTDOWN_GRACE_SECONDS` to drain queued jobs.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Some(Duration::from_secs(config.db_idle_timeout)))
        .max_lifetime(Some(Duration::from_secs(config.db_max_lifetime)))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let enricher: Arc<dyn GeoEnricher> = if config.geo_lookup_enabled {
        let enricher = IpApiEnricher::new(config.geo_api_url.clone(), config.geo_timeout())
            .context("Failed to build geo enricher")?;
        info!("Geo enrichment enabled");
        Arc::new(enricher)
    } else {
        info!("Geo enrichment disabled");
        Arc::new(NullEnricher)
    };

    let pool = Arc::new(pool);
    let link_repository: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(pool.clone()));
    let stats_repository: Arc<dyn StatsRepository> =
        Arc::new(PgStatsRepository::new(pool.clone()));

    let accountant = Arc::new(
        ClickAccountant::new(link_repository.clone(), stats_repository, enricher)
            .with_deadline(config.accounting_timeout())
            .with_enrichment_timeout(config.geo_timeout()),
    );

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
    let worker = tokio::spawn(run_click_worker(
        click_rx,
        accountant,
        config.click_worker_concurrency,
    ));

    let redirect_service = Arc::new(RedirectService::new(
        LinkResolver::new(link_repository),
        click_tx,
    ));
    let state = AppState::new(redirect_service, config.behind_proxy);

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router, and with it every click sender, is gone once `serve`
    // returns, so the worker sees a closed channel and drains.
    info!("HTTP server stopped, draining click worker");
    match tokio::time::timeout(config.shutdown_grace(), worker).await {
        Ok(Ok(())) => info!("Click worker drained"),
        Ok(Err(e)) => error!(error = %e, "Click worker task failed"),
        Err(_) => warn!(
            grace_seconds = config.shutdown_grace_seconds,
            "Click worker did not drain in time, abandoning queued clicks"
        ),
    }

    pool.close().await;
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
