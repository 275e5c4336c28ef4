#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::{ConnectInfo, Request};
use axum::routing::IntoMakeService;
use axum::{Router, ServiceExt};
use serde_json::json;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower::Layer;
use tower_http::normalize_path::NormalizePath;

use link_redirector::application::click_worker::run_click_worker;
use link_redirector::prelude::*;
use link_redirector::routes::app_router;

pub const PEER_ADDR: &str = "198.51.100.20:40000";

/// Link store backed by a map. The decrement holds the lock for the whole
/// check-and-update, like the row lock of the real store.
#[derive(Default)]
pub struct InMemoryLinkRepository {
    links: Mutex<HashMap<String, Link>>,
    fail_lookups: bool,
}

impl InMemoryLinkRepository {
    pub fn with_links(links: impl IntoIterator<Item = Link>) -> Self {
        Self {
            links: Mutex::new(links.into_iter().map(|l| (l.code.clone(), l)).collect()),
            fail_lookups: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            links: Mutex::default(),
            fail_lookups: true,
        }
    }

    pub fn remaining_clicks(&self, code: &str) -> Option<i32> {
        self.links
            .lock()
            .unwrap()
            .get(code)
            .and_then(|l| l.remaining_clicks)
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        if self.fail_lookups {
            return Err(AppError::store_unavailable(
                "Database error",
                json!({ "reason": "connection refused" }),
            ));
        }
        Ok(self.links.lock().unwrap().get(code).cloned())
    }

    async fn decrement_remaining_clicks(&self, link_id: i64) -> Result<bool, AppError> {
        let mut links = self.links.lock().unwrap();
        let link = links.values_mut().find(|l| l.id == link_id);

        match link.and_then(|l| l.remaining_clicks.as_mut()) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Click store that keeps every record in memory.
#[derive(Default)]
pub struct InMemoryStatsRepository {
    clicks: Mutex<Vec<Click>>,
    delay: Option<Duration>,
}

impl InMemoryStatsRepository {
    /// A store whose inserts take `delay` to complete.
    pub fn slow(delay: Duration) -> Self {
        Self {
            clicks: Mutex::default(),
            delay: Some(delay),
        }
    }

    pub fn clicks(&self) -> Vec<Click> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.clicks.lock().unwrap().len()
    }
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    async fn record_click(&self, new_click: NewClick) -> Result<Click, AppError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let click = Click {
            id: new_click.id,
            link_id: new_click.link_id,
            clicked_at: new_click.clicked_at,
            ip: new_click.ip,
            user_agent: new_click.user_agent,
            referer: new_click.referer,
            country: new_click.country,
            device_type: new_click.device_type,
        };
        self.clicks.lock().unwrap().push(click.clone());
        Ok(click)
    }
}

/// Enricher that always fails, like an unreachable lookup service.
pub struct FailingEnricher;

#[async_trait]
impl GeoEnricher for FailingEnricher {
    async fn lookup(&self, _ip: IpAddr, _timeout: Duration) -> Result<GeoInfo, AppError> {
        Err(AppError::enrichment_failed("service unavailable"))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Enricher that answers every lookup with the same result.
pub struct FixedEnricher(pub GeoInfo);

#[async_trait]
impl GeoEnricher for FixedEnricher {
    async fn lookup(&self, _ip: IpAddr, _timeout: Duration) -> Result<GeoInfo, AppError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

type TestAccountant = ClickAccountant<dyn LinkRepository, dyn StatsRepository>;

/// The production router with a fixed peer address.
pub type TestApp = IntoMakeService<MockConnectInfoService<NormalizePath<Router>>>;

/// Everything a redirect test needs: state for the router, the stores to
/// assert against and the click worker.
pub struct TestHarness {
    pub state: AppState,
    pub links: Arc<InMemoryLinkRepository>,
    pub stats: Arc<InMemoryStatsRepository>,
    worker: Mutex<Option<JoinHandle<()>>>,
    pending: Mutex<Option<(mpsc::Receiver<ClickEvent>, Arc<TestAccountant>)>>,
}

impl TestHarness {
    pub fn new(links: InMemoryLinkRepository) -> Self {
        Self::build(links, Arc::new(FailingEnricher), false)
    }

    pub fn build(
        links: InMemoryLinkRepository,
        enricher: Arc<dyn GeoEnricher>,
        behind_proxy: bool,
    ) -> Self {
        let harness = Self::paused(links, enricher, behind_proxy);
        harness.start_worker();
        harness
    }

    /// Like [`TestHarness::build`], but click jobs stay queued until
    /// [`TestHarness::start_worker`] is called.
    pub fn paused(
        links: InMemoryLinkRepository,
        enricher: Arc<dyn GeoEnricher>,
        behind_proxy: bool,
    ) -> Self {
        let links = Arc::new(links);
        let stats = Arc::new(InMemoryStatsRepository::default());

        let link_repository: Arc<dyn LinkRepository> = links.clone();
        let stats_repository: Arc<dyn StatsRepository> = stats.clone();

        let accountant = Arc::new(ClickAccountant::new(
            link_repository.clone(),
            stats_repository,
            enricher,
        ));

        let (tx, rx) = mpsc::channel(1_000);
        let service = Arc::new(RedirectService::new(LinkResolver::new(link_repository), tx));

        Self {
            state: AppState::new(service, behind_proxy),
            links,
            stats,
            worker: Mutex::new(None),
            pending: Mutex::new(Some((rx, accountant))),
        }
    }

    /// Spawns the click worker. Does nothing if it is already running.
    pub fn start_worker(&self) {
        if let Some((rx, accountant)) = self.pending.lock().unwrap().take() {
            let handle = tokio::spawn(run_click_worker(rx, accountant, 4));
            *self.worker.lock().unwrap() = Some(handle);
        }
    }

    pub fn router(&self) -> TestApp {
        let app = MockConnectInfoLayer.layer(app_router(self.state.clone()));
        ServiceExt::<Request>::into_make_service(app)
    }

    /// Waits until `expected` clicks are recorded or two seconds pass.
    pub async fn wait_for_clicks(&self, expected: usize) -> usize {
        for _ in 0..200 {
            if self.stats.len() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.stats.len()
    }
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let addr: SocketAddr = PEER_ADDR.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
