//! Asynchronous click accounting: budget consumption and click persistence.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::domain::click_event::{ClickEvent, RequestMetadata};
use crate::domain::entities::NewClick;
use crate::domain::geo::{GeoEnricher, GeoInfo};
use crate::domain::repositories::{LinkRepository, StatsRepository};
use crate::error::AppError;

/// Default deadline for one accounting job.
pub const DEFAULT_ACCOUNTING_TIMEOUT: Duration = Duration::from_secs(3);
/// Default and maximum timeout for one enrichment lookup.
pub const DEFAULT_ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Records clicks off the redirect path.
///
/// Each job runs two independent, best-effort sub-tasks concurrently:
///
/// - **Budget**: one atomic conditional decrement for links with a finite budget
/// - **Stats**: optional enrichment followed by one click insert
///
/// Failures are logged and counted, never retried and never reported to the
/// client that triggered the redirect. The whole job is bounded by its own
/// deadline, independent of the inbound request.
pub struct ClickAccountant<L, S>
where
    L: LinkRepository + ?Sized,
    S: StatsRepository + ?Sized,
{
    link_repository: Arc<L>,
    stats_repository: Arc<S>,
    enricher: Arc<dyn GeoEnricher>,
    deadline: Duration,
    enrichment_timeout: Duration,
}

impl<L, S> ClickAccountant<L, S>
where
    L: LinkRepository + ?Sized,
    S: StatsRepository + ?Sized,
{
    /// Creates an accountant with the default deadlines.
    pub fn new(
        link_repository: Arc<L>,
        stats_repository: Arc<S>,
        enricher: Arc<dyn GeoEnricher>,
    ) -> Self {
        Self {
            link_repository,
            stats_repository,
            enricher,
            deadline: DEFAULT_ACCOUNTING_TIMEOUT,
            enrichment_timeout: DEFAULT_ENRICHMENT_TIMEOUT,
        }
    }

    /// Sets the deadline for a whole accounting job.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Sets the enrichment timeout, capped at [`DEFAULT_ENRICHMENT_TIMEOUT`].
    pub fn with_enrichment_timeout(mut self, timeout: Duration) -> Self {
        self.enrichment_timeout = timeout.min(DEFAULT_ENRICHMENT_TIMEOUT);
        self
    }

    /// Accounts for one successful redirect.
    ///
    /// Never fails: every error is logged and swallowed. If the deadline
    /// elapses the outstanding store and network calls are dropped.
    pub async fn account(&self, event: ClickEvent) {
        let work = async {
            tokio::join!(self.consume_budget(&event), self.record_click(&event))
        };

        match tokio::time::timeout(self.deadline, work).await {
            Ok((budget, recorded)) => {
                if let Err(e) = budget {
                    warn!(
                        link_id = event.link_id,
                        code = %event.code,
                        error = %e,
                        "Failed to decrement click budget"
                    );
                }
                if let Err(e) = recorded {
                    warn!(
                        link_id = event.link_id,
                        code = %event.code,
                        error = %e,
                        "Failed to record click"
                    );
                }
            }
            Err(_) => {
                counter!("click_accounting_timeouts_total").increment(1);
                warn!(
                    link_id = event.link_id,
                    code = %event.code,
                    deadline_ms = self.deadline.as_millis() as u64,
                    "Click accounting deadline elapsed, abandoning remaining work"
                );
            }
        }
    }

    /// Consumes one unit of the link's click budget, if it has one.
    async fn consume_budget(&self, event: &ClickEvent) -> Result<(), AppError> {
        if !event.has_click_budget {
            return Ok(());
        }

        match self
            .link_repository
            .decrement_remaining_clicks(event.link_id)
            .await
        {
            Ok(true) => {
                counter!("click_budget_decrements_total", "result" => "applied").increment(1);
                debug!(link_id = event.link_id, "Click budget decremented");
                Ok(())
            }
            Ok(false) => {
                counter!("click_budget_decrements_total", "result" => "noop").increment(1);
                debug!(
                    link_id = event.link_id,
                    "Click budget already exhausted, nothing to decrement"
                );
                Ok(())
            }
            Err(e) => {
                counter!("click_budget_decrements_total", "result" => "failed").increment(1);
                Err(e)
            }
        }
    }

    /// Builds, optionally enriches and persists the click record.
    async fn record_click(&self, event: &ClickEvent) -> Result<(), AppError> {
        let geo = self.enrich(&event.metadata).await;
        let new_click = build_click(event, geo);

        match self.stats_repository.record_click(new_click).await {
            Ok(click) => {
                counter!("click_events_recorded_total").increment(1);
                info!(link_id = click.link_id, click_id = %click.id, "Recorded link click");
                Ok(())
            }
            Err(e) => {
                counter!("click_events_failed_total").increment(1);
                Err(AppError::AccountingPersistFailed(e.to_string()))
            }
        }
    }

    /// Runs one time-boxed lookup when hints are missing.
    ///
    /// Returns `None` on any failure so persistence always proceeds.
    async fn enrich(&self, metadata: &RequestMetadata) -> Option<GeoInfo> {
        if !metadata.needs_enrichment() {
            return None;
        }
        let ip = metadata.ip?;

        let lookup = self.enricher.lookup(ip, self.enrichment_timeout);
        match tokio::time::timeout(self.enrichment_timeout, lookup).await {
            Ok(Ok(info)) => {
                counter!("click_enrichment_total", "result" => "ok").increment(1);
                Some(info)
            }
            Ok(Err(e)) => {
                counter!("click_enrichment_total", "result" => "failed").increment(1);
                debug!(%ip, provider = self.enricher.name(), error = %e, "Skipping enrichment");
                None
            }
            Err(_) => {
                counter!("click_enrichment_total", "result" => "timeout").increment(1);
                debug!(%ip, provider = self.enricher.name(), "Enrichment lookup timed out");
                None
            }
        }
    }
}

/// Merges request metadata with an optional lookup result.
///
/// Enrichment is additive only: it fills the country and device when the
/// request did not supply them and never overwrites a supplied value.
fn build_click(event: &ClickEvent, geo: Option<GeoInfo>) -> NewClick {
    let metadata = &event.metadata;
    let mut click = NewClick::new(event.link_id, event.received_at);

    click.ip = metadata.ip.map(|ip| ip.to_string());
    click.user_agent = metadata.user_agent.clone();
    click.referer = metadata.referer.clone();
    click.country = metadata.country.clone();
    click.device_type = metadata.device_type;

    if let Some(geo) = geo {
        if click.country.is_none() {
            click.country = geo.country.clone();
        }
        if click.device_type.is_none() {
            click.device_type = Some(geo.device_type());
        }
    }

    click
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Click, DeviceType};
    use crate::domain::geo::MockGeoEnricher;
    use crate::domain::repositories::{MockLinkRepository, MockStatsRepository};
    use serde_json::json;
    use std::sync::Mutex;

    fn public_metadata() -> RequestMetadata {
        RequestMetadata {
            ip: Some("8.8.8.8".parse().unwrap()),
            user_agent: Some("curl/8.4.0".to_string()),
            referer: Some("https://news.ycombinator.com".to_string()),
            country: None,
            device_type: Some(DeviceType::Desktop),
        }
    }

    fn stored(new_click: NewClick) -> Click {
        Click {
            id: new_click.id,
            link_id: new_click.link_id,
            clicked_at: new_click.clicked_at,
            ip: new_click.ip,
            user_agent: new_click.user_agent,
            referer: new_click.referer,
            country: new_click.country,
            device_type: new_click.device_type,
        }
    }

    fn capturing_stats(captured: Arc<Mutex<Vec<NewClick>>>) -> MockStatsRepository {
        let mut mock_stats = MockStatsRepository::new();
        mock_stats.expect_record_click().times(1).returning(move |c| {
            captured.lock().unwrap().push(c.clone());
            Ok(stored(c))
        });
        mock_stats
    }

    fn failing_enricher() -> MockGeoEnricher {
        let mut enricher = MockGeoEnricher::new();
        enricher
            .expect_lookup()
            .returning(|_, _| Err(AppError::enrichment_failed("service unavailable")));
        enricher.expect_name().return_const("mock");
        enricher
    }

    #[tokio::test]
    async fn test_budgeted_link_decrements_and_records() {
        let mut mock_links = MockLinkRepository::new();
        mock_links
            .expect_decrement_remaining_clicks()
            .withf(|id| *id == 42)
            .times(1)
            .returning(|_| Ok(true));

        let captured = Arc::new(Mutex::new(Vec::new()));
        let accountant = ClickAccountant::new(
            Arc::new(mock_links),
            Arc::new(capturing_stats(captured.clone())),
            Arc::new(failing_enricher()),
        );

        accountant
            .account(ClickEvent::new(42, "abc123", true, public_metadata()))
            .await;

        let clicks = captured.lock().unwrap();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].link_id, 42);
        assert_eq!(clicks[0].ip.as_deref(), Some("8.8.8.8"));
        assert_eq!(clicks[0].user_agent.as_deref(), Some("curl/8.4.0"));
    }

    #[tokio::test]
    async fn test_unlimited_link_skips_decrement() {
        let mut mock_links = MockLinkRepository::new();
        mock_links.expect_decrement_remaining_clicks().times(0);

        let captured = Arc::new(Mutex::new(Vec::new()));
        let accountant = ClickAccountant::new(
            Arc::new(mock_links),
            Arc::new(capturing_stats(captured.clone())),
            Arc::new(failing_enricher()),
        );

        accountant
            .account(ClickEvent::new(7, "free", false, public_metadata()))
            .await;

        assert_eq!(captured.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_decrement_failure_does_not_block_persistence() {
        let mut mock_links = MockLinkRepository::new();
        mock_links
            .expect_decrement_remaining_clicks()
            .times(1)
            .returning(|_| Err(AppError::store_unavailable("Database error", json!({}))));

        let captured = Arc::new(Mutex::new(Vec::new()));
        let accountant = ClickAccountant::new(
            Arc::new(mock_links),
            Arc::new(capturing_stats(captured.clone())),
            Arc::new(failing_enricher()),
        );

        accountant
            .account(ClickEvent::new(1, "abc123", true, public_metadata()))
            .await;

        assert_eq!(captured.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_swallowed() {
        let mut mock_links = MockLinkRepository::new();
        mock_links
            .expect_decrement_remaining_clicks()
            .times(1)
            .returning(|_| Ok(true));

        let mut mock_stats = MockStatsRepository::new();
        mock_stats
            .expect_record_click()
            .times(1)
            .returning(|_| Err(AppError::store_unavailable("Database error", json!({}))));

        let accountant = ClickAccountant::new(
            Arc::new(mock_links),
            Arc::new(mock_stats),
            Arc::new(failing_enricher()),
        );

        accountant
            .account(ClickEvent::new(1, "abc123", true, public_metadata()))
            .await;
    }

    #[tokio::test]
    async fn test_failed_enrichment_still_persists_without_geo() {
        let mock_links = MockLinkRepository::new();
        let captured = Arc::new(Mutex::new(Vec::new()));

        let mut enricher = MockGeoEnricher::new();
        enricher
            .expect_lookup()
            .times(1)
            .returning(|_, _| Err(AppError::enrichment_failed("timeout")));
        enricher.expect_name().return_const("mock");

        let accountant = ClickAccountant::new(
            Arc::new(mock_links),
            Arc::new(capturing_stats(captured.clone())),
            Arc::new(enricher),
        );

        accountant
            .account(ClickEvent::new(5, "abc123", false, public_metadata()))
            .await;

        let clicks = captured.lock().unwrap();
        assert_eq!(clicks.len(), 1);
        assert!(clicks[0].country.is_none());
        assert_eq!(clicks[0].device_type, Some(DeviceType::Desktop));
    }

    #[tokio::test]
    async fn test_enrichment_fills_missing_fields_only() {
        let mock_links = MockLinkRepository::new();
        let captured = Arc::new(Mutex::new(Vec::new()));

        let mut enricher = MockGeoEnricher::new();
        enricher.expect_lookup().times(1).returning(|_, _| {
            Ok(GeoInfo {
                country: Some("US".to_string()),
                is_mobile: true,
            })
        });
        enricher.expect_name().return_const("mock");

        let accountant = ClickAccountant::new(
            Arc::new(mock_links),
            Arc::new(capturing_stats(captured.clone())),
            Arc::new(enricher),
        );

        accountant
            .account(ClickEvent::new(5, "abc123", false, public_metadata()))
            .await;

        let clicks = captured.lock().unwrap();
        assert_eq!(clicks[0].country.as_deref(), Some("US"));
        // The user agent said desktop; the mobile network flag does not override it.
        assert_eq!(clicks[0].device_type, Some(DeviceType::Desktop));
    }

    #[tokio::test]
    async fn test_enrichment_skipped_when_hints_present() {
        let mock_links = MockLinkRepository::new();
        let captured = Arc::new(Mutex::new(Vec::new()));

        let mut enricher = MockGeoEnricher::new();
        enricher.expect_lookup().times(0);

        let mut metadata = public_metadata();
        metadata.country = Some("FR".to_string());

        let accountant = ClickAccountant::new(
            Arc::new(mock_links),
            Arc::new(capturing_stats(captured.clone())),
            Arc::new(enricher),
        );

        accountant
            .account(ClickEvent::new(5, "abc123", false, metadata))
            .await;

        assert_eq!(captured.lock().unwrap()[0].country.as_deref(), Some("FR"));
    }

    #[tokio::test]
    async fn test_enrichment_skipped_without_ip() {
        let mock_links = MockLinkRepository::new();
        let captured = Arc::new(Mutex::new(Vec::new()));

        let mut enricher = MockGeoEnricher::new();
        enricher.expect_lookup().times(0);

        let mut metadata = public_metadata();
        metadata.ip = None;

        let accountant = ClickAccountant::new(
            Arc::new(mock_links),
            Arc::new(capturing_stats(captured.clone())),
            Arc::new(enricher),
        );

        accountant
            .account(ClickEvent::new(5, "abc123", false, metadata))
            .await;

        assert!(captured.lock().unwrap()[0].ip.is_none());
    }

    #[test]
    fn test_build_click_uses_enricher_device_when_missing() {
        let metadata = RequestMetadata {
            ip: Some("8.8.4.4".parse().unwrap()),
            ..Default::default()
        };
        let event = ClickEvent::new(9, "abc", false, metadata);

        let click = build_click(
            &event,
            Some(GeoInfo {
                country: Some("ID".to_string()),
                is_mobile: true,
            }),
        );

        assert_eq!(click.link_id, 9);
        assert_eq!(click.clicked_at, event.received_at);
        assert_eq!(click.country.as_deref(), Some("ID"));
        assert_eq!(click.device_type, Some(DeviceType::Mobile));
    }

    #[test]
    fn test_enrichment_timeout_is_capped() {
        let accountant = ClickAccountant::new(
            Arc::new(MockLinkRepository::new()),
            Arc::new(MockStatsRepository::new()),
            Arc::new(MockGeoEnricher::new()),
        )
        .with_enrichment_timeout(Duration::from_secs(30));

        assert_eq!(accountant.enrichment_timeout, DEFAULT_ENRICHMENT_TIMEOUT);
    }
}
