// =====================================================================================
// HEALTH MONITORING SERVICE
// =====================================================================================

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, error, info, instrument};

use crate::models::{
    Alert, ComponentProbeResult, HealthCheckResult, HealthMetrics, HealthStatus, MetricValue,
};
use crate::services::alerts::AlertRules;
use crate::services::probes::{run_probe, ProbeKind, ProbeOutcome};
use shared_config::AppConfig;
use shared_database::TenantStore;

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_CHECK_BUDGET: Duration = Duration::from_secs(10);

/// Health checks for one tenant. Holds no state between calls; build one per request.
pub struct MonitoringService {
    store: Arc<dyn TenantStore>,
    rules: AlertRules,
    probe_timeout: Duration,
    check_budget: Duration,
}

impl MonitoringService {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self {
            store,
            rules: AlertRules::default(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            check_budget: DEFAULT_CHECK_BUDGET,
        }
    }

    pub fn from_config(store: Arc<dyn TenantStore>, config: &AppConfig) -> Self {
        Self::new(store)
            .with_probe_timeout(config.probe_timeout())
            .with_check_budget(config.check_budget())
    }

    pub fn with_rules(mut self, rules: AlertRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    pub fn with_check_budget(mut self, check_budget: Duration) -> Self {
        self.check_budget = check_budget;
        self
    }

    pub fn tenant_id(&self) -> &str {
        self.store.tenant_id()
    }

    /// Per-probe limit. Never longer than the check budget, so a slow probe fails on
    /// its own while the probes that finished keep their results.
    pub fn probe_limit(&self) -> Duration {
        self.probe_timeout.min(self.check_budget)
    }

    /// Probes every component concurrently and aggregates the outcome.
    ///
    /// Always answers within the check budget: probe failures and overruns are folded into
    /// their own component, and a check that cannot be scheduled yields a terminal
    /// unhealthy result.
    #[instrument(skip(self), fields(tenant = %self.store.tenant_id()))]
    pub async fn get_health_check(&self) -> HealthCheckResult {
        let timestamp = Utc::now();

        if !runtime_available() {
            error!("No async runtime available to schedule probes");
            return self
                .terminal_result(timestamp, "no async runtime available to schedule probes");
        }

        let limit = self.probe_limit();
        debug!(
            probes = ProbeKind::ALL.len(),
            limit_ms = limit.as_millis() as u64,
            "Probing components"
        );

        let probes = ProbeKind::ALL.map(|kind| run_probe(kind, self.store.clone(), limit));
        let outcomes = join_all(probes).await;

        let result = self.aggregate(timestamp, ProbeKind::ALL.into_iter().zip(outcomes));
        info!(status = ?result.status, "Health check aggregated");

        result
    }

    /// Runs a single named probe; `None` for components outside the probe set.
    #[instrument(skip(self), fields(tenant = %self.store.tenant_id()))]
    pub async fn probe_component(&self, name: &str) -> Option<ComponentProbeResult> {
        let kind = ProbeKind::from_component(name)?;

        if !runtime_available() {
            return Some(unhealthy_component(kind, "no async runtime available to schedule probes"));
        }

        let outcome = run_probe(kind, self.store.clone(), self.probe_limit()).await;
        let (component, _) = self.fold_outcome(kind, outcome);

        Some(component)
    }

    /// Pure: the same metrics always produce the same alerts, in rule-table order.
    pub fn check_alerts(&self, metrics: &HealthMetrics) -> Vec<Alert> {
        self.rules.check_alerts(metrics)
    }

    fn aggregate(
        &self,
        timestamp: DateTime<Utc>,
        outcomes: impl IntoIterator<Item = (ProbeKind, ProbeOutcome)>,
    ) -> HealthCheckResult {
        let mut metrics = HealthMetrics::new();
        let mut checked_components = Vec::new();

        for (kind, outcome) in outcomes {
            let (component, metric) = self.fold_outcome(kind, outcome);
            metrics.insert(kind.metric(), metric);
            checked_components.push(component);
        }

        HealthCheckResult {
            status: overall_status(&checked_components),
            metrics,
            timestamp,
            checked_components,
            error: None,
        }
    }

    fn fold_outcome(
        &self,
        kind: ProbeKind,
        outcome: ProbeOutcome,
    ) -> (ComponentProbeResult, MetricValue) {
        let latency_ms = outcome.latency().as_millis() as u64;

        match outcome {
            ProbeOutcome::Completed { value, .. } => {
                let metric = MetricValue::observed(value);
                let (status, error) = match metric {
                    MetricValue::Number(value) => {
                        (HealthStatus::from(self.rules.classify(kind.metric(), value)), None)
                    }
                    MetricValue::Unavailable => {
                        (HealthStatus::Unhealthy, Some("non-finite observation".to_string()))
                    }
                };

                let component = ComponentProbeResult {
                    name: kind.component().to_string(),
                    status,
                    latency_ms,
                    error,
                };
                (component, metric)
            }
            ProbeOutcome::Failed { error, .. } => {
                let component = ComponentProbeResult {
                    name: kind.component().to_string(),
                    status: HealthStatus::Unhealthy,
                    latency_ms,
                    error: Some(error),
                };
                (component, MetricValue::Unavailable)
            }
        }
    }

    fn terminal_result(&self, timestamp: DateTime<Utc>, error: &str) -> HealthCheckResult {
        HealthCheckResult {
            status: HealthStatus::Unhealthy,
            metrics: ProbeKind::ALL
                .into_iter()
                .map(|kind| (kind.metric(), MetricValue::Unavailable))
                .collect(),
            timestamp,
            checked_components: ProbeKind::ALL
                .into_iter()
                .map(|kind| unhealthy_component(kind, error))
                .collect(),
            error: Some(error.to_string()),
        }
    }
}

/// Worst component status; an empty probe set is healthy.
pub fn overall_status(components: &[ComponentProbeResult]) -> HealthStatus {
    components
        .iter()
        .map(|component| component.status)
        .max()
        .unwrap_or(HealthStatus::Healthy)
}

fn unhealthy_component(kind: ProbeKind, error: &str) -> ComponentProbeResult {
    ComponentProbeResult {
        name: kind.component().to_string(),
        status: HealthStatus::Unhealthy,
        latency_ms: 0,
        error: Some(error.to_string()),
    }
}

fn runtime_available() -> bool {
    tokio::runtime::Handle::try_current().is_ok()
}
