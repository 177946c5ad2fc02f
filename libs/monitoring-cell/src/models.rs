// =====================================================================================
// MONITORING CELL MODELS
// =====================================================================================

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use shared_database::DatabaseError;

/// Ordered so that `max` yields the worst status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

impl From<Option<AlertSeverity>> for HealthStatus {
    fn from(severity: Option<AlertSeverity>) -> Self {
        match severity {
            None => HealthStatus::Healthy,
            Some(AlertSeverity::Warning) => HealthStatus::Degraded,
            Some(AlertSeverity::Critical) => HealthStatus::Unhealthy,
        }
    }
}

pub const UNAVAILABLE: &str = "unavailable";

/// A single observation. Failed probes report `Unavailable` instead of dropping the key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Unavailable,
}

impl MetricValue {
    /// Non-finite observations cannot be classified and are reported as unavailable.
    pub fn observed(value: f64) -> Self {
        if value.is_finite() {
            MetricValue::Number(value)
        } else {
            MetricValue::Unavailable
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, MetricValue::Unavailable)
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Number(value) => serializer.serialize_f64(*value),
            MetricValue::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HealthMetrics(BTreeMap<String, MetricValue>);

impl HealthMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: MetricValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<MetricValue> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MetricValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, MetricValue)> for HealthMetrics {
    fn from_iter<I: IntoIterator<Item = (K, MetricValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, value)| (name.into(), value)).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentProbeResult {
    pub name: String,
    pub status: HealthStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub metrics: HealthMetrics,
    pub timestamp: DateTime<Utc>,
    pub checked_components: Vec<ComponentProbeResult>,
    /// Set only when the check could not be aggregated at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ThresholdExceeded,
    ProbeUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub kind: AlertKind,
    pub metric: String,
    pub value: Option<f64>,
    pub threshold: Option<f64>,
    pub message: String,
}

impl Alert {
    pub fn probe_unavailable(metric: &str) -> Self {
        Self {
            severity: AlertSeverity::Critical,
            kind: AlertKind::ProbeUnavailable,
            metric: metric.to_string(),
            value: None,
            threshold: None,
            message: format!("Probe unavailable: no observation for {}", metric),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertComparison {
    /// Alert when the value is at or above the threshold.
    AtLeast,
    /// Alert when the value is at or below the threshold.
    AtMost,
}

impl AlertComparison {
    pub fn crossed(&self, value: f64, threshold: f64) -> bool {
        match self {
            AlertComparison::AtLeast => value >= threshold,
            AlertComparison::AtMost => value <= threshold,
        }
    }
}

/// One threshold rule. The message template may use `{metric}`, `{value}`,
/// `{threshold}` and `{severity}`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRule {
    pub metric: String,
    pub comparison: AlertComparison,
    pub warning: f64,
    pub critical: f64,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    pub warning: u32,
    pub critical: u32,
}

impl AlertSummary {
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        alerts.iter().fold(Self::default(), |mut summary, alert| {
            match alert.severity {
                AlertSeverity::Warning => summary.warning += 1,
                AlertSeverity::Critical => summary.critical += 1,
            }
            summary
        })
    }
}

// Response models

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub metrics: HealthMetrics,
    pub timestamp: DateTime<Utc>,
    pub checked_components: Vec<ComponentProbeResult>,
    pub alerts: Vec<Alert>,
    pub version: String,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn new(
        result: HealthCheckResult,
        alerts: Vec<Alert>,
        version: &str,
        environment: &str,
    ) -> Self {
        Self {
            status: result.status,
            metrics: result.metrics,
            timestamp: result.timestamp,
            checked_components: result.checked_components,
            alerts,
            version: version.to_string(),
            environment: environment.to_string(),
            error: result.error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<Alert>,
    pub summary: AlertSummary,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UnhealthyResponse {
    pub status: HealthStatus,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum MonitoringError {
    #[error("Tenant client unavailable: {0}")]
    TenantClient(#[from] DatabaseError),
    #[error("Unknown component: {0}")]
    UnknownComponent(String),
    #[error("Missing parameter: {0}")]
    MissingParameter(String),
}
