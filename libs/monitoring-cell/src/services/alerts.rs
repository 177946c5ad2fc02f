// =====================================================================================
// ALERT RULES
// =====================================================================================

use crate::models::{
    Alert, AlertComparison, AlertKind, AlertRule, AlertSeverity, HealthMetrics, MetricValue,
};
use crate::services::probes::metric_names;

impl AlertRule {
    pub fn at_least(metric: &str, warning: f64, critical: f64, message: &str) -> Self {
        Self {
            metric: metric.to_string(),
            comparison: AlertComparison::AtLeast,
            warning,
            critical,
            message: message.to_string(),
        }
    }

    pub fn at_most(metric: &str, warning: f64, critical: f64, message: &str) -> Self {
        Self {
            metric: metric.to_string(),
            comparison: AlertComparison::AtMost,
            warning,
            critical,
            message: message.to_string(),
        }
    }

    /// Critical supersedes warning for the same value.
    pub fn classify(&self, value: f64) -> Option<AlertSeverity> {
        if self.comparison.crossed(value, self.critical) {
            Some(AlertSeverity::Critical)
        } else if self.comparison.crossed(value, self.warning) {
            Some(AlertSeverity::Warning)
        } else {
            None
        }
    }

    fn threshold(&self, severity: AlertSeverity) -> f64 {
        match severity {
            AlertSeverity::Warning => self.warning,
            AlertSeverity::Critical => self.critical,
        }
    }

    fn render(&self, severity: AlertSeverity, value: f64) -> String {
        self.message
            .replace("{metric}", &self.metric)
            .replace("{value}", &format!("{:.2}", value))
            .replace("{threshold}", &format!("{:.2}", self.threshold(severity)))
            .replace("{severity}", &severity.to_string())
    }

    fn alert(&self, severity: AlertSeverity, value: f64) -> Alert {
        Alert {
            severity,
            kind: AlertKind::ThresholdExceeded,
            metric: self.metric.clone(),
            value: Some(value),
            threshold: Some(self.threshold(severity)),
            message: self.render(severity, value),
        }
    }
}

/// Ordered rule table, one rule per metric. Evaluation and output follow declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRules {
    rules: Vec<AlertRule>,
}

impl Default for AlertRules {
    fn default() -> Self {
        Self::new(vec![
            AlertRule::at_least(
                metric_names::STORAGE_LATENCY_MS,
                500.0,
                2000.0,
                "Storage latency {value}ms reached the {severity} threshold of {threshold}ms",
            ),
            AlertRule::at_least(
                metric_names::ACTIVE_SESSIONS,
                800.0,
                1000.0,
                "Active sessions {value} reached the {severity} threshold of {threshold}",
            ),
            AlertRule::at_least(
                metric_names::STORAGE_UTILIZATION,
                0.80,
                0.95,
                "Storage utilization {value} reached the {severity} threshold of {threshold}",
            ),
        ])
    }
}

impl AlertRules {
    pub fn new(rules: Vec<AlertRule>) -> Self {
        Self { rules }
    }

    pub fn rule_for(&self, metric: &str) -> Option<&AlertRule> {
        self.rules.iter().find(|rule| rule.metric == metric)
    }

    /// Severity of a single observation, `None` when no rule covers the metric.
    pub fn classify(&self, metric: &str, value: f64) -> Option<AlertSeverity> {
        self.rule_for(metric).and_then(|rule| rule.classify(value))
    }

    /// Pure evaluation of the rule table against one set of metrics.
    ///
    /// Unavailable metrics always yield a critical probe-unavailable alert; those not
    /// covered by any rule follow the rule-table alerts in metric-name order.
    pub fn check_alerts(&self, metrics: &HealthMetrics) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for rule in &self.rules {
            match metrics.get(&rule.metric) {
                None => {}
                Some(MetricValue::Unavailable) => {
                    alerts.push(Alert::probe_unavailable(&rule.metric))
                }
                Some(MetricValue::Number(value)) => {
                    if let Some(severity) = rule.classify(value) {
                        alerts.push(rule.alert(severity, value));
                    }
                }
            }
        }

        alerts.extend(
            metrics
                .iter()
                .filter(|(name, value)| value.is_unavailable() && self.rule_for(name).is_none())
                .map(|(name, _)| Alert::probe_unavailable(name)),
        );

        alerts
    }
}
