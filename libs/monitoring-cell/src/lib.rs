// =====================================================================================
// MONITORING CELL - TENANT HEALTH CHECKS & ALERT EVALUATION
// =====================================================================================
//
// This cell provides the tenant status endpoint:
// - Concurrent, failure-isolated component probes against a tenant's storage
// - Aggregation of probe outcomes into a single health report
// - Threshold-based alert classification of the reported metrics
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

// Re-export commonly used types
pub use models::{
    Alert, AlertKind, AlertRule, AlertSeverity, AlertSummary, ComponentProbeResult,
    HealthCheckResult, HealthMetrics, HealthReport, HealthStatus, MetricValue, MonitoringError,
};

pub use services::{AlertRules, MonitoringService, ProbeKind};

pub use handlers::MonitoringHandlers;
pub use router::create_monitoring_router;
