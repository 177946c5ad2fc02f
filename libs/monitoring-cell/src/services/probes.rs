// =====================================================================================
// COMPONENT PROBES
// =====================================================================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use shared_database::{DatabaseError, TenantStore};

pub mod metric_names {
    pub const STORAGE_LATENCY_MS: &str = "storage_latency_ms";
    pub const ACTIVE_SESSIONS: &str = "active_sessions";
    pub const STORAGE_UTILIZATION: &str = "storage_utilization";
}

/// The fixed probe set, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    Storage,
    Sessions,
    Capacity,
}

impl ProbeKind {
    pub const ALL: [ProbeKind; 3] = [ProbeKind::Storage, ProbeKind::Sessions, ProbeKind::Capacity];

    pub fn component(&self) -> &'static str {
        match self {
            ProbeKind::Storage => "storage",
            ProbeKind::Sessions => "sessions",
            ProbeKind::Capacity => "capacity",
        }
    }

    pub fn metric(&self) -> &'static str {
        match self {
            ProbeKind::Storage => metric_names::STORAGE_LATENCY_MS,
            ProbeKind::Sessions => metric_names::ACTIVE_SESSIONS,
            ProbeKind::Capacity => metric_names::STORAGE_UTILIZATION,
        }
    }

    pub fn from_component(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.component() == name)
    }

    async fn observe(self, store: &dyn TenantStore) -> Result<f64, DatabaseError> {
        match self {
            ProbeKind::Storage => store.ping().await.map(|rtt| rtt.as_secs_f64() * 1000.0),
            ProbeKind::Sessions => store.count_active_sessions().await.map(|count| count as f64),
            ProbeKind::Capacity => store.storage_utilization().await,
        }
    }
}

/// Captured outcome of one probe; failures never escape as panics or errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Completed { value: f64, latency: Duration },
    Failed { error: String, latency: Duration },
}

impl ProbeOutcome {
    pub fn latency(&self) -> Duration {
        match self {
            ProbeOutcome::Completed { latency, .. } | ProbeOutcome::Failed { latency, .. } => {
                *latency
            }
        }
    }
}

/// Aborts the spawned probe when the awaiting future is dropped, so a caller that
/// gives up on a check never leaves probe tasks running behind it.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs one probe on its own task, bounded by `limit`.
///
/// Errors, panics and timeouts all become `ProbeOutcome::Failed`. The task is aborted
/// on timeout and whenever the returned future is dropped before it resolves.
pub async fn run_probe(
    kind: ProbeKind,
    store: Arc<dyn TenantStore>,
    limit: Duration,
) -> ProbeOutcome {
    let start = Instant::now();
    let mut task = AbortOnDrop(tokio::spawn(async move { kind.observe(store.as_ref()).await }));

    let failed = |error: String| {
        warn!(component = kind.component(), "Probe failed: {}", error);
        ProbeOutcome::Failed { error, latency: start.elapsed() }
    };

    let result = timeout(limit, &mut task.0).await;
    match result {
        Ok(Ok(Ok(value))) => {
            let latency = start.elapsed();
            debug!(
                component = kind.component(),
                value,
                latency_ms = latency.as_millis() as u64,
                "Probe completed"
            );
            ProbeOutcome::Completed { value, latency }
        }
        Ok(Ok(Err(error))) => failed(error.to_string()),
        Ok(Err(join_error)) if join_error.is_panic() => failed("probe panicked".to_string()),
        Ok(Err(_)) => failed("probe cancelled".to_string()),
        Err(_) => failed(format!("timed out after {}ms", limit.as_millis())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_lookup_by_component() {
        assert_eq!(ProbeKind::from_component("storage"), Some(ProbeKind::Storage));
        assert_eq!(ProbeKind::from_component("capacity"), Some(ProbeKind::Capacity));
        assert_eq!(ProbeKind::from_component("cache"), None);
    }

    #[test]
    fn test_each_probe_owns_one_metric() {
        let metrics: Vec<_> = ProbeKind::ALL.iter().map(|kind| kind.metric()).collect();
        assert_eq!(
            metrics,
            vec![
                metric_names::STORAGE_LATENCY_MS,
                metric_names::ACTIVE_SESSIONS,
                metric_names::STORAGE_UTILIZATION,
            ]
        );
    }
}
