pub mod alerts;
pub mod health;
pub mod probes;

pub use alerts::AlertRules;
pub use health::MonitoringService;
pub use probes::{metric_names, run_probe, ProbeKind, ProbeOutcome};
