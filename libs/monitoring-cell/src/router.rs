// =====================================================================================
// MONITORING CELL ROUTER
// =====================================================================================

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers::{get_alerts, get_component_health, get_health_status, MonitoringHandlers};
use shared_config::AppConfig;

pub fn create_monitoring_router(config: Arc<AppConfig>) -> Router {
    let handlers = Arc::new(MonitoringHandlers::new(config));

    // The status endpoint is public; it carries no tenant data beyond health.
    Router::new()
        .route("/health", get(get_health_status))
        .route("/health/component", get(get_component_health))
        .route("/alerts", get(get_alerts))
        .layer(CorsLayer::permissive())
        .with_state(handlers)
}
