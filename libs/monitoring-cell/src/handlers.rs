// =====================================================================================
// MONITORING CELL HANDLERS
// =====================================================================================

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::{error, info, instrument, warn};

use crate::models::{
    Alert, AlertSeverity, AlertSummary, AlertsResponse, ComponentProbeResult, HealthReport,
    HealthStatus, MonitoringError, UnhealthyResponse,
};
use crate::services::MonitoringService;
use shared_config::AppConfig;
use shared_database::{TenantClientFactory, TenantConfig};

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct MonitoringHandlers {
    factory: TenantClientFactory,
    config: Arc<AppConfig>,
}

impl MonitoringHandlers {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            factory: TenantClientFactory::new(config.as_ref().clone()),
            config,
        }
    }

    /// Builds a service bound to the tenant named in the request headers.
    pub fn monitoring_service(
        &self,
        headers: &HeaderMap,
    ) -> Result<MonitoringService, MonitoringError> {
        let tenant = TenantConfig::from_header(
            headers.get(TENANT_HEADER).and_then(|v| v.to_str().ok()),
        );
        let store = self.factory.create_client(&tenant)?;

        Ok(MonitoringService::from_config(store, &self.config))
    }
}

fn status_code(status: HealthStatus) -> StatusCode {
    if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

fn log_alerts(tenant: &str, alerts: &[Alert]) {
    for alert in alerts {
        match alert.severity {
            AlertSeverity::Critical => {
                error!(
                    tenant = %tenant,
                    metric = %alert.metric,
                    kind = ?alert.kind,
                    value = ?alert.value,
                    threshold = ?alert.threshold,
                    "CRITICAL ALERT: {}", alert.message
                );
            }
            AlertSeverity::Warning => {
                warn!(
                    tenant = %tenant,
                    metric = %alert.metric,
                    value = ?alert.value,
                    "WARNING ALERT: {}", alert.message
                );
            }
        }
    }
}

// =====================================================================================
// HEALTH ENDPOINTS
// =====================================================================================

#[instrument(skip(handlers, headers))]
pub async fn get_health_status(
    State(handlers): State<Arc<MonitoringHandlers>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<HealthReport>), MonitoringError> {
    let service = handlers.monitoring_service(&headers)?;

    let result = service.get_health_check().await;
    let alerts = service.check_alerts(&result.metrics);
    log_alerts(service.tenant_id(), &alerts);

    info!(
        tenant = %service.tenant_id(),
        status = ?result.status,
        alerts = alerts.len(),
        "Health check completed"
    );

    let code = status_code(result.status);
    let report = HealthReport::new(result, alerts, VERSION, &handlers.config.environment);

    Ok((code, Json(report)))
}

#[instrument(skip(handlers, headers))]
pub async fn get_component_health(
    State(handlers): State<Arc<MonitoringHandlers>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<(StatusCode, Json<ComponentProbeResult>), MonitoringError> {
    let component_name = params.get("component")
        .ok_or_else(|| MonitoringError::MissingParameter("component".to_string()))?;

    let service = handlers.monitoring_service(&headers)?;
    let component = service.probe_component(component_name).await
        .ok_or_else(|| MonitoringError::UnknownComponent(component_name.clone()))?;

    Ok((status_code(component.status), Json(component)))
}

// =====================================================================================
// ALERT ENDPOINTS
// =====================================================================================

#[instrument(skip(handlers, headers))]
pub async fn get_alerts(
    State(handlers): State<Arc<MonitoringHandlers>>,
    headers: HeaderMap,
) -> Result<Json<AlertsResponse>, MonitoringError> {
    let service = handlers.monitoring_service(&headers)?;

    let result = service.get_health_check().await;
    let alerts = service.check_alerts(&result.metrics);
    log_alerts(service.tenant_id(), &alerts);

    Ok(Json(AlertsResponse {
        summary: AlertSummary::from_alerts(&alerts),
        alerts,
        timestamp: result.timestamp,
    }))
}

// =====================================================================================
// ERROR RESPONSE IMPLEMENTATION
// =====================================================================================

impl IntoResponse for MonitoringError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            MonitoringError::TenantClient(err) => {
                error!("Health check aborted before probing: {}", err);

                let body = UnhealthyResponse {
                    status: HealthStatus::Unhealthy,
                    error: err.to_string(),
                    timestamp: chrono::Utc::now(),
                };
                return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
            }
            MonitoringError::UnknownComponent(_) => StatusCode::NOT_FOUND,
            MonitoringError::MissingParameter(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(serde_json::json!({
            "error": self.to_string(),
            "timestamp": chrono::Utc::now()
        }))).into_response()
    }
}
