// =====================================================================================
// MONITORING CELL INTEGRATION TESTS - STATUS ENDPOINT AGAINST A MOCK TENANT STORE
// =====================================================================================

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use monitoring_cell::create_monitoring_router;
use shared_config::AppConfig;

fn setup_test_config(mock_server: &MockServer, probe_timeout_ms: u64) -> Arc<AppConfig> {
    Arc::new(AppConfig {
        supabase_url: mock_server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        environment: "test".to_string(),
        health_probe_timeout_ms: probe_timeout_ms,
        ..AppConfig::default()
    })
}

async fn mount_ping(mock_server: &MockServer, delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})).set_delay(delay))
        .mount(mock_server)
        .await;
}

async fn mount_sessions(mock_server: &MockServer, total: u64) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/sessions"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-range", format!("0-0/{}", total).as_str())
                .set_body_json(json!([])),
        )
        .mount(mock_server)
        .await;
}

async fn mount_utilization(mock_server: &MockServer, fraction: f64) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/storage_utilization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(fraction)))
        .mount(mock_server)
        .await;
}

async fn get(app: Router, uri: &str, tenant: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(tenant) = tenant {
        builder = builder.header("x-tenant-id", tenant);
    }
    let request = builder.body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    (status, json)
}

#[tokio::test]
async fn test_all_healthy_returns_ok_without_alerts() {
    let mock_server = MockServer::start().await;
    mount_ping(&mock_server, Duration::ZERO).await;
    mount_sessions(&mock_server, 12).await;
    mount_utilization(&mock_server, 0.35).await;

    let app = create_monitoring_router(setup_test_config(&mock_server, 3_000));
    let (status, json) = get(app, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["alerts"], json!([]));
    assert_eq!(json["environment"], "test");
    assert!(json["version"].is_string());
    assert!(json["timestamp"].is_string());
    assert!(json.get("error").is_none());

    assert_eq!(json["metrics"]["active_sessions"], 12.0);
    assert_eq!(json["metrics"]["storage_utilization"], 0.35);
    assert!(json["metrics"]["storage_latency_ms"].is_number());

    let names: Vec<&str> = json["checkedComponents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["storage", "sessions", "capacity"]);
}

#[tokio::test]
async fn test_storage_timeout_returns_unavailable() {
    let mock_server = MockServer::start().await;
    mount_ping(&mock_server, Duration::from_secs(2)).await;
    mount_sessions(&mock_server, 12).await;
    mount_utilization(&mock_server, 0.35).await;

    let app = create_monitoring_router(setup_test_config(&mock_server, 200));
    let (status, json) = get(app, "/health", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "unhealthy");
    assert_eq!(json["checkedComponents"][0]["name"], "storage");
    assert_eq!(json["checkedComponents"][0]["status"], "unhealthy");
    assert_eq!(json["checkedComponents"][1]["status"], "healthy");
    assert_eq!(json["metrics"]["storage_latency_ms"], "unavailable");

    let alerts = json["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["severity"], "critical");
    assert_eq!(alerts[0]["kind"], "probe_unavailable");
    assert_eq!(alerts[0]["metric"], "storage_latency_ms");
}

#[tokio::test]
async fn test_slow_storage_is_degraded_with_warning() {
    let mock_server = MockServer::start().await;
    mount_ping(&mock_server, Duration::from_millis(700)).await;
    mount_sessions(&mock_server, 12).await;
    mount_utilization(&mock_server, 0.35).await;

    let app = create_monitoring_router(setup_test_config(&mock_server, 3_000));
    let (status, json) = get(app, "/health", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "degraded");

    let alerts = json["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["severity"], "warning");
    assert_eq!(alerts[0]["metric"], "storage_latency_ms");
    assert_eq!(alerts[0]["threshold"], 500.0);

    let observed = alerts[0]["value"].as_f64().unwrap();
    assert!(observed >= 700.0 && observed < 2000.0);

    let message = alerts[0]["message"].as_str().unwrap();
    assert!(message.contains(&format!("{:.2}", observed)));
    assert!(message.contains("500.00"));
}

#[tokio::test]
async fn test_tenant_header_selects_schema() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/"))
        .and(header("accept-profile", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_sessions(&mock_server, 3).await;
    mount_utilization(&mock_server, 0.10).await;

    let app = create_monitoring_router(setup_test_config(&mock_server, 3_000));
    let (status, json) = get(app, "/health", Some("acme")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_unconfigured_store_returns_minimal_unhealthy_payload() {
    let app = create_monitoring_router(Arc::new(AppConfig::default()));

    let (status, json) = get(app, "/health", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "unhealthy");
    assert!(json["error"].is_string());
    assert!(json["timestamp"].is_string());
    assert!(json.get("metrics").is_none());
}

#[tokio::test]
async fn test_invalid_tenant_returns_minimal_unhealthy_payload() {
    let mock_server = MockServer::start().await;
    let app = create_monitoring_router(setup_test_config(&mock_server, 3_000));

    let (status, json) = get(app, "/health", Some("acme; drop")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "unhealthy");
    assert!(json["error"].as_str().unwrap().contains("Invalid tenant"));
}

#[tokio::test]
async fn test_component_health_endpoint() {
    let mock_server = MockServer::start().await;
    mount_ping(&mock_server, Duration::ZERO).await;

    let config = setup_test_config(&mock_server, 3_000);

    let (status, json) = get(
        create_monitoring_router(config.clone()),
        "/health/component?component=storage",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "storage");
    assert_eq!(json["status"], "healthy");
    assert!(json["latencyMs"].is_number());

    let (status, _) = get(
        create_monitoring_router(config.clone()),
        "/health/component?component=cache",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = get(create_monitoring_router(config), "/health/component", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("component"));
}

#[tokio::test]
async fn test_alerts_endpoint_summarises_severity() {
    let mock_server = MockServer::start().await;
    mount_ping(&mock_server, Duration::ZERO).await;
    mount_sessions(&mock_server, 900).await;
    mount_utilization(&mock_server, 0.97).await;

    let app = create_monitoring_router(setup_test_config(&mock_server, 3_000));
    let (status, json) = get(app, "/alerts", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["summary"], json!({ "warning": 1, "critical": 1 }));

    let metrics: Vec<&str> = json["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["metric"].as_str().unwrap())
        .collect();
    assert_eq!(metrics, vec!["active_sessions", "storage_utilization"]);
}
