use std::sync::Arc;

use axum::{
    Router,
    http::Uri,
    routing::get,
};

use monitoring_cell::router::create_monitoring_router;
use shared_config::AppConfig;
use shared_models::AppError;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Tenant health API is running!" }))
        .nest("/api", create_monitoring_router(state))
        .fallback(not_found)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use tower::ServiceExt;

    async fn call(uri: &str) -> (StatusCode, Vec<u8>) {
        let app = create_router(Arc::new(AppConfig::default()));
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_root_route() {
        let (status, body) = call("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Tenant health API is running!");
    }

    #[tokio::test]
    async fn test_health_is_nested_under_api() {
        let (status, body) = call("/api/health").await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        // Default config has no backing store, so the tenant client cannot be built.
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_not_found() {
        let (status, body) = call("/nope").await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "No route for /nope");
    }
}
