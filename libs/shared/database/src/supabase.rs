use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_RANGE, CONTENT_TYPE, RANGE},
    Method, RequestBuilder, Response,
};
use serde_json::{json, Value};
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::DatabaseError;
use crate::tenant::{TenantStore, DEFAULT_TENANT};

/// PostgREST client scoped to one tenant schema.
pub struct SupabaseTenantClient {
    client: Client,
    base_url: String,
    tenant_id: String,
    headers: HeaderMap,
}

impl SupabaseTenantClient {
    pub fn new(config: &AppConfig, tenant_schema: Option<&str>) -> Result<Self, DatabaseError> {
        let client = Client::builder()
            .timeout(config.storage_request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            tenant_id: tenant_schema.unwrap_or(DEFAULT_TENANT).to_string(),
            headers: Self::build_headers(&config.supabase_anon_key, tenant_schema)?,
        })
    }

    fn build_headers(
        anon_key: &str,
        tenant_schema: Option<&str>,
    ) -> Result<HeaderMap, DatabaseError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(anon_key)
            .map_err(|_| DatabaseError::InvalidHeader("apikey".to_string()))?;
        headers.insert("apikey", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Tenant partitions are PostgREST schemas; the default tenant uses the server default.
        if let Some(schema) = tenant_schema {
            let profile = HeaderValue::from_str(schema)
                .map_err(|_| DatabaseError::InvalidHeader("accept-profile".to_string()))?;
            headers.insert("accept-profile", profile.clone());
            headers.insert("content-profile", profile);
        }

        Ok(headers)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(tenant = %self.tenant_id, "Making request to {}", url);

        self.client.request(method, &url).headers(self.headers.clone())
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, DatabaseError> {
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(tenant = %self.tenant_id, "API error ({}): {}", status, body);

            return Err(DatabaseError::Api { status: status.as_u16(), body });
        }

        Ok(response)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TenantStore for SupabaseTenantClient {
    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    async fn ping(&self) -> Result<Duration, DatabaseError> {
        let start = Instant::now();
        self.send(self.request(Method::GET, "/rest/v1/")).await?;
        Ok(start.elapsed())
    }

    async fn count_active_sessions(&self) -> Result<u64, DatabaseError> {
        let req = self
            .request(Method::GET, "/rest/v1/sessions?select=id&status=eq.active")
            .header("prefer", "count=exact")
            .header(RANGE, "0-0");

        let response = self.send(req).await?;
        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                DatabaseError::MalformedResponse("missing Content-Range header".to_string())
            })?;

        parse_content_range_total(content_range)
    }

    async fn storage_utilization(&self) -> Result<f64, DatabaseError> {
        let req = self
            .request(Method::POST, "/rest/v1/rpc/storage_utilization")
            .json(&json!({}));

        let value: Value = self.send(req).await?.json().await?;
        let fraction = value
            .as_f64()
            .ok_or_else(|| {
                DatabaseError::MalformedResponse(format!("expected a number, got {}", value))
            })?;

        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(DatabaseError::MalformedResponse(format!(
                "utilization {} outside 0..=1",
                fraction
            )));
        }

        Ok(fraction)
    }
}

/// Extracts the total from a PostgREST `Content-Range` header (`0-0/42`, `*/0`).
pub fn parse_content_range_total(header: &str) -> Result<u64, DatabaseError> {
    header
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse::<u64>().ok())
        .ok_or_else(|| {
            DatabaseError::MalformedResponse(format!("unusable Content-Range '{}'", header))
        })
}
