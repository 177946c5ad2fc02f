use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use shared_config::AppConfig;

use crate::error::DatabaseError;
use crate::supabase::SupabaseTenantClient;

pub const DEFAULT_TENANT: &str = "default";
const MAX_TENANT_ID_LEN: usize = 63;

/// Data-access handle bound to one tenant's storage partition.
///
/// Implementations must bound every call with their own timeout; callers
/// additionally abandon calls that exceed the probe timeout.
#[async_trait]
pub trait TenantStore: Send + Sync {
    fn tenant_id(&self) -> &str;

    /// Round-trip to the backing store, returning the observed latency.
    async fn ping(&self) -> Result<Duration, DatabaseError>;

    async fn count_active_sessions(&self) -> Result<u64, DatabaseError>;

    /// Used fraction of the tenant's storage quota, in `0.0..=1.0`.
    async fn storage_utilization(&self) -> Result<f64, DatabaseError>;
}

/// Tenant resolution input. An absent or blank id selects the shared tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantConfig {
    pub tenant_id: Option<String>,
}

impl TenantConfig {
    pub fn default_tenant() -> Self {
        Self::default()
    }

    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self { tenant_id: Some(tenant_id.into()) }
    }

    pub fn from_header(value: Option<&str>) -> Self {
        let tenant_id = value
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Self { tenant_id }
    }

    pub fn is_default(&self) -> bool {
        self.tenant_id.is_none()
    }

    pub fn validate(&self) -> Result<(), DatabaseError> {
        let Some(id) = &self.tenant_id else {
            return Ok(());
        };

        let valid_chars = id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if id.is_empty() || id.len() > MAX_TENANT_ID_LEN || !valid_chars {
            return Err(DatabaseError::InvalidTenant(id.clone()));
        }

        Ok(())
    }
}

pub struct TenantClientFactory {
    config: AppConfig,
}

impl TenantClientFactory {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    #[instrument(skip(self, tenant), fields(tenant_id = ?tenant.tenant_id))]
    pub fn create_client(
        &self,
        tenant: &TenantConfig,
    ) -> Result<Arc<dyn TenantStore>, DatabaseError> {
        if !self.config.is_configured() {
            return Err(DatabaseError::NotConfigured);
        }
        tenant.validate()?;

        let client = SupabaseTenantClient::new(&self.config, tenant.tenant_id.as_deref())?;
        debug!("Created storage client for tenant {}", client.tenant_id());

        let store: Arc<dyn TenantStore> = Arc::new(client);
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn configured() -> AppConfig {
        AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_blank_header_resolves_to_default_tenant() {
        assert!(TenantConfig::from_header(None).is_default());
        assert!(TenantConfig::from_header(Some("   ")).is_default());
        assert_eq!(
            TenantConfig::from_header(Some(" acme ")),
            TenantConfig::for_tenant("acme")
        );
    }

    #[test]
    fn test_tenant_id_validation() {
        assert!(TenantConfig::default_tenant().validate().is_ok());
        assert!(TenantConfig::for_tenant("clinic_42-eu").validate().is_ok());

        assert_matches!(
            TenantConfig::for_tenant("acme; drop").validate(),
            Err(DatabaseError::InvalidTenant(_))
        );
        assert_matches!(
            TenantConfig::for_tenant("x".repeat(64)).validate(),
            Err(DatabaseError::InvalidTenant(_))
        );
    }

    #[test]
    fn test_factory_requires_configuration() {
        let factory = TenantClientFactory::new(AppConfig::default());
        assert_matches!(
            factory.create_client(&TenantConfig::default_tenant()).err(),
            Some(DatabaseError::NotConfigured)
        );
    }

    #[test]
    fn test_factory_binds_client_to_tenant() {
        let factory = TenantClientFactory::new(configured());

        let shared = factory.create_client(&TenantConfig::default_tenant()).unwrap();
        assert_eq!(shared.tenant_id(), DEFAULT_TENANT);

        let acme = factory.create_client(&TenantConfig::for_tenant("acme")).unwrap();
        assert_eq!(acme.tenant_id(), "acme");
    }

    #[test]
    fn test_factory_rejects_invalid_tenant() {
        let factory = TenantClientFactory::new(configured());
        assert_matches!(
            factory.create_client(&TenantConfig::for_tenant("../etc")).err(),
            Some(DatabaseError::InvalidTenant(_))
        );
    }
}
