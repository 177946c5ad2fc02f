use std::env;
use std::time::Duration;
use tracing::warn;

const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_CHECK_BUDGET_MS: u64 = 10_000;
const DEFAULT_STORAGE_REQUEST_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub environment: String,
    pub health_probe_timeout_ms: u64,
    pub health_check_budget_ms: u64,
    pub storage_request_timeout_ms: u64,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            health_probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            health_check_budget_ms: DEFAULT_CHECK_BUDGET_MS,
            storage_request_timeout_ms: DEFAULT_STORAGE_REQUEST_TIMEOUT_MS,
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            environment: env::var("APP_ENV")
                .unwrap_or_else(|_| {
                    warn!("APP_ENV not set, using default");
                    DEFAULT_ENVIRONMENT.to_string()
                }),
            health_probe_timeout_ms: numeric_var(
                "HEALTH_PROBE_TIMEOUT_MS",
                DEFAULT_PROBE_TIMEOUT_MS,
            ),
            health_check_budget_ms: numeric_var("HEALTH_CHECK_BUDGET_MS", DEFAULT_CHECK_BUDGET_MS),
            storage_request_timeout_ms: numeric_var(
                "STORAGE_REQUEST_TIMEOUT_MS",
                DEFAULT_STORAGE_REQUEST_TIMEOUT_MS,
            ),
            port: numeric_var("PORT", DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.health_probe_timeout_ms)
    }

    pub fn check_budget(&self) -> Duration {
        Duration::from_millis(self.health_check_budget_ms)
    }

    pub fn storage_request_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_request_timeout_ms)
    }
}

fn numeric_var<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
