use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Supabase,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "supabase" | "postgrest" => Ok(StorageBackend::Supabase),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub supabase_jwt_secret: String,
    pub storage_backend: StorageBackend,
    pub storage_timeout: Duration,
    pub listing_cache_enabled: bool,
    pub listing_cache_ttl: Duration,
    pub listing_cache_sweep_interval: Duration,
    pub listing_cache_max_entries: u64,
    pub mail_relay_url: Option<String>,
    pub mail_relay_api_key: Option<String>,
    pub mail_relay_timeout: Duration,
    pub mail_from: String,
    pub default_page_size: i64,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            supabase_jwt_secret: String::new(),
            storage_backend: StorageBackend::Memory,
            storage_timeout: Duration::from_secs(5),
            listing_cache_enabled: true,
            listing_cache_ttl: Duration::from_secs(30),
            listing_cache_sweep_interval: Duration::from_secs(60),
            listing_cache_max_entries: 10_000,
            mail_relay_url: None,
            mail_relay_api_key: None,
            mail_relay_timeout: Duration::from_secs(5),
            mail_from: "no-reply@clinic.local".to_string(),
            default_page_size: 10,
            port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            storage_backend: parse_var("STORAGE_BACKEND", defaults.storage_backend),
            storage_timeout: Duration::from_secs(
                parse_var("STORAGE_TIMEOUT_SECS", defaults.storage_timeout.as_secs()),
            ),
            listing_cache_enabled: parse_var("LISTING_CACHE_ENABLED", defaults.listing_cache_enabled),
            listing_cache_ttl: Duration::from_secs(
                parse_var("LISTING_CACHE_TTL_SECS", defaults.listing_cache_ttl.as_secs()),
            ),
            listing_cache_sweep_interval: Duration::from_secs(
                parse_var("LISTING_CACHE_SWEEP_SECS", defaults.listing_cache_sweep_interval.as_secs()),
            ),
            listing_cache_max_entries: parse_var("LISTING_CACHE_MAX_ENTRIES", defaults.listing_cache_max_entries),
            mail_relay_url: env::var("MAIL_RELAY_URL").ok().filter(|v| !v.is_empty()),
            mail_relay_api_key: env::var("MAIL_RELAY_API_KEY").ok().filter(|v| !v.is_empty()),
            mail_relay_timeout: Duration::from_secs(
                parse_var("MAIL_RELAY_TIMEOUT_SECS", defaults.mail_relay_timeout.as_secs()),
            ),
            mail_from: env::var("MAIL_FROM").unwrap_or(defaults.mail_from),
            default_page_size: parse_var("DEFAULT_PAGE_SIZE", defaults.default_page_size),
            port: parse_var("PORT", defaults.port),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        let storage_ready = match self.storage_backend {
            StorageBackend::Memory => true,
            StorageBackend::Supabase => {
                !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
            }
        };

        storage_ready && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_mail_relay_configured(&self) -> bool {
        self.mail_relay_url.is_some()
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
