use crate::tenant::TenantType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Origin of the fleet REST API, e.g. `https://fleet.example.com`.
    pub api_base: String,
    /// Google Maps web-service key. `None` disables the map view.
    pub maps_api_key: Option<String>,
    pub maps_base: String,
    /// Websocket origin of the alert push channel.
    pub ws_url: String,
    pub tenant_id: Option<String>,
    pub tenant_type: TenantType,
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub geocode_cache_capacity: usize,
    pub tracking_push_interval_secs: u64,
}

impl AppConfig {
    /// Whether the map view can be shown at all.
    #[must_use]
    pub fn has_maps_key(&self) -> bool {
        self.maps_api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("api_base", &self.api_base)
            .field(
                "maps_api_key",
                &self.maps_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("maps_base", &self.maps_base)
            .field("ws_url", &self.ws_url)
            .field("tenant_id", &self.tenant_id)
            .field("tenant_type", &self.tenant_type)
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("geocode_cache_capacity", &self.geocode_cache_capacity)
            .field(
                "tracking_push_interval_secs",
                &self.tracking_push_interval_secs,
            )
            .finish()
    }
}
