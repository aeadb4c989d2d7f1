use crate::app_config::{AppConfig, Environment};
use crate::tenant::TenantType;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it from a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let api_base = require("FLEETDASH_API_BASE")?;
    validate_origin("FLEETDASH_API_BASE", &api_base, &["http://", "https://"])?;

    let env = parse_environment(&or_default("FLEETDASH_ENV", "development"))?;
    let log_level = or_default("FLEETDASH_LOG_LEVEL", "info");

    let maps_api_key = optional("FLEETDASH_MAPS_API_KEY");
    let maps_base = or_default("FLEETDASH_MAPS_BASE", "https://maps.googleapis.com");

    let ws_url = or_default("FLEETDASH_WS_URL", "ws://localhost:5000/ws/alerts");
    validate_origin("FLEETDASH_WS_URL", &ws_url, &["ws://", "wss://"])?;

    let tenant_id = optional("FLEETDASH_TENANT_ID");
    let tenant_type = or_default("FLEETDASH_TENANT_TYPE", "business")
        .parse::<TenantType>()
        .map_err(|reason| ConfigError::InvalidEnvVar {
            var: "FLEETDASH_TENANT_TYPE".to_string(),
            reason,
        })?;

    let refresh_interval_secs = parse_u64("FLEETDASH_REFRESH_INTERVAL_SECS", "30")?;
    if refresh_interval_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "FLEETDASH_REFRESH_INTERVAL_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let request_timeout_secs = parse_u64("FLEETDASH_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("FLEETDASH_USER_AGENT", "fleetdash/0.1 (fleet-dashboard)");
    let max_retries = parse_u32("FLEETDASH_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("FLEETDASH_RETRY_BACKOFF_BASE_MS", "500")?;
    let geocode_cache_capacity = parse_usize("FLEETDASH_GEOCODE_CACHE_CAPACITY", "1024")?;

    let tracking_push_interval_secs = parse_u64("FLEETDASH_TRACKING_PUSH_INTERVAL_SECS", "10")?;
    if tracking_push_interval_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "FLEETDASH_TRACKING_PUSH_INTERVAL_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        log_level,
        api_base,
        maps_api_key,
        maps_base,
        ws_url,
        tenant_id,
        tenant_type,
        refresh_interval_secs,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        geocode_cache_capacity,
        tracking_push_interval_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FLEETDASH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn validate_origin(var: &str, value: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    if schemes.iter().any(|scheme| value.starts_with(scheme)) {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected one of {} schemes, got '{value}'", schemes.join(" ")),
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
