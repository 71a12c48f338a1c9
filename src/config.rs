//! Environment-driven configuration with development defaults.

use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_seconds: i64,
    pub document_bucket: String,
    pub rate_limits: RateLimitConfig,
}

/// Fixed-window request budgets per client over three horizons.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub per_minute: u32,
    pub per_hour: u32,
    pub per_day: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: 120,
            per_hour: 2_000,
            per_day: 20_000,
        }
    }
}

impl AppConfig {
    /// Read configuration from the environment. Missing DATABASE_URL selects
    /// the in-memory store, which is only suitable for development.
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            database_url: env::var("DATABASE_URL").ok(),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "dev-secret-change-me".to_string()),
            jwt_ttl_seconds: env::var("JWT_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8 * 3600),
            document_bucket: env::var("DOCUMENT_BUCKET")
                .unwrap_or_else(|_| "clinicroute-documents".to_string()),
            rate_limits: RateLimitConfig {
                per_minute: env_u32("RATE_LIMIT_PER_MINUTE", 120),
                per_hour: env_u32("RATE_LIMIT_PER_HOUR", 2_000),
                per_day: env_u32("RATE_LIMIT_PER_DAY", 20_000),
            },
        }
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
