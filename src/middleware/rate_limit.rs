//! Fixed-window rate limiting over three horizons. Counters live in-process;
//! a multi-instance deployment rate-limits per instance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;

use crate::app::AppContainer;
use crate::config::RateLimitConfig;
use crate::shared::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Horizon {
    Minute,
    Hour,
    Day,
}

impl Horizon {
    fn window_secs(self) -> u64 {
        match self {
            Horizon::Minute => 60,
            Horizon::Hour => 3_600,
            Horizon::Day => 86_400,
        }
    }
}

pub struct RateLimiter {
    config: RateLimitConfig,
    counters: DashMap<(String, Horizon), (u64, u32)>,
    last_sweep: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            counters: DashMap::new(),
            last_sweep: AtomicU64::new(0),
        }
    }

    /// Count one request for `client` against every horizon; `Err` when any
    /// budget is exhausted.
    pub fn check(&self, client: &str) -> Result<(), AppError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.evict_expired(now);

        for (horizon, budget) in [
            (Horizon::Minute, self.config.per_minute),
            (Horizon::Hour, self.config.per_hour),
            (Horizon::Day, self.config.per_day),
        ] {
            let window = now - now % horizon.window_secs();
            let mut entry = self
                .counters
                .entry((client.to_string(), horizon))
                .or_insert((window, 0));
            if entry.0 != window {
                *entry = (window, 0);
            }
            if entry.1 >= budget {
                return Err(AppError::RateLimited);
            }
            entry.1 += 1;
        }
        Ok(())
    }

    /// Drop counters from expired windows once per day boundary, so churning
    /// client identities cannot grow the map without bound.
    fn evict_expired(&self, now: u64) {
        let day_window = now - now % Horizon::Day.window_secs();
        if self.last_sweep.swap(day_window, Ordering::Relaxed) == day_window {
            return;
        }
        self.counters
            .retain(|key, value| value.0 == now - now % key.1.window_secs());
    }
}

pub async fn enforce_rate_limit(
    State(container): State<AppContainer>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .unwrap_or("unknown")
        .trim()
        .to_string();

    container.rate_limiter.check(&client)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_exhaustion_trips_the_limit() {
        let limiter = RateLimiter::new(RateLimitConfig {
            per_minute: 3,
            per_hour: 100,
            per_day: 100,
        });
        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").is_ok());
        }
        assert!(limiter.check("10.0.0.1").is_err());
        // Other clients are unaffected.
        assert!(limiter.check("10.0.0.2").is_ok());
    }

    #[test]
    fn tightest_horizon_wins() {
        let limiter = RateLimiter::new(RateLimitConfig {
            per_minute: 100,
            per_hour: 2,
            per_day: 100,
        });
        assert!(limiter.check("c").is_ok());
        assert!(limiter.check("c").is_ok());
        assert!(limiter.check("c").is_err());
    }

    #[test]
    fn stale_windows_are_evicted() {
        let limiter = RateLimiter::new(RateLimitConfig {
            per_minute: 100,
            per_hour: 100,
            per_day: 100,
        });
        for client in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            assert!(limiter.check(client).is_ok());
        }
        assert_eq!(limiter.counters.len(), 9);

        // Two days later every window has expired.
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        limiter.evict_expired(now + 2 * Horizon::Day.window_secs());
        assert!(limiter.counters.is_empty());
    }
}
