//! Request-level middleware: bearer authentication and rate limiting.

pub mod auth;
pub mod rate_limit;

pub use auth::require_auth;
pub use rate_limit::{enforce_rate_limit, RateLimiter};
