//! HTTP handlers, one module per resource.

pub mod audit;
pub mod auth;
pub mod cases;
pub mod documents;
pub mod health;
pub mod reports;
pub mod users;
