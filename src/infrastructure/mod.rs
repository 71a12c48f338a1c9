//! Storage backends. `memory` backs tests and local development; `postgres`
//! is the production store.

pub mod memory;
pub mod postgres;
