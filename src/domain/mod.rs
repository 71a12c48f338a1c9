//! Domain layer: entities, value rules and repository contracts.

pub mod entities;
pub mod repositories;
