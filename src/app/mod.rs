//! Application assembly: dependency container and router construction.

pub mod container;
pub mod router;

pub use container::AppContainer;
pub use router::create_router;
