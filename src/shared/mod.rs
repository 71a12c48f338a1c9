//! Shared building blocks: error taxonomy and pagination envelope.

pub mod error;
pub mod pagination;

pub use error::{AppError, AppResult};
pub use pagination::{PageParams, Paginated, Pagination};
