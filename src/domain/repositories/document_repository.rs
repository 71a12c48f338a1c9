//! Document metadata repository contract.
//!
//! Soft-deleted rows stay in the store but are invisible to every lookup
//! here, including direct id fetch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::RepoResult;
use crate::domain::entities::Document;

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn insert(&self, document: &Document) -> RepoResult<()>;

    /// Fetch by id, excluding soft-deleted rows.
    async fn find_active(&self, id: Uuid) -> RepoResult<Option<Document>>;

    /// Documents of a case excluding soft-deleted rows, newest first.
    async fn list_active_by_case(&self, case_id: Uuid) -> RepoResult<Vec<Document>>;

    /// Set the deletion timestamp. NotFound when the row is absent or
    /// already deleted.
    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> RepoResult<()>;
}
