//! Case note repository contract. Notes are append-only.

use async_trait::async_trait;
use uuid::Uuid;

use super::RepoResult;
use crate::domain::entities::CaseNote;

#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn insert(&self, note: &CaseNote) -> RepoResult<()>;

    /// Notes for a case, most recent first.
    async fn list_by_case(&self, case_id: Uuid) -> RepoResult<Vec<CaseNote>>;
}
