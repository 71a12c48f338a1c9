//! Insurer repository contract. Insurers are shared reference data.

use async_trait::async_trait;
use uuid::Uuid;

use super::RepoResult;
use crate::domain::entities::Insurer;

#[async_trait]
pub trait InsurerRepository: Send + Sync {
    async fn insert(&self, insurer: &Insurer) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Insurer>>;

    /// Resolve ids to display names for report breakdowns.
    async fn find_names(&self, ids: &[Uuid]) -> RepoResult<Vec<(Uuid, String)>>;
}
