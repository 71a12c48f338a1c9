//! Clinic repository contract.

use async_trait::async_trait;
use uuid::Uuid;

use super::RepoResult;
use crate::domain::entities::Clinic;

#[async_trait]
pub trait ClinicRepository: Send + Sync {
    async fn insert(&self, clinic: &Clinic) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Clinic>>;
}
