//! User repository contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::RepoResult;
use crate::domain::entities::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user. Fails with `Conflict` when the email is taken.
    async fn insert(&self, user: &User) -> RepoResult<()>;

    /// Lookup by email. Callers normalise to lowercase first.
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    /// Fetch a user only when they belong to the given clinic.
    async fn find_in_clinic(&self, id: Uuid, clinic_id: Uuid) -> RepoResult<Option<User>>;

    /// Write back a full user row.
    async fn update(&self, user: &User) -> RepoResult<()>;

    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> RepoResult<()>;

    /// All users of a clinic, surname order.
    async fn list_in_clinic(&self, clinic_id: Uuid) -> RepoResult<Vec<User>>;

    /// Active users of a clinic, for assignment checks and productivity
    /// reporting.
    async fn list_active_in_clinic(&self, clinic_id: Uuid) -> RepoResult<Vec<User>>;
}
