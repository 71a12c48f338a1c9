//! Audit log repository contract. Entries are append-only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::RepoResult;
use crate::domain::entities::{AuditAction, AuditEntry};

/// Filter + page parameters for the audit browse endpoint.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub user_id: Option<Uuid>,
    pub case_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn insert(&self, entry: &AuditEntry) -> RepoResult<()>;

    /// Filtered query, newest first, with the total matching count.
    async fn query(&self, query: &AuditQuery) -> RepoResult<(Vec<AuditEntry>, i64)>;

    async fn list_by_case(&self, case_id: Uuid) -> RepoResult<Vec<AuditEntry>>;

    async fn list_by_user(&self, user_id: Uuid, limit: i64) -> RepoResult<Vec<AuditEntry>>;

    /// Complete trail for one entity, oldest first (GDPR export order).
    async fn list_by_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> RepoResult<Vec<AuditEntry>>;
}
