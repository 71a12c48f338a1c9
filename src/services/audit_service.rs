//! Audit trail recording and the compliance query surface.
//!
//! Recording is strictly best-effort: a failed write is traced and swallowed
//! so the primary operation never aborts over its audit trail.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{AuditAction, AuditEntry, CurrentUser};
use crate::domain::repositories::{AuditQuery, DynAuditRepository, DynCaseRepository};
use crate::shared::{AppError, AppResult, PageParams, Paginated};

/// The caller-supplied portion of an audit entry; id and timestamp are
/// assigned at record time.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub description: String,
    pub previous_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub user_id: Option<Uuid>,
    pub case_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action,
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            description: description.into(),
            previous_value: None,
            new_value: None,
            user_id: None,
            case_id: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn by(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn on_case(mut self, case_id: Uuid) -> Self {
        self.case_id = Some(case_id);
        self
    }

    pub fn values(
        mut self,
        previous: Option<serde_json::Value>,
        new: Option<serde_json::Value>,
    ) -> Self {
        self.previous_value = previous;
        self.new_value = new;
        self
    }
}

pub struct AuditService {
    audit_repo: DynAuditRepository,
    case_repo: DynCaseRepository,
}

impl AuditService {
    pub fn new(audit_repo: DynAuditRepository, case_repo: DynCaseRepository) -> Self {
        Self {
            audit_repo,
            case_repo,
        }
    }

    /// Persist an audit entry. Never fails the caller.
    pub async fn record(&self, event: AuditEvent) {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            action: event.action,
            entity_type: event.entity_type,
            entity_id: event.entity_id,
            description: event.description,
            previous_value: event.previous_value,
            new_value: event.new_value,
            user_id: event.user_id,
            case_id: event.case_id,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            created_at: Utc::now(),
        };
        if let Err(err) = self.audit_repo.insert(&entry).await {
            tracing::error!(
                action = %entry.action,
                entity_type = %entry.entity_type,
                entity_id = %entry.entity_id,
                error = %err,
                "failed to persist audit entry"
            );
        }
    }

    /// Filtered audit browse. ADMIN/MANAGER only.
    pub async fn query(
        &self,
        current: &CurrentUser,
        mut query: AuditQuery,
        page: &PageParams,
    ) -> AppResult<Paginated<AuditEntry>> {
        if !current.role.is_manager_or_admin() {
            return Err(AppError::forbidden("Insufficient role"));
        }
        query.limit = page.limit();
        query.offset = page.offset();
        let (entries, total) = self.audit_repo.query(&query).await?;
        Ok(Paginated::new(entries, page, total))
    }

    /// Trail of one case, newest first. The case must belong to the caller's
    /// clinic.
    pub async fn for_case(
        &self,
        current: &CurrentUser,
        case_id: Uuid,
    ) -> AppResult<Vec<AuditEntry>> {
        self.case_repo
            .find_in_clinic(case_id, current.clinic_id)
            .await?
            .ok_or_else(|| AppError::not_found("Case"))?;
        Ok(self.audit_repo.list_by_case(case_id).await?)
    }

    /// Activity of one user. ADMIN/MANAGER only.
    pub async fn for_user(
        &self,
        current: &CurrentUser,
        user_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<AuditEntry>> {
        if !current.role.is_manager_or_admin() {
            return Err(AppError::forbidden("Insufficient role"));
        }
        Ok(self.audit_repo.list_by_user(user_id, limit).await?)
    }

    /// The caller's own recent activity.
    pub async fn my_activity(
        &self,
        current: &CurrentUser,
        limit: i64,
    ) -> AppResult<Vec<AuditEntry>> {
        Ok(self.audit_repo.list_by_user(current.id, limit).await?)
    }

    /// Full chronological trail for one entity, for subject-access requests.
    /// ADMIN only.
    pub async fn export_for_entity(
        &self,
        current: &CurrentUser,
        entity_type: &str,
        entity_id: &str,
    ) -> AppResult<Vec<AuditEntry>> {
        if current.role != crate::domain::entities::Role::Admin {
            return Err(AppError::forbidden("Admin role required"));
        }
        Ok(self
            .audit_repo
            .list_by_entity(entity_type, entity_id)
            .await?)
    }
}
