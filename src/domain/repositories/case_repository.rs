//! Case repository contract: lifecycle persistence, scoped queries and the
//! aggregate queries the reporting layer derives from.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::RepoResult;
use crate::domain::entities::{Case, CasePriority, CaseStatus, CaseStatusHistory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseSortField {
    CreatedAt,
    #[default]
    UpdatedAt,
    SlaDeadline,
    ReferenceNumber,
    Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filter, sort and page parameters for listing cases within one clinic.
#[derive(Debug, Clone, Default)]
pub struct CaseListQuery {
    pub status: Option<CaseStatus>,
    pub priority: Option<CasePriority>,
    pub assigned_to_id: Option<Uuid>,
    pub insurer_id: Option<Uuid>,
    /// Matches reference number, patient names or NHS number,
    /// case-insensitively.
    pub search: Option<String>,
    pub sla_breached: Option<bool>,
    pub sort_by: CaseSortField,
    pub sort_order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// Persist a new case. Fails with `Conflict` when the reference number
    /// is already taken (the reference-number race backstop).
    async fn insert(&self, case: &Case) -> RepoResult<()>;

    /// Fetch a case only when it belongs to the given clinic.
    async fn find_in_clinic(&self, id: Uuid, clinic_id: Uuid) -> RepoResult<Option<Case>>;

    async fn find_by_reference_in_clinic(
        &self,
        reference: &str,
        clinic_id: Uuid,
    ) -> RepoResult<Option<Case>>;

    /// Lexically greatest reference number starting with `prefix`, across
    /// all clinics (reference numbers are globally unique).
    async fn latest_reference_with_prefix(&self, prefix: &str) -> RepoResult<Option<String>>;

    /// Write back a full case row.
    async fn update(&self, case: &Case) -> RepoResult<()>;

    async fn list(&self, clinic_id: Uuid, query: &CaseListQuery)
        -> RepoResult<(Vec<Case>, i64)>;

    /// Breached, non-terminal cases, nearest deadline first.
    async fn overdue(&self, clinic_id: Uuid) -> RepoResult<Vec<Case>>;

    /// Flag every unflagged, non-terminal case past its deadline; returns
    /// how many rows changed. Idempotent across clinics.
    async fn mark_sla_breaches(&self, now: DateTime<Utc>) -> RepoResult<u64>;

    async fn append_history(&self, entry: &CaseStatusHistory) -> RepoResult<()>;

    async fn history_for_case(&self, case_id: Uuid) -> RepoResult<Vec<CaseStatusHistory>>;

    // Aggregates for stats and reporting. All are clinic-partitioned.

    async fn count_in_clinic(&self, clinic_id: Uuid) -> RepoResult<i64>;

    async fn count_active(&self, clinic_id: Uuid) -> RepoResult<i64>;

    async fn count_overdue(&self, clinic_id: Uuid) -> RepoResult<i64>;

    async fn count_created_between(
        &self,
        clinic_id: Uuid,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> RepoResult<i64>;

    async fn count_completed_between(
        &self,
        clinic_id: Uuid,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> RepoResult<i64>;

    async fn status_counts(&self, clinic_id: Uuid) -> RepoResult<Vec<(CaseStatus, i64)>>;

    async fn priority_counts(&self, clinic_id: Uuid) -> RepoResult<Vec<(CasePriority, i64)>>;

    async fn insurer_counts(&self, clinic_id: Uuid) -> RepoResult<Vec<(Uuid, i64)>>;

    /// Closed-case count per insurer.
    async fn closed_insurer_counts(&self, clinic_id: Uuid) -> RepoResult<Vec<(Uuid, i64)>>;

    /// `(created_at, completed_at)` pairs of closed cases with a completion
    /// timestamp, most recently completed first, optionally restricted to
    /// one insurer and capped at `limit` rows.
    async fn closed_case_durations(
        &self,
        clinic_id: Uuid,
        insurer_id: Option<Uuid>,
        limit: Option<i64>,
    ) -> RepoResult<Vec<(DateTime<Utc>, DateTime<Utc>)>>;

    async fn count_with_status_in(
        &self,
        clinic_id: Uuid,
        insurer_id: Option<Uuid>,
        statuses: &[CaseStatus],
    ) -> RepoResult<i64>;

    async fn count_closed_completed_since(
        &self,
        clinic_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepoResult<i64>;

    async fn count_closed_breached_completed_since(
        &self,
        clinic_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepoResult<i64>;

    async fn count_assigned_created_since(
        &self,
        assignee_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepoResult<i64>;

    async fn count_closed_by_assignee_since(
        &self,
        assignee_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepoResult<i64>;
}
