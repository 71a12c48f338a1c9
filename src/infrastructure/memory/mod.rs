//! In-process repositories backed by `RwLock<HashMap>`.
//!
//! Used by the test suites and as a development fallback when no
//! `DATABASE_URL` is configured. Behavior mirrors the Postgres
//! implementations, including uniqueness conflicts and soft-delete
//! visibility.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{
    AuditEntry, Case, CaseNote, CasePriority, CaseStatus, CaseStatusHistory, Clinic, Document,
    Insurer, User,
};
use crate::domain::repositories::{
    AuditQuery, AuditRepository, CaseListQuery, CaseRepository, CaseSortField, ClinicRepository,
    DocumentRepository, InsurerRepository, NoteRepository, RepoResult, RepositoryError,
    SortOrder, UserRepository,
};

#[derive(Default)]
pub struct MemoryClinicRepository {
    clinics: RwLock<HashMap<Uuid, Clinic>>,
}

#[async_trait]
impl ClinicRepository for MemoryClinicRepository {
    async fn insert(&self, clinic: &Clinic) -> RepoResult<()> {
        self.clinics.write().await.insert(clinic.id, clinic.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Clinic>> {
        Ok(self.clinics.read().await.get(&id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: &User) -> RepoResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!(
                "email {} already registered",
                user.email
            )));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_in_clinic(&self, id: Uuid, clinic_id: Uuid) -> RepoResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .get(&id)
            .filter(|u| u.clinic_id == clinic_id)
            .cloned())
    }

    async fn update(&self, user: &User) -> RepoResult<()> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> RepoResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.last_login_at = Some(at);
        Ok(())
    }

    async fn list_in_clinic(&self, clinic_id: Uuid) -> RepoResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.clinic_id == clinic_id)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.last_name.cmp(&b.last_name));
        Ok(users)
    }

    async fn list_active_in_clinic(&self, clinic_id: Uuid) -> RepoResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.clinic_id == clinic_id && u.is_active)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.last_name.cmp(&b.last_name));
        Ok(users)
    }
}

#[derive(Default)]
pub struct MemoryInsurerRepository {
    insurers: RwLock<HashMap<Uuid, Insurer>>,
}

#[async_trait]
impl InsurerRepository for MemoryInsurerRepository {
    async fn insert(&self, insurer: &Insurer) -> RepoResult<()> {
        self.insurers
            .write()
            .await
            .insert(insurer.id, insurer.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Insurer>> {
        Ok(self.insurers.read().await.get(&id).cloned())
    }

    async fn find_names(&self, ids: &[Uuid]) -> RepoResult<Vec<(Uuid, String)>> {
        let insurers = self.insurers.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| insurers.get(id).map(|i| (*id, i.name.clone())))
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryCaseRepository {
    cases: RwLock<HashMap<Uuid, Case>>,
    history: RwLock<Vec<CaseStatusHistory>>,
}

impl MemoryCaseRepository {
    fn matches(case: &Case, query: &CaseListQuery) -> bool {
        if query.status.is_some_and(|s| case.status != s) {
            return false;
        }
        if query.priority.is_some_and(|p| case.priority != p) {
            return false;
        }
        if query
            .assigned_to_id
            .is_some_and(|id| case.assigned_to_id != id)
        {
            return false;
        }
        if query.insurer_id.is_some_and(|id| case.insurer_id != id) {
            return false;
        }
        if query.sla_breached.is_some_and(|b| case.sla_breached != b) {
            return false;
        }
        if let Some(search) = &query.search {
            let needle = search.to_lowercase();
            let hit = case.reference_number.to_lowercase().contains(&needle)
                || case.patient_first_name.to_lowercase().contains(&needle)
                || case.patient_last_name.to_lowercase().contains(&needle)
                || case
                    .patient_nhs_number
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }

    fn sort(cases: &mut [Case], field: CaseSortField, order: SortOrder) {
        cases.sort_by(|a, b| {
            let ord = match field {
                CaseSortField::CreatedAt => a.created_at.cmp(&b.created_at),
                CaseSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                CaseSortField::SlaDeadline => a.sla_deadline.cmp(&b.sla_deadline),
                CaseSortField::ReferenceNumber => a.reference_number.cmp(&b.reference_number),
                CaseSortField::Priority => a.priority.as_str().cmp(b.priority.as_str()),
            };
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }
}

#[async_trait]
impl CaseRepository for MemoryCaseRepository {
    async fn insert(&self, case: &Case) -> RepoResult<()> {
        let mut cases = self.cases.write().await;
        if cases
            .values()
            .any(|c| c.reference_number == case.reference_number)
        {
            return Err(RepositoryError::Conflict(format!(
                "reference number {} already exists",
                case.reference_number
            )));
        }
        cases.insert(case.id, case.clone());
        Ok(())
    }

    async fn find_in_clinic(&self, id: Uuid, clinic_id: Uuid) -> RepoResult<Option<Case>> {
        Ok(self
            .cases
            .read()
            .await
            .get(&id)
            .filter(|c| c.clinic_id == clinic_id)
            .cloned())
    }

    async fn find_by_reference_in_clinic(
        &self,
        reference: &str,
        clinic_id: Uuid,
    ) -> RepoResult<Option<Case>> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .find(|c| c.reference_number == reference && c.clinic_id == clinic_id)
            .cloned())
    }

    async fn latest_reference_with_prefix(&self, prefix: &str) -> RepoResult<Option<String>> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .filter(|c| c.reference_number.starts_with(prefix))
            .map(|c| c.reference_number.clone())
            .max())
    }

    async fn update(&self, case: &Case) -> RepoResult<()> {
        let mut cases = self.cases.write().await;
        if !cases.contains_key(&case.id) {
            return Err(RepositoryError::NotFound);
        }
        cases.insert(case.id, case.clone());
        Ok(())
    }

    async fn list(
        &self,
        clinic_id: Uuid,
        query: &CaseListQuery,
    ) -> RepoResult<(Vec<Case>, i64)> {
        let mut matched: Vec<Case> = self
            .cases
            .read()
            .await
            .values()
            .filter(|c| c.clinic_id == clinic_id && Self::matches(c, query))
            .cloned()
            .collect();
        let total = matched.len() as i64;
        Self::sort(&mut matched, query.sort_by, query.sort_order);
        let page = matched
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn overdue(&self, clinic_id: Uuid) -> RepoResult<Vec<Case>> {
        let mut cases: Vec<Case> = self
            .cases
            .read()
            .await
            .values()
            .filter(|c| c.clinic_id == clinic_id && c.sla_breached && !c.status.is_terminal())
            .cloned()
            .collect();
        cases.sort_by(|a, b| a.sla_deadline.cmp(&b.sla_deadline));
        Ok(cases)
    }

    async fn mark_sla_breaches(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let mut cases = self.cases.write().await;
        let mut flagged = 0;
        for case in cases.values_mut() {
            if case.sla_deadline < now && !case.sla_breached && !case.status.is_terminal() {
                case.sla_breached = true;
                case.updated_at = now;
                flagged += 1;
            }
        }
        Ok(flagged)
    }

    async fn append_history(&self, entry: &CaseStatusHistory) -> RepoResult<()> {
        self.history.write().await.push(entry.clone());
        Ok(())
    }

    async fn history_for_case(&self, case_id: Uuid) -> RepoResult<Vec<CaseStatusHistory>> {
        let mut entries: Vec<CaseStatusHistory> = self
            .history
            .read()
            .await
            .iter()
            .filter(|h| h.case_id == case_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn count_in_clinic(&self, clinic_id: Uuid) -> RepoResult<i64> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .filter(|c| c.clinic_id == clinic_id)
            .count() as i64)
    }

    async fn count_active(&self, clinic_id: Uuid) -> RepoResult<i64> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .filter(|c| c.clinic_id == clinic_id && !c.status.is_terminal())
            .count() as i64)
    }

    async fn count_overdue(&self, clinic_id: Uuid) -> RepoResult<i64> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .filter(|c| c.clinic_id == clinic_id && c.sla_breached && !c.status.is_terminal())
            .count() as i64)
    }

    async fn count_created_between(
        &self,
        clinic_id: Uuid,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> RepoResult<i64> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .filter(|c| {
                c.clinic_id == clinic_id
                    && c.created_at >= from
                    && to.map_or(true, |t| c.created_at < t)
            })
            .count() as i64)
    }

    async fn count_completed_between(
        &self,
        clinic_id: Uuid,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> RepoResult<i64> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .filter(|c| {
                c.clinic_id == clinic_id
                    && c.completed_at
                        .is_some_and(|done| done >= from && to.map_or(true, |t| done < t))
            })
            .count() as i64)
    }

    async fn status_counts(&self, clinic_id: Uuid) -> RepoResult<Vec<(CaseStatus, i64)>> {
        let cases = self.cases.read().await;
        let mut counts: HashMap<CaseStatus, i64> = HashMap::new();
        for case in cases.values().filter(|c| c.clinic_id == clinic_id) {
            *counts.entry(case.status).or_default() += 1;
        }
        Ok(CaseStatus::ALL
            .into_iter()
            .filter_map(|s| counts.get(&s).map(|n| (s, *n)))
            .collect())
    }

    async fn priority_counts(&self, clinic_id: Uuid) -> RepoResult<Vec<(CasePriority, i64)>> {
        let cases = self.cases.read().await;
        let mut counts: HashMap<CasePriority, i64> = HashMap::new();
        for case in cases.values().filter(|c| c.clinic_id == clinic_id) {
            *counts.entry(case.priority).or_default() += 1;
        }
        Ok(CasePriority::ALL
            .into_iter()
            .filter_map(|p| counts.get(&p).map(|n| (p, *n)))
            .collect())
    }

    async fn insurer_counts(&self, clinic_id: Uuid) -> RepoResult<Vec<(Uuid, i64)>> {
        let cases = self.cases.read().await;
        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for case in cases.values().filter(|c| c.clinic_id == clinic_id) {
            *counts.entry(case.insurer_id).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn closed_insurer_counts(&self, clinic_id: Uuid) -> RepoResult<Vec<(Uuid, i64)>> {
        let cases = self.cases.read().await;
        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for case in cases
            .values()
            .filter(|c| c.clinic_id == clinic_id && c.status == CaseStatus::Closed)
        {
            *counts.entry(case.insurer_id).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn closed_case_durations(
        &self,
        clinic_id: Uuid,
        insurer_id: Option<Uuid>,
        limit: Option<i64>,
    ) -> RepoResult<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
        let cases = self.cases.read().await;
        let mut closed: Vec<(DateTime<Utc>, DateTime<Utc>)> = cases
            .values()
            .filter(|c| {
                c.clinic_id == clinic_id
                    && c.status == CaseStatus::Closed
                    && insurer_id.map_or(true, |i| c.insurer_id == i)
            })
            .filter_map(|c| c.completed_at.map(|done| (c.created_at, done)))
            .collect();
        closed.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(limit) = limit {
            closed.truncate(limit.max(0) as usize);
        }
        Ok(closed)
    }

    async fn count_with_status_in(
        &self,
        clinic_id: Uuid,
        insurer_id: Option<Uuid>,
        statuses: &[CaseStatus],
    ) -> RepoResult<i64> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .filter(|c| {
                c.clinic_id == clinic_id
                    && insurer_id.map_or(true, |i| c.insurer_id == i)
                    && statuses.contains(&c.status)
            })
            .count() as i64)
    }

    async fn count_closed_completed_since(
        &self,
        clinic_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepoResult<i64> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .filter(|c| {
                c.clinic_id == clinic_id
                    && c.status == CaseStatus::Closed
                    && c.completed_at.is_some_and(|done| done >= since)
            })
            .count() as i64)
    }

    async fn count_closed_breached_completed_since(
        &self,
        clinic_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepoResult<i64> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .filter(|c| {
                c.clinic_id == clinic_id
                    && c.status == CaseStatus::Closed
                    && c.sla_breached
                    && c.completed_at.is_some_and(|done| done >= since)
            })
            .count() as i64)
    }

    async fn count_assigned_created_since(
        &self,
        assignee_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepoResult<i64> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .filter(|c| c.assigned_to_id == assignee_id && c.created_at >= since)
            .count() as i64)
    }

    async fn count_closed_by_assignee_since(
        &self,
        assignee_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepoResult<i64> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .filter(|c| {
                c.assigned_to_id == assignee_id
                    && c.status == CaseStatus::Closed
                    && c.completed_at.is_some_and(|done| done >= since)
            })
            .count() as i64)
    }
}

#[derive(Default)]
pub struct MemoryNoteRepository {
    notes: RwLock<Vec<CaseNote>>,
}

#[async_trait]
impl NoteRepository for MemoryNoteRepository {
    async fn insert(&self, note: &CaseNote) -> RepoResult<()> {
        self.notes.write().await.push(note.clone());
        Ok(())
    }

    async fn list_by_case(&self, case_id: Uuid) -> RepoResult<Vec<CaseNote>> {
        let mut notes: Vec<CaseNote> = self
            .notes
            .read()
            .await
            .iter()
            .filter(|n| n.case_id == case_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }
}

#[derive(Default)]
pub struct MemoryDocumentRepository {
    documents: RwLock<HashMap<Uuid, Document>>,
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn insert(&self, document: &Document) -> RepoResult<()> {
        self.documents
            .write()
            .await
            .insert(document.id, document.clone());
        Ok(())
    }

    async fn find_active(&self, id: Uuid) -> RepoResult<Option<Document>> {
        Ok(self
            .documents
            .read()
            .await
            .get(&id)
            .filter(|d| !d.is_deleted())
            .cloned())
    }

    async fn list_active_by_case(&self, case_id: Uuid) -> RepoResult<Vec<Document>> {
        let mut docs: Vec<Document> = self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.case_id == case_id && !d.is_deleted())
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> RepoResult<()> {
        let mut docs = self.documents.write().await;
        match docs.get_mut(&id) {
            Some(doc) if !doc.is_deleted() => {
                doc.deleted_at = Some(at);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}

#[derive(Default)]
pub struct MemoryAuditRepository {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditRepository {
    fn matches(entry: &AuditEntry, query: &AuditQuery) -> bool {
        if query
            .entity_type
            .as_deref()
            .is_some_and(|t| entry.entity_type != t)
        {
            return false;
        }
        if query
            .entity_id
            .as_deref()
            .is_some_and(|i| entry.entity_id != i)
        {
            return false;
        }
        if query.user_id.is_some() && entry.user_id != query.user_id {
            return false;
        }
        if query.case_id.is_some() && entry.case_id != query.case_id {
            return false;
        }
        if query.action.is_some_and(|a| entry.action != a) {
            return false;
        }
        if query.start_date.is_some_and(|d| entry.created_at < d) {
            return false;
        }
        if query.end_date.is_some_and(|d| entry.created_at > d) {
            return false;
        }
        true
    }
}

#[async_trait]
impl AuditRepository for MemoryAuditRepository {
    async fn insert(&self, entry: &AuditEntry) -> RepoResult<()> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> RepoResult<(Vec<AuditEntry>, i64)> {
        let mut matched: Vec<AuditEntry> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| Self::matches(e, query))
            .cloned()
            .collect();
        let total = matched.len() as i64;
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let page = matched
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn list_by_case(&self, case_id: Uuid) -> RepoResult<Vec<AuditEntry>> {
        let mut entries: Vec<AuditEntry> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.case_id == Some(case_id))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn list_by_user(&self, user_id: Uuid, limit: i64) -> RepoResult<Vec<AuditEntry>> {
        let mut entries: Vec<AuditEntry> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.user_id == Some(user_id))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit.max(0) as usize);
        Ok(entries)
    }

    async fn list_by_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> RepoResult<Vec<AuditEntry>> {
        let mut entries: Vec<AuditEntry> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entries)
    }
}
