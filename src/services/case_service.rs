//! Case lifecycle rules: creation, the status state machine, assignment,
//! notes, SLA breach sweeps and per-clinic stats.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::{
    next_reference, reference_prefix, AuditAction, Case, CaseNote, CasePriority, CaseSource,
    CaseStatus, CaseStatusHistory, CurrentUser, User,
};
use crate::domain::repositories::{
    CaseListQuery, DynCaseRepository, DynClinicRepository, DynInsurerRepository,
    DynNoteRepository, DynUserRepository,
};
use crate::services::audit_service::{AuditEvent, AuditService};
use crate::shared::{AppError, AppResult, PageParams, Paginated};

pub struct CreateCase {
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_dob: NaiveDate,
    pub patient_nhs_number: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub referral_type: String,
    pub referring_clinician: String,
    pub clinical_notes: Option<String>,
    pub insurer_id: Uuid,
    pub insurer_policy_number: Option<String>,
    pub priority: Option<CasePriority>,
    pub source_type: Option<CaseSource>,
    pub assigned_to_id: Option<Uuid>,
}

/// Descriptive fields only; status and SLA never move through here.
#[derive(Default)]
pub struct UpdateCase {
    pub patient_first_name: Option<String>,
    pub patient_last_name: Option<String>,
    pub patient_dob: Option<NaiveDate>,
    pub patient_nhs_number: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub referral_type: Option<String>,
    pub referring_clinician: Option<String>,
    pub clinical_notes: Option<String>,
    pub insurer_id: Option<Uuid>,
    pub insurer_policy_number: Option<String>,
    pub insurer_auth_code: Option<String>,
    pub priority: Option<CasePriority>,
    pub assigned_to_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStats {
    pub total: i64,
    pub active: i64,
    pub overdue: i64,
    pub created_today: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_priority: BTreeMap<String, i64>,
}

pub struct CaseService {
    cases: DynCaseRepository,
    clinics: DynClinicRepository,
    insurers: DynInsurerRepository,
    users: DynUserRepository,
    notes: DynNoteRepository,
    audit: Arc<AuditService>,
}

impl CaseService {
    pub fn new(
        cases: DynCaseRepository,
        clinics: DynClinicRepository,
        insurers: DynInsurerRepository,
        users: DynUserRepository,
        notes: DynNoteRepository,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            cases,
            clinics,
            insurers,
            users,
            notes,
            audit,
        }
    }

    /// Create a case in RECEIVED with a fresh reference number and an SLA
    /// deadline from the clinic's configuration. A concurrent create taking
    /// the same reference surfaces as Conflict from the store.
    pub async fn create(&self, current: &CurrentUser, input: CreateCase) -> AppResult<Case> {
        self.insurers
            .find_by_id(input.insurer_id)
            .await?
            .ok_or_else(|| AppError::validation("Unknown insurer"))?;

        let clinic = self
            .clinics
            .find_by_id(current.clinic_id)
            .await?
            .ok_or_else(|| AppError::not_found("Clinic"))?;

        let now = Utc::now();
        let prefix = reference_prefix(now);
        let latest = self.cases.latest_reference_with_prefix(&prefix).await?;
        let reference_number = next_reference(&prefix, latest.as_deref());

        let case = Case {
            id: Uuid::new_v4(),
            reference_number,
            patient_first_name: input.patient_first_name,
            patient_last_name: input.patient_last_name,
            patient_dob: input.patient_dob,
            patient_nhs_number: input.patient_nhs_number,
            patient_email: input.patient_email,
            patient_phone: input.patient_phone,
            referral_type: input.referral_type,
            referring_clinician: input.referring_clinician,
            clinical_notes: input.clinical_notes,
            insurer_id: input.insurer_id,
            insurer_policy_number: input.insurer_policy_number,
            insurer_auth_code: None,
            priority: input.priority.unwrap_or(CasePriority::Medium),
            status: CaseStatus::Received,
            sla_deadline: now + Duration::days(clinic.sla_days()),
            sla_breached: false,
            source_type: input.source_type.unwrap_or(CaseSource::Portal),
            clinic_id: current.clinic_id,
            created_by_id: current.id,
            assigned_to_id: input.assigned_to_id.unwrap_or(current.id),
            submitted_at: None,
            approved_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.cases.insert(&case).await.map_err(|err| match err {
            crate::domain::repositories::RepositoryError::Conflict(_) => {
                AppError::conflict("Reference number already allocated")
            }
            other => other.into(),
        })?;

        self.cases
            .append_history(&CaseStatusHistory {
                id: Uuid::new_v4(),
                case_id: case.id,
                from_status: None,
                to_status: CaseStatus::Received,
                changed_by_id: current.id,
                reason: Some("Case created".to_string()),
                created_at: now,
            })
            .await?;

        self.audit
            .record(
                AuditEvent::new(
                    AuditAction::Create,
                    "Case",
                    case.id.to_string(),
                    format!("Case {} created", case.reference_number),
                )
                .by(current.id)
                .on_case(case.id),
            )
            .await;

        tracing::info!(reference = %case.reference_number, clinic = %case.clinic_id, "case created");
        Ok(case)
    }

    pub async fn list(
        &self,
        current: &CurrentUser,
        mut query: CaseListQuery,
        page: &PageParams,
    ) -> AppResult<Paginated<Case>> {
        query.limit = page.limit();
        query.offset = page.offset();
        let (cases, total) = self.cases.list(current.clinic_id, &query).await?;
        Ok(Paginated::new(cases, page, total))
    }

    /// Fetch one case; the read itself is audited.
    pub async fn find_one(&self, current: &CurrentUser, id: Uuid) -> AppResult<Case> {
        let case = self.require_case(current, id).await?;
        self.audit
            .record(
                AuditEvent::new(
                    AuditAction::View,
                    "Case",
                    case.id.to_string(),
                    format!("Case {} viewed", case.reference_number),
                )
                .by(current.id)
                .on_case(case.id),
            )
            .await;
        Ok(case)
    }

    pub async fn find_by_reference(
        &self,
        current: &CurrentUser,
        reference: &str,
    ) -> AppResult<Case> {
        self.cases
            .find_by_reference_in_clinic(reference, current.clinic_id)
            .await?
            .ok_or_else(|| AppError::not_found("Case"))
    }

    /// Partial descriptive update. The audit entry snapshots the fields most
    /// often disputed, whether or not they changed.
    pub async fn update(
        &self,
        current: &CurrentUser,
        id: Uuid,
        input: UpdateCase,
    ) -> AppResult<Case> {
        let mut case = self.require_case(current, id).await?;
        let previous = snapshot(&case);

        if let Some(insurer_id) = input.insurer_id {
            self.insurers
                .find_by_id(insurer_id)
                .await?
                .ok_or_else(|| AppError::validation("Unknown insurer"))?;
            case.insurer_id = insurer_id;
        }
        if let Some(assignee_id) = input.assigned_to_id {
            let assignee = self.require_active_assignee(case.clinic_id, assignee_id).await?;
            case.assigned_to_id = assignee.id;
        }
        if let Some(v) = input.patient_first_name {
            case.patient_first_name = v;
        }
        if let Some(v) = input.patient_last_name {
            case.patient_last_name = v;
        }
        if let Some(v) = input.patient_dob {
            case.patient_dob = v;
        }
        if let Some(v) = input.patient_nhs_number {
            case.patient_nhs_number = Some(v);
        }
        if let Some(v) = input.patient_email {
            case.patient_email = Some(v);
        }
        if let Some(v) = input.patient_phone {
            case.patient_phone = Some(v);
        }
        if let Some(v) = input.referral_type {
            case.referral_type = v;
        }
        if let Some(v) = input.referring_clinician {
            case.referring_clinician = v;
        }
        if let Some(v) = input.clinical_notes {
            case.clinical_notes = Some(v);
        }
        if let Some(v) = input.insurer_policy_number {
            case.insurer_policy_number = Some(v);
        }
        if let Some(v) = input.insurer_auth_code {
            case.insurer_auth_code = Some(v);
        }
        if let Some(v) = input.priority {
            case.priority = v;
        }
        case.updated_at = Utc::now();
        self.cases.update(&case).await?;

        self.audit
            .record(
                AuditEvent::new(
                    AuditAction::Update,
                    "Case",
                    case.id.to_string(),
                    format!("Case {} updated", case.reference_number),
                )
                .by(current.id)
                .on_case(case.id)
                .values(Some(previous), Some(snapshot(&case))),
            )
            .await;
        Ok(case)
    }

    /// Apply one edge of the status machine. Illegal edges fail without any
    /// persisted change. Entering SUBMITTED, APPROVED or CLOSED stamps the
    /// matching timestamp; re-entry re-stamps and nothing is ever cleared.
    pub async fn update_status(
        &self,
        current: &CurrentUser,
        id: Uuid,
        to: CaseStatus,
        reason: Option<String>,
    ) -> AppResult<Case> {
        let mut case = self.require_case(current, id).await?;
        let from = case.status;
        if !from.can_transition_to(to) {
            return Err(AppError::InvalidTransition { from, to });
        }

        let now = Utc::now();
        case.status = to;
        match to {
            CaseStatus::Submitted => case.submitted_at = Some(now),
            CaseStatus::Approved => case.approved_at = Some(now),
            CaseStatus::Closed => case.completed_at = Some(now),
            _ => {}
        }
        case.updated_at = now;
        self.cases.update(&case).await?;

        self.cases
            .append_history(&CaseStatusHistory {
                id: Uuid::new_v4(),
                case_id: case.id,
                from_status: Some(from),
                to_status: to,
                changed_by_id: current.id,
                reason: reason.clone(),
                created_at: now,
            })
            .await?;

        self.audit
            .record(
                AuditEvent::new(
                    AuditAction::StatusChange,
                    "Case",
                    case.id.to_string(),
                    format!("Case {} moved {from} -> {to}", case.reference_number),
                )
                .by(current.id)
                .on_case(case.id)
                .values(
                    Some(serde_json::json!({ "status": from })),
                    Some(serde_json::json!({ "status": to, "reason": reason })),
                ),
            )
            .await;
        Ok(case)
    }

    /// Reassign a case. The assignee must be an active user of the same
    /// clinic. ADMIN/MANAGER only.
    pub async fn assign(
        &self,
        current: &CurrentUser,
        id: Uuid,
        assignee_id: Uuid,
    ) -> AppResult<Case> {
        if !current.role.is_manager_or_admin() {
            return Err(AppError::forbidden("Insufficient role"));
        }
        let mut case = self.require_case(current, id).await?;
        let assignee = self.require_active_assignee(case.clinic_id, assignee_id).await?;

        let previous = case.assigned_to_id;
        case.assigned_to_id = assignee.id;
        case.updated_at = Utc::now();
        self.cases.update(&case).await?;

        self.audit
            .record(
                AuditEvent::new(
                    AuditAction::AssignmentChange,
                    "Case",
                    case.id.to_string(),
                    format!(
                        "Case {} assigned to {}",
                        case.reference_number,
                        assignee.full_name()
                    ),
                )
                .by(current.id)
                .on_case(case.id)
                .values(
                    Some(serde_json::json!({ "assignedToId": previous })),
                    Some(serde_json::json!({ "assignedToId": assignee.id })),
                ),
            )
            .await;
        Ok(case)
    }

    pub async fn add_note(
        &self,
        current: &CurrentUser,
        case_id: Uuid,
        content: String,
        is_internal: bool,
    ) -> AppResult<CaseNote> {
        let case = self.require_case(current, case_id).await?;
        let note = CaseNote {
            id: Uuid::new_v4(),
            case_id: case.id,
            content,
            is_internal,
            created_by_id: current.id,
            created_at: Utc::now(),
        };
        self.notes.insert(&note).await?;

        self.audit
            .record(
                AuditEvent::new(
                    AuditAction::NoteAdded,
                    "Case",
                    case.id.to_string(),
                    format!("Note added to case {}", case.reference_number),
                )
                .by(current.id)
                .on_case(case.id),
            )
            .await;
        Ok(note)
    }

    /// Notes, most recent first.
    pub async fn notes(&self, current: &CurrentUser, case_id: Uuid) -> AppResult<Vec<CaseNote>> {
        let case = self.require_case(current, case_id).await?;
        Ok(self.notes.list_by_case(case.id).await?)
    }

    pub async fn history(
        &self,
        current: &CurrentUser,
        case_id: Uuid,
    ) -> AppResult<Vec<CaseStatusHistory>> {
        let case = self.require_case(current, case_id).await?;
        Ok(self.cases.history_for_case(case.id).await?)
    }

    /// Flag every non-terminal case past its deadline. Idempotent; a second
    /// sweep finds nothing new. ADMIN only.
    pub async fn check_sla_breaches(&self, current: &CurrentUser) -> AppResult<u64> {
        if current.role != crate::domain::entities::Role::Admin {
            return Err(AppError::forbidden("Admin role required"));
        }
        let flagged = self.cases.mark_sla_breaches(Utc::now()).await?;
        if flagged > 0 {
            tracing::warn!(flagged, "cases newly past their SLA deadline");
        }
        Ok(flagged)
    }

    pub async fn overdue(&self, current: &CurrentUser) -> AppResult<Vec<Case>> {
        Ok(self.cases.overdue(current.clinic_id).await?)
    }

    pub async fn stats(&self, current: &CurrentUser) -> AppResult<CaseStats> {
        let clinic_id = current.clinic_id;
        let now = Utc::now();
        let midnight = Utc
            .with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
            .single()
            .unwrap_or(now);

        let total = self.cases.count_in_clinic(clinic_id).await?;
        let active = self.cases.count_active(clinic_id).await?;
        let overdue = self.cases.count_overdue(clinic_id).await?;
        let created_today = self
            .cases
            .count_created_between(clinic_id, midnight, None)
            .await?;

        let by_status = self
            .cases
            .status_counts(clinic_id)
            .await?
            .into_iter()
            .map(|(status, count)| (status.as_str().to_string(), count))
            .collect();
        let by_priority = self
            .cases
            .priority_counts(clinic_id)
            .await?
            .into_iter()
            .map(|(priority, count)| (priority.as_str().to_string(), count))
            .collect();

        Ok(CaseStats {
            total,
            active,
            overdue,
            created_today,
            by_status,
            by_priority,
        })
    }

    /// An assignee must be an active user of the case's clinic.
    async fn require_active_assignee(
        &self,
        clinic_id: Uuid,
        assignee_id: Uuid,
    ) -> AppResult<User> {
        self.users
            .find_in_clinic(assignee_id, clinic_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::validation("Invalid assignee"))
    }

    /// Clinic-scoped fetch; cross-tenant access is indistinguishable from a
    /// missing case.
    async fn require_case(&self, current: &CurrentUser, id: Uuid) -> AppResult<Case> {
        self.cases
            .find_in_clinic(id, current.clinic_id)
            .await?
            .ok_or_else(|| AppError::not_found("Case"))
    }
}

fn snapshot(case: &Case) -> serde_json::Value {
    serde_json::json!({
        "patientFirstName": case.patient_first_name,
        "patientLastName": case.patient_last_name,
        "priority": case.priority,
        "assignedToId": case.assigned_to_id,
    })
}
