//! `FromRow` structs for the Postgres tables and their conversions into
//! domain entities. Enum columns come back as TEXT and are parsed here.

use chrono::{DateTime, NaiveDate, Utc};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::entities::{
    AuditAction, AuditEntry, Case, CaseNote, CasePriority, CaseSource, CaseStatus,
    CaseStatusHistory, Clinic, Document, DocumentType, Insurer, Role, User,
};
use crate::domain::repositories::RepositoryError;

pub(super) fn parse_enum<T>(raw: &str) -> Result<T, RepositoryError>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>()
        .map_err(|msg| RepositoryError::Database(msg.into()))
}

#[derive(sqlx::FromRow)]
pub(super) struct ClinicRow {
    pub id: Uuid,
    pub name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub sla_default_days: Option<i64>,
    pub subscription_tier: String,
    pub created_at: DateTime<Utc>,
}

impl From<ClinicRow> for Clinic {
    fn from(row: ClinicRow) -> Self {
        Clinic {
            id: row.id,
            name: row.name,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            sla_default_days: row.sla_default_days,
            subscription_tier: row.subscription_tier,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub clinic_id: Uuid,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            role: parse_enum::<Role>(&row.role)?,
            clinic_id: row.clinic_id,
            is_active: row.is_active,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct InsurerRow {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub avg_response_days: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<InsurerRow> for Insurer {
    fn from(row: InsurerRow) -> Self {
        Insurer {
            id: row.id,
            name: row.name,
            code: row.code,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            avg_response_days: row.avg_response_days,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CaseRow {
    pub id: Uuid,
    pub reference_number: String,
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
    pub insurer_auth_code: Option<String>,
    pub priority: String,
    pub status: String,
    pub sla_deadline: DateTime<Utc>,
    pub sla_breached: bool,
    pub source_type: String,
    pub clinic_id: Uuid,
    pub created_by_id: Uuid,
    pub assigned_to_id: Uuid,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CaseRow> for Case {
    type Error = RepositoryError;

    fn try_from(row: CaseRow) -> Result<Self, Self::Error> {
        Ok(Case {
            id: row.id,
            reference_number: row.reference_number,
            patient_first_name: row.patient_first_name,
            patient_last_name: row.patient_last_name,
            patient_dob: row.patient_dob,
            patient_nhs_number: row.patient_nhs_number,
            patient_email: row.patient_email,
            patient_phone: row.patient_phone,
            referral_type: row.referral_type,
            referring_clinician: row.referring_clinician,
            clinical_notes: row.clinical_notes,
            insurer_id: row.insurer_id,
            insurer_policy_number: row.insurer_policy_number,
            insurer_auth_code: row.insurer_auth_code,
            priority: parse_enum::<CasePriority>(&row.priority)?,
            status: parse_enum::<CaseStatus>(&row.status)?,
            sla_deadline: row.sla_deadline,
            sla_breached: row.sla_breached,
            source_type: parse_enum::<CaseSource>(&row.source_type)?,
            clinic_id: row.clinic_id,
            created_by_id: row.created_by_id,
            assigned_to_id: row.assigned_to_id,
            submitted_at: row.submitted_at,
            approved_at: row.approved_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct HistoryRow {
    pub id: Uuid,
    pub case_id: Uuid,
    pub from_status: Option<String>,
    pub to_status: String,
    pub changed_by_id: Uuid,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for CaseStatusHistory {
    type Error = RepositoryError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(CaseStatusHistory {
            id: row.id,
            case_id: row.case_id,
            from_status: row
                .from_status
                .as_deref()
                .map(parse_enum::<CaseStatus>)
                .transpose()?,
            to_status: parse_enum::<CaseStatus>(&row.to_status)?,
            changed_by_id: row.changed_by_id,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct NoteRow {
    pub id: Uuid,
    pub case_id: Uuid,
    pub content: String,
    pub is_internal: bool,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<NoteRow> for CaseNote {
    fn from(row: NoteRow) -> Self {
        CaseNote {
            id: row.id,
            case_id: row.case_id,
            content: row.content,
            is_internal: row.is_internal,
            created_by_id: row.created_by_id,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct DocumentRow {
    pub id: Uuid,
    pub case_id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub storage_bucket: String,
    pub storage_key: String,
    pub document_type: String,
    pub uploaded_by_id: Uuid,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = RepositoryError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Ok(Document {
            id: row.id,
            case_id: row.case_id,
            filename: row.filename,
            original_name: row.original_name,
            mime_type: row.mime_type,
            size_bytes: row.size_bytes,
            storage_bucket: row.storage_bucket,
            storage_key: row.storage_key,
            document_type: parse_enum::<DocumentType>(&row.document_type)?,
            uploaded_by_id: row.uploaded_by_id,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct AuditRow {
    pub id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub description: String,
    pub previous_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub user_id: Option<Uuid>,
    pub case_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = RepositoryError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        Ok(AuditEntry {
            id: row.id,
            action: parse_enum::<AuditAction>(&row.action)?,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            description: row.description,
            previous_value: row.previous_value,
            new_value: row.new_value,
            user_id: row.user_id,
            case_id: row.case_id,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: row.created_at,
        })
    }
}
