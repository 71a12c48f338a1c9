//! Audit log entries: immutable compliance records, never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    View,
    StatusChange,
    AssignmentChange,
    NoteAdded,
    DocumentUpload,
    DocumentDownload,
    DocumentDelete,
    Login,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::View => "VIEW",
            AuditAction::StatusChange => "STATUS_CHANGE",
            AuditAction::AssignmentChange => "ASSIGNMENT_CHANGE",
            AuditAction::NoteAdded => "NOTE_ADDED",
            AuditAction::DocumentUpload => "DOCUMENT_UPLOAD",
            AuditAction::DocumentDownload => "DOCUMENT_DOWNLOAD",
            AuditAction::DocumentDelete => "DOCUMENT_DELETE",
            AuditAction::Login => "LOGIN",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(AuditAction::Create),
            "UPDATE" => Ok(AuditAction::Update),
            "VIEW" => Ok(AuditAction::View),
            "STATUS_CHANGE" => Ok(AuditAction::StatusChange),
            "ASSIGNMENT_CHANGE" => Ok(AuditAction::AssignmentChange),
            "NOTE_ADDED" => Ok(AuditAction::NoteAdded),
            "DOCUMENT_UPLOAD" => Ok(AuditAction::DocumentUpload),
            "DOCUMENT_DOWNLOAD" => Ok(AuditAction::DocumentDownload),
            "DOCUMENT_DELETE" => Ok(AuditAction::DocumentDelete),
            "LOGIN" => Ok(AuditAction::Login),
            other => Err(format!("unknown audit action: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
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
    pub created_at: DateTime<Utc>,
}
