//! Document metadata. File bytes live in external object storage; deletion
//! is logical only (the row is never removed).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted upload size: 10 MiB.
pub const MAX_DOCUMENT_BYTES: i64 = 10 * 1024 * 1024;

/// MIME types accepted for upload.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/gif",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    ReferralLetter,
    ClinicalNotes,
    InsuranceForm,
    Authorization,
    LabResults,
    Imaging,
    ConsentForm,
    Correspondence,
    Other,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::ReferralLetter => "REFERRAL_LETTER",
            DocumentType::ClinicalNotes => "CLINICAL_NOTES",
            DocumentType::InsuranceForm => "INSURANCE_FORM",
            DocumentType::Authorization => "AUTHORIZATION",
            DocumentType::LabResults => "LAB_RESULTS",
            DocumentType::Imaging => "IMAGING",
            DocumentType::ConsentForm => "CONSENT_FORM",
            DocumentType::Correspondence => "CORRESPONDENCE",
            DocumentType::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REFERRAL_LETTER" => Ok(DocumentType::ReferralLetter),
            "CLINICAL_NOTES" => Ok(DocumentType::ClinicalNotes),
            "INSURANCE_FORM" => Ok(DocumentType::InsuranceForm),
            "AUTHORIZATION" => Ok(DocumentType::Authorization),
            "LAB_RESULTS" => Ok(DocumentType::LabResults),
            "IMAGING" => Ok(DocumentType::Imaging),
            "CONSENT_FORM" => Ok(DocumentType::ConsentForm),
            "CORRESPONDENCE" => Ok(DocumentType::Correspondence),
            "OTHER" => Ok(DocumentType::Other),
            other => Err(format!("unknown document type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub case_id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub storage_bucket: String,
    pub storage_key: String,
    pub document_type: DocumentType,
    pub uploaded_by_id: Uuid,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_is_allowed_but_executables_are_not() {
        assert!(ALLOWED_MIME_TYPES.contains(&"application/pdf"));
        assert!(!ALLOWED_MIME_TYPES.contains(&"application/x-msdownload"));
    }

    #[test]
    fn document_type_round_trips() {
        let t: DocumentType = "REFERRAL_LETTER".parse().unwrap();
        assert_eq!(t, DocumentType::ReferralLetter);
        assert!("SPREADSHEET".parse::<DocumentType>().is_err());
    }
}
