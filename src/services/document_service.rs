//! Document metadata: upload validation, listing, download links and
//! logical deletion. File bytes live in external object storage.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::{
    AuditAction, CurrentUser, Document, DocumentType, ALLOWED_MIME_TYPES, MAX_DOCUMENT_BYTES,
};
use crate::domain::repositories::{DynCaseRepository, DynDocumentRepository};
use crate::services::audit_service::{AuditEvent, AuditService};
use crate::shared::{AppError, AppResult};

const DOWNLOAD_URL_TTL_SECS: i64 = 900;

pub struct UploadDocument {
    pub case_id: Uuid,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub document_type: Option<DocumentType>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub url: String,
    pub expires_at: chrono::DateTime<Utc>,
}

pub struct DocumentService {
    documents: DynDocumentRepository,
    cases: DynCaseRepository,
    audit: Arc<AuditService>,
    bucket: String,
}

impl DocumentService {
    pub fn new(
        documents: DynDocumentRepository,
        cases: DynCaseRepository,
        audit: Arc<AuditService>,
        bucket: String,
    ) -> Self {
        Self {
            documents,
            cases,
            audit,
            bucket,
        }
    }

    /// Record upload metadata after validating type and size. The storage
    /// key partitions objects by clinic and case.
    pub async fn upload(
        &self,
        current: &CurrentUser,
        input: UploadDocument,
    ) -> AppResult<Document> {
        let case = self.require_case(current, input.case_id).await?;

        if !ALLOWED_MIME_TYPES.contains(&input.mime_type.as_str()) {
            return Err(AppError::validation(format!(
                "File type {} is not allowed",
                input.mime_type
            )));
        }
        if input.size_bytes <= 0 || input.size_bytes > MAX_DOCUMENT_BYTES {
            return Err(AppError::validation("File exceeds the 10 MiB limit"));
        }

        let id = Uuid::new_v4();
        let filename = format!("{id}-{}", input.original_name);
        let document = Document {
            id,
            case_id: case.id,
            filename: filename.clone(),
            original_name: input.original_name,
            mime_type: input.mime_type,
            size_bytes: input.size_bytes,
            storage_bucket: self.bucket.clone(),
            storage_key: format!("{}/{}/{filename}", case.clinic_id, case.id),
            document_type: input.document_type.unwrap_or(DocumentType::Other),
            uploaded_by_id: current.id,
            deleted_at: None,
            created_at: Utc::now(),
        };
        self.documents.insert(&document).await?;

        self.audit
            .record(
                AuditEvent::new(
                    AuditAction::DocumentUpload,
                    "Document",
                    document.id.to_string(),
                    format!(
                        "Document {} uploaded to case {}",
                        document.original_name, case.reference_number
                    ),
                )
                .by(current.id)
                .on_case(case.id),
            )
            .await;
        Ok(document)
    }

    pub async fn list_for_case(
        &self,
        current: &CurrentUser,
        case_id: Uuid,
    ) -> AppResult<Vec<Document>> {
        let case = self.require_case(current, case_id).await?;
        Ok(self.documents.list_active_by_case(case.id).await?)
    }

    /// Fetch one document. Soft-deleted rows are not retrievable here either.
    pub async fn find_one(&self, current: &CurrentUser, id: Uuid) -> AppResult<Document> {
        let document = self
            .documents
            .find_active(id)
            .await?
            .ok_or_else(|| AppError::not_found("Document"))?;
        self.require_case(current, document.case_id).await?;
        Ok(document)
    }

    /// Produce a short-lived download URL for the stored object.
    pub async fn download(&self, current: &CurrentUser, id: Uuid) -> AppResult<DownloadLink> {
        let document = self.find_one(current, id).await?;

        self.audit
            .record(
                AuditEvent::new(
                    AuditAction::DocumentDownload,
                    "Document",
                    document.id.to_string(),
                    format!("Document {} downloaded", document.original_name),
                )
                .by(current.id)
                .on_case(document.case_id),
            )
            .await;

        // Placeholder for a presigned object-store URL.
        Ok(DownloadLink {
            url: format!(
                "https://{}.storage.local/{}",
                document.storage_bucket, document.storage_key
            ),
            expires_at: Utc::now() + Duration::seconds(DOWNLOAD_URL_TTL_SECS),
        })
    }

    /// Logical delete: the row stays but disappears from every read path.
    pub async fn delete(&self, current: &CurrentUser, id: Uuid) -> AppResult<()> {
        let document = self.find_one(current, id).await?;
        self.documents.soft_delete(document.id, Utc::now()).await?;

        self.audit
            .record(
                AuditEvent::new(
                    AuditAction::DocumentDelete,
                    "Document",
                    document.id.to_string(),
                    format!("Document {} deleted", document.original_name),
                )
                .by(current.id)
                .on_case(document.case_id),
            )
            .await;
        Ok(())
    }

    async fn require_case(
        &self,
        current: &CurrentUser,
        case_id: Uuid,
    ) -> AppResult<crate::domain::entities::Case> {
        self.cases
            .find_in_clinic(case_id, current.clinic_id)
            .await?
            .ok_or_else(|| AppError::not_found("Case"))
    }
}
