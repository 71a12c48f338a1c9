//! Domain entities and their invariants.

pub mod audit;
pub mod case;
pub mod clinic;
pub mod document;
pub mod insurer;
pub mod note;
pub mod user;

pub use audit::{AuditAction, AuditEntry};
pub use case::{
    next_reference, reference_prefix, Case, CasePriority, CaseSource, CaseStatus,
    CaseStatusHistory,
};
pub use clinic::{Clinic, DEFAULT_SLA_DAYS};
pub use document::{Document, DocumentType, ALLOWED_MIME_TYPES, MAX_DOCUMENT_BYTES};
pub use insurer::Insurer;
pub use note::CaseNote;
pub use user::{CurrentUser, Role, User};
