//! Repository contracts for the relational store.
//!
//! Services depend only on these traits; Postgres and in-memory
//! implementations live under `infrastructure`.

pub mod audit_repository;
pub mod case_repository;
pub mod clinic_repository;
pub mod document_repository;
pub mod insurer_repository;
pub mod note_repository;
pub mod user_repository;

use std::sync::Arc;

use thiserror::Error;

pub use audit_repository::{AuditQuery, AuditRepository};
pub use case_repository::{CaseListQuery, CaseRepository, CaseSortField, SortOrder};
pub use clinic_repository::ClinicRepository;
pub use document_repository::DocumentRepository;
pub use insurer_repository::InsurerRepository;
pub use note_repository::NoteRepository;
pub use user_repository::UserRepository;

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found")]
    NotFound,
    #[error("Uniqueness violation: {0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(#[from] Box<dyn std::error::Error + Send + Sync>),
    #[error("Connection error: {0}")]
    Connection(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.message().to_string())
            }
            _ => Self::Database(Box::new(err)),
        }
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

pub type DynClinicRepository = Arc<dyn ClinicRepository>;
pub type DynUserRepository = Arc<dyn UserRepository>;
pub type DynInsurerRepository = Arc<dyn InsurerRepository>;
pub type DynCaseRepository = Arc<dyn CaseRepository>;
pub type DynNoteRepository = Arc<dyn NoteRepository>;
pub type DynDocumentRepository = Arc<dyn DocumentRepository>;
pub type DynAuditRepository = Arc<dyn AuditRepository>;
