//! Business rules, one service per concern. Services depend on repository
//! traits only and are wired together by the application container.

pub mod audit_service;
pub mod auth_service;
pub mod case_service;
pub mod document_service;
pub mod report_service;
pub mod token_service;
pub mod user_service;

pub use audit_service::{AuditEvent, AuditService};
pub use auth_service::{AuthService, LoginOutcome, NewUser};
pub use case_service::{CaseService, CaseStats, CreateCase, UpdateCase};
pub use document_service::{DocumentService, DownloadLink, UploadDocument};
pub use report_service::ReportService;
pub use token_service::{Claims, TokenService};
pub use user_service::{CreateUser, UpdateUser, UserService};
