//! Dependency wiring. The container owns every service and is cloned into
//! the router as axum state.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::repositories::{
    DynAuditRepository, DynCaseRepository, DynClinicRepository, DynDocumentRepository,
    DynInsurerRepository, DynNoteRepository, DynUserRepository,
};
use crate::infrastructure::{memory, postgres};
use crate::middleware::RateLimiter;
use crate::services::{
    AuditService, AuthService, CaseService, DocumentService, ReportService, TokenService,
    UserService,
};
use crate::shared::{AppError, AppResult};

#[derive(Clone)]
pub struct AppContainer {
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub case_service: Arc<CaseService>,
    pub document_service: Arc<DocumentService>,
    pub audit_service: Arc<AuditService>,
    pub report_service: Arc<ReportService>,
    pub token_service: Arc<TokenService>,
    pub rate_limiter: Arc<RateLimiter>,
    // Exposed for seeding reference data (migrations cover Postgres).
    pub clinic_repo: DynClinicRepository,
    pub insurer_repo: DynInsurerRepository,
}

struct Repos {
    clinics: DynClinicRepository,
    users: DynUserRepository,
    insurers: DynInsurerRepository,
    cases: DynCaseRepository,
    notes: DynNoteRepository,
    documents: DynDocumentRepository,
    audit: DynAuditRepository,
}

impl AppContainer {
    /// In-memory wiring for tests and local development.
    pub fn new_memory(config: &AppConfig) -> Self {
        let repos = Repos {
            clinics: Arc::new(memory::MemoryClinicRepository::default()),
            users: Arc::new(memory::MemoryUserRepository::default()),
            insurers: Arc::new(memory::MemoryInsurerRepository::default()),
            cases: Arc::new(memory::MemoryCaseRepository::default()),
            notes: Arc::new(memory::MemoryNoteRepository::default()),
            documents: Arc::new(memory::MemoryDocumentRepository::default()),
            audit: Arc::new(memory::MemoryAuditRepository::default()),
        };
        Self::assemble(config, repos)
    }

    /// Production wiring: connect, migrate, build repositories on the pool.
    pub async fn new_postgres(config: &AppConfig, database_url: &str) -> AppResult<Self> {
        let pool = postgres::connect(database_url)
            .await
            .map_err(|e| AppError::internal(e.to_string()))?;
        let repos = Repos {
            clinics: Arc::new(postgres::PgClinicRepository::new(pool.clone())),
            users: Arc::new(postgres::PgUserRepository::new(pool.clone())),
            insurers: Arc::new(postgres::PgInsurerRepository::new(pool.clone())),
            cases: Arc::new(postgres::PgCaseRepository::new(pool.clone())),
            notes: Arc::new(postgres::PgNoteRepository::new(pool.clone())),
            documents: Arc::new(postgres::PgDocumentRepository::new(pool.clone())),
            audit: Arc::new(postgres::PgAuditRepository::new(pool)),
        };
        Ok(Self::assemble(config, repos))
    }

    fn assemble(config: &AppConfig, repos: Repos) -> Self {
        let token_service = Arc::new(TokenService::new(
            &config.jwt_secret,
            config.jwt_ttl_seconds,
        ));
        let audit_service = Arc::new(AuditService::new(
            repos.audit.clone(),
            repos.cases.clone(),
        ));
        let auth_service = Arc::new(AuthService::new(
            repos.users.clone(),
            token_service.clone(),
            audit_service.clone(),
        ));
        let user_service = Arc::new(UserService::new(
            repos.users.clone(),
            audit_service.clone(),
        ));
        let case_service = Arc::new(CaseService::new(
            repos.cases.clone(),
            repos.clinics.clone(),
            repos.insurers.clone(),
            repos.users.clone(),
            repos.notes,
            audit_service.clone(),
        ));
        let document_service = Arc::new(DocumentService::new(
            repos.documents,
            repos.cases.clone(),
            audit_service.clone(),
            config.document_bucket.clone(),
        ));
        let report_service = Arc::new(ReportService::new(
            repos.cases,
            repos.users,
            repos.insurers.clone(),
        ));

        Self {
            auth_service,
            user_service,
            case_service,
            document_service,
            audit_service,
            report_service,
            token_service,
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limits.clone())),
            clinic_repo: repos.clinics,
            insurer_repo: repos.insurers,
        }
    }
}
