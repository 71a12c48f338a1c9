//! Postgres repositories backed by a shared `PgPool`.
//!
//! Enums are stored as TEXT and parsed back through the domain `FromStr`
//! impls; dynamic filters are assembled with `QueryBuilder`.

mod rows;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
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

use rows::{AuditRow, CaseRow, ClinicRow, DocumentRow, HistoryRow, InsurerRow, NoteRow, UserRow};

/// Open a connection pool and apply pending migrations.
pub async fn connect(database_url: &str) -> Result<PgPool, RepositoryError> {
    let pool = PgPool::connect(database_url)
        .await
        .map_err(|e| RepositoryError::Connection(e.to_string()))?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| RepositoryError::Connection(e.to_string()))?;
    Ok(pool)
}

const CASE_COLUMNS: &str = "id, reference_number, patient_first_name, patient_last_name, \
     patient_dob, patient_nhs_number, patient_email, patient_phone, referral_type, \
     referring_clinician, clinical_notes, insurer_id, insurer_policy_number, insurer_auth_code, \
     priority, status, sla_deadline, sla_breached, source_type, clinic_id, created_by_id, \
     assigned_to_id, submitted_at, approved_at, completed_at, created_at, updated_at";

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, role, clinic_id, \
     is_active, last_login_at, created_at";

#[derive(Clone)]
pub struct PgClinicRepository {
    pool: PgPool,
}

impl PgClinicRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClinicRepository for PgClinicRepository {
    async fn insert(&self, clinic: &Clinic) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO clinics (id, name, contact_email, contact_phone, sla_default_days, \
             subscription_tier, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(clinic.id)
        .bind(&clinic.name)
        .bind(&clinic.contact_email)
        .bind(&clinic.contact_phone)
        .bind(clinic.sla_default_days)
        .bind(&clinic.subscription_tier)
        .bind(clinic.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Clinic>> {
        let row = sqlx::query_as::<_, ClinicRow>(
            "SELECT id, name, contact_email, contact_phone, sla_default_days, \
             subscription_tier, created_at FROM clinics WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Clinic::from))
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: &User) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, first_name, last_name, role, \
             clinic_id, is_active, last_login_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.clinic_id)
        .bind(user.is_active)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_in_clinic(&self, id: Uuid, clinic_id: Uuid) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND clinic_id = $2"
        ))
        .bind(id)
        .bind(clinic_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn update(&self, user: &User) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, password_hash = $3, first_name = $4, \
             last_name = $5, role = $6, is_active = $7 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> RepoResult<()> {
        let result = sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_in_clinic(&self, clinic_id: Uuid) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE clinic_id = $1 ORDER BY last_name"
        ))
        .bind(clinic_id)
        .fetch_all(&self.pool)
        .await?;
        users.into_iter().map(User::try_from).collect()
    }

    async fn list_active_in_clinic(&self, clinic_id: Uuid) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE clinic_id = $1 AND is_active = TRUE ORDER BY last_name"
        ))
        .bind(clinic_id)
        .fetch_all(&self.pool)
        .await?;
        users.into_iter().map(User::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgInsurerRepository {
    pool: PgPool,
}

impl PgInsurerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InsurerRepository for PgInsurerRepository {
    async fn insert(&self, insurer: &Insurer) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO insurers (id, name, code, contact_email, contact_phone, \
             avg_response_days, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(insurer.id)
        .bind(&insurer.name)
        .bind(&insurer.code)
        .bind(&insurer.contact_email)
        .bind(&insurer.contact_phone)
        .bind(insurer.avg_response_days)
        .bind(insurer.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Insurer>> {
        let row = sqlx::query_as::<_, InsurerRow>(
            "SELECT id, name, code, contact_email, contact_phone, avg_response_days, \
             created_at FROM insurers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Insurer::from))
    }

    async fn find_names(&self, ids: &[Uuid]) -> RepoResult<Vec<(Uuid, String)>> {
        let rows: Vec<(Uuid, String)> =
            sqlx::query_as("SELECT id, name FROM insurers WHERE id = ANY($1)")
                .bind(ids.to_vec())
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }
}

#[derive(Clone)]
pub struct PgCaseRepository {
    pool: PgPool,
}

impl PgCaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &CaseListQuery) {
        if let Some(status) = query.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_str());
        }
        if let Some(priority) = query.priority {
            builder.push(" AND priority = ");
            builder.push_bind(priority.as_str());
        }
        if let Some(assignee) = query.assigned_to_id {
            builder.push(" AND assigned_to_id = ");
            builder.push_bind(assignee);
        }
        if let Some(insurer) = query.insurer_id {
            builder.push(" AND insurer_id = ");
            builder.push_bind(insurer);
        }
        if let Some(breached) = query.sla_breached {
            builder.push(" AND sla_breached = ");
            builder.push_bind(breached);
        }
        if let Some(search) = &query.search {
            let pattern = format!("%{search}%");
            builder.push(" AND (reference_number ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR patient_first_name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR patient_last_name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR patient_nhs_number ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
    }

    fn order_clause(field: CaseSortField, order: SortOrder) -> String {
        let column = match field {
            CaseSortField::CreatedAt => "created_at",
            CaseSortField::UpdatedAt => "updated_at",
            CaseSortField::SlaDeadline => "sla_deadline",
            CaseSortField::ReferenceNumber => "reference_number",
            CaseSortField::Priority => "priority",
        };
        let direction = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        format!(" ORDER BY {column} {direction}")
    }
}

#[async_trait]
impl CaseRepository for PgCaseRepository {
    async fn insert(&self, case: &Case) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO cases (id, reference_number, patient_first_name, patient_last_name, \
             patient_dob, patient_nhs_number, patient_email, patient_phone, referral_type, \
             referring_clinician, clinical_notes, insurer_id, insurer_policy_number, \
             insurer_auth_code, priority, status, sla_deadline, sla_breached, source_type, \
             clinic_id, created_by_id, assigned_to_id, submitted_at, approved_at, completed_at, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)",
        )
        .bind(case.id)
        .bind(&case.reference_number)
        .bind(&case.patient_first_name)
        .bind(&case.patient_last_name)
        .bind(case.patient_dob)
        .bind(&case.patient_nhs_number)
        .bind(&case.patient_email)
        .bind(&case.patient_phone)
        .bind(&case.referral_type)
        .bind(&case.referring_clinician)
        .bind(&case.clinical_notes)
        .bind(case.insurer_id)
        .bind(&case.insurer_policy_number)
        .bind(&case.insurer_auth_code)
        .bind(case.priority.as_str())
        .bind(case.status.as_str())
        .bind(case.sla_deadline)
        .bind(case.sla_breached)
        .bind(case.source_type.as_str())
        .bind(case.clinic_id)
        .bind(case.created_by_id)
        .bind(case.assigned_to_id)
        .bind(case.submitted_at)
        .bind(case.approved_at)
        .bind(case.completed_at)
        .bind(case.created_at)
        .bind(case.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_in_clinic(&self, id: Uuid, clinic_id: Uuid) -> RepoResult<Option<Case>> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE id = $1 AND clinic_id = $2"
        ))
        .bind(id)
        .bind(clinic_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Case::try_from).transpose()
    }

    async fn find_by_reference_in_clinic(
        &self,
        reference: &str,
        clinic_id: Uuid,
    ) -> RepoResult<Option<Case>> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE reference_number = $1 AND clinic_id = $2"
        ))
        .bind(reference)
        .bind(clinic_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Case::try_from).transpose()
    }

    async fn latest_reference_with_prefix(&self, prefix: &str) -> RepoResult<Option<String>> {
        let latest: Option<String> = sqlx::query_scalar(
            "SELECT reference_number FROM cases WHERE reference_number LIKE $1 \
             ORDER BY reference_number DESC LIMIT 1",
        )
        .bind(format!("{prefix}%"))
        .fetch_optional(&self.pool)
        .await?;
        Ok(latest)
    }

    async fn update(&self, case: &Case) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE cases SET patient_first_name = $2, patient_last_name = $3, \
             patient_dob = $4, patient_nhs_number = $5, patient_email = $6, \
             patient_phone = $7, referral_type = $8, referring_clinician = $9, \
             clinical_notes = $10, insurer_id = $11, insurer_policy_number = $12, \
             insurer_auth_code = $13, priority = $14, status = $15, sla_deadline = $16, \
             sla_breached = $17, assigned_to_id = $18, submitted_at = $19, approved_at = $20, \
             completed_at = $21, updated_at = $22 WHERE id = $1",
        )
        .bind(case.id)
        .bind(&case.patient_first_name)
        .bind(&case.patient_last_name)
        .bind(case.patient_dob)
        .bind(&case.patient_nhs_number)
        .bind(&case.patient_email)
        .bind(&case.patient_phone)
        .bind(&case.referral_type)
        .bind(&case.referring_clinician)
        .bind(&case.clinical_notes)
        .bind(case.insurer_id)
        .bind(&case.insurer_policy_number)
        .bind(&case.insurer_auth_code)
        .bind(case.priority.as_str())
        .bind(case.status.as_str())
        .bind(case.sla_deadline)
        .bind(case.sla_breached)
        .bind(case.assigned_to_id)
        .bind(case.submitted_at)
        .bind(case.approved_at)
        .bind(case.completed_at)
        .bind(case.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list(
        &self,
        clinic_id: Uuid,
        query: &CaseListQuery,
    ) -> RepoResult<(Vec<Case>, i64)> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM cases WHERE clinic_id = ");
        count_builder.push_bind(clinic_id);
        Self::push_filters(&mut count_builder, query);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {CASE_COLUMNS} FROM cases WHERE clinic_id = "));
        builder.push_bind(clinic_id);
        Self::push_filters(&mut builder, query);
        builder.push(Self::order_clause(query.sort_by, query.sort_order));
        builder.push(" LIMIT ");
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset);

        let rows: Vec<CaseRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        let cases = rows
            .into_iter()
            .map(Case::try_from)
            .collect::<RepoResult<Vec<_>>>()?;
        Ok((cases, total))
    }

    async fn overdue(&self, clinic_id: Uuid) -> RepoResult<Vec<Case>> {
        let rows = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE clinic_id = $1 AND sla_breached = TRUE \
             AND status NOT IN ('CLOSED', 'CANCELLED') ORDER BY sla_deadline ASC"
        ))
        .bind(clinic_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Case::try_from).collect()
    }

    async fn mark_sla_breaches(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            "UPDATE cases SET sla_breached = TRUE, updated_at = $1 \
             WHERE sla_deadline < $1 AND sla_breached = FALSE \
             AND status NOT IN ('CLOSED', 'CANCELLED')",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn append_history(&self, entry: &CaseStatusHistory) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO case_status_history (id, case_id, from_status, to_status, \
             changed_by_id, reason, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(entry.id)
        .bind(entry.case_id)
        .bind(entry.from_status.map(|s| s.as_str()))
        .bind(entry.to_status.as_str())
        .bind(entry.changed_by_id)
        .bind(&entry.reason)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn history_for_case(&self, case_id: Uuid) -> RepoResult<Vec<CaseStatusHistory>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            "SELECT id, case_id, from_status, to_status, changed_by_id, reason, created_at \
             FROM case_status_history WHERE case_id = $1 ORDER BY created_at DESC",
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CaseStatusHistory::try_from).collect()
    }

    async fn count_in_clinic(&self, clinic_id: Uuid) -> RepoResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM cases WHERE clinic_id = $1")
            .bind(clinic_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_active(&self, clinic_id: Uuid) -> RepoResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cases WHERE clinic_id = $1 \
             AND status NOT IN ('CLOSED', 'CANCELLED')",
        )
        .bind(clinic_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_overdue(&self, clinic_id: Uuid) -> RepoResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cases WHERE clinic_id = $1 AND sla_breached = TRUE \
             AND status NOT IN ('CLOSED', 'CANCELLED')",
        )
        .bind(clinic_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_created_between(
        &self,
        clinic_id: Uuid,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> RepoResult<i64> {
        let count = match to {
            Some(to) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM cases WHERE clinic_id = $1 \
                     AND created_at >= $2 AND created_at < $3",
                )
                .bind(clinic_id)
                .bind(from)
                .bind(to)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM cases WHERE clinic_id = $1 AND created_at >= $2",
                )
                .bind(clinic_id)
                .bind(from)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(count)
    }

    async fn count_completed_between(
        &self,
        clinic_id: Uuid,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> RepoResult<i64> {
        let count = match to {
            Some(to) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM cases WHERE clinic_id = $1 \
                     AND completed_at >= $2 AND completed_at < $3",
                )
                .bind(clinic_id)
                .bind(from)
                .bind(to)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM cases WHERE clinic_id = $1 AND completed_at >= $2",
                )
                .bind(clinic_id)
                .bind(from)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(count)
    }

    async fn status_counts(&self, clinic_id: Uuid) -> RepoResult<Vec<(CaseStatus, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM cases WHERE clinic_id = $1 GROUP BY status",
        )
        .bind(clinic_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|(status, count)| Ok((rows::parse_enum::<CaseStatus>(&status)?, count)))
            .collect()
    }

    async fn priority_counts(&self, clinic_id: Uuid) -> RepoResult<Vec<(CasePriority, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT priority, COUNT(*) FROM cases WHERE clinic_id = $1 GROUP BY priority",
        )
        .bind(clinic_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|(priority, count)| Ok((rows::parse_enum::<CasePriority>(&priority)?, count)))
            .collect()
    }

    async fn insurer_counts(&self, clinic_id: Uuid) -> RepoResult<Vec<(Uuid, i64)>> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT insurer_id, COUNT(*) FROM cases WHERE clinic_id = $1 GROUP BY insurer_id",
        )
        .bind(clinic_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn closed_insurer_counts(&self, clinic_id: Uuid) -> RepoResult<Vec<(Uuid, i64)>> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT insurer_id, COUNT(*) FROM cases WHERE clinic_id = $1 \
             AND status = 'CLOSED' GROUP BY insurer_id",
        )
        .bind(clinic_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn closed_case_durations(
        &self,
        clinic_id: Uuid,
        insurer_id: Option<Uuid>,
        limit: Option<i64>,
    ) -> RepoResult<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT created_at, completed_at FROM cases WHERE status = 'CLOSED' \
             AND completed_at IS NOT NULL AND clinic_id = ",
        );
        builder.push_bind(clinic_id);
        if let Some(insurer) = insurer_id {
            builder.push(" AND insurer_id = ");
            builder.push_bind(insurer);
        }
        builder.push(" ORDER BY completed_at DESC");
        if let Some(limit) = limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }
        let rows: Vec<(DateTime<Utc>, DateTime<Utc>)> =
            builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count_with_status_in(
        &self,
        clinic_id: Uuid,
        insurer_id: Option<Uuid>,
        statuses: &[CaseStatus],
    ) -> RepoResult<i64> {
        let names: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM cases WHERE clinic_id = ");
        builder.push_bind(clinic_id);
        if let Some(insurer) = insurer_id {
            builder.push(" AND insurer_id = ");
            builder.push_bind(insurer);
        }
        builder.push(" AND status = ANY(");
        builder.push_bind(names);
        builder.push(")");
        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn count_closed_completed_since(
        &self,
        clinic_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepoResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cases WHERE clinic_id = $1 AND status = 'CLOSED' \
             AND completed_at >= $2",
        )
        .bind(clinic_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_closed_breached_completed_since(
        &self,
        clinic_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepoResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cases WHERE clinic_id = $1 AND status = 'CLOSED' \
             AND sla_breached = TRUE AND completed_at >= $2",
        )
        .bind(clinic_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_assigned_created_since(
        &self,
        assignee_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepoResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cases WHERE assigned_to_id = $1 AND created_at >= $2",
        )
        .bind(assignee_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_closed_by_assignee_since(
        &self,
        assignee_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepoResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cases WHERE assigned_to_id = $1 AND status = 'CLOSED' \
             AND completed_at >= $2",
        )
        .bind(assignee_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[derive(Clone)]
pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, note: &CaseNote) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO case_notes (id, case_id, content, is_internal, created_by_id, \
             created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(note.id)
        .bind(note.case_id)
        .bind(&note.content)
        .bind(note.is_internal)
        .bind(note.created_by_id)
        .bind(note.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_by_case(&self, case_id: Uuid) -> RepoResult<Vec<CaseNote>> {
        let rows = sqlx::query_as::<_, NoteRow>(
            "SELECT id, case_id, content, is_internal, created_by_id, created_at \
             FROM case_notes WHERE case_id = $1 ORDER BY created_at DESC",
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CaseNote::from).collect())
    }
}

#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, document: &Document) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO documents (id, case_id, filename, original_name, mime_type, \
             size_bytes, storage_bucket, storage_key, document_type, uploaded_by_id, \
             deleted_at, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(document.id)
        .bind(document.case_id)
        .bind(&document.filename)
        .bind(&document.original_name)
        .bind(&document.mime_type)
        .bind(document.size_bytes)
        .bind(&document.storage_bucket)
        .bind(&document.storage_key)
        .bind(document.document_type.as_str())
        .bind(document.uploaded_by_id)
        .bind(document.deleted_at)
        .bind(document.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_active(&self, id: Uuid) -> RepoResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, case_id, filename, original_name, mime_type, size_bytes, \
             storage_bucket, storage_key, document_type, uploaded_by_id, deleted_at, \
             created_at FROM documents WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Document::try_from).transpose()
    }

    async fn list_active_by_case(&self, case_id: Uuid) -> RepoResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, case_id, filename, original_name, mime_type, size_bytes, \
             storage_bucket, storage_key, document_type, uploaded_by_id, deleted_at, \
             created_at FROM documents WHERE case_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC",
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Document::try_from).collect()
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE documents SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgAuditRepository {
    pool: PgPool,
}

impl PgAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &AuditQuery) {
        if let Some(entity_type) = &query.entity_type {
            builder.push(" AND entity_type = ");
            builder.push_bind(entity_type.clone());
        }
        if let Some(entity_id) = &query.entity_id {
            builder.push(" AND entity_id = ");
            builder.push_bind(entity_id.clone());
        }
        if let Some(user_id) = query.user_id {
            builder.push(" AND user_id = ");
            builder.push_bind(user_id);
        }
        if let Some(case_id) = query.case_id {
            builder.push(" AND case_id = ");
            builder.push_bind(case_id);
        }
        if let Some(action) = query.action {
            builder.push(" AND action = ");
            builder.push_bind(action.as_str());
        }
        if let Some(start) = query.start_date {
            builder.push(" AND created_at >= ");
            builder.push_bind(start);
        }
        if let Some(end) = query.end_date {
            builder.push(" AND created_at <= ");
            builder.push_bind(end);
        }
    }
}

const AUDIT_COLUMNS: &str = "id, action, entity_type, entity_id, description, previous_value, \
     new_value, user_id, case_id, ip_address, user_agent, created_at";

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn insert(&self, entry: &AuditEntry) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO audit_log (id, action, entity_type, entity_id, description, \
             previous_value, new_value, user_id, case_id, ip_address, user_agent, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(entry.id)
        .bind(entry.action.as_str())
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.description)
        .bind(&entry.previous_value)
        .bind(&entry.new_value)
        .bind(entry.user_id)
        .bind(entry.case_id)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> RepoResult<(Vec<AuditEntry>, i64)> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM audit_log WHERE TRUE");
        Self::push_filters(&mut count_builder, query);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {AUDIT_COLUMNS} FROM audit_log WHERE TRUE"));
        Self::push_filters(&mut builder, query);
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset);

        let rows: Vec<AuditRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        let entries = rows
            .into_iter()
            .map(AuditEntry::try_from)
            .collect::<RepoResult<Vec<_>>>()?;
        Ok((entries, total))
    }

    async fn list_by_case(&self, case_id: Uuid) -> RepoResult<Vec<AuditEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_log WHERE case_id = $1 ORDER BY created_at DESC"
        ))
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AuditEntry::try_from).collect()
    }

    async fn list_by_user(&self, user_id: Uuid, limit: i64) -> RepoResult<Vec<AuditEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_log WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AuditEntry::try_from).collect()
    }

    async fn list_by_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> RepoResult<Vec<AuditEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_log WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY created_at ASC"
        ))
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AuditEntry::try_from).collect()
    }
}
