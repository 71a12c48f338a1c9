//! Login, registration and the authenticated-user lookup.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{AuditAction, CurrentUser, Role, User};
use crate::domain::repositories::DynUserRepository;
use crate::services::audit_service::{AuditEvent, AuditService};
use crate::services::token_service::TokenService;
use crate::shared::{AppError, AppResult};

pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<Role>,
    pub clinic_id: Uuid,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

pub struct AuthService {
    users: DynUserRepository,
    tokens: Arc<TokenService>,
    audit: Arc<AuditService>,
}

impl AuthService {
    pub fn new(
        users: DynUserRepository,
        tokens: Arc<TokenService>,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            users,
            tokens,
            audit,
        }
    }

    /// Verify credentials and issue a token. Unknown email, wrong password
    /// and inactive accounts all fail identically with 401.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;
        if !verify_password(password, hash) {
            return Err(AppError::unauthorized("Invalid credentials"));
        }
        if !user.is_active {
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        self.users.update_last_login(user.id, Utc::now()).await?;

        self.audit
            .record(
                AuditEvent::new(
                    AuditAction::Login,
                    "User",
                    user.id.to_string(),
                    format!("User {} logged in", user.email),
                )
                .by(user.id),
            )
            .await;

        let token = self.tokens.issue(&user)?;
        Ok(LoginOutcome { token, user })
    }

    /// Create an account and log the caller straight in. Email is unique
    /// case-insensitively; role defaults to CLINICIAN.
    pub async fn register(&self, new_user: NewUser) -> AppResult<LoginOutcome> {
        let email = new_user.email.trim().to_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }

        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash: Some(hash_password(&new_user.password)?),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            role: new_user.role.unwrap_or(Role::Clinician),
            clinic_id: new_user.clinic_id,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
        };
        // The insert's uniqueness constraint backstops the lookup above.
        self.users.insert(&user).await.map_err(|err| match err {
            crate::domain::repositories::RepositoryError::Conflict(_) => {
                AppError::conflict("Email already registered")
            }
            other => other.into(),
        })?;

        self.audit
            .record(
                AuditEvent::new(
                    AuditAction::Create,
                    "User",
                    user.id.to_string(),
                    format!("User {} registered", user.email),
                )
                .by(user.id),
            )
            .await;

        let token = self.tokens.issue(&user)?;
        Ok(LoginOutcome { token, user })
    }

    pub async fn me(&self, current: &CurrentUser) -> AppResult<User> {
        self.users
            .find_by_id(current.id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }
}

pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub(crate) fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
