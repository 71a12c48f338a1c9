//! Clinic user management: admin-created accounts, profile updates,
//! deactivation and password changes.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{AuditAction, CurrentUser, Role, User};
use crate::domain::repositories::DynUserRepository;
use crate::services::audit_service::{AuditEvent, AuditService};
use crate::services::auth_service::{hash_password, verify_password};
use crate::shared::{AppError, AppResult};

pub struct CreateUser {
    pub email: String,
    /// Absent for accounts backed by an external identity provider.
    pub password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<Role>,
}

#[derive(Default)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

pub struct UserService {
    users: DynUserRepository,
    audit: Arc<AuditService>,
}

impl UserService {
    pub fn new(users: DynUserRepository, audit: Arc<AuditService>) -> Self {
        Self { users, audit }
    }

    /// Create an account in the caller's clinic. ADMIN only.
    pub async fn create(&self, current: &CurrentUser, input: CreateUser) -> AppResult<User> {
        if current.role != Role::Admin {
            return Err(AppError::forbidden("Admin role required"));
        }
        let email = input.email.trim().to_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }

        let password_hash = input
            .password
            .as_deref()
            .map(hash_password)
            .transpose()?;
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            role: input.role.unwrap_or(Role::Clinician),
            clinic_id: current.clinic_id,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
        };
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
                    format!("User {} created", user.email),
                )
                .by(current.id),
            )
            .await;
        Ok(user)
    }

    /// Everyone in the clinic, surname order.
    pub async fn list(&self, current: &CurrentUser) -> AppResult<Vec<User>> {
        Ok(self.users.list_in_clinic(current.clinic_id).await?)
    }

    pub async fn find_one(&self, current: &CurrentUser, id: Uuid) -> AppResult<User> {
        self.require_user(current, id).await
    }

    /// Update a profile. Users may edit themselves; editing anyone else, and
    /// any role change, is ADMIN only.
    pub async fn update(
        &self,
        current: &CurrentUser,
        id: Uuid,
        input: UpdateUser,
    ) -> AppResult<User> {
        if id != current.id && current.role != Role::Admin {
            return Err(AppError::forbidden("Only admins can update other users"));
        }
        if input.role.is_some() && current.role != Role::Admin {
            return Err(AppError::forbidden("Only admins can change roles"));
        }
        let mut user = self.require_user(current, id).await?;
        let previous = snapshot(&user);

        if let Some(v) = input.first_name {
            user.first_name = v;
        }
        if let Some(v) = input.last_name {
            user.last_name = v;
        }
        if let Some(v) = input.role {
            user.role = v;
        }
        if let Some(v) = input.is_active {
            user.is_active = v;
        }
        self.users.update(&user).await?;

        self.audit
            .record(
                AuditEvent::new(
                    AuditAction::Update,
                    "User",
                    user.id.to_string(),
                    format!("User {} updated", user.email),
                )
                .by(current.id)
                .values(Some(previous), Some(snapshot(&user))),
            )
            .await;
        Ok(user)
    }

    /// Clear the active flag. ADMIN only, and never on yourself.
    pub async fn deactivate(&self, current: &CurrentUser, id: Uuid) -> AppResult<()> {
        if current.role != Role::Admin {
            return Err(AppError::forbidden("Admin role required"));
        }
        if id == current.id {
            return Err(AppError::forbidden("Cannot deactivate yourself"));
        }
        let mut user = self.require_user(current, id).await?;
        user.is_active = false;
        self.users.update(&user).await?;

        self.audit
            .record(
                AuditEvent::new(
                    AuditAction::Update,
                    "User",
                    user.id.to_string(),
                    format!("User {} deactivated", user.email),
                )
                .by(current.id),
            )
            .await;
        Ok(())
    }

    /// Change a password. Users change their own after proving the current
    /// one; admins may reset anyone in their clinic without it.
    pub async fn change_password(
        &self,
        current: &CurrentUser,
        id: Uuid,
        current_password: Option<&str>,
        new_password: &str,
    ) -> AppResult<()> {
        if id != current.id && current.role != Role::Admin {
            return Err(AppError::forbidden(
                "Cannot change another user's password",
            ));
        }
        let mut user = self.require_user(current, id).await?;

        if id == current.id {
            let valid = current_password
                .zip(user.password_hash.as_deref())
                .is_some_and(|(given, hash)| verify_password(given, hash));
            if !valid {
                return Err(AppError::forbidden("Current password is incorrect"));
            }
        }

        user.password_hash = Some(hash_password(new_password)?);
        self.users.update(&user).await?;

        self.audit
            .record(
                AuditEvent::new(
                    AuditAction::Update,
                    "User",
                    user.id.to_string(),
                    "Password changed".to_string(),
                )
                .by(current.id),
            )
            .await;
        Ok(())
    }

    /// Clinic-scoped fetch; other tenants' users look missing.
    async fn require_user(&self, current: &CurrentUser, id: Uuid) -> AppResult<User> {
        self.users
            .find_in_clinic(id, current.clinic_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }
}

fn snapshot(user: &User) -> serde_json::Value {
    serde_json::json!({
        "firstName": user.first_name,
        "lastName": user.last_name,
        "role": user.role,
        "isActive": user.is_active,
    })
}
