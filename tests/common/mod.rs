//! Shared fixtures: an in-memory container seeded with a clinic, an insurer
//! and one user per role.

use chrono::Utc;
use uuid::Uuid;

use clinicroute::app::AppContainer;
use clinicroute::config::{AppConfig, RateLimitConfig};
use clinicroute::domain::entities::{Clinic, CurrentUser, Insurer, Role, User};
use clinicroute::services::NewUser;

pub fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        database_url: None,
        jwt_secret: "integration-test-secret".to_string(),
        jwt_ttl_seconds: 3600,
        document_bucket: "test-documents".to_string(),
        rate_limits: RateLimitConfig {
            per_minute: 10_000,
            per_hour: 100_000,
            per_day: 1_000_000,
        },
    }
}

pub struct Fixture {
    pub container: AppContainer,
    pub clinic_id: Uuid,
    pub other_clinic_id: Uuid,
    pub insurer_id: Uuid,
    pub admin: CurrentUser,
    pub manager: CurrentUser,
    pub clinician: CurrentUser,
}

pub async fn fixture() -> Fixture {
    let container = AppContainer::new_memory(&test_config());

    let clinic_id = Uuid::new_v4();
    let other_clinic_id = Uuid::new_v4();
    for (id, name) in [
        (clinic_id, "Harley Street Physio"),
        (other_clinic_id, "Riverside Clinic"),
    ] {
        container
            .clinic_repo
            .insert(&Clinic {
                id,
                name: name.to_string(),
                contact_email: None,
                contact_phone: None,
                sla_default_days: None,
                subscription_tier: "STANDARD".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    let insurer_id = Uuid::new_v4();
    container
        .insurer_repo
        .insert(&Insurer {
            id: insurer_id,
            name: "Bupa".to_string(),
            code: "BUPA".to_string(),
            contact_email: None,
            contact_phone: None,
            avg_response_days: Some(3),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let admin = register(&container, clinic_id, Role::Admin, "admin@clinic.example").await;
    let manager = register(&container, clinic_id, Role::Manager, "manager@clinic.example").await;
    let clinician = register(
        &container,
        clinic_id,
        Role::Clinician,
        "clinician@clinic.example",
    )
    .await;

    Fixture {
        container,
        clinic_id,
        other_clinic_id,
        insurer_id,
        admin,
        manager,
        clinician,
    }
}

pub async fn register(
    container: &AppContainer,
    clinic_id: Uuid,
    role: Role,
    email: &str,
) -> CurrentUser {
    let outcome = container
        .auth_service
        .register(NewUser {
            email: email.to_string(),
            password: "correct horse battery staple".to_string(),
            first_name: "Test".to_string(),
            last_name: role.as_str().to_string(),
            role: Some(role),
            clinic_id,
        })
        .await
        .unwrap();
    current(&outcome.user)
}

pub fn current(user: &User) -> CurrentUser {
    CurrentUser {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
        clinic_id: user.clinic_id,
    }
}
