//! Service-level tests of the case workflow over the in-memory store.

mod common;

use chrono::NaiveDate;
use uuid::Uuid;

use clinicroute::domain::entities::{CasePriority, CaseStatus};
use clinicroute::services::{CreateCase, UpdateCase};
use clinicroute::shared::AppError;

use common::fixture;

fn create_input(insurer_id: Uuid) -> CreateCase {
    CreateCase {
        patient_first_name: "Amelia".to_string(),
        patient_last_name: "Hughes".to_string(),
        patient_dob: NaiveDate::from_ymd_opt(1987, 3, 14).unwrap(),
        patient_nhs_number: Some("943 476 5919".to_string()),
        patient_email: None,
        patient_phone: None,
        referral_type: "Physiotherapy".to_string(),
        referring_clinician: "Dr Okafor".to_string(),
        clinical_notes: None,
        insurer_id,
        insurer_policy_number: Some("POL-88231".to_string()),
        priority: None,
        source_type: None,
        assigned_to_id: None,
    }
}

#[tokio::test]
async fn create_sets_reference_defaults_and_history() {
    let fx = fixture().await;
    let svc = &fx.container.case_service;

    let case = svc
        .create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();

    assert!(case.reference_number.starts_with("REF-"));
    assert!(case.reference_number.ends_with("-0001"));
    assert_eq!(case.status, CaseStatus::Received);
    assert_eq!(case.priority, CasePriority::Medium);
    assert_eq!(case.assigned_to_id, fx.clinician.id);
    assert!(!case.sla_breached);
    // Default clinic SLA is five days.
    let days = (case.sla_deadline - case.created_at).num_days();
    assert_eq!(days, 5);

    let history = svc.history(&fx.clinician, case.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from_status, None);
    assert_eq!(history[0].to_status, CaseStatus::Received);
    assert_eq!(history[0].reason.as_deref(), Some("Case created"));
}

#[tokio::test]
async fn references_increment_within_the_year() {
    let fx = fixture().await;
    let svc = &fx.container.case_service;

    let first = svc
        .create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();
    let second = svc
        .create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();

    assert!(first.reference_number < second.reference_number);
    assert!(second.reference_number.ends_with("-0002"));
}

#[tokio::test]
async fn unknown_insurer_is_rejected() {
    let fx = fixture().await;
    let err = fx
        .container
        .case_service
        .create(&fx.clinician, create_input(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn full_happy_path_stamps_timestamps() {
    let fx = fixture().await;
    let svc = &fx.container.case_service;
    let case = svc
        .create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();

    let case = svc
        .update_status(&fx.clinician, case.id, CaseStatus::Submitted, None)
        .await
        .unwrap();
    assert!(case.submitted_at.is_some());

    let case = svc
        .update_status(&fx.clinician, case.id, CaseStatus::AwaitingInsurer, None)
        .await
        .unwrap();
    let case = svc
        .update_status(&fx.clinician, case.id, CaseStatus::Approved, None)
        .await
        .unwrap();
    assert!(case.approved_at.is_some());

    let case = svc
        .update_status(
            &fx.clinician,
            case.id,
            CaseStatus::TreatmentScheduled,
            None,
        )
        .await
        .unwrap();
    let case = svc
        .update_status(&fx.clinician, case.id, CaseStatus::Closed, None)
        .await
        .unwrap();
    assert!(case.completed_at.is_some());

    // Creation plus five transitions.
    let history = svc.history(&fx.clinician, case.id).await.unwrap();
    assert_eq!(history.len(), 6);
}

#[tokio::test]
async fn illegal_transition_changes_nothing() {
    let fx = fixture().await;
    let svc = &fx.container.case_service;
    let case = svc
        .create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();
    let case = svc
        .update_status(&fx.clinician, case.id, CaseStatus::Submitted, None)
        .await
        .unwrap();

    let err = svc
        .update_status(&fx.clinician, case.id, CaseStatus::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            from: CaseStatus::Submitted,
            to: CaseStatus::Approved,
        }
    ));

    let unchanged = svc.find_by_reference(&fx.clinician, &case.reference_number)
        .await
        .unwrap();
    assert_eq!(unchanged.status, CaseStatus::Submitted);
    assert!(unchanged.approved_at.is_none());
    let history = svc.history(&fx.clinician, case.id).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn denied_case_can_be_resubmitted() {
    let fx = fixture().await;
    let svc = &fx.container.case_service;
    let case = svc
        .create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();
    for status in [
        CaseStatus::Submitted,
        CaseStatus::AwaitingInsurer,
        CaseStatus::Denied,
    ] {
        svc.update_status(&fx.clinician, case.id, status, None)
            .await
            .unwrap();
    }
    let case = svc
        .update_status(&fx.clinician, case.id, CaseStatus::Submitted, None)
        .await
        .unwrap();
    assert_eq!(case.status, CaseStatus::Submitted);
}

#[tokio::test]
async fn terminal_case_rejects_everything() {
    let fx = fixture().await;
    let svc = &fx.container.case_service;
    let case = svc
        .create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();
    svc.update_status(&fx.clinician, case.id, CaseStatus::Cancelled, None)
        .await
        .unwrap();

    for to in CaseStatus::ALL {
        let result = svc
            .update_status(&fx.clinician, case.id, to, None)
            .await;
        assert!(result.is_err(), "CANCELLED -> {to} should fail");
    }
}

#[tokio::test]
async fn cross_clinic_access_is_not_found() {
    let fx = fixture().await;
    let svc = &fx.container.case_service;
    let case = svc
        .create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();

    let outsider =
        common::register(&fx.container, fx.other_clinic_id,
            clinicroute::domain::entities::Role::Admin, "outsider@riverside.example").await;

    let err = svc.find_one(&outsider, case.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = svc
        .update_status(&outsider, case.id, CaseStatus::Submitted, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn assignment_rules() {
    let fx = fixture().await;
    let svc = &fx.container.case_service;
    let case = svc
        .create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();

    // Clinicians cannot reassign.
    let err = svc
        .assign(&fx.clinician, case.id, fx.manager.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // A user from another clinic is not a valid assignee.
    let outsider = common::register(
        &fx.container,
        fx.other_clinic_id,
        clinicroute::domain::entities::Role::Clinician,
        "locum@riverside.example",
    )
    .await;
    let err = svc
        .assign(&fx.manager, case.id, outsider.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let case = svc
        .assign(&fx.manager, case.id, fx.clinician.id)
        .await
        .unwrap();
    assert_eq!(case.assigned_to_id, fx.clinician.id);
}

#[tokio::test]
async fn notes_are_most_recent_first() {
    let fx = fixture().await;
    let svc = &fx.container.case_service;
    let case = svc
        .create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();

    svc.add_note(&fx.clinician, case.id, "first".to_string(), false)
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    svc.add_note(&fx.clinician, case.id, "second".to_string(), true)
        .await
        .unwrap();

    let notes = svc.notes(&fx.clinician, case.id).await.unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].content, "second");
    assert!(notes[0].is_internal);
    assert_eq!(notes[1].content, "first");
}

#[tokio::test]
async fn sla_check_is_admin_only_and_idempotent() {
    let fx = fixture().await;
    let svc = &fx.container.case_service;
    svc.create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();

    let err = svc.check_sla_breaches(&fx.manager).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // Nothing is past its deadline yet; a second sweep finds nothing either.
    assert_eq!(svc.check_sla_breaches(&fx.admin).await.unwrap(), 0);
    assert_eq!(svc.check_sla_breaches(&fx.admin).await.unwrap(), 0);
    assert!(svc.overdue(&fx.clinician).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_touches_descriptive_fields_only() {
    let fx = fixture().await;
    let svc = &fx.container.case_service;
    let case = svc
        .create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();

    let updated = svc
        .update(
            &fx.clinician,
            case.id,
            UpdateCase {
                priority: Some(CasePriority::Urgent),
                clinical_notes: Some("MRI results attached".to_string()),
                assigned_to_id: Some(fx.manager.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.priority, CasePriority::Urgent);
    assert_eq!(updated.assigned_to_id, fx.manager.id);
    assert_eq!(updated.status, CaseStatus::Received);
    assert_eq!(updated.sla_deadline, case.sla_deadline);

    // Assignee and insurer changes pass the same checks as elsewhere.
    let err = svc
        .update(
            &fx.clinician,
            case.id,
            UpdateCase {
                assigned_to_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = svc
        .update(
            &fx.clinician,
            case.id,
            UpdateCase {
                insurer_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn stats_reflect_clinic_activity() {
    let fx = fixture().await;
    let svc = &fx.container.case_service;
    let case = svc
        .create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();
    svc.create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();
    svc.update_status(&fx.clinician, case.id, CaseStatus::Cancelled, None)
        .await
        .unwrap();

    let stats = svc.stats(&fx.clinician).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.active, 1);
    assert_eq!(stats.created_today, 2);
    assert_eq!(stats.by_status.get("RECEIVED"), Some(&1));
    assert_eq!(stats.by_status.get("CANCELLED"), Some(&1));
    assert_eq!(stats.by_priority.get("MEDIUM"), Some(&2));
}

#[tokio::test]
async fn audit_trail_per_transition() {
    let fx = fixture().await;
    let case = fx
        .container
        .case_service
        .create(&fx.clinician, create_input(fx.insurer_id))
        .await
        .unwrap();
    fx.container
        .case_service
        .update_status(&fx.clinician, case.id, CaseStatus::Submitted, None)
        .await
        .unwrap();

    let trail = fx
        .container
        .audit_service
        .for_case(&fx.manager, case.id)
        .await
        .unwrap();
    // CREATE plus STATUS_CHANGE, newest first.
    assert_eq!(trail.len(), 2);
    assert_eq!(
        trail[0].action,
        clinicroute::domain::entities::AuditAction::StatusChange
    );
    assert_eq!(
        trail[1].action,
        clinicroute::domain::entities::AuditAction::Create
    );
}
