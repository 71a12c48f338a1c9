//! End-to-end tests driving the router with `tower::ServiceExt::oneshot`.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use clinicroute::app::create_router;
use clinicroute::domain::entities::Role;

use common::fixture;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Log in through the API and return the bearer token.
async fn login(app: &axum::Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/auth/login",
            None,
            json!({ "email": email, "password": "correct horse battery staple" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["accessToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_probes_are_public() {
    let fx = fixture().await;
    let app = create_router(fx.container);

    for uri in ["/health", "/health/ready", "/health/live"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let fx = fixture().await;
    let app = create_router(fx.container);

    let response = app.clone().oneshot(get("/api/v1/cases", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get("/api/v1/cases", Some("bogus-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let fx = fixture().await;
    let app = create_router(fx.container);

    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/auth/login",
            None,
            json!({ "email": "admin@clinic.example", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/auth/login",
            None,
            json!({ "email": "nobody@clinic.example", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_and_register_share_the_token_envelope() {
    let fx = fixture().await;
    let clinic_id = fx.clinic_id;
    let app = create_router(fx.container);

    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/auth/login",
            None,
            json!({
                "email": "admin@clinic.example",
                "password": "correct horse battery staple",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["accessToken"].as_str().unwrap().len() > 20);
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 3600);
    assert_eq!(body["user"]["email"], "admin@clinic.example");

    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/auth/register",
            None,
            json!({
                "email": "new.starter@clinic.example",
                "password": "a long enough password",
                "firstName": "Niamh",
                "lastName": "Byrne",
                "clinicId": clinic_id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 3600);
    assert_eq!(body["user"]["role"], "CLINICIAN");
    let token = body["accessToken"].as_str().unwrap().to_string();

    // The registration token works immediately, and the sign-up itself is
    // on the new user's activity trail.
    let response = app
        .clone()
        .oneshot(get("/api/v1/audit/my-activity", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let activity = body_json(response).await;
    assert!(activity
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["action"] == "CREATE" && e["entityType"] == "User"));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let fx = fixture().await;
    let clinic_id = fx.clinic_id;
    let app = create_router(fx.container);

    let payload = json!({
        "email": "Admin@Clinic.Example",
        "password": "another long password",
        "firstName": "Dup",
        "lastName": "Licate",
        "clinicId": clinic_id,
    });
    let response = app
        .clone()
        .oneshot(post("/api/v1/auth/register", None, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn case_flow_over_http() {
    let fx = fixture().await;
    let insurer_id = fx.insurer_id;
    let app = create_router(fx.container);
    let token = login(&app, "clinician@clinic.example").await;

    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/cases",
            Some(&token),
            json!({
                "patientFirstName": "Amelia",
                "patientLastName": "Hughes",
                "patientDob": "1987-03-14",
                "referralType": "Physiotherapy",
                "referringClinician": "Dr Okafor",
                "insurerId": insurer_id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let case = body_json(response).await;
    let case_id = case["id"].as_str().unwrap().to_string();
    assert_eq!(case["status"], "RECEIVED");
    assert!(case["referenceNumber"].as_str().unwrap().starts_with("REF-"));

    // Move it along.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/v1/cases/{case_id}/status"))
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(json!({ "status": "SUBMITTED" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let moved = body_json(response).await;
    assert_eq!(moved["status"], "SUBMITTED");
    assert!(moved["submittedAt"].is_string());

    // An illegal jump is a 400.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/v1/cases/{case_id}/status"))
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(json!({ "status": "APPROVED" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // List envelope carries pagination metadata.
    let response = app
        .clone()
        .oneshot(get("/api/v1/cases?status=SUBMITTED", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listing = body_json(response).await;
    assert_eq!(listing["items"].as_array().unwrap().len(), 1);
    assert_eq!(listing["pagination"]["total"], 1);
    assert_eq!(listing["pagination"]["page"], 1);
    assert_eq!(listing["pagination"]["limit"], 20);
    assert_eq!(listing["pagination"]["totalPages"], 1);
}

#[tokio::test]
async fn assign_is_gated_by_role() {
    let fx = fixture().await;
    let insurer_id = fx.insurer_id;
    let manager_id = fx.manager.id;
    let app = create_router(fx.container);
    let clinician_token = login(&app, "clinician@clinic.example").await;
    let manager_token = login(&app, "manager@clinic.example").await;

    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/cases",
            Some(&clinician_token),
            json!({
                "patientFirstName": "Rhys",
                "patientLastName": "Morgan",
                "patientDob": "1990-11-02",
                "referralType": "Orthopaedics",
                "referringClinician": "Dr Shah",
                "insurerId": insurer_id,
            }),
        ))
        .await
        .unwrap();
    let case_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let assign = |token: String| {
        Request::builder()
            .method("PATCH")
            .uri(format!("/api/v1/cases/{case_id}/assign"))
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(
                json!({ "assignedToId": manager_id }).to_string(),
            ))
            .unwrap()
    };

    let response = app.clone().oneshot(assign(clinician_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.clone().oneshot(assign(manager_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn document_validation_and_soft_delete() {
    let fx = fixture().await;
    let insurer_id = fx.insurer_id;
    let app = create_router(fx.container);
    let token = login(&app, "clinician@clinic.example").await;

    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/cases",
            Some(&token),
            json!({
                "patientFirstName": "Eve",
                "patientLastName": "Njoku",
                "patientDob": "1979-06-21",
                "referralType": "Cardiology",
                "referringClinician": "Dr Lindqvist",
                "insurerId": insurer_id,
            }),
        ))
        .await
        .unwrap();
    let case_id = body_json(response).await["id"].as_str().unwrap().to_string();

    // Executables are refused.
    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/documents",
            Some(&token),
            json!({
                "caseId": case_id,
                "originalName": "malware.exe",
                "mimeType": "application/x-msdownload",
                "sizeBytes": 1024,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Oversized files are refused.
    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/documents",
            Some(&token),
            json!({
                "caseId": case_id,
                "originalName": "scan.pdf",
                "mimeType": "application/pdf",
                "sizeBytes": 11 * 1024 * 1024,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(post(
            "/api/v1/documents",
            Some(&token),
            json!({
                "caseId": case_id,
                "originalName": "referral.pdf",
                "mimeType": "application/pdf",
                "sizeBytes": 52_000,
                "documentType": "REFERRAL_LETTER",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let document = body_json(response).await;
    let document_id = document["id"].as_str().unwrap().to_string();
    let key = document["storageKey"].as_str().unwrap();
    assert!(key.ends_with("-referral.pdf"));
    assert!(key.contains(&case_id));

    let response = app
        .clone()
        .oneshot(get(
            &format!("/api/v1/documents/{document_id}/download"),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let link = body_json(response).await;
    assert!(link["url"].as_str().unwrap().contains("test-documents"));

    // Soft delete hides it from list and direct lookup alike.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/documents/{document_id}"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get(
            &format!("/api/v1/documents/case/{case_id}"),
            Some(&token),
        ))
        .await
        .unwrap();
    let listing = body_json(response).await;
    assert!(listing.as_array().unwrap().is_empty());

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/documents/{document_id}"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn audit_endpoints_enforce_roles() {
    let fx = fixture().await;
    let admin_id = fx.admin.id;
    let app = create_router(fx.container);
    let clinician_token = login(&app, "clinician@clinic.example").await;
    let admin_token = login(&app, "admin@clinic.example").await;

    let response = app
        .clone()
        .oneshot(get("/api/v1/audit", Some(&clinician_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(get("/api/v1/audit", Some(&admin_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Everyone sees their own activity; logins are recorded.
    let response = app
        .clone()
        .oneshot(get("/api/v1/audit/my-activity", Some(&admin_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let activity = body_json(response).await;
    assert!(activity
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["action"] == "LOGIN"));

    let response = app
        .clone()
        .oneshot(get(
            &format!("/api/v1/audit/export/User/{admin_id}"),
            Some(&clinician_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(get(
            &format!("/api/v1/audit/export/User/{admin_id}"),
            Some(&admin_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn reports_answer_with_empty_data() {
    let fx = fixture().await;
    let app = create_router(fx.container);
    let token = login(&app, "manager@clinic.example").await;

    let response = app
        .clone()
        .oneshot(get("/api/v1/reports/dashboard", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = body_json(response).await;
    assert_eq!(dashboard["activeCases"], 0);
    assert_eq!(dashboard["avgProcessingDays"], 0.0);

    let response = app
        .clone()
        .oneshot(get("/api/v1/reports/sla-compliance", Some(&token)))
        .await
        .unwrap();
    let compliance = body_json(response).await;
    // Nothing closed yet means full compliance.
    assert_eq!(compliance["complianceRate"], 100.0);

    let response = app
        .clone()
        .oneshot(get("/api/v1/reports/weekly-trend?weeks=2", Some(&token)))
        .await
        .unwrap();
    let trend = body_json(response).await;
    assert_eq!(trend.as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(get("/api/v1/reports/user-productivity", Some(&token)))
        .await
        .unwrap();
    let productivity = body_json(response).await;
    assert_eq!(productivity.as_array().unwrap().len(), 3);

    let response = app
        .clone()
        .oneshot(get("/api/v1/reports/insurer-performance", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn rate_limit_trips_429() {
    let mut config = common::test_config();
    config.rate_limits.per_minute = 2;
    let container = clinicroute::app::AppContainer::new_memory(&config);
    let app = create_router(container);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/cases")
                    .header("x-forwarded-for", "203.0.113.9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        // Unauthorized, but still counted against the budget.
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/cases")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn user_routes_are_wired_and_gated() {
    let fx = fixture().await;
    let clinician_id = fx.clinician.id;
    let app = create_router(fx.container);
    let clinician_token = login(&app, "clinician@clinic.example").await;
    let admin_token = login(&app, "admin@clinic.example").await;

    let response = app
        .clone()
        .oneshot(get("/api/v1/users", Some(&clinician_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let users = body_json(response).await;
    assert_eq!(users.as_array().unwrap().len(), 3);

    let deactivate = |token: String| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/v1/users/{clinician_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };
    let response = app.clone().oneshot(deactivate(clinician_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.clone().oneshot(deactivate(admin_token.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/users/{clinician_id}"), Some(&admin_token)))
        .await
        .unwrap();
    let user = body_json(response).await;
    assert_eq!(user["isActive"], false);
}

#[tokio::test]
async fn me_returns_the_caller() {
    let fx = fixture().await;
    let app = create_router(fx.container);
    let token = login(&app, "admin@clinic.example").await;

    let response = app
        .clone()
        .oneshot(get("/api/v1/auth/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["email"], "admin@clinic.example");
    assert_eq!(me["role"], Role::Admin.as_str());
    // Hashes never serialize.
    assert!(me.get("passwordHash").is_none());
}
