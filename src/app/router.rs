//! Route table. Login, register and the health probes are public; everything
//! else sits behind the bearer-auth middleware. Rate limiting wraps the
//! whole API surface.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::app::AppContainer;
use crate::handlers;
use crate::middleware::{enforce_rate_limit, require_auth};

pub fn create_router(container: AppContainer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/users", post(handlers::users::create).get(handlers::users::list))
        .route(
            "/users/:id",
            get(handlers::users::find_one)
                .put(handlers::users::update)
                .delete(handlers::users::deactivate),
        )
        .route("/users/:id/password", patch(handlers::users::change_password))
        .route("/cases", post(handlers::cases::create).get(handlers::cases::list))
        .route("/cases/stats", get(handlers::cases::stats))
        .route("/cases/overdue", get(handlers::cases::overdue))
        .route("/cases/sla/check", post(handlers::cases::check_sla))
        .route("/cases/reference/:reference", get(handlers::cases::find_by_reference))
        .route("/cases/:id", get(handlers::cases::find_one).put(handlers::cases::update))
        .route("/cases/:id/status", patch(handlers::cases::update_status))
        .route("/cases/:id/assign", patch(handlers::cases::assign))
        .route("/cases/:id/notes", post(handlers::cases::add_note).get(handlers::cases::notes))
        .route("/cases/:id/history", get(handlers::cases::history))
        .route("/documents", post(handlers::documents::upload))
        .route("/documents/case/:case_id", get(handlers::documents::list_for_case))
        .route(
            "/documents/:id",
            get(handlers::documents::find_one).delete(handlers::documents::delete),
        )
        .route("/documents/:id/download", get(handlers::documents::download))
        .route("/reports/dashboard", get(handlers::reports::dashboard))
        .route("/reports/weekly-trend", get(handlers::reports::weekly_trend))
        .route(
            "/reports/insurer-performance",
            get(handlers::reports::insurer_performance),
        )
        .route("/reports/sla-compliance", get(handlers::reports::sla_compliance))
        .route(
            "/reports/user-productivity",
            get(handlers::reports::user_productivity),
        )
        .route("/audit", get(handlers::audit::query))
        .route("/audit/case/:id", get(handlers::audit::for_case))
        .route("/audit/user/:id", get(handlers::audit::for_user))
        .route("/audit/my-activity", get(handlers::audit::my_activity))
        .route(
            "/audit/export/:entity_type/:entity_id",
            get(handlers::audit::export),
        )
        .route_layer(from_fn_with_state(container.clone(), require_auth));

    let api = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/register", post(handlers::auth::register))
        .merge(protected)
        .route_layer(from_fn_with_state(container.clone(), enforce_rate_limit));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(handlers::health::health))
        .route("/health/ready", get(handlers::health::ready))
        .route("/health/live", get(handlers::health::live))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(container)
}
