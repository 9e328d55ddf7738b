//! Router assembly: the `/api` surface, health probe, permissive CORS, and
//! the catch-all for unknown paths.

use crate::handlers::user;
use crate::response::{Envelope, STATUS_OK};
use crate::state::AppState;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    // credentialed CORS cannot use a wildcard origin; mirror whatever called
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::HeaderName::from_static("x-api-key")])
        .allow_credentials(true);

    let api = Router::new()
        .route("/user/register", post(user::register))
        .route("/user/list", get(user::list))
        .route("/user/search", get(user::search))
        .route("/user/:id", get(user::detail));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(unknown_route)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": STATUS_OK, "message": "ok" }))
}

async fn unknown_route() -> Envelope {
    let mut e = Envelope::failed("Invalid API url or method", 404);
    // fallback renders through the errorCode path so the HTTP status matches
    e.error_code = e.status_code;
    e
}
