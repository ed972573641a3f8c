use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{require_auth, with_cors};
use crate::state::AppState;

/// Full application router with CORS, body limits and (optionally) request tracing.
pub fn app(state: AppState) -> Router {
    let max_body = state.config.api.max_request_size_bytes;
    let request_logging = state.config.api.enable_request_logging;

    let router = Router::new()
        .route("/health", get(health))
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_body));
    let router = with_cors(router).with_state(state);

    if request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/login/:magic_id", get(public::auth::login))
        .route("/api/books", get(public::books::list))
        .route("/api/books/export", get(public::books::export))
        .route("/api/books/:id", get(public::books::get))
        .route("/api/formats", get(public::formats::list))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use axum::routing::{delete, patch, post};

    Router::new()
        .route("/api/me", get(protected::auth::me))
        .route("/api/books", post(protected::books::create))
        .route(
            "/api/books/:id",
            patch(protected::books::patch).delete(protected::books::delete),
        )
        .route_layer(from_fn_with_state(state, require_auth))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.database.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok",
                "key_version": state.tokens.key_version(),
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable",
                })),
            )
        }
    }
}

async fn not_found() -> ApiError {
    ApiError::not_found("generic not found")
}
