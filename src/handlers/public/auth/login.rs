use axum::extract::{Path, State};
use serde::Serialize;

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// GET /api/login/:magic_id - Exchange a magic key for a bearer token
///
/// The key must be a UUID present in the magic keys file. The token expires
/// after the configured TTL (14 days by default).
///
/// Expected Output (Success):
/// ```json
/// { "token": "eyJhbGciOiJIUzI1NiI..." }
/// ```
pub async fn login(
    State(state): State<AppState>,
    Path(magic_id): Path<String>,
) -> ApiResult<TokenResponse> {
    let token = state.tokens.issue_token(&magic_id).map_err(|e| {
        tracing::warn!("Rejected login attempt: {}", e);
        e
    })?;

    tracing::info!("Issued token (key version {})", state.tokens.key_version());
    Ok(ApiResponse::success(TokenResponse { token }))
}
