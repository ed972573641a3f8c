use axum::Extension;
use serde::Serialize;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: String,
    pub exp: i64,
}

/// GET /api/me - The magic key and expiry of the presented token
pub async fn me(Extension(user): Extension<AuthUser>) -> ApiResult<MeResponse> {
    Ok(ApiResponse::success(MeResponse {
        user: user.user,
        exp: user.exp,
    }))
}
