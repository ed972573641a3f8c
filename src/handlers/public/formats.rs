use axum::extract::State;
use serde::Serialize;

use crate::database::FormatEntry;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FormatListResponse {
    pub formats: Vec<FormatEntry>,
    pub count: usize,
}

/// GET /api/formats - The fixed picklist a book's `format` must come from
pub async fn list(State(state): State<AppState>) -> ApiResult<FormatListResponse> {
    let formats = state.books.formats().await?;
    let count = formats.len();
    Ok(ApiResponse::success(FormatListResponse { formats, count }))
}
