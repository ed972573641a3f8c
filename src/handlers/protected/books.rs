use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};

use crate::database::{Book, BookPatch, NewBook};
use crate::handlers::parse_book_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// POST /api/books - Add a book; returns it with its assigned id and timestamps
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> ApiResult<Book> {
    let Json(book) = payload?;
    let created = state.books.add(book).await?;
    tracing::info!("Book {} added by {}", created.id, user.user);
    Ok(ApiResponse::created(created))
}

/// PATCH /api/books/:id - Change only the fields present in the body
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<BookPatch>, JsonRejection>,
) -> ApiResult<Book> {
    let id = parse_book_id(&id)?;
    let Json(patch) = payload?;
    let updated = state.books.update(id, patch).await?;
    tracing::info!("Book {} updated by {}", id, user.user);
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/books/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_book_id(&id)?;
    state.books.delete(id).await?;
    tracing::info!("Book {} deleted by {}", id, user.user);
    Ok(ApiResponse::no_content())
}
