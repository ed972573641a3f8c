use axum::extract::{Path, State};
use serde::Serialize;

use crate::database::Book;
use crate::error::ApiError;
use crate::handlers::parse_book_id;
use crate::middleware::{ApiResponse, ApiResult, Viewer};
use crate::state::AppState;

pub const EXPORT_FILENAME: &str = "books-export.json";

#[derive(Debug, Serialize)]
pub struct BookListResponse {
    pub books: Vec<Book>,
    pub count: usize,
}

/// GET /api/books - Every book the caller may see
///
/// Anonymous callers get public books only; a valid bearer token shows all.
pub async fn list(State(state): State<AppState>, viewer: Viewer) -> ApiResult<BookListResponse> {
    let books = state.books.list(viewer.authenticated).await?;
    let count = books.len();
    Ok(ApiResponse::success(BookListResponse { books, count }))
}

/// GET /api/books/:id - A single book; private books require a token
pub async fn get(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> ApiResult<Book> {
    let id = parse_book_id(&id)?;

    let book = state
        .books
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book not found"))?;

    if !book.public && !viewer.authenticated {
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    Ok(ApiResponse::success(book))
}

/// GET /api/books/export - Same rows as the list, delivered as a download
pub async fn export(State(state): State<AppState>, viewer: Viewer) -> ApiResult<Vec<Book>> {
    let books = state.books.export(viewer.authenticated).await?;
    tracing::info!(
        "Exporting {} books (authenticated: {})",
        books.len(),
        viewer.authenticated
    );
    Ok(ApiResponse::attachment(books, EXPORT_FILENAME))
}
