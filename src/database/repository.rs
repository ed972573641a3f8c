use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::database::manager::StoreError;
use crate::database::models::{Book, BookPatch, FormatEntry, NewBook, BOOK_COLUMNS};
use crate::middleware::auth::visibility_filter;

/// Catalog operations over the `books` table. Every operation is a single
/// statement against the pool; nothing is cached.
#[derive(Clone, Debug)]
pub struct BookStore {
    pool: SqlitePool,
}

impl BookStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn add(&self, book: NewBook) -> Result<Book, StoreError> {
        let title = required_title(&book.title)?;
        let format = normalize_format(book.format);
        if let Some(format) = &format {
            self.ensure_format(format).await?;
        }

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO books (title, author, instrument, condition, format, description, public, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             RETURNING {}",
            BOOK_COLUMNS
        );

        let created = sqlx::query_as::<_, Book>(&sql)
            .bind(title)
            .bind(book.author)
            .bind(book.instrument)
            .bind(book.condition)
            .bind(format)
            .bind(book.description)
            .bind(book.public)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!("Added book {} ({:?})", created.id, created.title);
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Book>, StoreError> {
        let sql = format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS);
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// All books visible to the caller, in insertion order.
    pub async fn list(&self, authenticated: bool) -> Result<Vec<Book>, StoreError> {
        let sql = format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS);
        let books = sqlx::query_as::<_, Book>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(visibility_filter(books, authenticated))
    }

    /// Same rows as [`BookStore::list`]; the transport marks the response as a download.
    pub async fn export(&self, authenticated: bool) -> Result<Vec<Book>, StoreError> {
        self.list(authenticated).await
    }

    /// Applies the fields present in `patch` and refreshes `updated_at`.
    pub async fn update(&self, id: i64, patch: BookPatch) -> Result<Book, StoreError> {
        if patch.is_empty() {
            return Err(StoreError::Validation {
                field: "body",
                message: "no fields to update".to_string(),
            });
        }

        let title = patch.title.as_deref().map(required_title).transpose()?;
        let format = patch.format.map(normalize_format);
        if let Some(Some(name)) = &format {
            self.ensure_format(name).await?;
        }

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("UPDATE books SET ");
        let mut fields = qb.separated(", ");

        if let Some(title) = title {
            fields.push("title = ").push_bind_unseparated(title);
        }
        if let Some(author) = patch.author {
            fields.push("author = ").push_bind_unseparated(author);
        }
        if let Some(instrument) = patch.instrument {
            fields.push("instrument = ").push_bind_unseparated(instrument);
        }
        if let Some(condition) = patch.condition {
            fields.push("condition = ").push_bind_unseparated(condition);
        }
        if let Some(format) = format {
            fields.push("format = ").push_bind_unseparated(format);
        }
        if let Some(description) = patch.description {
            fields.push("description = ").push_bind_unseparated(description);
        }
        if let Some(public) = patch.public {
            fields.push("public = ").push_bind_unseparated(public);
        }
        fields.push("updated_at = ").push_bind_unseparated(Utc::now());

        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING ").push(BOOK_COLUMNS);

        let updated = qb
            .build_query_as::<Book>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))?;

        tracing::debug!("Updated book {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        tracing::debug!("Deleted book {}", id);
        Ok(())
    }

    pub async fn formats(&self) -> Result<Vec<FormatEntry>, StoreError> {
        let formats = sqlx::query_as::<_, FormatEntry>(
            "SELECT format, description FROM format_picklist ORDER BY format",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(formats)
    }

    async fn ensure_format(&self, format: &str) -> Result<(), StoreError> {
        let known: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM format_picklist WHERE format = ?1")
                .bind(format)
                .fetch_one(&self.pool)
                .await?;

        if known == 0 {
            return Err(StoreError::Validation {
                field: "format",
                message: format!("unknown format '{}'", format),
            });
        }
        Ok(())
    }
}

fn required_title(title: &str) -> Result<String, StoreError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StoreError::Validation {
            field: "title",
            message: "title is required".to_string(),
        });
    }
    Ok(title.to_string())
}

// Pickers send "" for "no format"
fn normalize_format(format: Option<String>) -> Option<String> {
    format.filter(|f| !f.trim().is_empty())
}
