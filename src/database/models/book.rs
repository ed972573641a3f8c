use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::middleware::auth::Visibility;

/// Column list shared by every query that returns a full book row.
pub const BOOK_COLUMNS: &str =
    "id, title, author, instrument, condition, format, description, public, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub instrument: String,
    pub condition: String,
    pub format: Option<String>,
    pub description: String,
    pub public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Visibility for Book {
    fn is_public(&self) -> bool {
        self.public
    }
}

/// Body of `POST /api/books`. Identifiers and timestamps sent by the client are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub instrument: String,
    pub condition: String,
    pub format: Option<String>,
    pub description: String,
    pub public: bool,
}

/// Body of `PATCH /api/books/:id`. Absent fields are left untouched;
/// `"format": null` clears the format.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub instrument: Option<String>,
    pub condition: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub format: Option<Option<String>>,
    pub description: Option<String>,
    pub public: Option<bool>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.instrument.is_none()
            && self.condition.is_none()
            && self.format.is_none()
            && self.description.is_none()
            && self.public.is_none()
    }
}

// Distinguishes a field set to null from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FormatEntry {
    pub format: String,
    pub description: String,
}
