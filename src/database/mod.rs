pub mod backup;
pub mod manager;
pub mod migrations;
pub mod models;
pub mod repository;

pub use manager::{Database, StoreError};
pub use models::{Book, BookPatch, FormatEntry, NewBook};
pub use repository::BookStore;
