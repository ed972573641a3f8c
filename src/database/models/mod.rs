pub mod book;

pub use book::{Book, BookPatch, FormatEntry, NewBook, BOOK_COLUMNS};
