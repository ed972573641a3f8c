use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::{BookStore, Database};

/// Shared handler state, built once at startup and cloned per request
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
    pub database: Database,
    pub books: BookStore,
}

impl AppState {
    pub fn new(config: AppConfig, tokens: TokenService, database: Database) -> Self {
        let books = database.books();
        Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            database,
            books,
        }
    }
}
