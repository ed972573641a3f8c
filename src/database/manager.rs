use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::repository::BookStore;
use crate::database::{backup, migrations};

/// Errors from the catalog store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Book {0} not found")]
    NotFound(i64),

    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Migration {name} failed: {source}")]
    Migration {
        name: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Backup failed: {0}")]
    Backup(#[from] std::io::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Owns the connection pool for the single catalog datastore file
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Snapshots an existing file, opens the pool and brings the schema up to date.
    /// Requests must not be served before this returns.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, StoreError> {
        if config.backup_on_open {
            if let Some(snapshot) = backup::snapshot(&config.path, Utc::now())? {
                info!(
                    "Backed up {} to {}",
                    config.path.display(),
                    snapshot.display()
                );
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        migrations::run(&pool, migrations::MIGRATIONS).await?;

        info!("Opened books store at {}", config.path.display());
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn books(&self) -> BookStore {
        BookStore::new(self.pool.clone())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed books store");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn config_for(path: &Path) -> DatabaseConfig {
        DatabaseConfig {
            path: path.to_path_buf(),
            max_connections: 2,
            backup_on_open: true,
        }
    }

    #[tokio::test]
    async fn open_creates_and_migrates_new_file_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.db");

        let db = Database::open(&config_for(&path)).await.unwrap();
        db.health_check().await.unwrap();
        let names = migrations::applied(db.pool()).await.unwrap();
        assert_eq!(names.len(), migrations::MIGRATIONS.len());
        db.close().await;

        assert!(path.exists());
        // Nothing existed before the first open, so nothing was snapshotted
        assert!(std::fs::read_dir(dir.path())
            .unwrap()
            .all(|e| !e.unwrap().file_name().to_string_lossy().ends_with(".bak")));
    }

    #[tokio::test]
    async fn reopening_snapshots_and_skips_applied_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.db");

        let db = Database::open(&config_for(&path)).await.unwrap();
        db.close().await;

        let db = Database::open(&config_for(&path)).await.unwrap();
        let names = migrations::applied(db.pool()).await.unwrap();
        assert_eq!(names.len(), migrations::MIGRATIONS.len());
        db.close().await;

        let backups = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(".bak")
            })
            .count();
        assert_eq!(backups, 1);
    }
}
