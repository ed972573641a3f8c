//! Ordered schema migrations tracked in a `migrations` ledger table.
//!
//! Every pending migration runs inside one transaction together with its ledger
//! row, so a failure anywhere in the batch leaves both schema and ledger as they
//! were before the run.

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::info;

use super::manager::StoreError;

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub statements: &'static [&'static str],
}

const CREATE_LEDGER: &str = r#"
    CREATE TABLE IF NOT EXISTS migrations (
        name       TEXT PRIMARY KEY,
        applied_at TEXT NOT NULL
    )"#;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "0001_create_books",
        statements: &[r#"
            CREATE TABLE IF NOT EXISTS books (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL,
                author      TEXT NOT NULL DEFAULT '',
                instrument  TEXT NOT NULL DEFAULT '',
                condition   TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                public      INTEGER NOT NULL DEFAULT 0 CHECK (public IN (0, 1))
            )"#],
    },
    Migration {
        name: "0002_create_format_picklist",
        statements: &[
            r#"
            CREATE TABLE IF NOT EXISTS format_picklist (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                format      TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL
            )"#,
            r#"
            INSERT OR IGNORE INTO format_picklist (format, description) VALUES
                ('sheet music',      'Single piece or short folio, typically softcover and intended for performance'),
                ('music book',       'Bound book of sheet music or exercises, such as method books, anthologies, or collections'),
                ('method book',      'Instructional book for learning an instrument, often organized by level'),
                ('score',            'Full musical score for ensembles, orchestras, or chamber music'),
                ('lead sheet',       'Single-line melody with chords, often used in jazz or pop music'),
                ('fake book',        'Gig-style book with hundreds of lead sheets for performance'),
                ('manuscript',       'Blank staff paper or note-taking formats for composers and students'),
                ('programming book', 'Technical or instructional book focused on coding, software, or computer science topics'),
                ('textbook',         'Educational book intended for academic study, often includes theory and exercises'),
                ('reference book',   'Non-fiction book used for lookups or guidance, such as dictionaries, style guides, or API references')
            "#,
        ],
    },
    Migration {
        name: "0003_add_book_format",
        statements: &[
            "ALTER TABLE books ADD COLUMN format TEXT REFERENCES format_picklist (format)",
        ],
    },
    Migration {
        name: "0004_add_book_timestamps",
        statements: &[
            "ALTER TABLE books ADD COLUMN created_at TEXT NOT NULL DEFAULT '1970-01-01T00:00:00Z'",
            "ALTER TABLE books ADD COLUMN updated_at TEXT NOT NULL DEFAULT '1970-01-01T00:00:00Z'",
        ],
    },
];

/// Applies every migration not yet recorded in the ledger and returns the names applied.
pub async fn run(
    pool: &SqlitePool,
    migrations: &[Migration],
) -> Result<Vec<&'static str>, StoreError> {
    let mut tx = pool.begin().await?;

    sqlx::query(CREATE_LEDGER).execute(&mut *tx).await?;

    let recorded: Vec<String> = sqlx::query_scalar("SELECT name FROM migrations")
        .fetch_all(&mut *tx)
        .await?;
    let recorded: HashSet<String> = recorded.into_iter().collect();

    let mut applied = Vec::new();
    for migration in migrations {
        if recorded.contains(migration.name) {
            continue;
        }

        for statement in migration.statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|source| StoreError::Migration {
                    name: migration.name,
                    source,
                })?;
        }

        sqlx::query("INSERT INTO migrations (name, applied_at) VALUES (?1, ?2)")
            .bind(migration.name)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(|source| StoreError::Migration {
                name: migration.name,
                source,
            })?;

        applied.push(migration.name);
    }

    // Dropping the transaction on any error above rolls the whole batch back
    tx.commit().await?;

    if applied.is_empty() {
        info!("Schema up to date ({} migrations recorded)", recorded.len());
    } else {
        info!("Applied migrations: {}", applied.join(", "));
    }

    Ok(applied)
}

/// Names recorded in the ledger, in the order they were applied.
pub async fn applied(pool: &SqlitePool) -> Result<Vec<String>, StoreError> {
    let names = sqlx::query_scalar("SELECT name FROM migrations ORDER BY applied_at, name")
        .fetch_all(pool)
        .await?;
    Ok(names)
}
