use serde_json::json;

use crate::cli::utils::{output_success, print_table};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{migrations, Database};

pub async fn migrate(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let database = Database::open(&config.database).await?;
    let applied = migrations::applied(database.pool()).await?;
    database.close().await;

    output_success(
        &output_format,
        &format!(
            "{} is at migration {}",
            config.database.path.display(),
            applied.last().map(String::as_str).unwrap_or("(none)")
        ),
        Some(json!({ "migrations": applied })),
    )
}

pub async fn export(config: &AppConfig, all: bool) -> anyhow::Result<()> {
    let database = Database::open(&config.database).await?;
    let books = database.books().export(all).await?;
    database.close().await;

    println!("{}", serde_json::to_string_pretty(&books)?);
    Ok(())
}

pub async fn formats(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let database = Database::open(&config.database).await?;
    let formats = database.books().formats().await?;
    database.close().await;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&formats)?),
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = formats
                .into_iter()
                .map(|f| vec![f.format, f.description])
                .collect();
            print_table(&["FORMAT", "DESCRIPTION"], &rows);
        }
    }
    Ok(())
}
