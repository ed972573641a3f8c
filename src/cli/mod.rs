pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "books")]
#[command(about = "Books CLI - offline administration of the books catalog")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Back up and migrate the configured datastore")]
    Migrate,

    #[command(about = "Issue a bearer token for a magic key without running the server")]
    Token {
        #[arg(help = "Magic key (UUID) from the magic keys file")]
        magic_id: String,
    },

    #[command(about = "Print the catalog export as JSON")]
    Export {
        #[arg(long, help = "Include private books")]
        all: bool,
    },

    #[command(about = "List the format picklist")]
    Formats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Migrate => commands::store::migrate(&config, output_format).await,
        Commands::Token { magic_id } => commands::token::issue(&config, &magic_id, output_format),
        Commands::Export { all } => commands::store::export(&config, all).await,
        Commands::Formats => commands::store::formats(&config, output_format).await,
    }
}
