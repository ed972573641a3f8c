use serde_json::json;

use crate::auth::TokenService;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn issue(config: &AppConfig, magic_id: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let tokens = TokenService::initialize(config)?;
    let token = tokens.issue_token(magic_id)?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "Token issued",
            Some(json!({ "token": token, "key_version": tokens.key_version() })),
        ),
        OutputFormat::Text => {
            // Bare token so it can be piped into an Authorization header
            println!("{}", token);
            Ok(())
        }
    }
}
