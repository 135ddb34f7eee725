//! `update dashboard`: push a YAML (or JSON) dashboard config with
//! `lovelace/config/save`.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde_json::Value;

use crate::commands::Context;
use crate::commands::get::dashboards::save_params;
use crate::error::CliError;
use crate::ws;

#[derive(Subcommand, Debug)]
pub enum UpdateCommand {
    /// Replace a dashboard's config from a file.
    Dashboard {
        url_path: String,
        /// YAML or JSON file holding the dashboard config.
        #[arg(long = "from", value_name = "FILE")]
        from_file: PathBuf,
        /// The dashboard is new rather than existing.
        #[arg(long)]
        create: bool,
    },
}

/// Parse a dashboard config. JSON is accepted since it is a YAML subset.
pub fn parse_config(text: &str) -> Result<Value, CliError> {
    let config: Value = serde_yaml::from_str(text)?;
    if !config.is_object() {
        return Err(CliError::InvalidDashboard("top level must be a mapping".to_owned()));
    }
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Value, CliError> {
    let text = std::fs::read_to_string(path).map_err(|error| CliError::io(format!("read {}", path.display()), error))?;
    parse_config(&text)
}

pub async fn run(ctx: &Context, command: UpdateCommand) -> Result<(), CliError> {
    match command {
        UpdateCommand::Dashboard { url_path, from_file, create } => {
            let config = load_config(&from_file)?;
            let params = save_params(&url_path, config);
            ws::session(&ctx.config()?, move |conn| Ok(conn.call_with("lovelace/config/save", params)?)).await?;

            let verb = if create { "created" } else { "updated" };
            tracing::info!(%url_path, verb, "dashboard saved");
            println!("Successfully {verb} dashboard: {url_path}");
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "update_test.rs"]
mod tests;
