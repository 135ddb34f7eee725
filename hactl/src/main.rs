mod api;
mod commands;
mod config;
mod entity;
mod error;
mod kubectl;
mod memory;
mod output;
mod ws;

#[cfg(test)]
mod test_support;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::Context;
use crate::commands::battery::BatteryCommand;
use crate::commands::get::GetCommand;
use crate::commands::k8s::K8sCommand;
use crate::commands::memory::MemoryCommand;
use crate::commands::update::UpdateCommand;
use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "hactl", version, about = "Home Assistant command-line client")]
struct Cli {
    /// Debug logging on stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only on stderr.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Base URL, e.g. `https://homeassistant.local:8123`.
    #[arg(long, global = true, env = "HASS_URL")]
    url: Option<String>,

    /// Long-lived access token.
    #[arg(long, global = true, env = "HASS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read-only reports.
    #[command(subcommand)]
    Get(GetCommand),
    /// Push changes to Home Assistant.
    #[command(subcommand)]
    Update(UpdateCommand),
    /// Battery sensor utilities.
    #[command(subcommand)]
    Battery(BatteryCommand),
    /// Configuration inside a Kubernetes pod.
    #[command(subcommand)]
    K8s(K8sCommand),
    /// Local notes and snapshots.
    #[command(subcommand)]
    Memory(MemoryCommand),
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let ctx = Context { url: cli.url, token: cli.token, memory_root: config::memory_root() };

    match cli.command {
        Command::Get(command) => commands::get::run(&ctx, command).await,
        Command::Update(command) => commands::update::run(&ctx, command).await,
        Command::Battery(command) => commands::battery::run(&ctx, command).await,
        Command::K8s(command) => commands::k8s::run(command).await,
        Command::Memory(command) => commands::memory::run(&ctx, command).await,
    }
}
