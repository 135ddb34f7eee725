//! `get` subcommands: read-only reports over the REST and WebSocket APIs.

pub mod areas;
pub mod dashboards;
pub mod devices;
pub mod entities;
pub mod integrations;
pub mod sensors;
pub mod services;
pub mod states;

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Subcommand;

use self::entities::EntityKind;
use crate::commands::Context;
use crate::error::CliError;
use crate::output::{DashboardFormat, ReportFormat, SensorFormat};

#[derive(Subcommand, Debug)]
pub enum GetCommand {
    /// Entity overview by domain, state, and attribute usage.
    States {
        /// Only entities in this domain (`light`, `sensor`, ...).
        #[arg(short, long)]
        domain: Option<String>,
        /// Only entity ids containing this text.
        #[arg(short, long)]
        entity: Option<String>,
        #[arg(short, long, value_enum, default_value = "table")]
        format: ReportFormat,
    },
    /// Devices grouped from entity attributes.
    Devices {
        #[arg(short, long, value_enum, default_value = "table")]
        format: ReportFormat,
    },
    /// Sensors by device class or id substring (`battery`, `temperature`, ...).
    Sensors {
        sensor_type: String,
        #[arg(short, long, value_enum, default_value = "table")]
        format: SensorFormat,
    },
    Integrations {
        #[arg(short, long, value_enum, default_value = "table")]
        format: ReportFormat,
    },
    Services {
        #[arg(short, long, value_enum, default_value = "table")]
        format: ReportFormat,
    },
    Automations {
        #[arg(short, long, value_enum, default_value = "table")]
        format: ReportFormat,
    },
    Scripts {
        #[arg(short, long, value_enum, default_value = "table")]
        format: ReportFormat,
    },
    /// `input_*`, counters, timers, and todo lists.
    Helpers {
        #[arg(short, long, value_enum, default_value = "table")]
        format: ReportFormat,
    },
    PersonsZones {
        #[arg(short, long, value_enum, default_value = "table")]
        format: ReportFormat,
    },
    Hacs {
        #[arg(short, long, value_enum, default_value = "table")]
        format: ReportFormat,
    },
    /// Lovelace dashboards (WebSocket).
    Dashboards {
        #[arg(short, long, value_enum, default_value = "table")]
        format: DashboardFormat,
        /// Dashboard for `yaml-single`; `dashboard/view` selects one view.
        #[arg(long)]
        url_path: Option<String>,
        /// Target directory for `yaml-save`.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Areas with device and entity counts (WebSocket).
    #[command(alias = "home-structure")]
    Areas {
        #[arg(short, long, value_enum, default_value = "table")]
        format: ReportFormat,
    },
}

pub async fn run(ctx: &Context, command: GetCommand) -> Result<(), CliError> {
    match command {
        GetCommand::States { domain, entity, format } => states::run(ctx, domain, entity, format).await,
        GetCommand::Devices { format } => devices::run(ctx, format).await,
        GetCommand::Sensors { sensor_type, format } => sensors::run(ctx, &sensor_type, format).await,
        GetCommand::Integrations { format } => integrations::run(ctx, format).await,
        GetCommand::Services { format } => services::run(ctx, format).await,
        GetCommand::Automations { format } => entities::run_kind(ctx, EntityKind::Automations, format).await,
        GetCommand::Scripts { format } => entities::run_kind(ctx, EntityKind::Scripts, format).await,
        GetCommand::Helpers { format } => entities::run_kind(ctx, EntityKind::Helpers, format).await,
        GetCommand::PersonsZones { format } => entities::run_persons_zones(ctx, format).await,
        GetCommand::Hacs { format } => entities::run_hacs(ctx, format).await,
        GetCommand::Dashboards { format, url_path, output_dir } => {
            dashboards::run(ctx, format, url_path, output_dir).await
        }
        GetCommand::Areas { format } => areas::run(ctx, format).await,
    }
}

/// Entries by count, highest first; ties by key.
pub(crate) fn by_count_desc(counts: &BTreeMap<String, usize>) -> Vec<(&String, &usize)> {
    let mut entries: Vec<_> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    entries
}
