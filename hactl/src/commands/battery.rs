//! `battery` subcommands: device battery listing and summary-sensor health.

use clap::Subcommand;
use serde::Serialize;

use crate::commands::Context;
use crate::entity::EntityState;
use crate::error::CliError;
use crate::output::{BatteryFormat, print_json};

/// Id fragments of phones, tablets, cars, and battery *state* sensors.
const MOBILE_KEYWORDS: [&str; 10] =
    ["iphone", "ipad", "tablet", "car", "tesla", "macbook", "watch", "android", "state", "tessy"];

/// Template sensors summarizing every battery in the house.
pub const SUMMARY_SENSORS: [&str; 4] = [
    "sensor.battery_summary_total",
    "sensor.battery_low_count",
    "sensor.battery_critical_count",
    "sensor.battery_average_level",
];

#[derive(Subcommand, Debug)]
pub enum BatteryCommand {
    /// List battery level sensors.
    List {
        #[arg(short, long, value_enum, default_value = "table")]
        format: BatteryFormat,
        /// Keep phones, tablets, and cars.
        #[arg(long)]
        include_mobile: bool,
    },
    /// Check that the battery summary sensors are reporting.
    Check,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BatterySensor {
    pub entity_id: String,
    pub friendly_name: String,
    pub state: String,
    pub unit: String,
}

fn is_battery_level(entity_id: &str) -> bool {
    entity_id.contains("level")
        || (entity_id.ends_with("_battery") && !entity_id.contains("state"))
        || entity_id.contains("battery_percentage")
}

#[must_use]
pub fn select_batteries(states: &[EntityState], include_mobile: bool) -> Vec<BatterySensor> {
    let mut sensors: Vec<BatterySensor> = states
        .iter()
        .filter(|state| {
            let id = state.entity_id.to_lowercase();
            id.contains("battery")
                && (include_mobile || !MOBILE_KEYWORDS.iter().any(|keyword| id.contains(keyword)))
                && is_battery_level(&id)
        })
        .map(|state| BatterySensor {
            entity_id: state.entity_id.clone(),
            friendly_name: state.attr_str("friendly_name").unwrap_or_default().to_owned(),
            state: state.state.clone(),
            unit: state.attr_str("unit_of_measurement").unwrap_or_default().to_owned(),
        })
        .collect();
    sensors.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
    sensors
}

/// Outcome of reading one summary sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorCheck {
    Reporting { state: String, unit: String },
    Unavailable,
    Failed(String),
}

impl SensorCheck {
    #[must_use]
    pub fn from_result(result: Result<EntityState, CliError>) -> Self {
        match result {
            Ok(state) if state.state == "unavailable" => Self::Unavailable,
            Ok(state) => Self::Reporting {
                unit: state.attr_str("unit_of_measurement").unwrap_or_default().to_owned(),
                state: state.state,
            },
            Err(error) => Self::Failed(error.to_string()),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Reporting { .. })
    }
}

pub async fn run(ctx: &Context, command: BatteryCommand) -> Result<(), CliError> {
    match command {
        BatteryCommand::List { format, include_mobile } => list(ctx, format, include_mobile).await,
        BatteryCommand::Check => check(ctx).await,
    }
}

async fn list(ctx: &Context, format: BatteryFormat, include_mobile: bool) -> Result<(), CliError> {
    let states = ctx.rest()?.states().await?;
    let sensors = select_batteries(&states, include_mobile);

    match format {
        BatteryFormat::Json => return print_json(&sensors),
        BatteryFormat::List => {
            for sensor in &sensors {
                println!("{}", sensor.entity_id);
            }
        }
        BatteryFormat::Table => {
            let scope = if include_mobile { "" } else { " (excluding mobile/car)" };
            println!("Found {} device battery sensors{scope}:\n", sensors.len());
            for sensor in &sensors {
                let name = if sensor.friendly_name.is_empty() { &sensor.entity_id } else { &sensor.friendly_name };
                println!("  - {}: {name} ({}{})", sensor.entity_id, sensor.state, sensor.unit);
            }
        }
    }
    Ok(())
}

async fn check(ctx: &Context) -> Result<(), CliError> {
    let rest = ctx.rest()?;

    println!("Battery Summary Sensors:");
    println!("{}", "=".repeat(50));

    let mut all_ok = true;
    for sensor_id in SUMMARY_SENSORS {
        let check = SensorCheck::from_result(rest.state(sensor_id).await);
        all_ok &= check.is_ok();
        match check {
            SensorCheck::Reporting { state, unit } => println!("  OK   {sensor_id}: {state} {unit}"),
            SensorCheck::Unavailable => println!("  FAIL {sensor_id}: unavailable"),
            SensorCheck::Failed(message) => {
                tracing::warn!(sensor_id, %message, "summary sensor lookup failed");
                println!("  FAIL {sensor_id}: ERROR - {}", crate::output::truncate(&message, 60));
            }
        }
    }

    println!();
    if all_ok {
        println!("All battery summary sensors are available");
    } else {
        println!("Some sensors are unavailable or missing");
    }
    Ok(())
}

#[cfg(test)]
#[path = "battery_test.rs"]
mod tests;
