//! `get sensors TYPE`: match by device class or entity id substring.

use serde::Serialize;

use crate::commands::Context;
use crate::entity::EntityState;
use crate::error::CliError;
use crate::output::{SensorFormat, print_json, rule, truncate, write_csv};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SensorRow {
    pub entity_id: String,
    pub state: String,
    pub device_class: String,
    pub unit: String,
    pub friendly_name: String,
    pub last_updated: String,
}

impl SensorRow {
    fn fields(&self) -> [&str; 6] {
        [&self.entity_id, &self.state, &self.device_class, &self.unit, &self.friendly_name, &self.last_updated]
    }
}

/// Case-insensitive match on `device_class`, or `sensor_type` appearing in
/// the lowercased entity id.
#[must_use]
pub fn match_sensors(states: &[EntityState], sensor_type: &str) -> Vec<SensorRow> {
    let wanted = sensor_type.to_lowercase();
    states
        .iter()
        .filter(|state| {
            let device_class = state.attr_str("device_class").unwrap_or_default().to_lowercase();
            device_class == wanted || state.entity_id.to_lowercase().contains(&wanted)
        })
        .map(|state| SensorRow {
            entity_id: state.entity_id.clone(),
            state: state.state.clone(),
            device_class: state.attr_str("device_class").unwrap_or("N/A").to_owned(),
            unit: state.attr_str("unit_of_measurement").unwrap_or_default().to_owned(),
            friendly_name: state.friendly_name().to_owned(),
            last_updated: state.last_updated.clone().unwrap_or_default(),
        })
        .collect()
}

pub async fn run(ctx: &Context, sensor_type: &str, format: SensorFormat) -> Result<(), CliError> {
    let states = ctx.rest()?.states().await?;
    let sensors = match_sensors(&states, sensor_type);

    if sensors.is_empty() {
        eprintln!("No sensors found for type: {}", sensor_type.to_lowercase());
        return Ok(());
    }
    eprintln!("Found {} sensor(s)\n", sensors.len());

    match format {
        SensorFormat::Json => print_json(&sensors),
        SensorFormat::Csv => write_csv(
            std::io::stdout().lock(),
            &["entity_id", "state", "device_class", "unit", "friendly_name", "last_updated"],
            sensors.iter().map(SensorRow::fields),
        ),
        SensorFormat::List => {
            for sensor in &sensors {
                println!("{}", sensor.entity_id);
            }
            Ok(())
        }
        SensorFormat::Table => {
            println!("{:<50} {:<15} {:<15} {:<10} {:<30}", "ENTITY_ID", "STATE", "DEVICE_CLASS", "UNIT", "FRIENDLY_NAME");
            println!("{}", rule(120));
            for sensor in &sensors {
                println!(
                    "{:<50} {:<15} {:<15} {:<10} {:<30}",
                    truncate(&sensor.entity_id, 48),
                    sensor.state,
                    sensor.device_class,
                    sensor.unit,
                    truncate(&sensor.friendly_name, 28),
                );
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "sensors_test.rs"]
mod tests;
