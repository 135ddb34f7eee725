//! `get devices`: entities grouped by their `device_id` attribute.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::commands::Context;
use crate::entity::EntityState;
use crate::error::CliError;
use crate::output::{ReportFormat, print_json, print_yaml, rule, truncate};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeviceSummary {
    pub device_id: String,
    pub device_name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub area_id: Option<String>,
    pub entity_count: usize,
    pub entities: Vec<DeviceEntity>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeviceEntity {
    pub entity_id: String,
    pub friendly_name: Option<String>,
    pub state: String,
}

/// Group states by `attributes.device_id`, sorted by lowercase device name.
///
/// Device metadata comes from the first entity seen for each device. The
/// name is `device_name`, else the first word of `friendly_name`.
#[must_use]
pub fn group_devices(states: &[EntityState]) -> Vec<DeviceSummary> {
    let mut devices = BTreeMap::<String, DeviceSummary>::new();

    for state in states {
        let Some(device_id) = state.attr_str("device_id") else {
            continue;
        };
        let device = devices.entry(device_id.to_owned()).or_insert_with(|| DeviceSummary {
            device_id: device_id.to_owned(),
            device_name: device_name(state),
            manufacturer: state.attr_str("manufacturer").map(ToOwned::to_owned),
            model: state.attr_str("model").map(ToOwned::to_owned),
            area_id: state.attr_str("area_id").map(ToOwned::to_owned),
            entity_count: 0,
            entities: Vec::new(),
        });
        device.entities.push(DeviceEntity {
            entity_id: state.entity_id.clone(),
            friendly_name: state.attr_str("friendly_name").map(ToOwned::to_owned),
            state: state.state.clone(),
        });
        device.entity_count = device.entities.len();
    }

    let mut list: Vec<DeviceSummary> = devices.into_values().collect();
    list.sort_by_key(|device| device.device_name.to_lowercase());
    list
}

fn device_name(state: &EntityState) -> String {
    if let Some(name) = state.attr_str("device_name").filter(|name| !name.is_empty()) {
        return name.to_owned();
    }
    state
        .attr_str("friendly_name")
        .and_then(|name| name.split(' ').next())
        .unwrap_or_default()
        .to_owned()
}

pub async fn run(ctx: &Context, format: ReportFormat) -> Result<(), CliError> {
    let states = ctx.rest()?.states().await?;
    let devices = group_devices(&states);

    match format {
        ReportFormat::Json => return print_json(&devices),
        ReportFormat::Yaml => return print_yaml("Home Assistant Devices", &devices),
        ReportFormat::Detail => print_detail(&devices),
        ReportFormat::Table => print_table(&devices),
    }
    Ok(())
}

fn display_name(device: &DeviceSummary) -> &str {
    if device.device_name.is_empty() { "Unknown" } else { &device.device_name }
}

fn print_detail(devices: &[DeviceSummary]) {
    println!("=== Home Assistant Devices ===\n");
    println!("Total Devices: {}\n", devices.len());

    for device in devices {
        println!("**{}** (ID: {})", display_name(device), device.device_id);
        if let Some(manufacturer) = &device.manufacturer {
            println!("  - Manufacturer: {manufacturer}");
        }
        if let Some(model) = &device.model {
            println!("  - Model: {model}");
        }
        if let Some(area) = &device.area_id {
            println!("  - Area: {area}");
        }
        println!("  - Entities: {}", device.entity_count);
        if !device.entities.is_empty() {
            println!("  - Entity List:");
            for entity in device.entities.iter().take(5) {
                println!("    - {} ({})", entity.entity_id, entity.friendly_name.as_deref().unwrap_or("-"));
            }
            if device.entities.len() > 5 {
                println!("    ... and {} more", device.entities.len() - 5);
            }
        }
        println!();
    }
}

fn print_table(devices: &[DeviceSummary]) {
    println!("=== Home Assistant Devices ===\n");
    println!("Total Devices: {}\n", devices.len());
    println!("{:<40} {:<25} {:<30} {:<20} {:<10}", "Device Name", "Manufacturer", "Model", "Area", "Entities");
    println!("{}", rule(125));

    for device in devices {
        println!(
            "{:<40} {:<25} {:<30} {:<20} {:<10}",
            truncate(display_name(device), 38),
            truncate(device.manufacturer.as_deref().unwrap_or("-"), 23),
            truncate(device.model.as_deref().unwrap_or("-"), 28),
            truncate(device.area_id.as_deref().unwrap_or("-"), 18),
            device.entity_count,
        );
    }
    println!();
}

#[cfg(test)]
#[path = "devices_test.rs"]
mod tests;
