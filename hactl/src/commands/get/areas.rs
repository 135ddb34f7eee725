//! `get areas`: areas with device and entity counts, built from the three
//! registries over the WebSocket API.
//!
//! An entity belongs to its own `area_id` when set, otherwise to the area of
//! its device.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::commands::Context;
use crate::error::CliError;
use crate::output::{ReportFormat, print_json, print_yaml, rule, truncate};
use crate::ws;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AreaEntry {
    pub area_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeviceEntry {
    pub id: String,
    #[serde(default)]
    pub area_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EntityEntry {
    pub entity_id: String,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub area_id: Option<String>,
}

/// The three registry listings, fetched in one session.
#[derive(Debug, Clone, Default)]
pub struct Registries {
    pub areas: Vec<AreaEntry>,
    pub devices: Vec<DeviceEntry>,
    pub entities: Vec<EntityEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AreaSummary {
    pub area_id: String,
    pub name: String,
    pub device_count: usize,
    pub entity_count: usize,
    pub sample_entities: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AreaReport {
    pub areas: Vec<AreaSummary>,
    /// Entities with no area of their own and none through their device.
    pub unassigned_entities: usize,
}

const SAMPLE_SIZE: usize = 5;

#[must_use]
pub fn build_report(registries: &Registries) -> AreaReport {
    let device_area: BTreeMap<&str, &str> = registries
        .devices
        .iter()
        .filter_map(|device| Some((device.id.as_str(), device.area_id.as_deref()?)))
        .collect();

    let mut devices_per_area: BTreeMap<&str, usize> = BTreeMap::new();
    for area_id in device_area.values() {
        *devices_per_area.entry(*area_id).or_default() += 1;
    }

    let mut entities_per_area: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut unassigned_entities = 0;
    for entity in &registries.entities {
        let area = entity
            .area_id
            .as_deref()
            .filter(|area| !area.is_empty())
            .or_else(|| entity.device_id.as_deref().and_then(|device| device_area.get(device).copied()));
        match area {
            Some(area) => entities_per_area.entry(area).or_default().push(entity.entity_id.as_str()),
            None => unassigned_entities += 1,
        }
    }

    let mut areas: Vec<AreaSummary> = registries
        .areas
        .iter()
        .map(|area| {
            let entities = entities_per_area.get(area.area_id.as_str()).map(Vec::as_slice).unwrap_or_default();
            AreaSummary {
                area_id: area.area_id.clone(),
                name: area.name.clone().unwrap_or_else(|| area.area_id.clone()),
                device_count: devices_per_area.get(area.area_id.as_str()).copied().unwrap_or(0),
                entity_count: entities.len(),
                sample_entities: entities.iter().take(SAMPLE_SIZE).map(|id| (*id).to_owned()).collect(),
            }
        })
        .collect();
    areas.sort_by_key(|area| area.name.to_lowercase());

    AreaReport { areas, unassigned_entities }
}

fn fetch_registries(conn: &mut hassws::Connection) -> Result<Registries, CliError> {
    Ok(Registries {
        areas: serde_json::from_value(conn.call("config/area_registry/list")?)?,
        devices: serde_json::from_value(conn.call("config/device_registry/list")?)?,
        entities: serde_json::from_value(conn.call("config/entity_registry/list")?)?,
    })
}

pub async fn run(ctx: &Context, format: ReportFormat) -> Result<(), CliError> {
    let registries = ws::session(&ctx.config()?, fetch_registries).await?;
    let report = build_report(&registries);

    match format {
        ReportFormat::Json => return print_json(&report),
        ReportFormat::Yaml => return print_yaml("Home Assistant Areas", &report),
        ReportFormat::Detail => {
            println!("=== Home Assistant Areas ===\n");
            for area in &report.areas {
                println!("**{}** (`{}`)", area.name, area.area_id);
                println!("  - Devices: {}", area.device_count);
                println!("  - Entities: {}", area.entity_count);
                for entity_id in &area.sample_entities {
                    println!("    - {entity_id}");
                }
                println!();
            }
        }
        ReportFormat::Table => {
            println!("=== Home Assistant Areas ===\n");
            println!("{:<30} {:<25} {:>8} {:>9}", "Name", "Area ID", "Devices", "Entities");
            println!("{}", rule(75));
            for area in &report.areas {
                println!(
                    "{:<30} {:<25} {:>8} {:>9}",
                    truncate(&area.name, 28),
                    truncate(&area.area_id, 23),
                    area.device_count,
                    area.entity_count
                );
            }
            println!();
        }
    }
    println!("Entities without an area: {}", report.unassigned_entities);
    Ok(())
}

#[cfg(test)]
#[path = "areas_test.rs"]
mod tests;
