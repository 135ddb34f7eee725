//! Prefix-filtered entity listings: automations, scripts, helpers,
//! persons and zones, and HACS.

use serde::Serialize;
use serde_json::Value;

use crate::commands::Context;
use crate::entity::EntityState;
use crate::error::CliError;
use crate::output::{ReportFormat, print_json, print_yaml, rule, truncate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Automations,
    Scripts,
    Helpers,
}

impl EntityKind {
    #[must_use]
    pub fn matches(self, entity_id: &str) -> bool {
        match self {
            Self::Automations => entity_id.starts_with("automation."),
            Self::Scripts => entity_id.starts_with("script."),
            Self::Helpers => ["input_", "counter.", "timer.", "todo."].iter().any(|prefix| entity_id.starts_with(prefix)),
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Automations => "Automations",
            Self::Scripts => "Scripts",
            Self::Helpers => "Helpers",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EntityRow {
    pub entity_id: String,
    pub state: String,
    pub friendly_name: String,
}

#[must_use]
pub fn select_kind(states: &[EntityState], kind: EntityKind) -> Vec<EntityRow> {
    states
        .iter()
        .filter(|state| kind.matches(&state.entity_id))
        .map(|state| EntityRow {
            entity_id: state.entity_id.clone(),
            state: state.state.clone(),
            friendly_name: state.friendly_name().to_owned(),
        })
        .collect()
}

pub async fn run_kind(ctx: &Context, kind: EntityKind, format: ReportFormat) -> Result<(), CliError> {
    let states = ctx.rest()?.states().await?;
    let rows = select_kind(&states, kind);

    match format {
        ReportFormat::Json => print_json(&rows),
        ReportFormat::Yaml => print_yaml(kind.title(), &rows),
        ReportFormat::Table | ReportFormat::Detail => {
            println!("=== {} ===\n", kind.title());
            println!("Total: {}\n", rows.len());
            for row in &rows {
                println!("{}: {} ({})", row.entity_id, row.friendly_name, row.state);
            }
            Ok(())
        }
    }
}

// =============================================================================
// PERSONS AND ZONES
// =============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Person {
    pub entity_id: String,
    pub state: String,
    pub friendly_name: String,
    pub user_id: Option<String>,
    pub device_trackers: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub gps_accuracy: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Zone {
    pub entity_id: String,
    pub state: String,
    pub friendly_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<f64>,
    pub icon: Option<String>,
    pub passive: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PersonsZones {
    pub persons: Vec<Person>,
    pub zones: Vec<Zone>,
}

#[must_use]
pub fn persons_and_zones(states: &[EntityState]) -> PersonsZones {
    let mut persons = Vec::new();
    let mut zones = Vec::new();

    for state in states {
        let number = |key: &str| state.attr(key).and_then(Value::as_f64);
        if state.entity_id.starts_with("person.") {
            persons.push(Person {
                entity_id: state.entity_id.clone(),
                state: state.state.clone(),
                friendly_name: state.friendly_name().to_owned(),
                user_id: state.attr_str("user_id").map(ToOwned::to_owned),
                device_trackers: state
                    .attr("device_trackers")
                    .and_then(Value::as_array)
                    .map(|trackers| trackers.iter().filter_map(Value::as_str).map(ToOwned::to_owned).collect())
                    .unwrap_or_default(),
                latitude: number("latitude"),
                longitude: number("longitude"),
                gps_accuracy: number("gps_accuracy"),
            });
        } else if state.entity_id.starts_with("zone.") {
            zones.push(Zone {
                entity_id: state.entity_id.clone(),
                state: state.state.clone(),
                friendly_name: state.friendly_name().to_owned(),
                latitude: number("latitude"),
                longitude: number("longitude"),
                radius: number("radius"),
                icon: state.attr_str("icon").map(ToOwned::to_owned),
                passive: state.attr("passive").and_then(Value::as_bool).unwrap_or(false),
            });
        }
    }

    persons.sort_by_key(|person| person.friendly_name.to_lowercase());
    zones.sort_by_key(|zone| zone.friendly_name.to_lowercase());
    PersonsZones { persons, zones }
}

pub async fn run_persons_zones(ctx: &Context, format: ReportFormat) -> Result<(), CliError> {
    let states = ctx.rest()?.states().await?;
    let report = persons_and_zones(&states);

    match format {
        ReportFormat::Json => return print_json(&report),
        ReportFormat::Yaml => return print_yaml("Home Assistant Persons and Zones", &report),
        ReportFormat::Detail => print_persons_zones_detail(&report),
        ReportFormat::Table => print_persons_zones_table(&report),
    }
    Ok(())
}

fn location(latitude: Option<f64>, longitude: Option<f64>) -> Option<(f64, f64)> {
    latitude.zip(longitude)
}

fn print_persons_zones_detail(report: &PersonsZones) {
    println!("=== Home Assistant Persons and Zones ===\n");
    println!("## Persons ({})\n", report.persons.len());
    for person in &report.persons {
        println!("**{}** (`{}`)", person.friendly_name, person.entity_id);
        println!("  - State: {}", person.state);
        if let Some(user_id) = &person.user_id {
            println!("  - User ID: {user_id}");
        }
        if !person.device_trackers.is_empty() {
            println!("  - Device Trackers: {}", person.device_trackers.join(", "));
        }
        if let Some((lat, lon)) = location(person.latitude, person.longitude) {
            println!("  - Location: {lat}, {lon}");
        }
        println!();
    }

    println!("## Zones ({})\n", report.zones.len());
    for zone in &report.zones {
        println!("**{}** (`{}`)", zone.friendly_name, zone.entity_id);
        println!("  - State: {}", zone.state);
        if let Some((lat, lon)) = location(zone.latitude, zone.longitude) {
            println!("  - Location: {lat}, {lon}");
        }
        if let Some(radius) = zone.radius {
            println!("  - Radius: {radius}m");
        }
        if let Some(icon) = &zone.icon {
            println!("  - Icon: {icon}");
        }
        if zone.passive {
            println!("  - Passive: Yes");
        }
        println!();
    }
}

fn print_persons_zones_table(report: &PersonsZones) {
    println!("=== Home Assistant Persons and Zones ===\n");
    println!("## Persons ({})\n", report.persons.len());
    println!("{:<40} {:<20} {:<30}", "Name", "State", "Trackers");
    println!("{}", rule(90));
    for person in &report.persons {
        let trackers = person.device_trackers.join(", ");
        let trackers = if trackers.is_empty() { "-".to_owned() } else { trackers };
        println!("{:<40} {:<20} {:<30}", truncate(&person.friendly_name, 38), person.state, truncate(&trackers, 28));
    }
    println!();

    println!("## Zones ({})\n", report.zones.len());
    println!("{:<40} {:<30} {:<15}", "Name", "Location", "Radius");
    println!("{}", rule(85));
    for zone in &report.zones {
        let location = location(zone.latitude, zone.longitude)
            .map_or_else(|| "-".to_owned(), |(lat, lon)| format!("{lat:.4}, {lon:.4}"));
        let radius = zone.radius.map_or_else(|| "-".to_owned(), |radius| format!("{radius}m"));
        println!("{:<40} {:<30} {:<15}", truncate(&zone.friendly_name, 38), location, radius);
    }
    println!();
}

// =============================================================================
// HACS
// =============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HacsEntity {
    pub entity_id: String,
    pub state: String,
    pub friendly_name: String,
    pub device_class: Option<String>,
    pub unit_of_measurement: Option<String>,
}

const HACS_NOTE: &str = "HACS information may be limited via API. Check HACS UI for full details.";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HacsReport {
    pub hacs_entities: Vec<HacsEntity>,
    pub note: &'static str,
}

#[must_use]
pub fn hacs_entities(states: &[EntityState]) -> HacsReport {
    let mut hacs_entities: Vec<HacsEntity> = states
        .iter()
        .filter(|state| state.entity_id.to_lowercase().contains("hacs"))
        .map(|state| HacsEntity {
            entity_id: state.entity_id.clone(),
            state: state.state.clone(),
            friendly_name: state.friendly_name().to_owned(),
            device_class: state.attr_str("device_class").map(ToOwned::to_owned),
            unit_of_measurement: state.attr_str("unit_of_measurement").map(ToOwned::to_owned),
        })
        .collect();
    hacs_entities.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
    HacsReport { hacs_entities, note: HACS_NOTE }
}

pub async fn run_hacs(ctx: &Context, format: ReportFormat) -> Result<(), CliError> {
    let states = ctx.rest()?.states().await?;
    let report = hacs_entities(&states);

    match format {
        ReportFormat::Json => return print_json(&report),
        ReportFormat::Yaml => return print_yaml("Home Assistant HACS Information", &report),
        ReportFormat::Detail | ReportFormat::Table => {}
    }

    println!("=== Home Assistant HACS Information ===\n");
    println!("HACS-related Entities: {}\n", report.hacs_entities.len());
    if report.hacs_entities.is_empty() {
        println!("No HACS-related entities found.");
        println!("Note: HACS information may not be exposed via the API.");
        println!();
        return Ok(());
    }

    if format == ReportFormat::Detail {
        for entity in &report.hacs_entities {
            println!("**{}** (`{}`)", entity.friendly_name, entity.entity_id);
            println!("  - State: {}", entity.state);
            if let Some(device_class) = &entity.device_class {
                println!("  - Device Class: {device_class}");
            }
            if let Some(unit) = &entity.unit_of_measurement {
                println!("  - Unit: {unit}");
            }
            println!();
        }
    } else {
        println!("{:<50} {:<20} {:<20}", "Entity ID", "State", "Device Class");
        println!("{}", rule(90));
        for entity in &report.hacs_entities {
            println!(
                "{:<50} {:<20} {:<20}",
                truncate(&entity.entity_id, 48),
                entity.state,
                truncate(entity.device_class.as_deref().unwrap_or("-"), 18),
            );
        }
    }
    println!();
    Ok(())
}

#[cfg(test)]
#[path = "entities_test.rs"]
mod tests;
