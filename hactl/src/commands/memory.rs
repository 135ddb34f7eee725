//! `memory` subcommands: notes, hand-edited context files, and snapshots of
//! the live installation.

use clap::{Subcommand, ValueEnum};
use serde::Serialize;

use crate::commands::Context;
use crate::commands::get::services::ServiceEntry;
use crate::commands::get::{dashboards, devices, services};
use crate::entity::EntityState;
use crate::error::CliError;
use crate::memory::{Category, MemoryStore, Note};
use crate::ws;

#[derive(Subcommand, Debug)]
pub enum MemoryCommand {
    /// Record a note about a sensor, device, automation, or dashboard.
    Add {
        #[arg(value_enum)]
        category: Category,
        item_id: String,
        note: String,
    },
    /// Notes for a category, or for one item in it.
    Show {
        #[arg(value_enum)]
        category: Category,
        item_id: Option<String>,
    },
    /// Files stored under the memory directory.
    List,
    /// Open a memory file in `$EDITOR` (default `nano`), creating it if needed.
    Edit {
        /// Path relative to the memory directory, e.g. `context/preferences.md`.
        path: String,
    },
    /// Snapshot the current installation into the memory directory.
    Sync {
        /// Categories to sync; all when omitted.
        #[arg(short, long = "category", value_enum)]
        categories: Vec<SyncCategory>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum SyncCategory {
    Devices,
    Sensors,
    Automations,
    Dashboards,
    Services,
}

impl SyncCategory {
    fn label(self) -> &'static str {
        match self {
            Self::Devices => "devices",
            Self::Sensors => "sensors",
            Self::Automations => "automations",
            Self::Dashboards => "dashboards",
            Self::Services => "services",
        }
    }
}

pub async fn run(ctx: &Context, command: MemoryCommand) -> Result<(), CliError> {
    let store = MemoryStore::new(&ctx.memory_root);
    match command {
        MemoryCommand::Add { category, item_id, note } => {
            let entry = store.add_note(category, &item_id, &note)?;
            println!("Added note for {item_id} in {}", category.dir());
            println!("  Note: {}", entry.note);
            Ok(())
        }
        MemoryCommand::Show { category, item_id } => show(&store, category, item_id.as_deref()),
        MemoryCommand::List => list(&store),
        MemoryCommand::Edit { path } => edit(&store, &path).await,
        MemoryCommand::Sync { categories } => sync(ctx, &store, categories).await,
    }
}

fn print_notes(notes: &[Note]) {
    for entry in notes {
        println!("  [{}] {}", entry.timestamp, entry.note);
    }
}

fn show(store: &MemoryStore, category: Category, item_id: Option<&str>) -> Result<(), CliError> {
    let notes = store.notes(category)?;
    if notes.is_empty() {
        println!("No notes found for {}", category.dir());
        return Ok(());
    }

    match item_id {
        Some(id) => match notes.get(id) {
            Some(entries) => {
                println!("Notes for {id}:");
                print_notes(entries);
            }
            None => println!("No notes found for {id}"),
        },
        None => {
            println!("All notes in {}:", category.dir());
            for (id, entries) in &notes {
                println!("\n{id}:");
                print_notes(entries);
            }
        }
    }
    Ok(())
}

fn list(store: &MemoryStore) -> Result<(), CliError> {
    println!("Memory Contents ({}):\n", store.root().display());
    for dir in store.listing()? {
        match dir.files {
            Some(files) => {
                println!("{}/", dir.name);
                for (name, size) in files {
                    println!("  {name} ({size} bytes)");
                }
            }
            None => println!("{}/ (empty)", dir.name),
        }
        println!();
    }
    Ok(())
}

async fn edit(store: &MemoryStore, relative: &str) -> Result<(), CliError> {
    let (path, created) = store.ensure_file(relative)?;
    if created {
        println!("Created new file: {}", path.display());
    }

    let editor = std::env::var("EDITOR").ok().filter(|editor| !editor.trim().is_empty());
    let editor = editor.as_deref().unwrap_or("nano");
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("nano");

    println!("Opening {} with {editor}...", path.display());
    let status = tokio::process::Command::new(program)
        .args(parts)
        .arg(&path)
        .status()
        .await
        .map_err(|error| CliError::io(format!("launch editor `{program}`"), error))?;
    if !status.success() {
        tracing::warn!(%status, "editor exited unsuccessfully");
    }
    Ok(())
}

// =============================================================================
// SYNC
// =============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SensorSnapshot {
    pub entity_id: String,
    pub friendly_name: String,
    pub device_class: String,
    pub unit_of_measurement: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AutomationSnapshot {
    pub entity_id: String,
    pub friendly_name: String,
    pub state: String,
    pub last_triggered: Option<String>,
}

pub const SERVICES_CSV_HEADER: [&str; 4] = ["domain", "service", "description", "fields"];

fn attr_or_empty(state: &EntityState, key: &str) -> String {
    state.attr_str(key).unwrap_or_default().to_owned()
}

#[must_use]
pub fn sensor_snapshot(states: &[EntityState]) -> Vec<SensorSnapshot> {
    states
        .iter()
        .filter(|state| state.domain() == "sensor")
        .map(|state| SensorSnapshot {
            entity_id: state.entity_id.clone(),
            friendly_name: attr_or_empty(state, "friendly_name"),
            device_class: attr_or_empty(state, "device_class"),
            unit_of_measurement: attr_or_empty(state, "unit_of_measurement"),
            state: state.state.clone(),
        })
        .collect()
}

#[must_use]
pub fn automation_snapshot(states: &[EntityState]) -> Vec<AutomationSnapshot> {
    states
        .iter()
        .filter(|state| state.domain() == "automation")
        .map(|state| AutomationSnapshot {
            entity_id: state.entity_id.clone(),
            friendly_name: attr_or_empty(state, "friendly_name"),
            state: state.state.clone(),
            last_triggered: state.attr_str("last_triggered").map(ToOwned::to_owned),
        })
        .collect()
}

/// One CSV row per service; field names joined with `;`.
#[must_use]
pub fn service_rows(entries: &[ServiceEntry]) -> Vec<[String; 4]> {
    entries
        .iter()
        .map(|entry| {
            let fields: Vec<&str> = entry.fields.keys().map(String::as_str).collect();
            [entry.domain.clone(), entry.service.clone(), entry.description.clone(), fields.join(";")]
        })
        .collect()
}

async fn cached_states<'a>(ctx: &Context, cache: &'a mut Option<Vec<EntityState>>) -> Result<&'a [EntityState], CliError> {
    if cache.is_none() {
        *cache = Some(ctx.rest()?.states().await?);
    }
    Ok(cache.as_deref().unwrap_or_default())
}

async fn sync_category(
    ctx: &Context,
    store: &MemoryStore,
    category: SyncCategory,
    states: &mut Option<Vec<EntityState>>,
) -> Result<usize, CliError> {
    match category {
        SyncCategory::Devices => {
            let snapshot = devices::group_devices(cached_states(ctx, states).await?);
            store.write_json("devices/devices.json", &snapshot)?;
            Ok(snapshot.len())
        }
        SyncCategory::Sensors => {
            let snapshot = sensor_snapshot(cached_states(ctx, states).await?);
            store.write_json("sensors/sensors.json", &snapshot)?;
            Ok(snapshot.len())
        }
        SyncCategory::Automations => {
            let snapshot = automation_snapshot(cached_states(ctx, states).await?);
            store.write_json("automations/automations.json", &snapshot)?;
            Ok(snapshot.len())
        }
        SyncCategory::Dashboards => {
            let set = ws::session(&ctx.config()?, dashboards::fetch_all).await?;
            store.write_json("dashboards/dashboards.json", &set.snapshot())?;
            Ok(set.dashboards.len())
        }
        SyncCategory::Services => {
            let rows = service_rows(&services::fetch(ctx).await?);
            store.write_csv("services/service_capabilities.csv", &SERVICES_CSV_HEADER, &rows)?;
            Ok(rows.len())
        }
    }
}

/// Sync each category in turn. A failing category is reported and the rest
/// still run.
pub async fn sync(ctx: &Context, store: &MemoryStore, mut categories: Vec<SyncCategory>) -> Result<(), CliError> {
    if categories.is_empty() {
        categories = SyncCategory::value_variants().to_vec();
    }
    categories.sort();
    categories.dedup();

    println!("Syncing Home Assistant state to {}...\n", store.root().display());
    let mut states = None;
    let mut synced = Vec::new();
    for category in categories {
        match sync_category(ctx, store, category, &mut states).await {
            Ok(count) => {
                println!("  {}: {count} saved", category.label());
                synced.push((category, count));
            }
            Err(error) => {
                tracing::warn!(category = category.label(), %error, "sync failed");
                eprintln!("  Failed to sync {}: {error}", category.label());
            }
        }
    }

    println!("\nMemory sync complete.");
    for (category, count) in synced {
        println!("  {}: {count} items", category.label());
    }
    Ok(())
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
