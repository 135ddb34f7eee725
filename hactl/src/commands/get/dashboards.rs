//! `get dashboards`: Lovelace dashboards over the WebSocket API.
//!
//! FLOW
//! ====
//! 1. `get_panels`, keeping panels whose `component_name` is `lovelace`
//!    (the `lovelace` alias and duplicate paths are skipped)
//! 2. no dashboards left → fall back to the default `lovelace` dashboard
//! 3. `lovelace/config` per dashboard; a failed call is recorded on that
//!    dashboard's summary and the rest continue

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use hassws::{Connection, WsError};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::commands::Context;
use crate::error::CliError;
use crate::output::{DashboardFormat, print_json, to_yaml};
use crate::ws;

pub const DEFAULT_URL_PATH: &str = "lovelace";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DashboardRef {
    pub id: String,
    pub title: String,
    pub url_path: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DashboardSummary {
    pub title: String,
    pub url_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Value>,
    pub views: Vec<ViewSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ViewSummary {
    pub index: usize,
    pub title: String,
    pub path: Option<String>,
    pub icon: Option<String>,
    pub badges: usize,
    pub cards: Vec<CardSummary>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CardSummary {
    #[serde(rename = "type")]
    pub card_type: String,
    pub title: Option<String>,
    /// Length of the card's `entities` list, when it has one.
    pub entities: Option<usize>,
}

/// Everything fetched in one WebSocket session.
#[derive(Debug, Clone, Default)]
pub struct DashboardSet {
    pub dashboards: Vec<DashboardRef>,
    /// Raw configs keyed by url path; failed dashboards are absent.
    pub configs: BTreeMap<String, Value>,
    pub summaries: Vec<DashboardSummary>,
}

/// Lovelace dashboards from a `get_panels` result.
#[must_use]
pub fn select_dashboards(panels: &Value) -> Vec<DashboardRef> {
    let mut dashboards = Vec::new();
    let mut seen = BTreeSet::new();

    if let Some(panels) = panels.as_object() {
        for (key, panel) in panels {
            if panel.get("component_name").and_then(Value::as_str) != Some("lovelace") {
                continue;
            }
            let path = panel.get("url_path").and_then(Value::as_str).filter(|path| !path.is_empty()).unwrap_or(key);
            if path == DEFAULT_URL_PATH || !seen.insert(path.to_owned()) {
                continue;
            }
            dashboards.push(DashboardRef {
                id: panel.get("config_panel").and_then(Value::as_str).unwrap_or(key).to_owned(),
                title: panel.get("title").and_then(Value::as_str).map_or_else(|| title_case(key), ToOwned::to_owned),
                url_path: path.to_owned(),
                icon: panel.get("icon").and_then(Value::as_str).map(ToOwned::to_owned),
            });
        }
    }

    if dashboards.is_empty() {
        dashboards.push(DashboardRef {
            id: "default".to_owned(),
            title: "Home".to_owned(),
            url_path: DEFAULT_URL_PATH.to_owned(),
            icon: None,
        });
    }
    dashboards
}

/// Upper-case the first letter of every alphabetic run: `energy-dash` → `Energy-Dash`.
fn title_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut at_word_start = true;
    for ch in key.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Summarize a dashboard config into views and cards. Cards nested in
/// `sections` are flattened after the view's own cards.
#[must_use]
pub fn summarize(dashboard: &DashboardRef, config: &Value) -> DashboardSummary {
    let views = config.get("views").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();

    DashboardSummary {
        title: dashboard.title.clone(),
        url_path: dashboard.url_path.clone(),
        mode: config.get("mode").and_then(Value::as_str).map(ToOwned::to_owned),
        strategy: config.get("strategy").filter(|strategy| !strategy.is_null()).cloned(),
        views: views.iter().enumerate().map(|(index, view)| summarize_view(index, view)).collect(),
        error: None,
    }
}

fn summarize_view(index: usize, view: &Value) -> ViewSummary {
    let mut cards: Vec<&Value> = Vec::new();
    if let Some(own) = view.get("cards").and_then(Value::as_array) {
        cards.extend(own);
    }
    if let Some(sections) = view.get("sections").and_then(Value::as_array) {
        for section in sections {
            if let Some(section_cards) = section.get("cards").and_then(Value::as_array) {
                cards.extend(section_cards);
            }
        }
    }

    ViewSummary {
        index,
        title: view.get("title").and_then(Value::as_str).map_or_else(|| format!("View {}", index + 1), ToOwned::to_owned),
        path: view.get("path").and_then(Value::as_str).map(ToOwned::to_owned),
        icon: view.get("icon").and_then(Value::as_str).map(ToOwned::to_owned),
        badges: view.get("badges").and_then(Value::as_array).map_or(0, Vec::len),
        cards: cards
            .into_iter()
            .map(|card| CardSummary {
                card_type: card.get("type").and_then(Value::as_str).unwrap_or("unknown").to_owned(),
                title: card.get("title").and_then(Value::as_str).map(ToOwned::to_owned),
                entities: card.get("entities").and_then(Value::as_array).map(Vec::len),
            })
            .collect(),
    }
}

fn failed_summary(dashboard: &DashboardRef, message: String) -> DashboardSummary {
    DashboardSummary {
        title: dashboard.title.clone(),
        url_path: dashboard.url_path.clone(),
        mode: None,
        strategy: None,
        views: Vec::new(),
        error: Some(message),
    }
}

/// Human-readable message from a failed `result`.
#[must_use]
pub fn remote_error_message(raw: &Value) -> String {
    raw.pointer("/error/message")
        .and_then(Value::as_str)
        .map_or_else(|| raw.to_string(), ToOwned::to_owned)
}

pub fn url_path_params(url_path: &str) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("url_path".to_owned(), Value::String(url_path.to_owned()));
    params
}

/// Panels, then each dashboard's config. Only fatal connection errors abort.
pub fn fetch_all(conn: &mut Connection) -> Result<DashboardSet, CliError> {
    let panels = conn.call("get_panels")?;
    let dashboards = select_dashboards(&panels);
    let mut set = DashboardSet::default();

    for dashboard in &dashboards {
        match conn.call_with("lovelace/config", url_path_params(&dashboard.url_path)) {
            Ok(config) => {
                set.summaries.push(summarize(dashboard, &config));
                set.configs.insert(dashboard.url_path.clone(), config);
            }
            Err(WsError::RemoteCallFailed(raw)) => {
                tracing::warn!(url_path = %dashboard.url_path, "dashboard config unavailable");
                set.summaries.push(failed_summary(dashboard, remote_error_message(&raw)));
            }
            Err(error) => return Err(error.into()),
        }
    }

    set.dashboards = dashboards;
    Ok(set)
}

/// Split `dashboard/view` into its parts.
#[must_use]
pub fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.trim_matches('/').split_once('/') {
        Some((dashboard, view)) if !view.is_empty() => (dashboard, Some(view)),
        Some((dashboard, _)) => (dashboard, None),
        None => (target.trim_matches('/'), None),
    }
}

#[must_use]
pub fn find_view<'a>(config: &'a Value, view_path: &str) -> Option<&'a Value> {
    config
        .get("views")
        .and_then(Value::as_array)?
        .iter()
        .find(|view| view.get("path").and_then(Value::as_str) == Some(view_path))
}

/// Keep alphanumerics, `-` and `_`.
#[must_use]
pub fn sanitize_file_stem(url_path: &str) -> String {
    url_path.chars().filter(|ch| ch.is_alphanumeric() || matches!(ch, '-' | '_')).collect()
}

/// Commented YAML document for one dashboard, as written by `yaml-save`.
pub fn dashboard_document(dashboard: &DashboardRef, base_url: &str, config: &Value) -> Result<String, CliError> {
    Ok(format!(
        "# Dashboard: {title} (/{path})\n# URL: {base_url}/{path}\n---\n{body}",
        title = dashboard.title,
        path = dashboard.url_path,
        body = to_yaml(config)?,
    ))
}

pub async fn run(
    ctx: &Context,
    format: DashboardFormat,
    url_path: Option<String>,
    output_dir: PathBuf,
) -> Result<(), CliError> {
    let config = ctx.config()?;

    if format == DashboardFormat::YamlSingle {
        let target = url_path.unwrap_or_else(|| DEFAULT_URL_PATH.to_owned());
        return print_single(ctx, &target).await;
    }

    let set = ws::session(&config, fetch_all).await?;

    match format {
        DashboardFormat::Json => print_json(&set.summaries)?,
        DashboardFormat::Yaml => {
            for dashboard in &set.dashboards {
                match set.configs.get(&dashboard.url_path) {
                    Some(cfg) => println!("{}\n", dashboard_document(dashboard, &config.base_url, cfg)?),
                    None => println!("# Dashboard: {} (/{}) - Config not available\n---\n", dashboard.title, dashboard.url_path),
                }
            }
        }
        DashboardFormat::YamlSave => save_all(&set, &config.base_url, &output_dir)?,
        DashboardFormat::Detail => print_detail(&set.summaries),
        DashboardFormat::Table | DashboardFormat::YamlSingle => print_table(&set.summaries),
    }
    Ok(())
}

async fn print_single(ctx: &Context, target: &str) -> Result<(), CliError> {
    let (dashboard, view) = split_target(target);
    let dashboard_path = dashboard.to_owned();
    let config = ws::session(&ctx.config()?, move |conn| {
        Ok(conn.call_with("lovelace/config", url_path_params(&dashboard_path))?)
    })
    .await?;

    let document = match view {
        Some(view) => find_view(&config, view)
            .ok_or_else(|| CliError::NotFound(format!("view `{view}` not found in dashboard `{dashboard}`")))?,
        None => &config,
    };
    print!("{}", to_yaml(document)?);
    Ok(())
}

fn save_all(set: &DashboardSet, base_url: &str, output_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(output_dir)
        .map_err(|error| CliError::io(format!("create {}", output_dir.display()), error))?;

    for dashboard in &set.dashboards {
        let Some(cfg) = set.configs.get(&dashboard.url_path) else {
            eprintln!("Skipped: {} (/{}) - Config not available", dashboard.title, dashboard.url_path);
            continue;
        };
        let path = output_dir.join(format!("{}.yaml", sanitize_file_stem(&dashboard.url_path)));
        std::fs::write(&path, dashboard_document(dashboard, base_url, cfg)?)
            .map_err(|error| CliError::io(format!("write {}", path.display()), error))?;
        println!("Saved: {}", path.display());
    }
    Ok(())
}

fn print_detail(summaries: &[DashboardSummary]) {
    for dash in summaries {
        if let Some(error) = &dash.error {
            println!("Dashboard: {} (/{}) error: {error}\n", dash.title, dash.url_path);
            continue;
        }
        println!(
            "Dashboard: {} (/{}) mode={} views={}",
            dash.title,
            dash.url_path,
            dash.mode.as_deref().unwrap_or_default(),
            dash.views.len()
        );
        for view in &dash.views {
            println!(
                "  View {}: {} (path={}, icon={})",
                view.index + 1,
                view.title,
                view.path.as_deref().unwrap_or("-"),
                view.icon.as_deref().unwrap_or("-")
            );
            println!("    Badges: {}  Cards: {}", view.badges, view.cards.len());
            for card in view.cards.iter().take(5) {
                let entities = card.entities.map(|n| format!(", entities={n}")).unwrap_or_default();
                println!("      - {} {}{entities}", card.card_type, card.title.as_deref().unwrap_or_default());
            }
        }
        println!();
    }
}

fn print_table(summaries: &[DashboardSummary]) {
    println!("=== Home Assistant Dashboards ===");
    for dash in summaries {
        if let Some(error) = &dash.error {
            println!("Dashboard: {} (/{})  error: {error}\n", dash.title, dash.url_path);
            continue;
        }
        println!("Dashboard: {} (/{})  Views: {}", dash.title, dash.url_path, dash.views.len());
        for view in dash.views.iter().take(5) {
            let titles: Vec<&str> = view.cards.iter().filter_map(|card| card.title.as_deref()).take(3).collect();
            let sample = if titles.is_empty() { "Untitled cards".to_owned() } else { titles.join(", ") };
            println!("  - {} (cards={}) e.g., {}", view.title, view.cards.len(), crate::output::truncate(&sample, 80));
        }
        if dash.views.len() > 5 {
            println!("    ... {} more views", dash.views.len() - 5);
        }
        println!();
    }
}

/// `{"url_path": .., "config": ..}` for `lovelace/config/save`.
#[must_use]
pub fn save_params(url_path: &str, config: Value) -> Map<String, Value> {
    let mut params = url_path_params(url_path);
    params.insert("config".to_owned(), config);
    params
}

/// Dashboard snapshot written by `memory sync`.
#[derive(Debug, Serialize)]
pub struct DashboardSnapshot<'a> {
    pub dashboards: &'a [DashboardRef],
    pub summaries: &'a [DashboardSummary],
}

impl DashboardSet {
    #[must_use]
    pub fn snapshot(&self) -> DashboardSnapshot<'_> {
        DashboardSnapshot { dashboards: &self.dashboards, summaries: &self.summaries }
    }
}

#[cfg(test)]
#[path = "dashboards_test.rs"]
mod tests;
