//! `get integrations`: config entries with a per-state summary.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::commands::Context;
use crate::error::CliError;
use crate::output::{ReportFormat, print_json, print_yaml};

/// One element of `GET /api/config/config_entries/entry`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Integration {
    #[serde(default = "unknown_title")]
    pub title: String,
    #[serde(default = "unknown")]
    pub domain: String,
    #[serde(default = "unknown")]
    pub state: String,
    #[serde(default)]
    pub entry_id: Option<String>,
    #[serde(default = "unknown")]
    pub source: String,
}

fn unknown() -> String {
    "unknown".to_owned()
}

fn unknown_title() -> String {
    "Unknown".to_owned()
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct IntegrationReport {
    pub integrations: Vec<Integration>,
    pub summary: IntegrationSummary,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct IntegrationSummary {
    pub total: usize,
    pub by_state: BTreeMap<String, usize>,
    pub domains: BTreeSet<String>,
}

#[must_use]
pub fn build_report(mut integrations: Vec<Integration>) -> IntegrationReport {
    integrations.sort_by(|a, b| a.domain.cmp(&b.domain).then_with(|| a.title.cmp(&b.title)));

    let mut by_state = BTreeMap::new();
    for integration in &integrations {
        *by_state.entry(integration.state.clone()).or_insert(0) += 1;
    }
    let domains = integrations.iter().map(|integration| integration.domain.clone()).collect();

    IntegrationReport {
        summary: IntegrationSummary { total: integrations.len(), by_state, domains },
        integrations,
    }
}

pub async fn run(ctx: &Context, format: ReportFormat) -> Result<(), CliError> {
    let entries: Vec<Integration> = ctx.rest()?.get("/api/config/config_entries/entry").await?;
    let report = build_report(entries);

    match format {
        ReportFormat::Json => return print_json(&report),
        ReportFormat::Yaml => return print_yaml("Home Assistant Integrations", &report),
        ReportFormat::Detail => {
            println!("=== Configured Integrations ===\n");
            for integration in &report.integrations {
                println!("**{}** ({})", integration.title, integration.domain);
                println!("  - State: {}", integration.state);
                println!("  - Source: {}", integration.source);
                println!();
            }
        }
        ReportFormat::Table => {
            println!("=== Configured Integrations ===\n");
            for integration in &report.integrations {
                println!("{} ({}) - State: {}", integration.title, integration.domain, integration.state);
            }
        }
    }

    let summary = &report.summary;
    println!("\n=== Summary ===");
    println!("Total integrations: {}", summary.total);
    println!("\nBy state:");
    for (state, count) in &summary.by_state {
        println!("  {state}: {count}");
    }
    println!("\nDomains:");
    for domain in &summary.domains {
        println!("  - {domain}");
    }
    Ok(())
}

#[cfg(test)]
#[path = "integrations_test.rs"]
mod tests;
