//! `get states`: entity overview by domain, state, and attribute usage.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::by_count_desc;
use crate::commands::Context;
use crate::entity::EntityState;
use crate::error::CliError;
use crate::output::{ReportFormat, print_json, print_yaml, rule, truncate};

const MAX_UNAVAILABLE: usize = 50;
const SHOWN_UNAVAILABLE: usize = 20;
const MAX_COMMON_ATTRIBUTES: usize = 20;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatesOverview {
    pub total_entities: usize,
    pub domains: BTreeMap<String, usize>,
    pub state_distribution: BTreeMap<String, usize>,
    pub unavailable_count: usize,
    pub unavailable_entities: Vec<UnavailableEntity>,
    /// Attribute name → number of domains using it, most widespread first.
    pub common_attributes: Vec<AttributeUsage>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UnavailableEntity {
    pub entity_id: String,
    pub friendly_name: String,
    pub last_updated: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AttributeUsage {
    pub attribute: String,
    pub domains: usize,
}

/// Keep states whose domain equals `domain` and whose id contains `entity`.
#[must_use]
pub fn filter_states(states: Vec<EntityState>, domain: Option<&str>, entity: Option<&str>) -> Vec<EntityState> {
    states
        .into_iter()
        .filter(|state| domain.is_none_or(|domain| state.domain() == domain))
        .filter(|state| entity.is_none_or(|pattern| state.entity_id.contains(pattern)))
        .collect()
}

#[must_use]
pub fn build_overview(states: &[EntityState]) -> StatesOverview {
    let mut domains = BTreeMap::<String, usize>::new();
    let mut state_distribution = BTreeMap::<String, usize>::new();
    let mut unavailable = Vec::new();
    let mut attribute_domains = BTreeMap::<&str, BTreeSet<&str>>::new();

    for state in states {
        *domains.entry(state.domain().to_owned()).or_default() += 1;
        *state_distribution.entry(state.state.clone()).or_default() += 1;

        if state.state == "unavailable" {
            unavailable.push(UnavailableEntity {
                entity_id: state.entity_id.clone(),
                friendly_name: state.friendly_name().to_owned(),
                last_updated: state.last_updated.clone(),
            });
        }
        for key in state.attributes.keys() {
            attribute_domains.entry(key).or_default().insert(state.domain());
        }
    }

    let mut common_attributes: Vec<AttributeUsage> = attribute_domains
        .into_iter()
        .map(|(attribute, used_by)| AttributeUsage { attribute: attribute.to_owned(), domains: used_by.len() })
        .collect();
    common_attributes.sort_by(|a, b| b.domains.cmp(&a.domains).then_with(|| a.attribute.cmp(&b.attribute)));
    common_attributes.truncate(MAX_COMMON_ATTRIBUTES);

    let unavailable_count = unavailable.len();
    unavailable.truncate(MAX_UNAVAILABLE);

    StatesOverview {
        total_entities: states.len(),
        domains,
        state_distribution,
        unavailable_count,
        unavailable_entities: unavailable,
        common_attributes,
    }
}

pub async fn run(
    ctx: &Context,
    domain: Option<String>,
    entity: Option<String>,
    format: ReportFormat,
) -> Result<(), CliError> {
    let states = ctx.rest()?.states().await?;
    let states = filter_states(states, domain.as_deref(), entity.as_deref());
    let overview = build_overview(&states);

    match format {
        ReportFormat::Json => print_json(&overview),
        ReportFormat::Yaml => print_yaml("Home Assistant Entity States Overview", &overview),
        ReportFormat::Detail => {
            print_detail(&overview);
            Ok(())
        }
        ReportFormat::Table => {
            print_table(&overview);
            Ok(())
        }
    }
}

fn print_detail(overview: &StatesOverview) {
    println!("=== Home Assistant Entity States Overview ===\n");
    println!("Total Entities: {}\n", overview.total_entities);

    println!("## Entity Counts by Domain\n");
    for (domain, count) in by_count_desc(&overview.domains) {
        println!("  {domain}: {count}");
    }
    println!();

    println!("## State Distribution\n");
    for (state, count) in by_count_desc(&overview.state_distribution).into_iter().take(20) {
        println!("  {state}: {count}");
    }
    println!();

    print_unavailable(overview, |entity| format!("  - {} ({})", entity.entity_id, entity.friendly_name));

    println!("## Common Attributes\n");
    for usage in overview.common_attributes.iter().take(10) {
        println!("  {}: used by {} domains", usage.attribute, usage.domains);
    }
}

fn print_table(overview: &StatesOverview) {
    println!("=== Home Assistant Entity States Overview ===\n");
    println!("Total Entities: {}\n", overview.total_entities);

    println!("## Entity Counts by Domain\n");
    println!("{:<30} {:<10}", "Domain", "Count");
    println!("{}", rule(40));
    for (domain, count) in by_count_desc(&overview.domains) {
        println!("{domain:<30} {count:<10}");
    }
    println!();

    println!("## State Distribution (Top 20)\n");
    println!("{:<30} {:<10}", "State", "Count");
    println!("{}", rule(40));
    for (state, count) in by_count_desc(&overview.state_distribution).into_iter().take(20) {
        println!("{:<30} {count:<10}", truncate(state, 28));
    }
    println!();

    print_unavailable(overview, |entity| {
        format!("{:<50} {:<40}", entity.entity_id, truncate(&entity.friendly_name, 38))
    });
}

fn print_unavailable(overview: &StatesOverview, line: impl Fn(&UnavailableEntity) -> String) {
    if overview.unavailable_count == 0 {
        return;
    }
    println!("## Unavailable Entities ({})\n", overview.unavailable_count);
    for entity in overview.unavailable_entities.iter().take(SHOWN_UNAVAILABLE) {
        println!("{}", line(entity));
    }
    if overview.unavailable_count > SHOWN_UNAVAILABLE {
        println!("  ... and {} more", overview.unavailable_count - SHOWN_UNAVAILABLE);
    }
    println!();
}

#[cfg(test)]
#[path = "states_test.rs"]
mod tests;
