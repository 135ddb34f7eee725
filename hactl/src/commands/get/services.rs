//! `get services`: every callable service, normalized from `/api/services`.
//!
//! The endpoint has answered in two shapes over time:
//! - a list, either of flat `{domain, service, description, fields}` entries
//!   or of `{domain, services: {name: info}}` groups
//! - a map of `domain → {service → info}`
//!
//! [`ServicesResponse`] captures both at the deserialization boundary and
//! [`ServicesResponse::normalize`] flattens them into [`ServiceEntry`] rows,
//! so nothing downstream looks at the raw shape again.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::commands::Context;
use crate::error::CliError;
use crate::output::{ReportFormat, print_json, print_yaml, rule, truncate};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ServicesResponse {
    ListForm(Vec<Value>),
    MapForm(Map<String, Value>),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServiceEntry {
    pub domain: String,
    pub service: String,
    pub description: String,
    pub fields: BTreeMap<String, ServiceField>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ServiceField {
    pub description: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Raw value for fields not described by an object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ServicesResponse {
    /// Flatten into entries sorted by `(domain, service)`.
    #[must_use]
    pub fn normalize(self) -> Vec<ServiceEntry> {
        let mut entries = Vec::new();
        match self {
            Self::ListForm(items) => {
                for item in items {
                    let Value::Object(item) = item else { continue };
                    let domain = str_field(&item, "domain").unwrap_or("unknown");
                    if let Some(Value::Object(services)) = item.get("services") {
                        push_domain(&mut entries, domain, services);
                    } else {
                        entries.push(ServiceEntry {
                            domain: domain.to_owned(),
                            service: str_field(&item, "service").unwrap_or("unknown").to_owned(),
                            description: str_field(&item, "description").unwrap_or_default().to_owned(),
                            fields: parse_fields(item.get("fields")),
                        });
                    }
                }
            }
            Self::MapForm(domains) => {
                for (domain, services) in &domains {
                    if let Value::Object(services) = services {
                        push_domain(&mut entries, domain, services);
                    }
                }
            }
        }
        entries.sort_by(|a, b| a.domain.cmp(&b.domain).then_with(|| a.service.cmp(&b.service)));
        entries
    }
}

fn push_domain(entries: &mut Vec<ServiceEntry>, domain: &str, services: &Map<String, Value>) {
    for (service, info) in services {
        let (description, fields) = match info {
            Value::Object(info) => {
                (str_field(info, "description").unwrap_or_default().to_owned(), parse_fields(info.get("fields")))
            }
            _ => (String::new(), BTreeMap::new()),
        };
        entries.push(ServiceEntry { domain: domain.to_owned(), service: service.clone(), description, fields });
    }
}

fn parse_fields(fields: Option<&Value>) -> BTreeMap<String, ServiceField> {
    let Some(Value::Object(fields)) = fields else {
        return BTreeMap::new();
    };
    fields
        .iter()
        .map(|(name, info)| {
            let field = match info {
                Value::Object(info) => ServiceField {
                    description: str_field(info, "description").unwrap_or_default().to_owned(),
                    required: info.get("required").and_then(Value::as_bool).unwrap_or(false),
                    example: info.get("example").filter(|example| !example.is_null()).cloned(),
                    value: None,
                },
                other => ServiceField { value: Some(other.clone()), ..ServiceField::default() },
            };
            (name.clone(), field)
        })
        .collect()
}

fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Entries grouped by domain, domains in sorted order.
#[must_use]
pub fn group_by_domain(entries: &[ServiceEntry]) -> BTreeMap<&str, Vec<&ServiceEntry>> {
    let mut grouped = BTreeMap::<&str, Vec<&ServiceEntry>>::new();
    for entry in entries {
        grouped.entry(entry.domain.as_str()).or_default().push(entry);
    }
    grouped
}

pub async fn fetch(ctx: &Context) -> Result<Vec<ServiceEntry>, CliError> {
    let response: ServicesResponse = ctx.rest()?.get("/api/services").await?;
    Ok(response.normalize())
}

pub async fn run(ctx: &Context, format: ReportFormat) -> Result<(), CliError> {
    let services = fetch(ctx).await?;

    match format {
        ReportFormat::Json => return print_json(&services),
        ReportFormat::Yaml => return print_yaml("Home Assistant Services", &services),
        ReportFormat::Detail | ReportFormat::Table => {}
    }

    println!("=== Home Assistant Services ===\n");
    for (domain, entries) in group_by_domain(&services) {
        println!("## {} ({} services)\n", domain.to_uppercase(), entries.len());
        if format == ReportFormat::Detail {
            for entry in entries {
                print_detail(entry);
            }
            continue;
        }

        println!("{:<30} {:<50} {:<30}", "Service", "Description", "Parameters");
        println!("{}", rule(110));
        for entry in entries {
            let description = if entry.description.is_empty() { "-" } else { entry.description.as_str() };
            let params = parameter_list(entry);
            let params = if params.is_empty() { "-".to_owned() } else { params };
            println!("{:<30} {:<50} {:<30}", entry.service, truncate(description, 48), truncate(&params, 28));
        }
        println!();
    }
    Ok(())
}

fn print_detail(entry: &ServiceEntry) {
    println!("**{}**", entry.service);
    if !entry.description.is_empty() {
        println!("  - Description: {}", entry.description);
    }
    if !entry.fields.is_empty() {
        println!("  - Parameters: {}", parameter_list(entry));
        for (name, field) in &entry.fields {
            let requirement = if field.required { "required" } else { "optional" };
            println!("    - {name} ({requirement})");
        }
    }
    println!();
}

fn parameter_list(entry: &ServiceEntry) -> String {
    entry.fields.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
#[path = "services_test.rs"]
mod tests;
