//! Output formats and the printers shared by every command.

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::CliError;

/// Formats offered by most `get` reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Table,
    Json,
    Yaml,
    Detail,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SensorFormat {
    Table,
    Json,
    Csv,
    List,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BatteryFormat {
    Table,
    Json,
    List,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DashboardFormat {
    Table,
    Json,
    Yaml,
    Detail,
    /// One `<url_path>.yaml` file per dashboard under `--output-dir`.
    YamlSave,
    /// Raw config of the dashboard named by `--url-path`.
    YamlSingle,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

pub fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(value)?)
}

/// YAML document preceded by a `# title` comment and a `---` marker.
pub fn print_yaml<T: Serialize + ?Sized>(title: &str, value: &T) -> Result<(), CliError> {
    let rendered = to_yaml(value)?;
    println!("# {title}");
    println!("---");
    print!("{rendered}");
    Ok(())
}

/// Header row then one record per row.
pub fn write_csv<W, R, I>(writer: W, header: &[&str], rows: R) -> Result<(), CliError>
where
    W: Write,
    R: IntoIterator<Item = I>,
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(header)?;
    for row in rows {
        csv.write_record(row)?;
    }
    csv.flush().map_err(|error| CliError::io("flush csv output", error))?;
    Ok(())
}

/// Shorten `text` to at most `max` characters, ending in `...` when cut.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[must_use]
pub fn rule(width: usize) -> String {
    "-".repeat(width)
}

#[cfg(test)]
#[path = "output_test.rs"]
mod tests;
