//! `kubectl` subprocess wrapper.
//!
//! Commands are built as argument vectors and spawned directly, never through
//! a shell, so pod names and paths need no quoting.

use std::ffi::OsStr;
use std::path::Path;

use chrono::{DateTime, TimeZone};
use tokio::process::Command;

use crate::error::CliError;

pub const DEFAULT_NAMESPACE: &str = "home-automation";
pub const DEFAULT_CONFIG_FILE: &str = "/config/configuration.yaml";

pub struct Kubectl {
    program: String,
    namespace: String,
}

impl Kubectl {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { program: "kubectl".to_owned(), namespace: namespace.into() }
    }

    #[cfg(test)]
    fn with_program(program: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { program: program.into(), namespace: namespace.into() }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Run `kubectl -n <namespace> <args..>` and return its stdout.
    ///
    /// # Errors
    ///
    /// [`CliError::Io`] when kubectl cannot be spawned, [`CliError::Kubectl`]
    /// with its stderr when it exits non-zero.
    pub async fn run<I, A>(&self, args: I) -> Result<String, CliError>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|arg| arg.as_ref().to_os_string()).collect();
        let command = args.iter().map(|arg| arg.to_string_lossy()).collect::<Vec<_>>().join(" ");
        tracing::debug!(namespace = %self.namespace, %command, "kubectl");

        let output = Command::new(&self.program)
            .arg("-n")
            .arg(&self.namespace)
            .args(&args)
            .output()
            .await
            .map_err(|error| CliError::io(format!("spawn {}", self.program), error))?;

        if !output.status.success() {
            return Err(CliError::Kubectl {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Name of the Home Assistant pod, if one is running in the namespace.
    pub async fn find_hass_pod(&self) -> Result<Option<String>, CliError> {
        let names = self.run(["get", "pods", "-o", "jsonpath={.items[*].metadata.name}"]).await?;
        Ok(select_hass_pod(names.split_whitespace()).map(ToOwned::to_owned))
    }

    pub async fn require_hass_pod(&self) -> Result<String, CliError> {
        self.find_hass_pod()
            .await?
            .ok_or_else(|| CliError::NotFound(format!("no Home Assistant pod found in namespace `{}`", self.namespace)))
    }

    /// A field of a pod via a jsonpath expression such as `{.status.phase}`.
    pub async fn pod_field(&self, pod: &str, jsonpath: &str) -> Result<String, CliError> {
        let output_flag = format!("jsonpath={jsonpath}");
        let output = self.run(["get", "pod", pod, "-o", output_flag.as_str()]).await?;
        Ok(output.trim().to_owned())
    }

    pub async fn exec(&self, pod: &str, command: &[&str]) -> Result<String, CliError> {
        let mut args = vec!["exec", pod, "--"];
        args.extend_from_slice(command);
        self.run(args).await
    }

    pub async fn read_file(&self, pod: &str, remote_path: &str) -> Result<String, CliError> {
        self.exec(pod, &["cat", remote_path]).await
    }

    pub async fn upload(&self, local: &Path, pod: &str, remote_path: &str) -> Result<(), CliError> {
        let target = format!("{pod}:{remote_path}");
        self.run([OsStr::new("cp"), local.as_os_str(), OsStr::new(&target)]).await?;
        Ok(())
    }
}

/// First pod whose name mentions `home-assistant` but not `esphome`.
pub fn select_hass_pod<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    names.into_iter().find(|name| {
        let name = name.to_lowercase();
        name.contains("home-assistant") && !name.contains("esphome")
    })
}

/// Append `helper` to `current` under a new `template:` section.
///
/// # Errors
///
/// [`CliError::MergeConflict`] when `current` already has a `template:`
/// section.
pub fn merge_template(current: &str, helper: &str) -> Result<String, CliError> {
    if current.contains("template:") {
        return Err(CliError::MergeConflict);
    }
    Ok(format!("{}\n\n# Added by hactl\ntemplate:\n{helper}", current.trim_end()))
}

/// `<path>.backup.YYYYmmdd_HHMMSS`
pub fn backup_name<Tz>(config_file: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{config_file}.backup.{}", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
#[path = "kubectl_test.rs"]
mod tests;
