//! `k8s` subcommands: read and update the Home Assistant configuration inside
//! its Kubernetes pod.
//!
//! UPDATE FLOW
//! ===========
//! 1. find the pod, read `configuration.yaml`
//! 2. merge the helper file under a new `template:` section
//! 3. back up the remote file (failure is a warning)
//! 4. `kubectl cp` the merged file
//! 5. `ha core restart` (failure is a warning)

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::error::CliError;
use crate::kubectl::{DEFAULT_CONFIG_FILE, DEFAULT_NAMESPACE, Kubectl, backup_name, merge_template};

#[derive(Subcommand, Debug)]
pub enum K8sCommand {
    /// Locate the Home Assistant pod.
    FindPod {
        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },
    /// Print or save a config file from the pod.
    GetConfig {
        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
        /// Local file to write instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config_file: String,
    },
    /// Merge a helper YAML file into `configuration.yaml` and restart.
    UpdateConfig {
        helper_file: PathBuf,
        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
        /// Print the steps without touching the pod.
        #[arg(long)]
        dry_run: bool,
    },
}

pub async fn run(command: K8sCommand) -> Result<(), CliError> {
    match command {
        K8sCommand::FindPod { namespace } => find_pod(&Kubectl::new(namespace)).await,
        K8sCommand::GetConfig { namespace, output, config_file } => {
            get_config(&Kubectl::new(namespace), output.as_deref(), &config_file).await
        }
        K8sCommand::UpdateConfig { helper_file, namespace, dry_run } => {
            update_config(&Kubectl::new(namespace), &helper_file, dry_run).await
        }
    }
}

async fn find_pod(kubectl: &Kubectl) -> Result<(), CliError> {
    println!("Finding Home Assistant pod in namespace: {}", kubectl.namespace());
    let Some(pod) = kubectl.find_hass_pod().await? else {
        println!("No Home Assistant pod found");
        return Ok(());
    };

    println!("Found pod: {pod}");
    println!("  Status: {}", kubectl.pod_field(&pod, "{.status.phase}").await?);
    println!("  Created: {}", kubectl.pod_field(&pod, "{.metadata.creationTimestamp}").await?);
    Ok(())
}

async fn get_config(kubectl: &Kubectl, output: Option<&Path>, config_file: &str) -> Result<(), CliError> {
    let pod = kubectl.require_hass_pod().await?;
    eprintln!("Downloading {config_file} from pod {pod}...");
    let content = kubectl.read_file(&pod, config_file).await?;

    match output {
        Some(path) => {
            std::fs::write(path, content).map_err(|error| CliError::io(format!("write {}", path.display()), error))?;
            eprintln!("Saved to {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

async fn update_config(kubectl: &Kubectl, helper_file: &Path, dry_run: bool) -> Result<(), CliError> {
    if dry_run {
        println!("DRY RUN MODE - No changes will be made\n");
    }
    println!("Updating Home Assistant config in namespace: {}", kubectl.namespace());
    println!("Helper file: {}\n", helper_file.display());

    let pod = kubectl.require_hass_pod().await?;
    println!("Found pod: {pod}");
    println!("  Config path: {DEFAULT_CONFIG_FILE}");

    if dry_run {
        println!("\nWould perform:");
        println!("  1. Read current config from pod");
        println!("  2. Merge helpers from {}", helper_file.display());
        println!("  3. Backup {DEFAULT_CONFIG_FILE}");
        println!("  4. Write updated config to pod");
        println!("  5. Restart Home Assistant");
        println!("\nDry run complete - no changes made");
        return Ok(());
    }

    let helper = std::fs::read_to_string(helper_file)
        .map_err(|error| CliError::io(format!("read {}", helper_file.display()), error))?;

    println!("\n1. Downloading current configuration...");
    let current = kubectl.read_file(&pod, DEFAULT_CONFIG_FILE).await?;

    println!("2. Merging helper configuration...");
    let merged = merge_template(&current, &helper)?;

    let mut staged = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .map_err(|error| CliError::io("create temporary config", error))?;
    staged
        .write_all(merged.as_bytes())
        .and_then(|()| staged.flush())
        .map_err(|error| CliError::io(format!("write {}", staged.path().display()), error))?;

    println!("3. Uploading updated configuration...");
    let backup = backup_name(DEFAULT_CONFIG_FILE, &chrono::Local::now());
    match kubectl.exec(&pod, &["cp", DEFAULT_CONFIG_FILE, backup.as_str()]).await {
        Ok(_) => println!("  Backup created: {backup}"),
        Err(error) => {
            tracing::warn!(%error, "config backup failed");
            eprintln!("  Backup failed: {error}");
        }
    }

    kubectl.upload(staged.path(), &pod, DEFAULT_CONFIG_FILE).await?;
    println!("  File uploaded");

    println!("Restarting Home Assistant...");
    match kubectl.exec(&pod, &["ha", "core", "restart"]).await {
        Ok(_) => println!("  Restart initiated; Home Assistant will be unavailable for ~30 seconds"),
        Err(error) => {
            tracing::warn!(%error, "restart failed");
            eprintln!("  Restart command failed: {error}");
        }
    }

    println!("\nConfiguration update complete!");
    Ok(())
}
