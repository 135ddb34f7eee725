//! Command handlers.
//!
//! Each handler splits into a pure builder (states in, report out) and a
//! thin async `run` that fetches, builds, and prints.

pub mod battery;
pub mod get;
pub mod k8s;
pub mod memory;
pub mod update;

use std::path::PathBuf;

use crate::api::RestClient;
use crate::config::HassConfig;
use crate::error::CliError;

/// Global flags, resolved lazily so offline commands never need a token.
#[derive(Debug, Clone)]
pub struct Context {
    pub url: Option<String>,
    pub token: Option<String>,
    pub memory_root: PathBuf,
}

impl Context {
    pub fn config(&self) -> Result<HassConfig, CliError> {
        HassConfig::resolve(self.url.as_deref(), self.token.as_deref())
    }

    pub fn rest(&self) -> Result<RestClient, CliError> {
        RestClient::new(&self.config()?)
    }
}
