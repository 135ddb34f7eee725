//! Error type shared by every command.

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("HASS_URL not set; pass --url or export HASS_URL (e.g. https://homeassistant.local:8123)")]
    MissingUrl,
    #[error("HASS_TOKEN not set; pass --token or export HASS_TOKEN (a long-lived access token)")]
    MissingToken,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("HTTP {status} from {path}: {body}")]
    Api { status: u16, path: String, body: String },
    #[error(transparent)]
    Ws(#[from] hassws::WsError),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("`kubectl {command}` failed: {stderr}")]
    Kubectl { command: String, stderr: String },
    #[error("{0}")]
    NotFound(String),
    #[error("invalid dashboard config: {0}")]
    InvalidDashboard(String),
    #[error("configuration already has a `template:` section; manual merge required (use `hactl k8s get-config` and edit by hand)")]
    MergeConflict,
    #[error("invalid memory path `{0}`: must be relative and stay inside the memory directory")]
    InvalidMemoryPath(String),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CliError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }
}
