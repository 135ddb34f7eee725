//! Inbound Home Assistant WebSocket messages, tagged by `type`.

use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    AuthRequired {
        #[serde(default)]
        ha_version: Option<String>,
    },
    AuthOk {
        #[serde(default)]
        ha_version: Option<String>,
    },
    AuthInvalid {
        #[serde(default)]
        message: Option<String>,
    },
    Result {
        id: u64,
        /// Absent means failure.
        #[serde(default)]
        success: bool,
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<Value>,
    },
    Event {
        #[serde(default)]
        id: Option<u64>,
    },
    Pong {
        #[serde(default)]
        id: Option<u64>,
    },
    #[serde(other)]
    Other,
}

impl ServerMessage {
    /// Classify a decoded JSON value. Shapes that do not match a known type
    /// (including a `result` without a numeric `id` or with a non-boolean
    /// `success`) become [`Self::Other`]; call correlation reads the raw
    /// JSON instead.
    #[must_use]
    pub fn classify(value: &Value) -> Self {
        Self::deserialize(value).unwrap_or(Self::Other)
    }

    /// Correlation id, for message types that carry one.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        match self {
            Self::Result { id, .. } => Some(*id),
            Self::Event { id } | Self::Pong { id } => *id,
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
