//! Entity state as returned by `GET /api/states`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,
    pub attributes: Map<String, Value>,
    pub last_updated: Option<String>,
    pub last_changed: Option<String>,
}

impl EntityState {
    /// Part of the entity id before the first `.`, or `unknown`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.entity_id.split_once('.').map_or("unknown", |(domain, _)| domain)
    }

    /// String attribute, `None` when absent or not a string.
    #[must_use]
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// `friendly_name` attribute, falling back to the entity id.
    #[must_use]
    pub fn friendly_name(&self) -> &str {
        self.attr_str("friendly_name").unwrap_or(&self.entity_id)
    }

    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|value| !value.is_null())
    }
}

#[cfg(test)]
#[path = "entity_test.rs"]
mod tests;
