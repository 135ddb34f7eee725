//! REST helper: bearer-authenticated JSON GETs against `<base_url>/api/...`.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::HassConfig;
use crate::entity::EntityState;
use crate::error::CliError;

pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(config: &HassConfig) -> Result<Self, CliError> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.token))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { http, base_url: config.base_url.clone() })
    }

    /// GET `path` and return the body as JSON. Non-2xx statuses become
    /// [`CliError::Api`] carrying the response body.
    pub async fn get_json(&self, path: &str) -> Result<Value, CliError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "GET");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CliError::Api { status: status.as_u16(), path: path.to_owned(), body });
        }
        Ok(response.json::<Value>().await?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CliError> {
        let value = self.get_json(path).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn states(&self) -> Result<Vec<EntityState>, CliError> {
        self.get("/api/states").await
    }

    pub async fn state(&self, entity_id: &str) -> Result<EntityState, CliError> {
        self.get(&format!("/api/states/{entity_id}")).await
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
