// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Read-only backend over an external HTTP API

use super::backend::{Backend, Outcome};
use crate::config::HttpConfig;
use crate::error::BackendError;
use crate::record::{project, DeleteConfirmation, FieldFilter, Record, WriteConfirmation};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use pct_str::{PctString, UriReserved};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

const BACKEND_TYPE: &str = "http";

/// Client for an external read-only resource API.
///
/// Keys are mapped to resource ids with `key_pattern`; the first capture
/// group is percent-encoded and substituted into the URL templates.
pub struct HttpBackend {
    client: Client,
    resource_url: String,
    multi_get_url: Option<String>,
    key_pattern: Regex,
    max_retries: u32,
}

impl HttpBackend {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let key_pattern = Regex::new(&config.key_pattern)
            .with_context(|| format!("Invalid key_pattern '{}'", config.key_pattern))?;
        if key_pattern.captures_len() < 2 {
            bail!(
                "key_pattern '{}' must have a capture group for the resource id",
                config.key_pattern
            );
        }

        let mut client_builder = reqwest::ClientBuilder::new()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(Duration::from_secs(config.timeout_seconds));

        // Add API token if provided
        if let Some(token) = &config.api_token {
            let mut headers = reqwest::header::HeaderMap::new();
            let auth_value = format!("Bearer {}", token);
            headers.insert(
                reqwest::header::AUTHORIZATION,
                reqwest::header::HeaderValue::from_str(&auth_value).context("Invalid API token")?,
            );
            client_builder = client_builder.default_headers(headers);
        }

        let client = client_builder
            .build()
            .context("Failed to build HTTP client")?;

        info!("HTTP backend serving keys matching '{}'", config.key_pattern);

        Ok(Self {
            client,
            resource_url: config.resource_url,
            multi_get_url: config.multi_get_url,
            key_pattern,
            max_retries: config.max_retries,
        })
    }

    /// Resource id embedded in `key`
    pub fn resource_id(&self, key: &str) -> Result<String, BackendError> {
        let id = self
            .key_pattern
            .captures(key)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| {
                BackendError::invalid_key(key, "not served by the external source")
            })?;

        // Dot segments survive encoding and would be resolved against the path
        if matches!(id, "" | "." | "..") {
            return Err(BackendError::invalid_key(key, "not a valid resource id"));
        }
        Ok(id.to_string())
    }

    /// Resource id of `key`, safe to splice into any part of a URL
    fn encoded_id(&self, key: &str) -> Result<String, BackendError> {
        let id = self.resource_id(key)?;
        Ok(PctString::encode(id.chars(), UriReserved::Any).into_string())
    }

    /// URL of the single resource behind `key`
    pub fn resource_url(&self, key: &str) -> Result<String, BackendError> {
        Ok(self.resource_url.replace("{id}", &self.encoded_id(key)?))
    }

    /// URL fetching all `keys` in one request, when the API offers one
    pub fn multi_get_url(&self, keys: &[String]) -> Option<Result<String, BackendError>> {
        let template = self.multi_get_url.as_ref()?;
        let ids = keys
            .iter()
            .map(|key| self.encoded_id(key))
            .collect::<Result<Vec<_>, _>>();
        Some(ids.map(|ids| template.replace("{ids}", &ids.join(","))))
    }

    async fn get_json(&self, url: &str) -> Result<Option<Value>, BackendError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::unavailable(BACKEND_TYPE, e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = format!("GET {} failed with status {}: {}", url, status, error_text);
            // Only server-side errors are worth retrying
            return Err(if status.is_server_error() {
                BackendError::unavailable(BACKEND_TYPE, message)
            } else {
                BackendError::rejected(BACKEND_TYPE, status.as_u16(), message)
            });
        }

        response
            .json::<Value>()
            .await
            .map(Some)
            .map_err(|e| BackendError::malformed(BACKEND_TYPE, e.to_string()))
    }

    /// GET with retry on transient failures
    async fn get_with_retry(&self, url: &str) -> Result<Option<Value>, BackendError> {
        let mut attempt = 0;
        let mut delay = Duration::from_millis(100);

        loop {
            match self.get_json(url).await {
                Ok(body) => {
                    if attempt > 0 {
                        info!("Fetched '{}' after {} retries", url, attempt);
                    }
                    return Ok(body);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    warn!(
                        "GET '{}' failed (attempt {}/{}): {}. Retrying in {:?}",
                        url,
                        attempt + 1,
                        self.max_retries,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2; // Exponential backoff
                    delay = delay.min(Duration::from_secs(30));
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One GET per key, for APIs without a batch endpoint
    async fn fetch_each(
        &self,
        keys: &[String],
        filter: Option<&FieldFilter>,
    ) -> Result<Vec<Record>, BackendError> {
        let mut found = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(record) = self.fetch_one(key, filter).await.into_result()? {
                found.push(record);
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_one(&self, key: &str, filter: Option<&FieldFilter>) -> Outcome<Record> {
        let url = match self.resource_url(key) {
            Ok(url) => url,
            Err(e) => return Outcome::Failure(e),
        };
        debug!("Fetching '{}' from {}", key, url);

        let body = self.get_with_retry(&url).await;
        Outcome::from(body.map(|body| body.filter(|v| !v.is_null())))
            .map(|record| project(&record, filter))
    }

    async fn fetch_many(
        &self,
        keys: &[String],
        filter: Option<&FieldFilter>,
    ) -> Outcome<Vec<Record>> {
        let url = match self.multi_get_url(keys) {
            None => {
                return match self.fetch_each(keys, filter).await {
                    Ok(found) => Outcome::from_items(found),
                    Err(e) => Outcome::Failure(e),
                }
            }
            Some(Ok(url)) => url,
            Some(Err(e)) => return Outcome::Failure(e),
        };
        debug!("Fetching {} keys from {}", keys.len(), url);

        match self.get_with_retry(&url).await {
            Ok(None) => Outcome::Empty,
            Ok(Some(body)) => match flatten_records(body) {
                Some(records) => Outcome::from_items(
                    records.iter().map(|r| project(r, filter)).collect(),
                ),
                None => Outcome::Failure(BackendError::malformed(
                    BACKEND_TYPE,
                    "multi-get response is not an array",
                )),
            },
            Err(e) => Outcome::Failure(e),
        }
    }

    async fn insert(&self, _key: &str, _record: Record) -> Outcome<WriteConfirmation> {
        Outcome::Failure(BackendError::unsupported(BACKEND_TYPE, "insert"))
    }

    async fn update(&self, _key: &str, _record: Record) -> Outcome<WriteConfirmation> {
        Outcome::Failure(BackendError::unsupported(BACKEND_TYPE, "update"))
    }

    async fn search(&self, _query: &Value) -> Outcome<Vec<Record>> {
        Outcome::Empty
    }

    async fn delete(&self, _key: &str) -> Outcome<DeleteConfirmation> {
        Outcome::Failure(BackendError::unsupported(BACKEND_TYPE, "delete"))
    }

    fn backend_type(&self) -> &str {
        BACKEND_TYPE
    }
}

/// Batch responses must be a flat list; one level of nesting and nulls are
/// normalised away.
fn flatten_records(body: Value) -> Option<Vec<Record>> {
    let Value::Array(items) = body else {
        return None;
    };
    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Null => {}
            Value::Array(nested) => records.extend(nested.into_iter().filter(|v| !v.is_null())),
            other => records.push(other),
        }
    }
    Some(records)
}
