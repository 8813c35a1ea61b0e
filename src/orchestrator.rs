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

// Ordered multi-backend orchestration
//
// Reads walk the backend list in priority order:
// - fetch_one / search stop at the first success and abort on the first failure
// - fetch_many stops at the first non-empty success and skips past failures
// Writes go to the primary backend only.

use crate::error::{BackendError, StoreError, StoreResult};
use crate::record::{DeleteConfirmation, FieldFilter, Record, WriteConfirmation};
use crate::storage::{Backend, Outcome};
use anyhow::Context;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Routes every operation over an ordered, non-empty list of backends.
///
/// Index 0 is the primary: the only backend ever written to. The rest are
/// read/search fallbacks consulted one at a time.
pub struct Orchestrator {
    backends: Vec<Arc<dyn Backend>>,
}

impl Orchestrator {
    /// Create an orchestrator over `backends`, primary first
    pub fn new(backends: Vec<Arc<dyn Backend>>) -> StoreResult<Self> {
        if backends.is_empty() {
            return Err(StoreError::Configuration(
                "at least one backend is required".to_string(),
            ));
        }
        Ok(Self { backends })
    }

    pub fn backends(&self) -> &[Arc<dyn Backend>] {
        &self.backends
    }

    /// The backend that receives all writes
    pub fn primary(&self) -> &Arc<dyn Backend> {
        &self.backends[0]
    }

    /// Initialize every backend in order, stopping at the first error
    pub async fn initialize(&self) -> anyhow::Result<()> {
        for backend in &self.backends {
            backend
                .initialize()
                .await
                .with_context(|| format!("Failed to initialize {} backend", backend.backend_type()))?;
            info!("Backend initialized: {}", backend.backend_type());
        }
        Ok(())
    }

    /// Health of every backend, in list order
    pub async fn health(&self) -> Vec<(String, bool)> {
        let mut report = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            let healthy = match backend.health_check().await {
                Ok(healthy) => healthy,
                Err(e) => {
                    warn!("Health check error on {}: {}", backend.backend_type(), e);
                    false
                }
            };
            report.push((backend.backend_type().to_string(), healthy));
        }
        report
    }

    /// Fetch one record; a backend failure is returned as-is, never skipped
    pub async fn fetch_one(&self, key: &str, filter: Option<&FieldFilter>) -> StoreResult<Record> {
        for (index, backend) in self.backends.iter().enumerate() {
            match backend.fetch_one(key, filter).await {
                Outcome::Success(record) => {
                    debug!(key, index, backend = backend.backend_type(), "fetch_one hit");
                    return Ok(record);
                }
                Outcome::Empty => {
                    debug!(key, index, backend = backend.backend_type(), "fetch_one miss");
                }
                Outcome::Failure(err) => {
                    warn!(key, index, backend = backend.backend_type(), error = %err, "fetch_one failed");
                    return Err(err.into());
                }
            }
        }
        Err(StoreError::NotFound)
    }

    /// Fetch the records for `keys`.
    ///
    /// The first non-empty result wins even when it covers fewer keys than
    /// requested. Failures move on to the next backend; if nothing is found
    /// the last failure seen is returned, otherwise `NotFound`.
    pub async fn fetch_many(
        &self,
        keys: &[String],
        filter: Option<&FieldFilter>,
    ) -> StoreResult<Vec<Record>> {
        let mut last_error: Option<BackendError> = None;

        for (index, backend) in self.backends.iter().enumerate() {
            match backend.fetch_many(keys, filter).await {
                Outcome::Success(records) if !records.is_empty() => {
                    debug!(
                        requested = keys.len(),
                        found = records.len(),
                        index,
                        backend = backend.backend_type(),
                        "fetch_many hit"
                    );
                    return Ok(records);
                }
                Outcome::Success(_) | Outcome::Empty => {
                    debug!(index, backend = backend.backend_type(), "fetch_many miss");
                }
                Outcome::Failure(err) => {
                    warn!(index, backend = backend.backend_type(), error = %err, "fetch_many failed, trying next backend");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.map_or(StoreError::NotFound, StoreError::from))
    }

    /// Run a query; same cascade as `fetch_one`
    pub async fn search(&self, query: &Value) -> StoreResult<Vec<Record>> {
        for (index, backend) in self.backends.iter().enumerate() {
            match backend.search(query).await {
                Outcome::Success(results) if !results.is_empty() => {
                    debug!(index, hits = results.len(), backend = backend.backend_type(), "search hit");
                    return Ok(results);
                }
                Outcome::Success(_) | Outcome::Empty => {
                    debug!(index, backend = backend.backend_type(), "search miss");
                }
                Outcome::Failure(err) => {
                    warn!(index, backend = backend.backend_type(), error = %err, "search failed");
                    return Err(err.into());
                }
            }
        }
        Err(StoreError::NotFound)
    }

    pub async fn insert(&self, key: &str, record: Record) -> StoreResult<WriteConfirmation> {
        settle(self.primary().insert(key, record).await)
    }

    pub async fn update(&self, key: &str, record: Record) -> StoreResult<WriteConfirmation> {
        settle(self.primary().update(key, record).await)
    }

    pub async fn delete(&self, key: &str) -> StoreResult<DeleteConfirmation> {
        settle(self.primary().delete(key).await)
    }
}

/// Primary write outcome as returned to callers; an empty write targeted a missing key
fn settle<T>(outcome: Outcome<T>) -> StoreResult<T> {
    match outcome {
        Outcome::Success(value) => Ok(value),
        Outcome::Empty => Err(StoreError::NotFound),
        Outcome::Failure(err) => Err(err.into()),
    }
}
