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

// Backend factory for creating backends and the orchestrator from configuration

use super::backend::Backend;
use super::filesystem::FilesystemBackend;
use super::http::HttpBackend;
use super::memory::MemoryBackend;
use crate::config::{BackendSpec, StoreConfig};
use crate::orchestrator::Orchestrator;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

pub struct BackendFactory;

impl BackendFactory {
    /// Create one backend from its configuration entry
    pub fn create(spec: &BackendSpec) -> Result<Arc<dyn Backend>> {
        match spec {
            BackendSpec::Memory => Ok(Arc::new(MemoryBackend::new())),

            BackendSpec::Filesystem(config) => {
                let backend = FilesystemBackend::new(config.clone())?;
                Ok(Arc::new(backend))
            }

            BackendSpec::Http(config) => {
                let backend = HttpBackend::new(config.clone())?;
                Ok(Arc::new(backend))
            }
        }
    }

    /// Create every configured backend, in order, and wrap them in an orchestrator
    pub fn build_orchestrator(config: &StoreConfig) -> Result<Orchestrator> {
        let backends = config
            .backends
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                Self::create(spec)
                    .with_context(|| format!("Failed to create backend #{} ({})", index, spec.kind()))
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Backend list: {}",
            backends
                .iter()
                .map(|b| b.backend_type())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        Ok(Orchestrator::new(backends)?)
    }
}
