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

// Content store with ordered multi-backend reads
//
// Records are addressed by opaque string keys and live in one or more
// backends (in-memory store, filesystem, external HTTP API):
// - Single reads and searches fall through empty backends and stop on errors
// - Batch reads fall through both empty and failing backends
// - Writes and deletes go to the primary backend only
// - Request middleware guards handlers with token and input checks

pub mod config;
pub mod error;
pub mod middleware;
pub mod orchestrator;
pub mod record;
pub mod storage;

// Re-export main types
pub use config::{load_config, load_config_with_env, StoreConfig};
pub use error::{BackendError, StoreError, StoreResult};
pub use middleware::{Decision, Middleware, Pipeline, Rejection, Request};
pub use orchestrator::Orchestrator;
pub use record::{DeleteConfirmation, FieldFilter, Record, WriteConfirmation};
pub use storage::{Backend, BackendFactory, Outcome};
