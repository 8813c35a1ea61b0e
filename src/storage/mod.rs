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

// Storage backend module
//
// Provides a trait-based abstraction over the systems records live in
// (in-memory key-value store, local filesystem, external HTTP API).
// Every adapter reports Success / Empty / Failure so the orchestrator
// can decide whether to keep cascading.

pub mod backend;
pub mod factory;
pub mod filesystem;
pub mod http;
pub mod memory;

pub use backend::{Backend, Outcome, PrefixQuery};
pub use factory::BackendFactory;
pub use filesystem::FilesystemBackend;
pub use http::HttpBackend;
pub use memory::MemoryBackend;
