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

// Configuration types for content-store

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Ordered backend list; the first entry is the primary
    pub backends: Vec<BackendSpec>,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backends: vec![BackendSpec::Memory],
            security: SecurityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// One entry of the backend list, selected by `type`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendSpec {
    Memory,
    Filesystem(FilesystemConfig),
    Http(HttpConfig),
}

impl BackendSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendSpec::Memory => "memory",
            BackendSpec::Filesystem(_) => "filesystem",
            BackendSpec::Http(_) => "http",
        }
    }

    pub fn as_filesystem(&self) -> Option<&FilesystemConfig> {
        match self {
            BackendSpec::Filesystem(config) => Some(config),
            _ => None,
        }
    }

    pub fn as_http(&self) -> Option<&HttpConfig> {
        match self {
            BackendSpec::Http(config) => Some(config),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesystemConfig {
    pub base_path: String,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            base_path: "/data/records".to_string(),
        }
    }
}

/// External read-only API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// URL template with an `{id}` placeholder
    pub resource_url: String,

    /// Optional batch URL template with an `{ids}` placeholder (comma-joined)
    #[serde(default)]
    pub multi_get_url: Option<String>,

    /// Keys this source serves; capture group 1 is the resource id
    #[serde(default = "default_key_pattern")]
    pub key_pattern: String,

    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            resource_url: "http://localhost:8080/api/{id}.json".to_string(),
            multi_get_url: None,
            key_pattern: default_key_pattern(),
            api_token: None,
            timeout_seconds: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

/// Token check applied ahead of request handlers
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_exempt_paths")]
    pub exempt_paths: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            token: None,
            exempt_paths: default_exempt_paths(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,  // "trace", "debug", "info", "warn", "error"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_key_pattern() -> String { "^(.+)$".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_retries() -> u32 { 2 }
fn default_exempt_paths() -> Vec<String> { vec!["/ping".to_string()] }
fn default_log_level() -> String { "info".to_string() }
