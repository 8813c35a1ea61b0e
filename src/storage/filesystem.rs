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

// Filesystem backend implementation

use super::backend::{Backend, Outcome, PrefixQuery};
use crate::config::FilesystemConfig;
use crate::error::BackendError;
use crate::record::{project, DeleteConfirmation, FieldFilter, Record, WriteConfirmation};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const RECORD_SUFFIX: &str = ".json";

/// Longest directory or file stem cut from an encoded key
const MAX_SEGMENT_LEN: usize = 200;

/// Keys longer than this are never stored here
pub const MAX_KEY_BYTES: usize = 1024;

/// On-disk layout of one record file
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    key: String,
    stored_at: DateTime<Utc>,
    record: Record,
}

/// Filesystem backend storing one JSON file per key
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    pub fn new(config: FilesystemConfig) -> Result<Self> {
        let base_path = PathBuf::from(&config.base_path);

        info!(
            "Initializing filesystem backend at: {}",
            base_path.display()
        );

        Ok(Self { base_path })
    }

    /// Ensure base directory exists
    async fn ensure_base_directory(&self) -> Result<()> {
        if !self.base_path.exists() {
            info!("Creating base directory: {}", self.base_path.display());
            fs::create_dir_all(&self.base_path)
                .await
                .context("Failed to create base directory")?;
        } else {
            info!(
                "Base directory already exists: {}",
                self.base_path.display()
            );
        }
        Ok(())
    }

    /// File holding `key`, or `None` when the key is too long to store.
    ///
    /// Keys are hex-encoded so any string maps to a safe name. Encoded keys
    /// longer than one segment are split into nested directories, keeping
    /// every path component under the filesystem's name limit.
    fn record_path(&self, key: &str) -> Option<PathBuf> {
        if key.len() > MAX_KEY_BYTES {
            return None;
        }

        let encoded = encode_key(key);
        let mut path = self.base_path.clone();
        let mut rest = encoded.as_str();
        while rest.len() > MAX_SEGMENT_LEN {
            let (segment, tail) = rest.split_at(MAX_SEGMENT_LEN);
            path.push(segment);
            rest = tail;
        }
        path.push(format!("{}{}", rest, RECORD_SUFFIX));
        Some(path)
    }

    async fn read_stored(&self, key: &str) -> Result<Option<StoredRecord>, BackendError> {
        match self.record_path(key) {
            Some(path) => read_envelope(&path).await,
            None => Ok(None),
        }
    }

    /// Replace the record file atomically; readers see the old or the new
    /// envelope, never a partial one.
    async fn write_stored(&self, key: &str, record: Record) -> Result<(), BackendError> {
        let path = self.record_path(key).ok_or_else(|| {
            BackendError::invalid_key(key, format!("longer than {} bytes", MAX_KEY_BYTES))
        })?;
        let dir = path.parent().unwrap_or(self.base_path.as_path());
        fs::create_dir_all(dir).await?;

        let stored = StoredRecord {
            key: key.to_string(),
            stored_at: Utc::now(),
            record,
        };
        let content =
            serde_json::to_vec_pretty(&stored).context("Failed to serialize record")?;

        let temp_path = dir.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
        debug!(
            "Writing {} bytes to {} via {}",
            content.len(),
            path.display(),
            temp_path.display()
        );

        if let Err(e) = write_then_rename(&temp_path, &path, &content).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(
                        "Failed to remove temp file {}: {}",
                        temp_path.display(),
                        cleanup
                    );
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// All stored records whose key matches the query, ordered by key
    async fn scan(&self, query: &PrefixQuery) -> Result<Vec<StoredRecord>, BackendError> {
        let mut hits = Vec::new();
        // (directory, encoded key prefix carried by its parent directories)
        let mut pending = vec![(self.base_path.clone(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string)
                else {
                    continue;
                };

                if entry.file_type().await?.is_dir() {
                    pending.push((path, format!("{}{}", prefix, name)));
                    continue;
                }

                // Temp files and health probes carry no record suffix
                let Some(stem) = name.strip_suffix(RECORD_SUFFIX) else {
                    continue;
                };
                let Some(key) = decode_key(&format!("{}{}", prefix, stem)) else {
                    warn!("Skipping unrecognised file {}", path.display());
                    continue;
                };
                if !query.matches(&key) {
                    continue;
                }
                if let Some(stored) = read_envelope(&path).await? {
                    hits.push(stored);
                }
            }
        }

        hits.sort_by(|a, b| a.key.cmp(&b.key));
        if let Some(limit) = query.limit {
            hits.truncate(limit);
        }
        Ok(hits)
    }
}

async fn read_envelope(path: &Path) -> Result<Option<StoredRecord>, BackendError> {
    let content = match fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let stored = serde_json::from_slice(&content).map_err(|e| {
        BackendError::malformed("filesystem", format!("{}: {}", path.display(), e))
    })?;
    Ok(Some(stored))
}

async fn write_then_rename(temp_path: &Path, path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(temp_path).await?;
    file.write_all(content).await?;
    file.flush().await?;
    drop(file);
    fs::rename(temp_path, path).await
}

#[async_trait]
impl Backend for FilesystemBackend {
    async fn initialize(&self) -> Result<()> {
        self.ensure_base_directory().await
    }

    async fn fetch_one(&self, key: &str, filter: Option<&FieldFilter>) -> Outcome<Record> {
        Outcome::from(self.read_stored(key).await).map(|stored| project(&stored.record, filter))
    }

    async fn fetch_many(
        &self,
        keys: &[String],
        filter: Option<&FieldFilter>,
    ) -> Outcome<Vec<Record>> {
        let mut found = Vec::with_capacity(keys.len());
        for key in keys {
            match self.read_stored(key).await {
                Ok(Some(stored)) => found.push(project(&stored.record, filter)),
                Ok(None) => {}
                Err(e) => return Outcome::Failure(e),
            }
        }
        Outcome::from_items(found)
    }

    async fn insert(&self, key: &str, record: Record) -> Outcome<WriteConfirmation> {
        let key = if key.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            key.to_string()
        };

        match self.write_stored(&key, record).await {
            Ok(()) => {
                info!("Stored record '{}'", key);
                Outcome::Success(WriteConfirmation::new(key))
            }
            Err(e) => Outcome::Failure(e),
        }
    }

    async fn update(&self, key: &str, record: Record) -> Outcome<WriteConfirmation> {
        let Some(path) = self.record_path(key) else {
            return Outcome::Empty;
        };
        match fs::try_exists(&path).await {
            Ok(true) => {}
            Ok(false) => return Outcome::Empty,
            Err(e) => return Outcome::Failure(e.into()),
        }
        match self.write_stored(key, record).await {
            Ok(()) => Outcome::Success(WriteConfirmation::new(key)),
            Err(e) => Outcome::Failure(e),
        }
    }

    async fn search(&self, query: &Value) -> Outcome<Vec<Record>> {
        let Some(query) = PrefixQuery::from_value(query) else {
            return Outcome::Empty;
        };
        match self.scan(&query).await {
            Ok(hits) => Outcome::from_items(hits.into_iter().map(|s| s.record).collect()),
            Err(e) => Outcome::Failure(e),
        }
    }

    async fn delete(&self, key: &str) -> Outcome<DeleteConfirmation> {
        let Some(path) = self.record_path(key) else {
            return Outcome::Empty;
        };
        match fs::remove_file(path).await {
            Ok(()) => Outcome::Success(DeleteConfirmation::new(key)),
            Err(e) if e.kind() == ErrorKind::NotFound => Outcome::Empty,
            Err(e) => Outcome::Failure(e.into()),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        // Check if base directory is accessible and writable
        match fs::metadata(&self.base_path).await {
            Ok(metadata) if metadata.is_dir() => {
                let test_file = self.base_path.join(".health_check_test");
                match fs::File::create(&test_file).await {
                    Ok(mut f) => {
                        if let Err(e) = f.write_all(b"test").await {
                            warn!("Health check failed - cannot write: {}", e);
                            return Ok(false);
                        }
                        if let Err(e) = fs::remove_file(&test_file).await {
                            warn!(
                                "Health check could not remove {}: {}",
                                test_file.display(),
                                e
                            );
                        }
                        Ok(true)
                    }
                    Err(e) => {
                        warn!("Health check failed - cannot create file: {}", e);
                        Ok(false)
                    }
                }
            }
            Ok(_) => {
                warn!(
                    "Health check failed - base path is not a directory: {}",
                    self.base_path.display()
                );
                Ok(false)
            }
            Err(e) => {
                warn!(
                    "Health check failed - cannot access base path {}: {}",
                    self.base_path.display(),
                    e
                );
                Ok(false)
            }
        }
    }

    fn backend_type(&self) -> &str {
        "filesystem"
    }
}

fn encode_key(key: &str) -> String {
    key.bytes().map(|b| format!("{:02x}", b)).collect()
}

fn decode_key(encoded: &str) -> Option<String> {
    if encoded.len() % 2 != 0 {
        return None;
    }
    let bytes = (0..encoded.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(encoded.get(i..i + 2)?, 16).ok())
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}
