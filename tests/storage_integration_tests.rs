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

/// Orchestrator over the real adapters
///
/// Memory primary, filesystem fallback and an external HTTP source whose
/// server is not running.
///
use content_store::config::{FilesystemConfig, HttpConfig};
use content_store::storage::{FilesystemBackend, HttpBackend, MemoryBackend};
use content_store::{Backend, BackendError, FieldFilter, Orchestrator};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

struct Tiers {
    primary: Arc<MemoryBackend>,
    archive: Arc<FilesystemBackend>,
    _dir: TempDir,
}

async fn tiers() -> Tiers {
    let dir = TempDir::new().unwrap();
    let archive = Arc::new(
        FilesystemBackend::new(FilesystemConfig {
            base_path: dir.path().to_string_lossy().to_string(),
        })
        .unwrap(),
    );
    archive.initialize().await.unwrap();

    Tiers {
        primary: Arc::new(MemoryBackend::new()),
        archive,
        _dir: dir,
    }
}

fn unreachable_api() -> Arc<HttpBackend> {
    Arc::new(
        HttpBackend::new(HttpConfig {
            resource_url: "http://127.0.0.1:9/media-api/{id}.json".to_string(),
            key_pattern: r"^DM-(\d+)$".to_string(),
            timeout_seconds: 2,
            max_retries: 0,
            ..HttpConfig::default()
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn test_read_falls_through_to_archive() {
    let t = tiers().await;
    t.archive
        .insert("DM-1", json!({"itemId": "DM-1", "title": "archived"}))
        .await;

    let store = Orchestrator::new(vec![t.primary.clone() as Arc<dyn Backend>, t.archive.clone()]).unwrap();

    let filter = FieldFilter::parse("title");
    let record = store.fetch_one("DM-1", Some(&filter)).await.unwrap();
    assert_eq!(record, json!({"title": "archived"}));
}

#[tokio::test]
async fn test_primary_shadows_archive() {
    let t = tiers().await;
    t.primary.insert("DM-1", json!("fresh")).await;
    t.archive.insert("DM-1", json!("stale")).await;

    let store = Orchestrator::new(vec![t.primary.clone() as Arc<dyn Backend>, t.archive.clone()]).unwrap();
    assert_eq!(store.fetch_one("DM-1", None).await.unwrap(), json!("fresh"));
}

#[tokio::test]
async fn test_writes_never_reach_archive() {
    let t = tiers().await;
    let store = Orchestrator::new(vec![t.primary.clone() as Arc<dyn Backend>, t.archive.clone()]).unwrap();

    store.insert("DM-7", json!({"n": 7})).await.unwrap();
    assert_eq!(t.primary.len(), 1);
    assert!(t.archive.fetch_one("DM-7", None).await.is_empty());

    store.delete("DM-7").await.unwrap();
    assert!(store.fetch_one("DM-7", None).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_unreachable_source_aborts_single_read() {
    let t = tiers().await;
    t.archive.insert("DM-5", json!("archived")).await;

    // The API sits before the archive, so its failure must surface
    let store = Orchestrator::new(vec![
        t.primary.clone() as Arc<dyn Backend>,
        unreachable_api(),
        t.archive.clone(),
    ])
    .unwrap();

    let err = store.fetch_one("DM-5", None).await.unwrap_err();
    assert!(matches!(
        err.backend_error(),
        Some(BackendError::Unavailable { .. })
    ));
}

#[tokio::test]
async fn test_unreachable_source_skipped_by_batch_read() {
    let t = tiers().await;
    t.archive.insert("DM-5", json!("archived")).await;

    let store = Orchestrator::new(vec![
        t.primary.clone() as Arc<dyn Backend>,
        unreachable_api(),
        t.archive.clone(),
    ])
    .unwrap();

    let keys = vec!["DM-5".to_string(), "DM-6".to_string()];
    let records = store.fetch_many(&keys, None).await.unwrap();
    assert_eq!(records, vec![json!("archived")]);
}

#[tokio::test]
async fn test_search_reaches_archive() {
    let t = tiers().await;
    t.archive.insert("TN-1", json!({"itemId": "TN-1"})).await;
    t.archive.insert("TN-2", json!({"itemId": "TN-2"})).await;

    let store = Orchestrator::new(vec![
        t.primary.clone() as Arc<dyn Backend>,
        t.archive.clone(),
        unreachable_api(),
    ])
    .unwrap();

    let results = store.search(&json!("TN-")).await.unwrap();
    assert_eq!(results.len(), 2);

    assert!(store.search(&json!("XX-")).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_any_key_length_cascades_past_archive() {
    let t = tiers().await;
    let long_key = "k".repeat(300);
    let huge_key = "k".repeat(4096);
    t.archive.insert(&long_key, json!("archived")).await;
    t.primary.insert(&huge_key, json!("in memory")).await;

    // Archive first: it must answer or step aside, never fail
    let store = Orchestrator::new(vec![t.archive.clone() as Arc<dyn Backend>, t.primary.clone()]).unwrap();

    assert_eq!(store.fetch_one(&long_key, None).await.unwrap(), json!("archived"));
    assert_eq!(store.fetch_one(&huge_key, None).await.unwrap(), json!("in memory"));
}
