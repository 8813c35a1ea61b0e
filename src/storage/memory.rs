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

// In-memory key-value backend

use super::backend::{Backend, Outcome, PrefixQuery};
use crate::record::{project, DeleteConfirmation, FieldFilter, Record, WriteConfirmation};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

/// Key-value store held in process memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: DashMap<String, Record>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn fetch_one(&self, key: &str, filter: Option<&FieldFilter>) -> Outcome<Record> {
        self.records
            .get(key)
            .map(|entry| project(entry.value(), filter))
            .into()
    }

    async fn fetch_many(
        &self,
        keys: &[String],
        filter: Option<&FieldFilter>,
    ) -> Outcome<Vec<Record>> {
        let found: Vec<Record> = keys
            .iter()
            .filter_map(|key| self.records.get(key))
            .map(|entry| project(entry.value(), filter))
            .collect();
        Outcome::from_items(found)
    }

    async fn insert(&self, key: &str, record: Record) -> Outcome<WriteConfirmation> {
        let key = if key.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            key.to_string()
        };
        debug!("Inserting record '{}'", key);
        self.records.insert(key.clone(), record);
        Outcome::Success(WriteConfirmation::new(key))
    }

    async fn update(&self, key: &str, record: Record) -> Outcome<WriteConfirmation> {
        match self.records.get_mut(key) {
            Some(mut entry) => {
                *entry = record;
                Outcome::Success(WriteConfirmation::new(key))
            }
            None => Outcome::Empty,
        }
    }

    async fn search(&self, query: &Value) -> Outcome<Vec<Record>> {
        let Some(query) = PrefixQuery::from_value(query) else {
            return Outcome::Empty;
        };

        let mut hits: Vec<(String, Record)> = self
            .records
            .iter()
            .filter(|entry| query.matches(entry.key()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        hits.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(limit) = query.limit {
            hits.truncate(limit);
        }

        Outcome::from_items(hits.into_iter().map(|(_, record)| record).collect())
    }

    async fn delete(&self, key: &str) -> Outcome<DeleteConfirmation> {
        self.records
            .remove(key)
            .map(|(key, _)| DeleteConfirmation::new(key))
            .into()
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_then_fetch() {
        let backend = MemoryBackend::new();
        let outcome = backend.insert("DM-1", json!({"title": "a"})).await;
        assert!(matches!(outcome, Outcome::Success(ref c) if c.key == "DM-1"));

        match backend.fetch_one("DM-1", None).await {
            Outcome::Success(record) => assert_eq!(record, json!({"title": "a"})),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(backend.fetch_one("DM-2", None).await.is_empty());
    }

    #[tokio::test]
    async fn test_insert_without_key_generates_one() {
        let backend = MemoryBackend::new();
        let Outcome::Success(confirmation) = backend.insert("", json!(1)).await else {
            panic!("insert should succeed");
        };
        assert!(!confirmation.key.is_empty());
        assert!(backend.fetch_one(&confirmation.key, None).await.is_success());
    }

    #[tokio::test]
    async fn test_fetch_many_skips_missing() {
        let backend = MemoryBackend::new();
        backend.insert("a", json!("A")).await;
        backend.insert("b", json!("B")).await;

        let keys = vec!["b".to_string(), "zz".to_string(), "a".to_string()];
        match backend.fetch_many(&keys, None).await {
            Outcome::Success(records) => assert_eq!(records, vec![json!("B"), json!("A")]),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let missing = vec!["x".to_string()];
        assert!(backend.fetch_many(&missing, None).await.is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_existing_key() {
        let backend = MemoryBackend::new();
        assert!(backend.update("a", json!(1)).await.is_empty());
        backend.insert("a", json!(1)).await;
        assert!(backend.update("a", json!(2)).await.is_success());
        assert!(matches!(backend.fetch_one("a", None).await, Outcome::Success(v) if v == json!(2)));
    }

    #[tokio::test]
    async fn test_search_by_prefix() {
        let backend = MemoryBackend::new();
        backend.insert("TN-2", json!("t2")).await;
        backend.insert("TN-1", json!("t1")).await;
        backend.insert("DM-1", json!("d1")).await;

        match backend.search(&json!("TN-")).await {
            Outcome::Success(records) => assert_eq!(records, vec![json!("t1"), json!("t2")]),
            other => panic!("unexpected outcome: {:?}", other),
        }
        match backend.search(&json!({"prefix": "TN-", "limit": 1})).await {
            Outcome::Success(records) => assert_eq!(records.len(), 1),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(backend.search(&json!("XX-")).await.is_empty());
        assert!(backend.search(&json!(null)).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let backend = MemoryBackend::new();
        backend.insert("a", json!(1)).await;
        assert!(backend.delete("a").await.is_success());
        assert!(backend.delete("a").await.is_empty());
        assert!(backend.is_empty());
    }
}
