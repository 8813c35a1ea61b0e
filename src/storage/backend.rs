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

// Backend contract shared by every storage and search adapter

use crate::error::BackendError;
use crate::record::{DeleteConfirmation, FieldFilter, Record, WriteConfirmation};
use async_trait::async_trait;
use serde_json::Value;

/// Result of a single backend call.
///
/// `Empty` means the call worked but found nothing; `Failure` means the
/// backend itself went wrong. The orchestrator treats the two very
/// differently, so adapters must never report one as the other.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    Empty,
    Failure(BackendError),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Empty => Outcome::Empty,
            Outcome::Failure(err) => Outcome::Failure(err),
        }
    }

    /// `Ok(None)` for Empty, `Err` for Failure
    pub fn into_result(self) -> Result<Option<T>, BackendError> {
        match self {
            Outcome::Success(value) => Ok(Some(value)),
            Outcome::Empty => Ok(None),
            Outcome::Failure(err) => Err(err),
        }
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Outcome::Success(value),
            None => Outcome::Empty,
        }
    }
}

impl<T> From<Result<Option<T>, BackendError>> for Outcome<T> {
    fn from(result: Result<Option<T>, BackendError>) -> Self {
        match result {
            Ok(value) => value.into(),
            Err(err) => Outcome::Failure(err),
        }
    }
}

impl<T> Outcome<Vec<T>> {
    /// Empty vectors become `Empty` so batch results are never "successfully nothing"
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            Outcome::Empty
        } else {
            Outcome::Success(items)
        }
    }
}

/// Contract every backend adapter satisfies.
///
/// A backend that does not support an operation either returns
/// [`Outcome::Empty`] (the next backend is tried) or a
/// [`BackendError::Unsupported`] failure (handled per operation by the
/// orchestrator). Which one an adapter picks decides cascade behavior.
///
/// Implementations must be safe to call concurrently.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Prepare the backend (create directories, check remote reachability)
    async fn initialize(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Fetch the record stored under `key`
    async fn fetch_one(&self, key: &str, filter: Option<&FieldFilter>) -> Outcome<Record>;

    /// Fetch the records found for `keys`.
    ///
    /// Keys without a record are skipped; callers accept fewer results
    /// than keys requested.
    async fn fetch_many(&self, keys: &[String], filter: Option<&FieldFilter>)
        -> Outcome<Vec<Record>>;

    async fn insert(&self, key: &str, record: Record) -> Outcome<WriteConfirmation>;

    async fn update(&self, key: &str, record: Record) -> Outcome<WriteConfirmation>;

    /// Run a backend-specific query
    async fn search(&self, query: &Value) -> Outcome<Vec<Record>>;

    async fn delete(&self, key: &str) -> Outcome<DeleteConfirmation>;

    /// Health check
    async fn health_check(&self) -> anyhow::Result<bool> {
        Ok(true)
    }

    /// Get backend type identifier
    fn backend_type(&self) -> &str;
}

/// Key-prefix query understood by the local adapters.
///
/// Accepts a bare JSON string or `{"prefix": "...", "limit": n}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixQuery {
    pub prefix: String,
    pub limit: Option<usize>,
}

impl PrefixQuery {
    pub fn from_value(query: &Value) -> Option<Self> {
        match query {
            Value::String(prefix) => Some(Self {
                prefix: prefix.clone(),
                limit: None,
            }),
            Value::Object(map) => {
                let prefix = map.get("prefix")?.as_str()?.to_string();
                let limit = map
                    .get("limit")
                    .and_then(Value::as_u64)
                    .map(|n| n as usize);
                Some(Self { prefix, limit })
            }
            _ => None,
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        key.starts_with(&self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_from_option() {
        assert!(Outcome::from(Some(1)).is_success());
        assert!(Outcome::<i32>::from(None).is_empty());
    }

    #[test]
    fn test_from_items_classifies_empty_vec() {
        assert!(Outcome::<Vec<i32>>::from_items(vec![]).is_empty());
        assert!(Outcome::from_items(vec![1]).is_success());
    }

    #[test]
    fn test_into_result() {
        let failed: Outcome<i32> = Outcome::Failure(BackendError::unavailable("x", "down"));
        assert!(failed.into_result().is_err());
        assert_eq!(Outcome::Success(3).into_result().unwrap(), Some(3));
        assert_eq!(Outcome::<i32>::Empty.into_result().unwrap(), None);
    }

    #[test]
    fn test_prefix_query_shapes() {
        let q = PrefixQuery::from_value(&json!("TN-")).unwrap();
        assert_eq!(q.prefix, "TN-");
        assert_eq!(q.limit, None);

        let q = PrefixQuery::from_value(&json!({"prefix": "DM-", "limit": 2})).unwrap();
        assert_eq!(q.prefix, "DM-");
        assert_eq!(q.limit, Some(2));
        assert!(q.matches("DM-12"));
        assert!(!q.matches("TN-12"));

        assert!(PrefixQuery::from_value(&json!({"match": "x"})).is_none());
        assert!(PrefixQuery::from_value(&json!(42)).is_none());
    }
}
