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

// Record payloads and write confirmations

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque record value. The store never looks inside it.
pub type Record = Value;

/// Confirmation returned by insert and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteConfirmation {
    pub key: String,
}

impl WriteConfirmation {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Confirmation returned by delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub key: String,
    pub deleted: bool,
}

impl DeleteConfirmation {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            deleted: true,
        }
    }
}

/// Projection of top-level fields, parsed from "a,b,c"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    fields: Vec<String>,
}

impl FieldFilter {
    pub fn parse(spec: &str) -> Self {
        let fields = spec
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Keep only the selected fields of an object record.
    ///
    /// Non-object records and empty filters pass through unchanged.
    pub fn apply(&self, record: &Record) -> Record {
        match record {
            Value::Object(map) if !self.is_empty() => {
                let projected: Map<String, Value> = self
                    .fields
                    .iter()
                    .filter_map(|f| map.get(f).map(|v| (f.clone(), v.clone())))
                    .collect();
                Value::Object(projected)
            }
            other => other.clone(),
        }
    }
}

/// Apply an optional filter, as adapters receive it
pub fn project(record: &Record, filter: Option<&FieldFilter>) -> Record {
    match filter {
        Some(filter) => filter.apply(record),
        None => record.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_trims_and_skips_blanks() {
        let filter = FieldFilter::parse(" itemId, title ,,");
        assert_eq!(filter.fields(), &["itemId".to_string(), "title".to_string()]);
    }

    #[test]
    fn test_apply_projects_objects() {
        let record = json!({"itemId": "DM-1", "title": "t", "body": "b"});
        let filter = FieldFilter::parse("itemId,missing");
        assert_eq!(filter.apply(&record), json!({"itemId": "DM-1"}));
    }

    #[test]
    fn test_apply_passes_through_non_objects() {
        let filter = FieldFilter::parse("a");
        assert_eq!(filter.apply(&json!("scalar")), json!("scalar"));
        assert_eq!(FieldFilter::parse("").apply(&json!({"a": 1})), json!({"a": 1}));
    }
}
