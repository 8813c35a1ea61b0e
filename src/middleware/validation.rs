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

// Parameter and body validation checks

use super::{Decision, Middleware, Rejection, Request};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn alphanumeric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^[a-z0-9\-_]+$").expect("pattern is valid"))
}

fn numeric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+$").expect("pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamRule {
    Alphanumeric,
    Numeric,
}

/// Shape check on one path/query parameter.
///
/// A missing parameter fails the check.
#[derive(Debug, Clone)]
pub struct ParamCheck {
    field: String,
    rule: ParamRule,
}

impl ParamCheck {
    /// Letters, digits, `-` and `_` only
    pub fn alphanumeric(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: ParamRule::Alphanumeric,
        }
    }

    /// Digits only
    pub fn numeric(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: ParamRule::Numeric,
        }
    }
}

impl Middleware for ParamCheck {
    fn check(&self, request: &Request) -> Decision {
        let (pattern, expected) = match self.rule {
            ParamRule::Alphanumeric => (alphanumeric_pattern(), "alphanumeric"),
            ParamRule::Numeric => (numeric_pattern(), "numeric"),
        };

        match request.param(&self.field) {
            Some(value) if pattern.is_match(value) => Decision::Pass,
            _ => Decision::Reject(Rejection::not_acceptable(format!(
                "The {} must be {}",
                self.field, expected
            ))),
        }
    }

    fn name(&self) -> &str {
        match self.rule {
            ParamRule::Alphanumeric => "alphanumeric",
            ParamRule::Numeric => "numeric",
        }
    }
}

/// JSON type a body field must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Bool,
    Object,
    Array,
    Any,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Object => value.is_object(),
            FieldKind::Array => value.is_array(),
            FieldKind::Any => true,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::Bool => "a boolean",
            FieldKind::Object => "an object",
            FieldKind::Array => "an array",
            FieldKind::Any => "any value",
        }
    }
}

/// Required top-level fields of a JSON request body
#[derive(Debug, Clone, Default)]
pub struct BodySchema {
    required: Vec<(String, FieldKind)>,
}

impl BodySchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, field: impl Into<String>, kind: FieldKind) -> Self {
        self.required.push((field.into(), kind));
        self
    }

    /// First violation, in declaration order
    pub fn validate(&self, body: &Value) -> Result<(), String> {
        let Value::Object(map) = body else {
            return Err("\"value\" must be an object".to_string());
        };

        for (field, kind) in &self.required {
            match map.get(field) {
                None | Some(Value::Null) => return Err(format!("\"{}\" is required", field)),
                Some(value) if !kind.accepts(value) => {
                    return Err(format!("\"{}\" must be {}", field, kind.describe()))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl Middleware for BodySchema {
    fn check(&self, request: &Request) -> Decision {
        let Some(body) = &request.body else {
            return Decision::Reject(Rejection::not_acceptable("Body params can't be undefined"));
        };
        match self.validate(body) {
            Ok(()) => Decision::Pass,
            Err(message) => Decision::Reject(Rejection::unprocessable(message)),
        }
    }

    fn name(&self) -> &str {
        "body_schema"
    }
}
