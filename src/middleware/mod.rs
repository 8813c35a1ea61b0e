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

// Request middleware
//
// Checks that run ahead of a request handler, composed in a fixed order.
// Each check passes or rejects; the first rejection ends the pipeline.
// The types are independent of any HTTP framework so a server layer can
// translate its own request into a `Request`.

pub mod security;
pub mod validation;

pub use security::SecurityCheck;
pub use validation::{BodySchema, FieldKind, ParamCheck};

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Framework-independent view of an incoming request
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Header names are stored lowercase
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Why a request was turned away, with the HTTP status to answer with
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status} {message}")]
pub struct Rejection {
    pub status: u16,
    pub message: String,
}

impl Rejection {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: 401,
            message: message.into(),
        }
    }

    pub fn not_acceptable(message: impl Into<String>) -> Self {
        Self {
            status: 406,
            message: message.into(),
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: 422,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Pass,
    Reject(Rejection),
}

/// A single pre-handler check
pub trait Middleware: Send + Sync {
    fn check(&self, request: &Request) -> Decision;

    fn name(&self) -> &str;
}

/// Ordered list of checks run before a handler
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, stage: impl Middleware + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every check in order, stopping at the first rejection
    pub fn run(&self, request: &Request) -> Result<(), Rejection> {
        for stage in &self.stages {
            if let Decision::Reject(rejection) = stage.check(request) {
                debug!(
                    stage = stage.name(),
                    path = %request.path,
                    status = rejection.status,
                    "request rejected"
                );
                return Err(rejection);
            }
        }
        Ok(())
    }
}
