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

// Shared-token authorization check

use super::{Decision, Middleware, Rejection, Request};
use crate::config::SecurityConfig;

const GUARDED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Rejects guarded requests whose `authorization` header differs from the token
pub struct SecurityCheck {
    token: String,
    exempt_paths: Vec<String>,
}

impl SecurityCheck {
    pub fn new(token: impl Into<String>, exempt_paths: Vec<String>) -> Self {
        Self {
            token: token.into(),
            exempt_paths,
        }
    }

    /// `None` when security is disabled or no token is configured
    pub fn from_config(config: &SecurityConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let token = config.token.as_deref().filter(|t| !t.is_empty())?;
        Some(Self::new(token, config.exempt_paths.clone()))
    }

    fn guards(&self, request: &Request) -> bool {
        GUARDED_METHODS.contains(&request.method.to_ascii_uppercase().as_str())
            && !self.exempt_paths.iter().any(|p| p == &request.path)
    }
}

impl Middleware for SecurityCheck {
    fn check(&self, request: &Request) -> Decision {
        if !self.guards(request) {
            return Decision::Pass;
        }
        match request.header("authorization") {
            Some(token) if token == self.token => Decision::Pass,
            _ => Decision::Reject(Rejection::unauthorized("invalid Token")),
        }
    }

    fn name(&self) -> &str {
        "security"
    }
}
