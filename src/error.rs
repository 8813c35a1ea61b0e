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

// Error types for the store and its backends

use thiserror::Error;

/// Error reported by a single backend.
///
/// The orchestrator never rewrites these; callers can match on the variant
/// they receive through [`StoreError::Backend`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// Key rejected by the backend (wrong shape for this source)
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Backend does not implement the operation and says so loudly
    #[error("{backend} does not support {operation}")]
    Unsupported {
        backend: String,
        operation: &'static str,
    },

    /// Backend unreachable or answered with a server-side error
    #[error("{backend} unavailable: {message}")]
    Unavailable { backend: String, message: String },

    /// Backend refused the request; sending it again gives the same answer
    #[error("{backend} rejected the request with status {status}: {message}")]
    Rejected {
        backend: String,
        status: u16,
        message: String,
    },

    /// Response could not be decoded
    #[error("malformed response from {backend}: {message}")]
    Malformed { backend: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BackendError {
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(backend: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            backend: backend.into(),
            operation,
        }
    }

    pub fn unavailable(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn rejected(backend: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            backend: backend.into(),
            status,
            message: message.into(),
        }
    }

    pub fn malformed(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Whether a retry of the same request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Error returned by the orchestrator to its callers
#[derive(Debug, Error)]
pub enum StoreError {
    /// Every consulted backend came back empty
    #[error("Resource not found")]
    NotFound,

    /// A backend failed; the original error is kept intact
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// The wrapped backend error, if this came from a backend
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
