// Copyright 2024 The Kubernetes Authors.
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

//! Admission error types.

use thiserror::Error;

/// Result type for admission operations.
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// AdmissionError represents errors that can occur during admission.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// BadRequest indicates a malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// Internal represents an internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// NotFound indicates a resource was not found.
    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: String, name: String },

    /// NotReady indicates a plugin was invoked before its listers were wired in.
    #[error("{0} admission plugin is not ready to handle requests yet")]
    NotReady(String),

    /// InvalidSetting indicates a setting whose raw value is not the expected JSON.
    #[error("failed to parse setting \"{name}\": {source}")]
    InvalidSetting {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization indicates a patch value could not be encoded.
    #[error("failed to encode patch: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl AdmissionError {
    /// Create a new BadRequest error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AdmissionError::BadRequest(msg.into())
    }

    /// Create a NotFound error.
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        AdmissionError::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an Internal error.
    pub fn internal_error(msg: impl Into<String>) -> Self {
        AdmissionError::Internal(msg.into())
    }

    /// Create a NotReady error for the named plugin.
    pub fn not_ready(plugin: impl Into<String>) -> Self {
        AdmissionError::NotReady(plugin.into())
    }

    /// Create an InvalidSetting error.
    pub fn invalid_setting(name: impl Into<String>, source: serde_json::Error) -> Self {
        AdmissionError::InvalidSetting {
            name: name.into(),
            source,
        }
    }

    /// Returns true if this error reports a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdmissionError::NotFound { .. })
    }
}
