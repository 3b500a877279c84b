// Copyright 2025 Querytrace Contributors
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

//! Error types for chain construction and phase execution.

use thiserror::Error;

/// The value threaded through a composed chain: whatever the phase body
/// produced, or the failure that is propagating outward through each layer.
pub type PhaseResult = Result<serde_json::Value, PhaseError>;

/// Construction-time failures. Fatal to building the trace factory or
/// instance they occur in; nothing is dispatched after one of these.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Unknown hook point: {0}")]
    UnknownHookPoint(String),

    #[error("No registered module named: {0}")]
    UnknownModule(String),

    #[error("Module registered twice: {0}")]
    DuplicateModule(String),

    #[error("Failed to parse trace config: {0}")]
    ConfigParse(String),
}

/// A failure flowing through a phase chain.
///
/// Absent an intercepting module, a `Pipeline` error surfaces to the engine
/// exactly as the phase body raised it. A module that fails before running
/// its continuation skips the phase body entirely; outer layers see the
/// `Module` error as if the continuation itself had failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    #[error("Phase body failed: {message}")]
    Pipeline { message: String },

    #[error("Trace module '{module}' failed: {message}")]
    Module { module: String, message: String },
}

impl PhaseError {
    /// A failure raised by the wrapped phase body.
    pub fn pipeline(message: impl Into<String>) -> Self {
        PhaseError::Pipeline {
            message: message.into(),
        }
    }

    /// A failure raised by an observer module.
    pub fn module(module: impl Into<String>, message: impl Into<String>) -> Self {
        PhaseError::Module {
            module: module.into(),
            message: message.into(),
        }
    }
}
