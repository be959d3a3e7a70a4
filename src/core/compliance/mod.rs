// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Compliance rules: classification, credit lifecycle, queries, re-verification.

pub mod classifier;
pub mod lifecycle;
pub mod query;
pub mod reverify;

use crate::core::ledger::LedgerError;
use crate::core::state::repository::StateError;
use thiserror::Error;

/// Errors surfaced by compliance operations.
#[derive(Debug, Error)]
pub enum ComplianceError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),
    /// Unknown project, alert or job.
    #[error("{0}")]
    NotFound(String),
    /// Request is not allowed in the record's current state.
    #[error("{0}")]
    Conflict(String),
    /// Re-verification queue cannot take more jobs.
    #[error("re-verification queue full")]
    QueueFull,
    /// Ledger submission failed.
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
    /// Record store failed.
    #[error("storage: {0}")]
    Storage(#[from] StateError),
}

/// Who performed an audited action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    /// Display name.
    pub name: &'static str,
    /// Role tag.
    pub role: &'static str,
}

impl Actor {
    /// Human operator issuing lifecycle actions.
    pub const OFFICER: Actor = Actor { name: "Compliance Officer", role: "GOVERNMENT_OFFICER" };
    /// External AI verification service.
    pub const AI_SERVICE: Actor = Actor { name: "AI Service", role: "AI_SERVICE" };
    /// The service itself.
    pub const SYSTEM: Actor = Actor { name: "System", role: "SYSTEM" };
}
