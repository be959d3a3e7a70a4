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

//! Ledger client seam.
//!
//! Lifecycle actions are recorded on a ledger before the record store is
//! touched. Submission returns the transaction hash or an error; the caller
//! decides whether to retry. Confirmed transactions can be proven against
//! the ledger's Merkle root.

pub mod local;
pub mod merkle;
pub mod signing;

use crate::core::state::repository::StateError;
use crate::core::types::TxHash;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use local::{LedgerEntry, LedgerLog, LocalLedger};

/// Ledger errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Transient; the submission may be retried.
    #[error("ledger unavailable")]
    Unavailable,
    /// The ledger refused the transaction.
    #[error("ledger rejected transaction: {0}")]
    Rejected(String),
    /// Could not sign the transaction.
    #[error("signing")]
    Signing,
    /// The entry log could not be read or written.
    #[error("ledger storage: {0}")]
    Storage(#[from] StateError),
    /// A stored entry fails signature or id checks.
    #[error("ledger entry at height {0} does not verify")]
    Corrupt(u64),
}

impl LedgerError {
    /// True for failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

/// Credit lifecycle action recorded on the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerAction {
    /// Suspend credits.
    Freeze,
    /// Permanently cancel credits.
    Revoke,
    /// Lift a freeze.
    Reactivate,
}

impl LedgerAction {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Freeze => "FREEZE",
            Self::Revoke => "REVOKE",
            Self::Reactivate => "REACTIVATE",
        }
    }
}

impl fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction submitted for one lifecycle action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Action.
    pub action: LedgerAction,
    /// Affected project.
    pub project_id: String,
    /// Operator reason.
    pub reason: String,
    /// Issue time, unix milliseconds.
    pub issued_at_ms: u64,
    /// Random nonce; two submissions of the same action never collide.
    pub nonce: u64,
}

/// Public view of a ledger's state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerStatus {
    /// Confirmed transactions.
    pub height: u64,
    /// Merkle root, hex.
    pub root: String,
    /// Signer public key, hex.
    pub signer_public_key: String,
}

/// One sibling on the way to the root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProofNode {
    /// Sibling hash, hex.
    pub hash: String,
    /// `left` or `right` of the running hash.
    pub position: &'static str,
}

/// Inclusion proof for a confirmed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerProof {
    /// Transaction id.
    pub tx_hash: String,
    /// Recorded action.
    pub action: LedgerAction,
    /// Affected project.
    pub project_id: String,
    /// Zero-based position in the ledger.
    pub index: u64,
    /// Ledger height the proof was built at.
    pub height: u64,
    /// Leaf hash, hex.
    pub leaf: String,
    /// Root the path leads to, hex.
    pub root: String,
    /// Siblings from leaf to root.
    pub path: Vec<ProofNode>,
    /// Signature and id check out and the path reproduces the root.
    pub verified: bool,
}

/// Ledger the lifecycle controller writes to.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit one transaction and wait for its hash.
    async fn submit_transaction(&self, tx: &LedgerTransaction) -> Result<TxHash, LedgerError>;

    /// Current height and root, when the ledger can report them.
    fn status(&self) -> Option<LedgerStatus> {
        None
    }

    /// Inclusion proof for a confirmed transaction, when the ledger keeps them.
    fn proof(&self, _tx_hash: &TxHash) -> Option<LedgerProof> {
        None
    }
}
