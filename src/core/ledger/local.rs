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

//! Local signed append-only ledger.
//!
//! Each transaction is signed over its domain-separated bytes. The id is
//! `0x || hex(SHA-256(payload || signature))`. Entries are kept in
//! submission order and committed to by a Merkle root. With a
//! [`LedgerLog`] attached, every confirmation is written through before it
//! is acknowledged and the ledger is replayed and re-verified on open.

use crate::core::ledger::merkle::{self, Hash32, MerkleTree};
use crate::core::ledger::signing::tx_signing_bytes_v1;
use crate::core::ledger::{
    LedgerClient, LedgerError, LedgerProof, LedgerStatus, LedgerTransaction, ProofNode,
};
use crate::core::security::keystore::{verify_pubkey_bytes, SignerBackend};
use crate::core::state::repository::StateError;
use crate::core::types::{Signature, TxHash};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// One confirmed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Transaction id.
    pub tx_hash: TxHash,
    /// Submitted transaction.
    pub tx: LedgerTransaction,
    /// Signed bytes.
    pub payload: Vec<u8>,
    /// Signature over `payload`.
    pub signature: Signature,
}

impl LedgerEntry {
    fn leaf(&self) -> (&[u8], &[u8]) {
        (self.tx_hash.as_str().as_bytes(), self.payload.as_slice())
    }
}

/// Durable storage for confirmed entries.
pub trait LedgerLog: Send + Sync {
    /// All entries, in height order.
    fn load_entries(&self) -> Result<Vec<LedgerEntry>, StateError>;

    /// Store the entry confirmed at `height` (zero-based).
    fn append_entry(&self, height: u64, entry: &LedgerEntry) -> Result<(), StateError>;
}

fn tx_id(payload: &[u8], sig: &Signature) -> TxHash {
    let mut buf = Vec::with_capacity(payload.len() + sig.0.len());
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&sig.0);
    TxHash::from_digest(&merkle::sha256(&buf))
}

fn entry_valid(public_key: &[u8; 32], entry: &LedgerEntry) -> bool {
    verify_pubkey_bytes(public_key, &entry.payload, &entry.signature).is_ok()
        && tx_id(&entry.payload, &entry.signature) == entry.tx_hash
}

fn tree_of(entries: &[LedgerEntry]) -> MerkleTree {
    MerkleTree::from_transactions(entries.iter().map(LedgerEntry::leaf))
}

/// In-process ledger.
pub struct LocalLedger {
    signer: Arc<dyn SignerBackend>,
    confirm_delay: Duration,
    available: AtomicBool,
    log: Option<Arc<dyn LedgerLog>>,
    entries: Mutex<Vec<LedgerEntry>>,
}

impl LocalLedger {
    /// New empty memory-only ledger. `confirm_delay` is awaited before each
    /// confirmation.
    pub fn new(signer: Arc<dyn SignerBackend>, confirm_delay: Duration) -> Self {
        Self {
            signer,
            confirm_delay,
            available: AtomicBool::new(true),
            log: None,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Ledger backed by `log`. Stored entries are replayed and each must
    /// verify against `signer`'s key.
    pub fn open(
        signer: Arc<dyn SignerBackend>,
        confirm_delay: Duration,
        log: Arc<dyn LedgerLog>,
    ) -> Result<Self, LedgerError> {
        let entries = log.load_entries()?;
        let public_key = signer.public_key();
        if let Some(height) = entries.iter().position(|e| !entry_valid(&public_key, e)) {
            return Err(LedgerError::Corrupt(height as u64));
        }
        info!(height = entries.len(), "ledger replayed");
        Ok(Self {
            signer,
            confirm_delay,
            available: AtomicBool::new(true),
            log: Some(log),
            entries: Mutex::new(entries),
        })
    }

    /// Toggle availability; while unavailable every submission fails with
    /// [`LedgerError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Signer public key.
    pub fn public_key(&self) -> [u8; 32] {
        self.signer.public_key()
    }

    /// Number of confirmed transactions.
    pub fn height(&self) -> u64 {
        self.entries.lock().map(|g| g.len() as u64).unwrap_or(0)
    }

    /// Snapshot of confirmed transactions in order.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Merkle root over all transactions. Empty ledger => ZERO hash.
    pub fn root(&self) -> Hash32 {
        tree_of(&self.entries()).root()
    }

    /// Check an entry's signature and id against this ledger's key.
    pub fn verify_entry(&self, entry: &LedgerEntry) -> bool {
        entry_valid(&self.public_key(), entry)
    }
}

#[async_trait]
impl LedgerClient for LocalLedger {
    async fn submit_transaction(&self, tx: &LedgerTransaction) -> Result<TxHash, LedgerError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable);
        }
        if tx.project_id.trim().is_empty() {
            return Err(LedgerError::Rejected("empty project id".into()));
        }

        let payload = tx_signing_bytes_v1(tx).map_err(|_| LedgerError::Signing)?;
        let signature = self.signer.sign(&payload).map_err(|_| LedgerError::Signing)?;
        let tx_hash = tx_id(&payload, &signature);

        if !self.confirm_delay.is_zero() {
            tokio::time::sleep(self.confirm_delay).await;
        }

        let entry = LedgerEntry { tx_hash: tx_hash.clone(), tx: tx.clone(), payload, signature };
        let mut g = self.entries.lock().map_err(|_| LedgerError::Unavailable)?;
        if let Some(log) = &self.log {
            log.append_entry(g.len() as u64, &entry)?;
        }
        g.push(entry);
        debug!(tx = %tx_hash, action = %tx.action, project = %tx.project_id, height = g.len(), "ledger tx confirmed");
        Ok(tx_hash)
    }

    fn status(&self) -> Option<LedgerStatus> {
        Some(LedgerStatus {
            height: self.height(),
            root: hex::encode(self.root()),
            signer_public_key: hex::encode(self.public_key()),
        })
    }

    fn proof(&self, tx_hash: &TxHash) -> Option<LedgerProof> {
        let entries = self.entries();
        let index = entries.iter().position(|e| &e.tx_hash == tx_hash)?;
        let tree = tree_of(&entries);
        let root = tree.root();
        let proof = tree.proof(index)?;
        let entry = &entries[index];
        Some(LedgerProof {
            tx_hash: entry.tx_hash.to_string(),
            action: entry.tx.action,
            project_id: entry.tx.project_id.clone(),
            index: index as u64,
            height: tree.len() as u64,
            leaf: hex::encode(proof.leaf),
            root: hex::encode(root),
            path: proof
                .steps
                .iter()
                .map(|s| ProofNode {
                    hash: hex::encode(s.sibling),
                    position: if s.sibling_on_left { "left" } else { "right" },
                })
                .collect(),
            verified: proof.verify(&root) && self.verify_entry(entry),
        })
    }
}
