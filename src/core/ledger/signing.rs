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
#![deny(missing_docs)]

//! Domain-separated signing bytes for ledger transactions.

use crate::core::ledger::LedgerTransaction;
use crate::core::types::encode_canonical;
use thiserror::Error;

const TX_DOMAIN: &[u8] = b"BlueCarbon-Ledger-Tx-v1";

/// Signing error.
#[derive(Debug, Error)]
pub enum SigningError {
    /// Field encoding failed.
    #[error("codec")]
    Codec,
}

/// Transaction signing payload:
/// domain || issued_at_ms || nonce || action || project_id || reason
///
/// Strings are length-prefixed through the canonical codec, so no two
/// transactions share signing bytes.
pub fn tx_signing_bytes_v1(tx: &LedgerTransaction) -> Result<Vec<u8>, SigningError> {
    let mut out = Vec::with_capacity(TX_DOMAIN.len() + 16 + 64 + tx.project_id.len() + tx.reason.len());
    out.extend_from_slice(TX_DOMAIN);
    out.extend_from_slice(&tx.issued_at_ms.to_be_bytes());
    out.extend_from_slice(&tx.nonce.to_be_bytes());
    out.extend_from_slice(tx.action.as_str().as_bytes());
    out.push(0);
    let pid = encode_canonical(&tx.project_id).map_err(|_| SigningError::Codec)?;
    out.extend_from_slice(&pid);
    let reason = encode_canonical(&tx.reason).map_err(|_| SigningError::Codec)?;
    out.extend_from_slice(&reason);
    Ok(out)
}
