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

//! Persistent compliance state using sled.
//!
//! Key layout (single tree, so one transaction can span all kinds):
//! - `record/<project_id>`            -> canonical `ComplianceRecord`
//! - `alert/<alert_id>`               -> canonical `Alert`
//! - `audit/<hex(project_id)>/<seq:020>` -> canonical `AuditEntry`
//! - `ledger/<height:020>`            -> canonical `LedgerEntry`
//!
//! Project ids are hex-encoded in audit keys so an id containing `/` can
//! never share a prefix with another project. `seq` comes from sled's
//! monotonic id generator, so prefix scans return audit entries in append
//! order. Nothing is ever deleted.

use crate::core::ledger::{LedgerEntry, LedgerLog};
use crate::core::state::repository::{
    sort_alerts_newest_first, ComplianceRepository, RecordFilter, StateError,
};
use crate::core::types::{
    decode_canonical_limited, encode_canonical, Alert, AuditEntry, ComplianceRecord,
    MAX_ENCODED_ITEM,
};
use serde::de::DeserializeOwned;
use sled::transaction::ConflictableTransactionError;

const RECORD_PREFIX: &str = "record/";
const ALERT_PREFIX: &str = "alert/";
const AUDIT_PREFIX: &str = "audit/";
const LEDGER_PREFIX: &str = "ledger/";

/// State operation.
#[derive(Clone, Debug)]
pub enum KvOp {
    /// Put key/value.
    Put { key: Vec<u8>, value: Vec<u8> },
}

/// sled-backed repository.
#[derive(Clone)]
pub struct SledRepository {
    db: sled::Db,
}

fn record_key(project_id: &str) -> Vec<u8> {
    format!("{RECORD_PREFIX}{project_id}").into_bytes()
}

fn alert_key(alert_id: &str) -> Vec<u8> {
    format!("{ALERT_PREFIX}{alert_id}").into_bytes()
}

fn audit_prefix(project_id: &str) -> Vec<u8> {
    format!("{AUDIT_PREFIX}{}/", hex::encode(project_id.as_bytes())).into_bytes()
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StateError> {
    decode_canonical_limited(bytes, MAX_ENCODED_ITEM).map_err(|_| StateError::Codec)
}

/// Items past the decode limit are refused so nothing unreadable is stored.
fn encode<T: serde::Serialize>(v: &T) -> Result<Vec<u8>, StateError> {
    let bytes = encode_canonical(v).map_err(|_| StateError::Codec)?;
    if bytes.len() > MAX_ENCODED_ITEM {
        return Err(StateError::Codec);
    }
    Ok(bytes)
}

impl SledRepository {
    /// Open sled DB at path (directory).
    pub fn open(path: &str) -> Result<Self, StateError> {
        let db = sled::open(path).map_err(|_| StateError::DbOpen)?;
        Ok(Self { db })
    }

    /// Flush dirty pages to disk.
    pub fn flush(&self) -> Result<(), StateError> {
        self.db.flush().map_err(|_| StateError::DbIo)?;
        Ok(())
    }

    fn scan<T: DeserializeOwned>(&self, prefix: &[u8]) -> Result<Vec<T>, StateError> {
        let mut out = Vec::new();
        for item in self.db.scan_prefix(prefix) {
            let (_k, v) = item.map_err(|_| StateError::DbIo)?;
            out.push(decode(&v)?);
        }
        Ok(out)
    }

    fn audit_op(&self, entry: &AuditEntry) -> Result<KvOp, StateError> {
        let seq = self.db.generate_id().map_err(|_| StateError::DbIo)?;
        let mut key = audit_prefix(&entry.project_id);
        key.extend_from_slice(format!("{seq:020}").as_bytes());
        Ok(KvOp::Put { key, value: encode(entry)? })
    }

    /// Atomic commit using sled transactions.
    pub fn commit_atomic(&self, ops: Vec<KvOp>) -> Result<(), StateError> {
        let res: sled::transaction::TransactionResult<(), StateError> = self.db.transaction(|t| {
            for op in ops.iter() {
                match op {
                    KvOp::Put { key, value } => {
                        t.insert(key.as_slice(), value.as_slice()).map_err(|_| {
                            ConflictableTransactionError::Abort(StateError::DbIo)
                        })?;
                    }
                }
            }
            Ok::<(), ConflictableTransactionError<StateError>>(())
        });

        match res {
            Ok(()) => Ok(()),
            Err(sled::transaction::TransactionError::Abort(e)) => Err(e),
            Err(sled::transaction::TransactionError::Storage(_)) => Err(StateError::DbIo),
        }
    }
}

impl ComplianceRepository for SledRepository {
    fn get_record(&self, project_id: &str) -> Result<Option<ComplianceRecord>, StateError> {
        let v = self.db.get(record_key(project_id)).map_err(|_| StateError::DbIo)?;
        v.map(|iv| decode(&iv)).transpose()
    }

    fn list_records(&self, filter: &RecordFilter) -> Result<Vec<ComplianceRecord>, StateError> {
        let all: Vec<ComplianceRecord> = self.scan(RECORD_PREFIX.as_bytes())?;
        Ok(all.into_iter().filter(|r| filter.matches(r)).collect())
    }

    fn put_record(&self, record: &ComplianceRecord) -> Result<(), StateError> {
        self.db
            .insert(record_key(&record.project_id), encode(record)?)
            .map_err(|_| StateError::DbIo)?;
        Ok(())
    }

    fn record_count(&self) -> Result<usize, StateError> {
        Ok(self.db.scan_prefix(RECORD_PREFIX.as_bytes()).count())
    }

    fn get_alert(&self, alert_id: &str) -> Result<Option<Alert>, StateError> {
        let v = self.db.get(alert_key(alert_id)).map_err(|_| StateError::DbIo)?;
        v.map(|iv| decode(&iv)).transpose()
    }

    fn list_alerts(&self) -> Result<Vec<Alert>, StateError> {
        let mut alerts: Vec<Alert> = self.scan(ALERT_PREFIX.as_bytes())?;
        sort_alerts_newest_first(&mut alerts);
        Ok(alerts)
    }

    fn put_alert(&self, alert: &Alert) -> Result<(), StateError> {
        self.db
            .insert(alert_key(&alert.alert_id), encode(alert)?)
            .map_err(|_| StateError::DbIo)?;
        Ok(())
    }

    fn append_audit(&self, entry: &AuditEntry) -> Result<(), StateError> {
        let op = self.audit_op(entry)?;
        self.commit_atomic(vec![op])
    }

    fn audit_for_project(&self, project_id: &str) -> Result<Vec<AuditEntry>, StateError> {
        let mut entries: Vec<AuditEntry> = self.scan(&audit_prefix(project_id))?;
        entries.reverse();
        Ok(entries)
    }

    fn put_record_with_audit(
        &self,
        record: &ComplianceRecord,
        entries: &[AuditEntry],
    ) -> Result<(), StateError> {
        let mut ops = Vec::with_capacity(1 + entries.len());
        ops.push(KvOp::Put { key: record_key(&record.project_id), value: encode(record)? });
        for e in entries {
            ops.push(self.audit_op(e)?);
        }
        self.commit_atomic(ops)
    }
}

impl LedgerLog for SledRepository {
    fn load_entries(&self) -> Result<Vec<LedgerEntry>, StateError> {
        self.scan(LEDGER_PREFIX.as_bytes())
    }

    fn append_entry(&self, height: u64, entry: &LedgerEntry) -> Result<(), StateError> {
        let key = format!("{LEDGER_PREFIX}{height:020}").into_bytes();
        self.commit_atomic(vec![KvOp::Put { key, value: encode(entry)? }])?;
        self.flush()
    }
}
