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

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bluecarbon::core::compliance::lifecycle::{LifecycleController, RetryPolicy};
use bluecarbon::core::compliance::ComplianceError;
use bluecarbon::core::fixtures::FixtureGenerator;
use bluecarbon::core::ledger::{LedgerClient, LedgerError, LedgerTransaction, LocalLedger};
use bluecarbon::core::security::keystore::EphemeralEd25519Backend;
use bluecarbon::core::state::repository::{ComplianceRepository, InMemoryRepository};
use bluecarbon::core::types::{AuditAction, ComplianceRecord, ComplianceStatus, TxHash};
use bluecarbon::monitoring::metrics::Metrics;

fn record(pid: &str, status: ComplianceStatus) -> ComplianceRecord {
    let mut r = FixtureGenerator::new(7, Utc::now()).records(1).remove(0);
    r.project_id = pid.to_string();
    r.compliance_status = status;
    r.credits_frozen = matches!(status, ComplianceStatus::Frozen | ComplianceStatus::Revoked);
    r.credits_revoked = status == ComplianceStatus::Revoked;
    r.blockchain_tx_hash = None;
    r
}

fn local_ledger() -> Arc<LocalLedger> {
    let key = EphemeralEd25519Backend::generate().unwrap();
    Arc::new(LocalLedger::new(Arc::new(key), Duration::ZERO))
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy { max_attempts: 3, base: Duration::from_millis(1), cap: Duration::from_millis(2) }
}

fn controller(repo: &Arc<InMemoryRepository>, ledger: Arc<dyn LedgerClient>) -> LifecycleController {
    LifecycleController::new(repo.clone(), ledger, Arc::new(Metrics::new().unwrap()), fast_retry())
}

fn seeded(records: &[ComplianceRecord]) -> Arc<InMemoryRepository> {
    let repo = Arc::new(InMemoryRepository::new());
    for r in records {
        repo.put_record(r).unwrap();
    }
    repo
}

/// Fails the first `failures` submissions with the error built by `err`.
struct FlakyLedger {
    failures: AtomicU32,
    calls: AtomicU32,
    err: fn() -> LedgerError,
}

impl FlakyLedger {
    fn new(failures: u32, err: fn() -> LedgerError) -> Self {
        Self { failures: AtomicU32::new(failures), calls: AtomicU32::new(0), err }
    }
}

#[async_trait]
impl LedgerClient for FlakyLedger {
    async fn submit_transaction(&self, _tx: &LedgerTransaction) -> Result<TxHash, LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err((self.err)());
        }
        Ok(TxHash::from_digest(&[0xab; 32]))
    }
}

#[tokio::test]
async fn freeze_then_reactivate_returns_to_compliant() {
    let repo = seeded(&[record("PRJ-0001", ComplianceStatus::ReviewNeeded)]);
    let ledger = local_ledger();
    let ctl = controller(&repo, ledger.clone());

    let frozen = ctl.freeze("PRJ-0001", "NDVI drop under review").await.unwrap();
    assert_eq!(frozen.record.compliance_status, ComplianceStatus::Frozen);
    assert!(frozen.record.credits_frozen);
    assert_eq!(frozen.record.blockchain_tx_hash.as_deref(), Some(frozen.tx_hash.as_str()));

    let back = ctl.reactivate("PRJ-0001", "Site inspection passed").await.unwrap();
    assert_eq!(back.record.compliance_status, ComplianceStatus::Compliant);
    assert!(!back.record.credits_frozen);
    assert!(!back.record.credits_revoked);
    assert_ne!(frozen.tx_hash, back.tx_hash);

    let stored = repo.get_record("PRJ-0001").unwrap().unwrap();
    assert_eq!(stored, back.record);
    assert!(stored.lifecycle_consistent());
    assert_eq!(ledger.height(), 2);
    for e in ledger.entries() {
        assert!(ledger.verify_entry(&e));
    }
}

#[tokio::test]
async fn revoke_is_terminal() {
    let repo = seeded(&[record("PRJ-0002", ComplianceStatus::Frozen)]);
    let ctl = controller(&repo, local_ledger());

    let revoked = ctl.revoke("PRJ-0002", "Fraudulent reporting").await.unwrap();
    assert_eq!(revoked.record.compliance_status, ComplianceStatus::Revoked);
    assert!(revoked.record.credits_frozen && revoked.record.credits_revoked);

    let err = ctl.reactivate("PRJ-0002", "appeal").await.unwrap_err();
    assert!(matches!(err, ComplianceError::Conflict(ref m) if m == "Cannot reactivate revoked credits"));

    let err = ctl.freeze("PRJ-0002", "again").await.unwrap_err();
    assert!(matches!(err, ComplianceError::Conflict(ref m) if m == "Cannot freeze revoked credits"));

    // Re-asserting the terminal state is accepted.
    let again = ctl.revoke("PRJ-0002", "confirmed").await.unwrap();
    assert_eq!(again.record.compliance_status, ComplianceStatus::Revoked);
    assert_eq!(repo.get_record("PRJ-0002").unwrap().unwrap().compliance_status, ComplianceStatus::Revoked);
}

#[tokio::test]
async fn reactivate_requires_frozen_credits() {
    let repo = seeded(&[record("PRJ-0003", ComplianceStatus::NonCompliant)]);
    let ctl = controller(&repo, local_ledger());

    let err = ctl.reactivate("PRJ-0003", "no reason").await.unwrap_err();
    assert!(matches!(err, ComplianceError::Conflict(ref m) if m == "Credits are not frozen"));
    assert_eq!(
        repo.get_record("PRJ-0003").unwrap().unwrap().compliance_status,
        ComplianceStatus::NonCompliant
    );
}

#[tokio::test]
async fn missing_inputs_and_unknown_projects_are_refused() {
    let repo = seeded(&[record("PRJ-0004", ComplianceStatus::Compliant)]);
    let ledger = local_ledger();
    let ctl = controller(&repo, ledger.clone());

    assert!(matches!(ctl.freeze("PRJ-0004", "   ").await, Err(ComplianceError::Validation(_))));
    assert!(matches!(ctl.freeze("", "reason").await, Err(ComplianceError::Validation(_))));
    assert!(matches!(ctl.freeze("PRJ-9999", "reason").await, Err(ComplianceError::NotFound(_))));
    assert_eq!(ledger.height(), 0);
}

#[tokio::test]
async fn every_refusal_is_counted() {
    let repo = seeded(&[record("PRJ-0014", ComplianceStatus::Revoked)]);
    let metrics = Arc::new(Metrics::new().unwrap());
    let ctl = LifecycleController::new(repo.clone(), local_ledger(), metrics.clone(), fast_retry());

    assert!(matches!(ctl.revoke("PRJ-9999", "reason").await, Err(ComplianceError::NotFound(_))));
    assert_eq!(metrics.lifecycle_rejected_total.get(), 1);
    assert!(matches!(ctl.freeze(" ", "reason").await, Err(ComplianceError::Validation(_))));
    assert_eq!(metrics.lifecycle_rejected_total.get(), 2);
    assert!(matches!(ctl.reactivate("PRJ-0014", "reason").await, Err(ComplianceError::Conflict(_))));
    assert_eq!(metrics.lifecycle_rejected_total.get(), 3);
}

#[tokio::test]
async fn freezing_twice_writes_two_transactions() {
    let repo = seeded(&[record("PRJ-0005", ComplianceStatus::Compliant)]);
    let ledger = local_ledger();
    let ctl = controller(&repo, ledger.clone());

    let a = ctl.freeze("PRJ-0005", "first").await.unwrap();
    let b = ctl.freeze("PRJ-0005", "second").await.unwrap();
    assert_ne!(a.tx_hash, b.tx_hash);
    assert_eq!(ledger.height(), 2);
    assert_eq!(b.record.compliance_status, ComplianceStatus::Frozen);
}

#[tokio::test]
async fn audit_trail_records_each_action_newest_first() {
    let repo = seeded(&[record("PRJ-0006", ComplianceStatus::ReviewNeeded)]);
    let ctl = controller(&repo, local_ledger());

    let f = ctl.freeze("PRJ-0006", "hold").await.unwrap();
    let r = ctl.reactivate("PRJ-0006", "release").await.unwrap();

    let trail = repo.audit_for_project("PRJ-0006").unwrap();
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0].action_type, AuditAction::CreditsReactivated);
    assert_eq!(trail[0].previous_status, ComplianceStatus::Frozen);
    assert_eq!(trail[0].new_status, ComplianceStatus::Compliant);
    assert_eq!(trail[0].blockchain_tx_hash.as_deref(), Some(r.tx_hash.as_str()));
    assert_eq!(trail[1].action_type, AuditAction::CreditsFrozen);
    assert_eq!(trail[1].previous_status, ComplianceStatus::ReviewNeeded);
    assert_eq!(trail[1].reason, "hold");
    assert_eq!(trail[1].blockchain_tx_hash.as_deref(), Some(f.tx_hash.as_str()));
}

#[tokio::test]
async fn transient_ledger_failures_are_retried() {
    let repo = seeded(&[record("PRJ-0007", ComplianceStatus::Compliant)]);
    let ledger = Arc::new(FlakyLedger::new(2, || LedgerError::Unavailable));
    let ctl = controller(&repo, ledger.clone());

    let out = ctl.freeze("PRJ-0007", "hold").await.unwrap();
    assert_eq!(ledger.calls.load(Ordering::SeqCst), 3);
    assert_eq!(out.record.compliance_status, ComplianceStatus::Frozen);
}

#[tokio::test]
async fn exhausted_ledger_leaves_record_untouched() {
    let before = record("PRJ-0008", ComplianceStatus::Compliant);
    let repo = seeded(&[before.clone()]);
    let ledger = Arc::new(FlakyLedger::new(10, || LedgerError::Unavailable));
    let ctl = controller(&repo, ledger.clone());

    let err = ctl.revoke("PRJ-0008", "fraud").await.unwrap_err();
    assert!(matches!(err, ComplianceError::Ledger(LedgerError::Unavailable)));
    assert_eq!(ledger.calls.load(Ordering::SeqCst), 3);
    assert_eq!(repo.get_record("PRJ-0008").unwrap().unwrap(), before);
    assert!(repo.audit_for_project("PRJ-0008").unwrap().is_empty());
}

#[tokio::test]
async fn rejected_transactions_are_not_retried() {
    let before = record("PRJ-0009", ComplianceStatus::Frozen);
    let repo = seeded(&[before.clone()]);
    let ledger = Arc::new(FlakyLedger::new(1, || LedgerError::Rejected("nonce reuse".into())));
    let ctl = controller(&repo, ledger.clone());

    let err = ctl.reactivate("PRJ-0009", "release").await.unwrap_err();
    assert!(matches!(err, ComplianceError::Ledger(LedgerError::Rejected(_))));
    assert_eq!(ledger.calls.load(Ordering::SeqCst), 1);
    assert_eq!(repo.get_record("PRJ-0009").unwrap().unwrap(), before);
}

#[tokio::test]
async fn unavailable_local_ledger_fails_without_mutation() {
    let before = record("PRJ-0010", ComplianceStatus::Compliant);
    let repo = seeded(&[before.clone()]);
    let ledger = local_ledger();
    ledger.set_available(false);
    let ctl = controller(&repo, ledger.clone());

    assert!(ctl.freeze("PRJ-0010", "hold").await.is_err());
    assert_eq!(repo.get_record("PRJ-0010").unwrap().unwrap(), before);

    ledger.set_available(true);
    assert!(ctl.freeze("PRJ-0010", "hold").await.is_ok());
    assert_eq!(ledger.height(), 1);
}
