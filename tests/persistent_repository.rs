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

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

use bluecarbon::core::fixtures::FixtureGenerator;
use bluecarbon::core::ledger::{
    LedgerAction, LedgerClient, LedgerError, LedgerLog, LedgerTransaction, LocalLedger,
};
use bluecarbon::core::security::keystore::{EphemeralEd25519Backend, FileEd25519Backend, SignerBackend};
use bluecarbon::core::state::persistent_state::SledRepository;
use bluecarbon::core::state::repository::{ComplianceRepository, RecordFilter};
use bluecarbon::core::types::{AuditAction, AuditEntry, ComplianceStatus};

fn audit(pid: &str, action: AuditAction, minutes: i64) -> AuditEntry {
    AuditEntry {
        log_id: format!("audit-{pid}-{minutes}"),
        project_id: pid.to_string(),
        action_type: action,
        performed_by_name: "Compliance Officer".into(),
        performed_by_role: "GOVERNMENT_OFFICER".into(),
        previous_status: ComplianceStatus::Compliant,
        new_status: ComplianceStatus::Frozen,
        reason: "test".into(),
        blockchain_tx_hash: Some(format!("0x{:064x}", minutes)),
        timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes),
    }
}

#[test]
fn records_alerts_and_audit_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_str().unwrap().to_string();
    let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
    let generator = FixtureGenerator::new(99, now);
    let records = generator.records(10);
    let alerts = generator.alerts(4, 10);

    {
        let repo = SledRepository::open(&path).unwrap();
        for r in &records {
            repo.put_record(r).unwrap();
        }
        for a in &alerts {
            repo.put_alert(a).unwrap();
        }
        let mut frozen = records[2].clone();
        frozen.compliance_status = ComplianceStatus::Frozen;
        frozen.credits_frozen = true;
        frozen.credits_revoked = false;
        repo.put_record_with_audit(&frozen, &[audit(&frozen.project_id, AuditAction::CreditsFrozen, 1)])
            .unwrap();
        repo.flush().unwrap();
    }

    let repo = SledRepository::open(&path).unwrap();
    assert_eq!(repo.record_count().unwrap(), 10);
    assert_eq!(repo.get_record("PRJ-0001").unwrap().unwrap(), records[0]);
    assert_eq!(
        repo.get_record("PRJ-0003").unwrap().unwrap().compliance_status,
        ComplianceStatus::Frozen
    );
    assert_eq!(repo.list_alerts().unwrap().len(), 4);
    assert_eq!(repo.get_alert("alert-1").unwrap().unwrap(), alerts[0]);

    let trail = repo.audit_for_project("PRJ-0003").unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action_type, AuditAction::CreditsFrozen);
    assert!(repo.get_record("PRJ-0404").unwrap().is_none());
}

#[test]
fn audit_is_scoped_per_project_and_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let repo = SledRepository::open(dir.path().to_str().unwrap()).unwrap();

    repo.append_audit(&audit("PRJ-0001", AuditAction::CreditsFrozen, 1)).unwrap();
    repo.append_audit(&audit("PRJ-0010", AuditAction::CreditsRevoked, 2)).unwrap();
    repo.append_audit(&audit("PRJ-0001", AuditAction::CreditsReactivated, 3)).unwrap();

    let trail = repo.audit_for_project("PRJ-0001").unwrap();
    let actions: Vec<AuditAction> = trail.iter().map(|e| e.action_type).collect();
    assert_eq!(actions, vec![AuditAction::CreditsReactivated, AuditAction::CreditsFrozen]);

    // `PRJ-0001/` must not pick up `PRJ-0010`.
    assert_eq!(repo.audit_for_project("PRJ-0010").unwrap().len(), 1);
}

#[test]
fn audit_keys_do_not_collide_on_slashes() {
    let dir = tempfile::tempdir().unwrap();
    let repo = SledRepository::open(dir.path().to_str().unwrap()).unwrap();

    repo.append_audit(&audit("A", AuditAction::CreditsFrozen, 1)).unwrap();
    repo.append_audit(&audit("A/B", AuditAction::CreditsRevoked, 2)).unwrap();
    repo.append_audit(&audit("A/B", AuditAction::CreditsReactivated, 3)).unwrap();

    let a = repo.audit_for_project("A").unwrap();
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].project_id, "A");
    let ab = repo.audit_for_project("A/B").unwrap();
    assert_eq!(ab.len(), 2);
    assert!(ab.iter().all(|e| e.project_id == "A/B"));
}

#[test]
fn oversized_items_are_refused_and_previous_value_kept() {
    let dir = tempfile::tempdir().unwrap();
    let repo = SledRepository::open(dir.path().to_str().unwrap()).unwrap();
    let original = FixtureGenerator::new(3, Utc::now()).records(1).remove(0);
    repo.put_record(&original).unwrap();

    let mut huge = original.clone();
    huge.flagged_reason = Some("x".repeat(70 * 1024));
    assert!(repo.put_record(&huge).is_err());
    assert!(repo.put_record_with_audit(&huge, &[]).is_err());
    assert_eq!(repo.get_record(&original.project_id).unwrap().unwrap(), original);
}

fn freeze_tx(pid: &str, nonce: u64) -> LedgerTransaction {
    LedgerTransaction {
        action: LedgerAction::Freeze,
        project_id: pid.to_string(),
        reason: "Audit hold".into(),
        issued_at_ms: 1_767_225_600_000 + nonce,
        nonce,
    }
}

#[tokio::test]
async fn ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("db");
    let key_path = dir.path().join("ledger.key");

    let (hashes, root) = {
        let repo = SledRepository::open(db_path.to_str().unwrap()).unwrap();
        let key: Arc<dyn SignerBackend> = Arc::new(FileEd25519Backend::load_or_create(&key_path).unwrap());
        let ledger = LocalLedger::open(key, std::time::Duration::ZERO, Arc::new(repo.clone())).unwrap();
        assert_eq!(ledger.height(), 0);
        let mut hashes = Vec::new();
        for (i, pid) in ["PRJ-0001", "PRJ-0002", "PRJ-0001"].into_iter().enumerate() {
            hashes.push(ledger.submit_transaction(&freeze_tx(pid, i as u64)).await.unwrap());
        }
        assert_eq!(repo.load_entries().unwrap().len(), 3);
        (hashes, ledger.root())
    };

    let repo = SledRepository::open(db_path.to_str().unwrap()).unwrap();
    let key: Arc<dyn SignerBackend> = Arc::new(FileEd25519Backend::load_or_create(&key_path).unwrap());
    let ledger = LocalLedger::open(key, std::time::Duration::ZERO, Arc::new(repo.clone())).unwrap();
    assert_eq!(ledger.height(), 3);
    assert_eq!(ledger.root(), root);
    let stored: Vec<_> = ledger.entries().into_iter().map(|e| e.tx_hash).collect();
    assert_eq!(stored, hashes);
    for h in &hashes {
        assert!(ledger.proof(h).unwrap().verified);
    }

    // Appends continue at the replayed height.
    let next = ledger.submit_transaction(&freeze_tx("PRJ-0003", 9)).await.unwrap();
    let entries = repo.load_entries().unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[3].tx_hash, next);

    // Entries signed by another key are refused.
    let stranger: Arc<dyn SignerBackend> = Arc::new(EphemeralEd25519Backend::generate().unwrap());
    assert!(matches!(
        LocalLedger::open(stranger, std::time::Duration::ZERO, Arc::new(repo)),
        Err(LedgerError::Corrupt(0))
    ));
}

#[test]
fn listing_is_ordered_and_filtered() {
    let dir = tempfile::tempdir().unwrap();
    let repo = SledRepository::open(dir.path().to_str().unwrap()).unwrap();
    let records = FixtureGenerator::new(5, Utc::now()).records(30);
    for r in records.iter().rev() {
        repo.put_record(r).unwrap();
    }

    let all = repo.list_records(&RecordFilter::default()).unwrap();
    let ids: Vec<&str> = all.iter().map(|r| r.project_id.as_str()).collect();
    let expected: Vec<&str> = records.iter().map(|r| r.project_id.as_str()).collect();
    assert_eq!(ids, expected);

    let revoked = repo.list_records(&RecordFilter::status("Revoked")).unwrap();
    assert!(revoked.iter().all(|r| r.credits_revoked && r.credits_frozen));
}
