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

//! Credit lifecycle controller.
//!
//! ```text
//!   Compliant / Review Needed / Non-Compliant
//!        |  freeze                 ^
//!        v                         | reactivate
//!      Frozen  ---------------------
//!        |  revoke (from any state)
//!        v
//!     Revoked   (terminal)
//! ```
//!
//! Every accepted action is written to the ledger first. The record is only
//! mutated once the ledger returns a transaction id, and the transition is
//! checked again against the record as it is at that point.

use crate::core::compliance::{Actor, ComplianceError};
use crate::core::config::LedgerConfig;
use crate::core::ledger::{LedgerAction, LedgerClient, LedgerError, LedgerTransaction};
use crate::core::state::repository::ComplianceRepository;
use crate::core::types::{AuditAction, AuditEntry, ComplianceRecord, ComplianceStatus, TxHash};
use crate::monitoring::metrics::Metrics;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

const MISSING_INPUT: &str = "Project ID and reason are required";

/// Ledger retry schedule for transient failures.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// First backoff step.
    pub base: Duration,
    /// Largest backoff step.
    pub cap: Duration,
}

impl RetryPolicy {
    /// Policy from the `[ledger]` section.
    pub fn from_config(cfg: &LedgerConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base: Duration::from_millis(cfg.retry_backoff_ms),
            cap: Duration::from_millis(cfg.retry_backoff_max_ms),
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self { max_attempts: 1, base: Duration::ZERO, cap: Duration::ZERO }
    }

    /// Wait after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(backoff_ms(
            self.base.as_millis() as u64,
            self.cap.as_millis() as u64,
            attempt,
        ))
    }
}

fn backoff_ms(base: u64, cap: u64, attempt: u32) -> u64 {
    let pow = attempt.saturating_sub(1).min(16);
    let mut v = base.saturating_mul(1u64 << pow);
    if v > cap { v = cap; }
    v
}

/// Result of an accepted lifecycle action.
#[derive(Clone, Debug)]
pub struct LifecycleOutcome {
    /// Record after the transition.
    pub record: ComplianceRecord,
    /// Ledger transaction id.
    pub tx_hash: TxHash,
}

/// Operator-facing confirmation for a completed action.
pub fn success_message(action: LedgerAction) -> &'static str {
    match action {
        LedgerAction::Freeze => "Credits frozen successfully",
        LedgerAction::Revoke => "Credits revoked successfully",
        LedgerAction::Reactivate => "Credits reactivated successfully",
    }
}

fn audit_action(action: LedgerAction) -> AuditAction {
    match action {
        LedgerAction::Freeze => AuditAction::CreditsFrozen,
        LedgerAction::Revoke => AuditAction::CreditsRevoked,
        LedgerAction::Reactivate => AuditAction::CreditsReactivated,
    }
}

/// Whether `action` may be applied to `record` in its current state.
pub fn check_transition(action: LedgerAction, record: &ComplianceRecord) -> Result<(), ComplianceError> {
    match action {
        LedgerAction::Freeze if record.credits_revoked => {
            Err(ComplianceError::Conflict("Cannot freeze revoked credits".into()))
        }
        LedgerAction::Freeze | LedgerAction::Revoke => Ok(()),
        LedgerAction::Reactivate if record.credits_revoked => {
            Err(ComplianceError::Conflict("Cannot reactivate revoked credits".into()))
        }
        LedgerAction::Reactivate if !record.credits_frozen => {
            Err(ComplianceError::Conflict("Credits are not frozen".into()))
        }
        LedgerAction::Reactivate => Ok(()),
    }
}

fn apply_transition(action: LedgerAction, record: &mut ComplianceRecord) {
    match action {
        LedgerAction::Freeze => {
            record.credits_frozen = true;
            record.compliance_status = ComplianceStatus::Frozen;
        }
        LedgerAction::Revoke => {
            record.credits_frozen = true;
            record.credits_revoked = true;
            record.compliance_status = ComplianceStatus::Revoked;
        }
        LedgerAction::Reactivate => {
            record.credits_frozen = false;
            record.compliance_status = ComplianceStatus::Compliant;
        }
    }
}

/// Applies freeze / revoke / reactivate.
pub struct LifecycleController {
    repo: Arc<dyn ComplianceRepository>,
    ledger: Arc<dyn LedgerClient>,
    metrics: Arc<Metrics>,
    retry: RetryPolicy,
}

impl LifecycleController {
    /// New controller.
    pub fn new(
        repo: Arc<dyn ComplianceRepository>,
        ledger: Arc<dyn LedgerClient>,
        metrics: Arc<Metrics>,
        retry: RetryPolicy,
    ) -> Self {
        Self { repo, ledger, metrics, retry }
    }

    /// Suspend credits. Not allowed once revoked.
    pub async fn freeze(&self, project_id: &str, reason: &str) -> Result<LifecycleOutcome, ComplianceError> {
        self.apply(LedgerAction::Freeze, project_id, reason).await
    }

    /// Permanently cancel credits.
    pub async fn revoke(&self, project_id: &str, reason: &str) -> Result<LifecycleOutcome, ComplianceError> {
        self.apply(LedgerAction::Revoke, project_id, reason).await
    }

    /// Lift a freeze; the record returns to `Compliant`.
    pub async fn reactivate(&self, project_id: &str, reason: &str) -> Result<LifecycleOutcome, ComplianceError> {
        self.apply(LedgerAction::Reactivate, project_id, reason).await
    }

    fn load(&self, project_id: &str) -> Result<ComplianceRecord, ComplianceError> {
        match self.repo.get_record(project_id)? {
            Some(record) => Ok(record),
            None => Err(self.reject(ComplianceError::NotFound("Project not found".into()))),
        }
    }

    fn reject(&self, err: ComplianceError) -> ComplianceError {
        self.metrics.lifecycle_rejected_total.inc();
        err
    }

    async fn apply(
        &self,
        action: LedgerAction,
        project_id: &str,
        reason: &str,
    ) -> Result<LifecycleOutcome, ComplianceError> {
        let project_id = project_id.trim();
        let reason = reason.trim();
        if project_id.is_empty() || reason.is_empty() {
            return Err(self.reject(ComplianceError::Validation(MISSING_INPUT.into())));
        }

        let record = self.load(project_id)?;
        check_transition(action, &record).map_err(|e| self.reject(e))?;

        let tx = LedgerTransaction {
            action,
            project_id: project_id.to_string(),
            reason: reason.to_string(),
            issued_at_ms: Utc::now().timestamp_millis().max(0) as u64,
            nonce: rand::random(),
        };
        let tx_hash = self.submit_with_retry(&tx).await?;

        // State may have moved while the ledger was confirming.
        let mut record = self.load(project_id)?;
        if let Err(e) = check_transition(action, &record) {
            warn!(project = %project_id, action = %action, tx = %tx_hash, "transition no longer valid after ledger write");
            return Err(self.reject(e));
        }

        let previous_status = record.compliance_status;
        let now = Utc::now();
        apply_transition(action, &mut record);
        record.blockchain_tx_hash = Some(tx_hash.to_string());
        record.updated_at = now;

        let entry = AuditEntry {
            log_id: format!("audit-{}", Uuid::new_v4()),
            project_id: project_id.to_string(),
            action_type: audit_action(action),
            performed_by_name: Actor::OFFICER.name.to_string(),
            performed_by_role: Actor::OFFICER.role.to_string(),
            previous_status,
            new_status: record.compliance_status,
            reason: reason.to_string(),
            blockchain_tx_hash: Some(tx_hash.to_string()),
            timestamp: now,
        };
        self.repo.put_record_with_audit(&record, &[entry])?;

        self.metrics.lifecycle_actions_total.with_label_values(&[action.as_str()]).inc();
        info!(
            project = %project_id,
            action = %action,
            from = %previous_status,
            to = %record.compliance_status,
            tx = %tx_hash,
            "lifecycle action applied"
        );
        Ok(LifecycleOutcome { record, tx_hash })
    }

    async fn submit_with_retry(&self, tx: &LedgerTransaction) -> Result<TxHash, LedgerError> {
        let mut attempt: u32 = 1;
        loop {
            self.metrics.ledger_submissions_total.inc();
            match self.ledger.submit_transaction(tx).await {
                Ok(h) => return Ok(h),
                Err(e) => {
                    self.metrics.ledger_failures_total.inc();
                    if !e.is_retryable() || attempt >= self.retry.max_attempts {
                        warn!(project = %tx.project_id, action = %tx.action, attempt, err = %e, "ledger submission failed");
                        return Err(e);
                    }
                    let wait = self.retry.backoff(attempt);
                    warn!(project = %tx.project_id, attempt, wait_ms = wait.as_millis() as u64, "ledger unavailable, retrying");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}
