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

//! AI re-verification queue.
//!
//! `submit` records a job and hands its id to a bounded channel. The worker
//! waits the configured delay, asks the verifier for fresh readings, and
//! reclassifies the record against its own baselines. Jobs stay pollable
//! after they finish.

use crate::core::compliance::classifier::{classify_readings, round_to, Classification, STORED_DECIMALS};
use crate::core::compliance::{Actor, ComplianceError};
use crate::core::state::repository::{ComplianceRepository, StateError};
use crate::core::types::{AuditAction, AuditEntry, ComplianceRecord, ComplianceStatus, RiskLevel};
use crate::core::verifier::{GeoPolygon, VerifierClient, VerifierRequest, VerifierResponse};
use crate::monitoring::metrics::Metrics;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Shown to callers when a job is accepted.
pub const ESTIMATED_COMPLETION: &str = "10-15 minutes";

const PROJECT_TYPE: &str = "mangrove_restoration";
const BASELINE_AREA_HECTARES: f64 = 10.0;

/// Why a re-verification runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReverificationType {
    /// Operator request.
    #[default]
    Manual,
    /// Periodic inspection.
    Scheduled,
    /// Metrics crossed a threshold.
    ThresholdBreach,
    /// Raised from an alert.
    AlertTriggered,
}

impl ReverificationType {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Scheduled => "SCHEDULED",
            Self::ThresholdBreach => "THRESHOLD_BREACH",
            Self::AlertTriggered => "ALERT_TRIGGERED",
        }
    }

    /// Parse an optional wire name; absent or empty means `MANUAL`.
    pub fn parse(raw: Option<&str>) -> Result<Self, ComplianceError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::Manual),
            Some(s) => [Self::Manual, Self::Scheduled, Self::ThresholdBreach, Self::AlertTriggered]
                .into_iter()
                .find(|t| t.as_str().eq_ignore_ascii_case(s))
                .ok_or_else(|| ComplianceError::Validation(format!("Unknown reverification_type: {s}"))),
        }
    }
}

/// Job state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for the worker.
    Queued,
    /// Verifier call in flight.
    Running,
    /// Record updated.
    Completed,
    /// Verifier or store failed; record unchanged.
    Failed,
}

/// Pollable job record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReverifyJob {
    /// Queue id returned on submission.
    pub queue_id: String,
    /// Project under re-verification.
    pub project_id: String,
    /// Trigger.
    pub reverification_type: ReverificationType,
    /// Free-form priority tag.
    pub priority: String,
    /// State.
    pub status: JobStatus,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
    /// Completion or failure time.
    pub finished_at: Option<DateTime<Utc>>,
    /// Failure reason.
    pub error: Option<String>,
    /// Record status after completion.
    pub resulting_status: Option<ComplianceStatus>,
    /// Record risk after completion.
    pub resulting_risk: Option<RiskLevel>,
}

/// Apply fresh readings to `record` and return the classification used.
///
/// Frozen and revoked records keep their status and credit flags; only the
/// metrics, risk and flag reason move.
pub fn apply_verification(
    record: &mut ComplianceRecord,
    resp: &VerifierResponse,
    now: DateTime<Utc>,
) -> Classification {
    let (change, class) = classify_readings(
        record.baseline_ndvi,
        resp.current_ndvi,
        record.baseline_co2_tons,
        resp.current_co2_tons,
    );

    record.current_ndvi = resp.current_ndvi;
    record.current_co2_tons = resp.current_co2_tons;
    let stored = change.stored();
    record.ndvi_change_percent = stored.ndvi_change_percent;
    record.co2_change_percent = stored.co2_change_percent;
    record.area_change_percent = round_to(resp.area_change_percent, STORED_DECIMALS);
    record.ai_confidence_score = resp.ai_confidence_score;
    record.risk_level = class.risk_level;
    record.flagged_reason = class.flagged_reason.clone();
    record.last_inspection = now;
    record.updated_at = now;
    if !record.credits_frozen {
        record.compliance_status = class.status;
    }
    class
}

fn request_for(record: &ComplianceRecord, kind: ReverificationType) -> VerifierRequest {
    VerifierRequest {
        project_id: record.project_id.clone(),
        coordinates: GeoPolygon::from_ring(vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
            [0.0, 0.0],
        ]),
        project_type: PROJECT_TYPE.to_string(),
        baseline_ndvi: record.baseline_ndvi,
        baseline_co2_tons: record.baseline_co2_tons,
        baseline_area_hectares: BASELINE_AREA_HECTARES,
        reverification_type: kind.as_str().to_string(),
    }
}

fn audit(
    record: &ComplianceRecord,
    action: AuditAction,
    actor: Actor,
    previous_status: ComplianceStatus,
    reason: String,
    now: DateTime<Utc>,
) -> AuditEntry {
    AuditEntry {
        log_id: format!("audit-{}", Uuid::new_v4()),
        project_id: record.project_id.clone(),
        action_type: action,
        performed_by_name: actor.name.to_string(),
        performed_by_role: actor.role.to_string(),
        previous_status,
        new_status: record.compliance_status,
        reason,
        blockchain_tx_hash: None,
        timestamp: now,
    }
}

#[derive(Default)]
struct JobTable {
    jobs: BTreeMap<String, ReverifyJob>,
    finished: VecDeque<String>,
}

/// Job registry and submission side of the channel.
///
/// Finished jobs stay pollable until `retention` newer ones have finished.
pub struct ReverifyQueue {
    repo: Arc<dyn ComplianceRepository>,
    metrics: Arc<Metrics>,
    table: RwLock<JobTable>,
    retention: usize,
    tx: mpsc::Sender<String>,
}

impl ReverifyQueue {
    /// New queue holding at most `capacity` pending jobs and `retention`
    /// finished ones. The receiver goes to [`ReverifyWorker::run`].
    pub fn new(
        repo: Arc<dyn ComplianceRepository>,
        metrics: Arc<Metrics>,
        capacity: usize,
        retention: usize,
    ) -> (Arc<Self>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let q = Self {
            repo,
            metrics,
            table: RwLock::new(JobTable::default()),
            retention: retention.max(1),
            tx,
        };
        (Arc::new(q), rx)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, JobTable>, ComplianceError> {
        self.table.write().map_err(|_| ComplianceError::Storage(StateError::Lock))
    }

    /// Accept a job for an existing project.
    pub fn submit(
        &self,
        project_id: &str,
        reverification_type: Option<&str>,
        priority: Option<&str>,
    ) -> Result<ReverifyJob, ComplianceError> {
        let project_id = project_id.trim();
        if project_id.is_empty() {
            return Err(ComplianceError::Validation("Project ID is required".into()));
        }
        let kind = ReverificationType::parse(reverification_type)?;
        if self.repo.get_record(project_id)?.is_none() {
            return Err(ComplianceError::NotFound("Project not found".into()));
        }

        let job = ReverifyJob {
            queue_id: format!("queue-{}", Uuid::new_v4().simple()),
            project_id: project_id.to_string(),
            reverification_type: kind,
            priority: priority
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .unwrap_or("normal")
                .to_string(),
            status: JobStatus::Queued,
            submitted_at: Utc::now(),
            finished_at: None,
            error: None,
            resulting_status: None,
            resulting_risk: None,
        };

        self.write()?.jobs.insert(job.queue_id.clone(), job.clone());
        if self.tx.try_send(job.queue_id.clone()).is_err() {
            self.write()?.jobs.remove(&job.queue_id);
            warn!(project = %project_id, "re-verification queue full");
            return Err(ComplianceError::QueueFull);
        }

        self.metrics.reverify_queued_total.inc();
        info!(project = %project_id, queue_id = %job.queue_id, kind = kind.as_str(), "re-verification queued");
        Ok(job)
    }

    /// Current state of a job.
    pub fn job(&self, queue_id: &str) -> Result<ReverifyJob, ComplianceError> {
        self.table
            .read()
            .map_err(|_| ComplianceError::Storage(StateError::Lock))?
            .jobs
            .get(queue_id)
            .cloned()
            .ok_or_else(|| ComplianceError::NotFound("Job not found".into()))
    }

    fn update(&self, queue_id: &str, f: impl FnOnce(&mut ReverifyJob)) -> Option<ReverifyJob> {
        let mut g = self.table.write().ok()?;
        let job = g.jobs.get_mut(queue_id)?;
        f(job);
        Some(job.clone())
    }

    /// Apply the terminal update and evict the oldest finished jobs past retention.
    fn finish(&self, queue_id: &str, f: impl FnOnce(&mut ReverifyJob)) {
        let Ok(mut g) = self.table.write() else {
            return;
        };
        let Some(job) = g.jobs.get_mut(queue_id) else {
            return;
        };
        f(job);
        g.finished.push_back(queue_id.to_string());
        while g.finished.len() > self.retention {
            if let Some(old) = g.finished.pop_front() {
                g.jobs.remove(&old);
            }
        }
    }

    fn fail(&self, queue_id: &str, project_id: &str, error: String) {
        warn!(project = %project_id, queue_id = %queue_id, err = %error, "re-verification failed");
        self.metrics.reverify_failed_total.inc();
        self.finish(queue_id, |j| {
            j.status = JobStatus::Failed;
            j.finished_at = Some(Utc::now());
            j.error = Some(error);
        });
    }
}

/// Drains the queue and talks to the verifier.
pub struct ReverifyWorker {
    queue: Arc<ReverifyQueue>,
    verifier: Arc<dyn VerifierClient>,
    delay: Duration,
    max_concurrency: usize,
}

impl ReverifyWorker {
    /// New worker.
    pub fn new(
        queue: Arc<ReverifyQueue>,
        verifier: Arc<dyn VerifierClient>,
        delay: Duration,
        max_concurrency: usize,
    ) -> Self {
        Self { queue, verifier, delay, max_concurrency: max_concurrency.max(1) }
    }

    /// Run until every sender is dropped.
    pub async fn run(self, rx: mpsc::Receiver<String>) {
        let jobs = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|id| (id, rx))
        });
        jobs.for_each_concurrent(self.max_concurrency, |queue_id| {
            let this = &self;
            async move { this.process(&queue_id).await }
        })
        .await;
        info!("re-verification worker stopped");
    }

    async fn process(&self, queue_id: &str) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let Some(job) = self.queue.update(queue_id, |j| j.status = JobStatus::Running) else {
            return;
        };

        let record = match self.queue.repo.get_record(&job.project_id) {
            Ok(Some(r)) => r,
            Ok(None) => return self.queue.fail(queue_id, &job.project_id, "Project not found".into()),
            Err(e) => return self.queue.fail(queue_id, &job.project_id, e.to_string()),
        };

        let resp = match self.verifier.reverify(&request_for(&record, job.reverification_type)).await {
            Ok(r) => r,
            Err(e) => return self.queue.fail(queue_id, &job.project_id, e.to_string()),
        };

        // Re-read: a lifecycle action may have landed during the call.
        let mut record = match self.queue.repo.get_record(&job.project_id) {
            Ok(Some(r)) => r,
            Ok(None) => return self.queue.fail(queue_id, &job.project_id, "Project not found".into()),
            Err(e) => return self.queue.fail(queue_id, &job.project_id, e.to_string()),
        };

        let now = Utc::now();
        let previous_status = record.compliance_status;
        let class = apply_verification(&mut record, &resp, now);

        let mut entries = vec![audit(
            &record,
            AuditAction::AiReverificationCompleted,
            Actor::AI_SERVICE,
            previous_status,
            format!("{} re-verification completed", job.reverification_type.as_str()),
            now,
        )];
        if record.compliance_status != previous_status {
            entries.push(audit(
                &record,
                AuditAction::ComplianceStatusChanged,
                Actor::SYSTEM,
                previous_status,
                "Status updated based on AI analysis".to_string(),
                now,
            ));
        }

        if let Err(e) = self.queue.repo.put_record_with_audit(&record, &entries) {
            return self.queue.fail(queue_id, &job.project_id, e.to_string());
        }

        self.queue.metrics.reverify_completed_total.inc();
        self.queue.finish(queue_id, |j| {
            j.status = JobStatus::Completed;
            j.finished_at = Some(now);
            j.resulting_status = Some(record.compliance_status);
            j.resulting_risk = Some(record.risk_level);
        });
        info!(
            project = %job.project_id,
            queue_id = %queue_id,
            status = %record.compliance_status,
            risk = %record.risk_level,
            max_degradation = class.max_degradation,
            "re-verification completed"
        );
    }
}
