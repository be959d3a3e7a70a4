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

//! Read side: filtered listings, summaries, alerts, dashboard analytics.

use crate::core::compliance::classifier::round_to;
use crate::core::compliance::ComplianceError;
use crate::core::state::repository::{ComplianceRepository, RecordFilter};
use crate::core::types::{Alert, AlertStatus, AuditEntry, ComplianceRecord, ComplianceStatus, RiskLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counts over a set of records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ComplianceSummary {
    /// Records in the set.
    pub total_projects: usize,
    /// `Compliant` records.
    pub compliant_projects: usize,
    /// `Review Needed` records.
    pub review_needed: usize,
    /// `Non-Compliant` records.
    pub non_compliant: usize,
    /// Records with frozen credits (revoked included).
    pub frozen_credits: usize,
    /// Records with revoked credits.
    pub revoked_credits: usize,
}

/// Summarize `records`.
pub fn summarize(records: &[ComplianceRecord]) -> ComplianceSummary {
    let status = |s: ComplianceStatus| records.iter().filter(|r| r.compliance_status == s).count();
    ComplianceSummary {
        total_projects: records.len(),
        compliant_projects: status(ComplianceStatus::Compliant),
        review_needed: status(ComplianceStatus::ReviewNeeded),
        non_compliant: status(ComplianceStatus::NonCompliant),
        frozen_credits: records.iter().filter(|r| r.credits_frozen).count(),
        revoked_credits: records.iter().filter(|r| r.credits_revoked).count(),
    }
}

/// Filtered records plus the summary of exactly those records.
#[derive(Clone, Debug, Serialize)]
pub struct RecordListing {
    /// Summary over `compliance_records`.
    pub summary: ComplianceSummary,
    /// Matching records ordered by project id.
    pub compliance_records: Vec<ComplianceRecord>,
}

/// Records matching every filter, with their summary.
pub fn list_records(
    repo: &dyn ComplianceRepository,
    filter: &RecordFilter,
) -> Result<RecordListing, ComplianceError> {
    let compliance_records = repo.list_records(filter)?;
    Ok(RecordListing { summary: summarize(&compliance_records), compliance_records })
}

/// Active alerts, newest first.
pub fn list_active_alerts(repo: &dyn ComplianceRepository) -> Result<Vec<Alert>, ComplianceError> {
    Ok(repo
        .list_alerts()?
        .into_iter()
        .filter(|a| a.alert_status == AlertStatus::Active)
        .collect())
}

/// Mark an alert acknowledged. Acknowledging twice keeps the first timestamp.
pub fn acknowledge_alert(
    repo: &dyn ComplianceRepository,
    alert_id: &str,
    now: DateTime<Utc>,
) -> Result<Alert, ComplianceError> {
    let mut alert = repo
        .get_alert(alert_id)?
        .ok_or_else(|| ComplianceError::NotFound("Alert not found".into()))?;
    if alert.alert_status == AlertStatus::Acknowledged {
        return Ok(alert);
    }
    alert.alert_status = AlertStatus::Acknowledged;
    alert.acknowledged_at = Some(now);
    repo.put_alert(&alert)?;
    Ok(alert)
}

/// One record with its audit trail.
#[derive(Clone, Debug, Serialize)]
pub struct ProjectDetail {
    /// The record.
    pub compliance_record: ComplianceRecord,
    /// Audit trail, newest first.
    pub audit_log: Vec<AuditEntry>,
}

/// Record and audit trail of one project.
pub fn project_detail(
    repo: &dyn ComplianceRepository,
    project_id: &str,
) -> Result<ProjectDetail, ComplianceError> {
    let compliance_record = repo
        .get_record(project_id)?
        .ok_or_else(|| ComplianceError::NotFound("Compliance record not found".into()))?;
    let audit_log = repo.audit_for_project(project_id)?;
    Ok(ProjectDetail { compliance_record, audit_log })
}

/// Dashboard figures over all records.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OverviewAnalytics {
    /// Records under monitoring.
    pub total_monitored_projects: usize,
    /// Share of `Compliant` records in percent, two decimals.
    pub compliance_rate: f64,
    /// Mean compliance score, three decimals.
    pub average_compliance_score: f64,
    /// Records at `High` or `Critical` risk.
    pub projects_at_risk: usize,
    /// Records with NDVI below -10% or CO2 below -15%.
    pub recent_degradations: usize,
}

/// Compute dashboard figures. An empty store yields all zeros.
pub fn overview_of(records: &[ComplianceRecord]) -> OverviewAnalytics {
    if records.is_empty() {
        return OverviewAnalytics::default();
    }
    let n = records.len() as f64;
    let compliant = records
        .iter()
        .filter(|r| r.compliance_status == ComplianceStatus::Compliant)
        .count() as f64;
    let score_sum: f64 = records.iter().map(|r| r.compliance_score).sum();

    OverviewAnalytics {
        total_monitored_projects: records.len(),
        compliance_rate: round_to(compliant / n * 100.0, 2),
        average_compliance_score: round_to(score_sum / n, 3),
        projects_at_risk: records
            .iter()
            .filter(|r| matches!(r.risk_level, RiskLevel::High | RiskLevel::Critical))
            .count(),
        recent_degradations: records
            .iter()
            .filter(|r| r.ndvi_change_percent < -10.0 || r.co2_change_percent < -15.0)
            .count(),
    }
}

/// Dashboard figures read from the store.
pub fn overview(repo: &dyn ComplianceRepository) -> Result<OverviewAnalytics, ComplianceError> {
    let records = repo.list_records(&RecordFilter::default())?;
    Ok(overview_of(&records))
}
