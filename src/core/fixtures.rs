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

//! Seeded demo data.
//!
//! Records and alerts draw from separate PCG streams derived from one master
//! seed, so changing the alert count never changes the records. Output depends
//! only on `(seed, now, counts)`.

use crate::core::compliance::classifier::{classify_readings, round_to};
use crate::core::config::FixtureConfig;
use crate::core::state::repository::{ComplianceRepository, StateError};
use crate::core::types::{
    Alert, AlertSeverity, AlertStatus, AlertType, ComplianceRecord, ComplianceStatus,
};
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use tracing::info;

const COMPANIES: [&str; 5] = [
    "EcoTech Solutions",
    "Green Future Corp",
    "Ocean Guardians Ltd",
    "Blue Planet Inc",
    "Coastal Restoration Co",
];

const SEVERITIES: [AlertSeverity; 3] = [AlertSeverity::High, AlertSeverity::Critical, AlertSeverity::Medium];

const RECORD_STREAM: u64 = 1;
const ALERT_STREAM: u64 = 2;

fn stream(master_seed: u64, index: u64) -> Pcg64Mcg {
    Pcg64Mcg::seed_from_u64(master_seed ^ index.wrapping_mul(0x9e37_79b9_7f4a_7c15))
}

fn millis(days: f64) -> Duration {
    Duration::milliseconds((days * 24.0 * 60.0 * 60.0 * 1000.0) as i64)
}

/// `PRJ-0007` style project id.
pub fn project_id(i: u32) -> String {
    format!("PRJ-{i:04}")
}

/// Deterministic generator of demo records and alerts.
pub struct FixtureGenerator {
    seed: u64,
    now: DateTime<Utc>,
}

impl FixtureGenerator {
    /// Generator for `seed` with all timestamps relative to `now`.
    pub fn new(seed: u64, now: DateTime<Utc>) -> Self {
        Self { seed, now }
    }

    /// `count` records, `PRJ-0001` upward.
    pub fn records(&self, count: u32) -> Vec<ComplianceRecord> {
        let mut rng = stream(self.seed, RECORD_STREAM);
        (1..=count).map(|i| self.record(&mut rng, i)).collect()
    }

    fn record(&self, rng: &mut Pcg64Mcg, i: u32) -> ComplianceRecord {
        let baseline_ndvi = round_to(rng.gen_range(0.7..0.9), 4);
        let current_ndvi = round_to(baseline_ndvi * rng.gen_range(0.8..1.2), 4);
        let baseline_co2 = round_to(rng.gen_range(50.0..250.0), 2);
        let current_co2 = round_to(baseline_co2 * rng.gen_range(0.7..1.3), 2);

        let (change, class) = classify_readings(baseline_ndvi, current_ndvi, baseline_co2, current_co2);

        let mut status = class.status;
        if rng.gen::<f64>() > 0.85 {
            status = if rng.gen_bool(0.5) { ComplianceStatus::Frozen } else { ComplianceStatus::Revoked };
        }

        let last_inspection = self.now - Duration::days(rng.gen_range(0..90));
        let next_inspection_due = self.now + millis(rng.gen_range(0.0..120.0));
        let company = rng.gen_range(0..COMPANIES.len());

        ComplianceRecord {
            id: format!("compliance-{i}"),
            project_id: project_id(i),
            project_title: format!("Blue Carbon Project {i}"),
            company_id: format!("company-{}", company + 1),
            company_name: COMPANIES[company].to_string(),
            total_credits: baseline_co2.floor() as u64,
            baseline_ndvi,
            current_ndvi,
            baseline_co2_tons: baseline_co2,
            current_co2_tons: current_co2,
            ndvi_change_percent: change.stored().ndvi_change_percent,
            co2_change_percent: change.stored().co2_change_percent,
            area_change_percent: round_to(rng.gen_range(-10.0..10.0), 2),
            ai_confidence_score: round_to(rng.gen_range(0.6..1.0), 4),
            compliance_score: round_to(rng.gen_range(0.5..1.0), 4),
            compliance_status: status,
            risk_level: class.risk_level,
            credits_frozen: matches!(status, ComplianceStatus::Frozen | ComplianceStatus::Revoked),
            credits_revoked: status == ComplianceStatus::Revoked,
            last_inspection,
            next_inspection_due,
            created_at: self.now - millis(rng.gen_range(0.0..180.0)),
            updated_at: self.now,
            flagged_reason: class.flagged_reason,
            blockchain_tx_hash: None,
        }
    }

    /// `count` alerts against projects `1..=record_count`.
    pub fn alerts(&self, count: u32, record_count: u32) -> Vec<Alert> {
        let mut rng = stream(self.seed, ALERT_STREAM);
        let span = record_count.max(1);
        (1..=count)
            .map(|i| {
                let alert_type = AlertType::ALL[rng.gen_range(0..AlertType::ALL.len())];
                let severity = SEVERITIES[rng.gen_range(0..SEVERITIES.len())];
                let project = project_id(rng.gen_range(1..=span));
                let created_at = self.now - millis(rng.gen_range(0.0..7.0));
                let mut alert = Alert::new(format!("alert-{i}"), project, alert_type, severity, created_at);
                if rng.gen::<f64>() <= 0.3 {
                    alert.alert_status = AlertStatus::Acknowledged;
                    alert.acknowledged_at = Some((created_at + Duration::hours(1)).min(self.now));
                }
                alert
            })
            .collect()
    }
}

/// Seed `repo` when it holds no records. Returns the number of records written.
pub fn seed_if_empty(
    repo: &dyn ComplianceRepository,
    cfg: &FixtureConfig,
    now: DateTime<Utc>,
) -> Result<usize, StateError> {
    if !cfg.enabled || repo.record_count()? > 0 {
        return Ok(0);
    }
    let generator = FixtureGenerator::new(cfg.seed, now);
    let records = generator.records(cfg.records);
    for r in &records {
        repo.put_record(r)?;
    }
    for a in generator.alerts(cfg.alerts, cfg.records) {
        repo.put_alert(&a)?;
    }
    info!(seed = cfg.seed, records = records.len(), alerts = cfg.alerts, "fixtures seeded");
    Ok(records.len())
}
