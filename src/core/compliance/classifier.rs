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

//! Status classifier: degradation magnitude -> compliance status and risk level.
//!
//! Bands (strict comparisons, first match wins):
//!
//! | max degradation | status          | risk     |
//! |-----------------|-----------------|----------|
//! | > 25%           | Non-Compliant   | Critical |
//! | > 15%           | Review Needed   | High     |
//! | > 8%            | Compliant       | Medium   |
//! | otherwise       | Compliant       | Low      |
//!
//! Classification uses the measured change. Stored percentages are rounded to
//! two decimals separately, so a change of 25.004% is Critical even though it
//! is persisted as 25.0.

use crate::core::types::{ComplianceStatus, RiskLevel};

/// Above this: Non-Compliant / Critical.
pub const CRITICAL_DEGRADATION_PCT: f64 = 25.0;
/// Above this: Review Needed / High.
pub const REVIEW_DEGRADATION_PCT: f64 = 15.0;
/// Above this: Medium risk.
pub const MEDIUM_DEGRADATION_PCT: f64 = 8.0;

/// Round half away from zero to `decimals` places.
pub fn round_to(v: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}

/// Decimals kept in measured changes. Trims division noise such as
/// `(0.6 - 0.8) / 0.8 * 100 = -25.000000000000007` without moving real values.
const MEASURE_DECIMALS: i32 = 9;

/// Decimals of persisted percentages.
pub const STORED_DECIMALS: i32 = 2;

/// Measured `(current - baseline) / baseline * 100`.
///
/// A zero or non-finite baseline (or a non-finite result) yields 0.
pub fn percent_change(baseline: f64, current: f64) -> f64 {
    if baseline == 0.0 || !baseline.is_finite() {
        return 0.0;
    }
    let pct = (current - baseline) / baseline * 100.0;
    if !pct.is_finite() {
        return 0.0;
    }
    round_to(pct, MEASURE_DECIMALS)
}

/// Measured percent changes of the two classified metrics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricChange {
    /// NDVI change in percent.
    pub ndvi_change_percent: f64,
    /// CO2 change in percent.
    pub co2_change_percent: f64,
}

impl MetricChange {
    /// Derive from baseline and current readings.
    pub fn derive(baseline_ndvi: f64, current_ndvi: f64, baseline_co2: f64, current_co2: f64) -> Self {
        Self {
            ndvi_change_percent: percent_change(baseline_ndvi, current_ndvi),
            co2_change_percent: percent_change(baseline_co2, current_co2),
        }
    }

    /// `max(|ndvi|, |co2|)`.
    pub fn max_degradation(&self) -> f64 {
        self.ndvi_change_percent.abs().max(self.co2_change_percent.abs())
    }

    /// The same change at storage precision.
    pub fn stored(&self) -> Self {
        Self {
            ndvi_change_percent: round_to(self.ndvi_change_percent, STORED_DECIMALS),
            co2_change_percent: round_to(self.co2_change_percent, STORED_DECIMALS),
        }
    }
}

/// Classifier output.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    /// Derived status (never Frozen or Revoked).
    pub status: ComplianceStatus,
    /// Derived risk.
    pub risk_level: RiskLevel,
    /// Magnitude the decision was based on.
    pub max_degradation: f64,
    /// Set when degradation exceeds the review threshold.
    pub flagged_reason: Option<String>,
}

/// Classify a metric change.
pub fn classify(change: &MetricChange) -> Classification {
    let max_degradation = change.max_degradation();

    let (status, risk_level) = if max_degradation > CRITICAL_DEGRADATION_PCT {
        (ComplianceStatus::NonCompliant, RiskLevel::Critical)
    } else if max_degradation > REVIEW_DEGRADATION_PCT {
        (ComplianceStatus::ReviewNeeded, RiskLevel::High)
    } else if max_degradation > MEDIUM_DEGRADATION_PCT {
        (ComplianceStatus::Compliant, RiskLevel::Medium)
    } else {
        (ComplianceStatus::Compliant, RiskLevel::Low)
    };

    let flagged_reason = (max_degradation > REVIEW_DEGRADATION_PCT)
        .then(|| format!("Degradation detected: {max_degradation:.1}%"));

    Classification { status, risk_level, max_degradation, flagged_reason }
}

/// Derive changes from raw readings and classify them.
pub fn classify_readings(
    baseline_ndvi: f64,
    current_ndvi: f64,
    baseline_co2: f64,
    current_co2: f64,
) -> (MetricChange, Classification) {
    let change = MetricChange::derive(baseline_ndvi, current_ndvi, baseline_co2, current_co2);
    let class = classify(&change);
    (change, class)
}
