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

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus")]
    Prom,
}

/// Metrics container.
#[derive(Clone)]
pub struct Metrics {
    /// Registry.
    pub registry: Registry,

    /// Records under monitoring.
    pub records_monitored: IntGauge,
    /// Alerts awaiting acknowledgement.
    pub alerts_active: IntGauge,

    /// Completed lifecycle actions by action.
    pub lifecycle_actions_total: IntCounterVec,
    /// Lifecycle requests refused by validation or state rules.
    pub lifecycle_rejected_total: IntCounter,

    /// Ledger submission attempts.
    pub ledger_submissions_total: IntCounter,
    /// Ledger attempts that failed.
    pub ledger_failures_total: IntCounter,

    /// Re-verification jobs accepted.
    pub reverify_queued_total: IntCounter,
    /// Re-verification jobs applied to a record.
    pub reverify_completed_total: IntCounter,
    /// Re-verification jobs that failed.
    pub reverify_failed_total: IntCounter,
}

fn counter(name: &str, help: &str) -> Result<IntCounter, MetricsError> {
    IntCounter::new(name, help).map_err(|_| MetricsError::Prom)
}

fn gauge(name: &str, help: &str) -> Result<IntGauge, MetricsError> {
    IntGauge::new(name, help).map_err(|_| MetricsError::Prom)
}

impl Metrics {
    /// Create and register metrics.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let records_monitored = gauge("bluecarbon_records_monitored", "Records under monitoring")?;
        let alerts_active = gauge("bluecarbon_alerts_active", "Alerts awaiting acknowledgement")?;
        let lifecycle_actions_total = IntCounterVec::new(
            Opts::new("bluecarbon_lifecycle_actions_total", "Completed lifecycle actions"),
            &["action"],
        )
        .map_err(|_| MetricsError::Prom)?;
        let lifecycle_rejected_total =
            counter("bluecarbon_lifecycle_rejected_total", "Refused lifecycle requests")?;
        let ledger_submissions_total =
            counter("bluecarbon_ledger_submissions_total", "Ledger submission attempts")?;
        let ledger_failures_total =
            counter("bluecarbon_ledger_failures_total", "Failed ledger submission attempts")?;
        let reverify_queued_total =
            counter("bluecarbon_reverify_queued_total", "Re-verification jobs accepted")?;
        let reverify_completed_total =
            counter("bluecarbon_reverify_completed_total", "Re-verification jobs completed")?;
        let reverify_failed_total =
            counter("bluecarbon_reverify_failed_total", "Re-verification jobs failed")?;

        registry
            .register(Box::new(records_monitored.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(alerts_active.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(lifecycle_actions_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(lifecycle_rejected_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(ledger_submissions_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(ledger_failures_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(reverify_queued_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(reverify_completed_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(reverify_failed_total.clone()))
            .map_err(|_| MetricsError::Prom)?;

        Ok(Self {
            registry,
            records_monitored,
            alerts_active,
            lifecycle_actions_total,
            lifecycle_rejected_total,
            ledger_submissions_total,
            ledger_failures_total,
            reverify_queued_total,
            reverify_completed_total,
            reverify_failed_total,
        })
    }

    /// Prometheus text exposition of the registry.
    pub fn render(&self) -> Result<String, MetricsError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|_| MetricsError::Prom)?;
        String::from_utf8(buf).map_err(|_| MetricsError::Prom)
    }
}
