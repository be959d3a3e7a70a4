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

//! Record store interface and the in-memory implementation.

use crate::core::types::{Alert, AuditEntry, ComplianceRecord};
use std::collections::BTreeMap;
use std::sync::RwLock;
use thiserror::Error;

/// State errors.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("db open")]
    DbOpen,
    #[error("db io")]
    DbIo,
    #[error("codec")]
    Codec,
    #[error("lock poisoned")]
    Lock,
}

/// Record filter. `None` matches everything; so does the sentinel `all`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Exact compliance status wire name.
    pub status: Option<String>,
    /// Exact risk level wire name.
    pub risk_level: Option<String>,
    /// Exact company identifier.
    pub company_id: Option<String>,
}

fn normalize(v: Option<&str>) -> Option<String> {
    match v.map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(s) => Some(s.to_string()),
    }
}

impl RecordFilter {
    /// Build from raw query values, dropping empty values and `all`.
    pub fn from_query(status: Option<&str>, risk_level: Option<&str>, company_id: Option<&str>) -> Self {
        Self {
            status: normalize(status),
            risk_level: normalize(risk_level),
            company_id: normalize(company_id),
        }
    }

    /// Filter on status only.
    pub fn status(status: &str) -> Self {
        Self::from_query(Some(status), None, None)
    }

    /// True if `r` passes every set filter.
    pub fn matches(&self, r: &ComplianceRecord) -> bool {
        self.status.as_deref().map_or(true, |s| r.compliance_status.as_str() == s)
            && self.risk_level.as_deref().map_or(true, |s| r.risk_level.as_str() == s)
            && self.company_id.as_deref().map_or(true, |s| r.company_id == s)
    }
}

/// Storage seam for compliance state.
///
/// Records are keyed by `project_id`, alerts by `alert_id`. Audit entries are
/// append-only and returned newest first.
pub trait ComplianceRepository: Send + Sync {
    /// Fetch one record.
    fn get_record(&self, project_id: &str) -> Result<Option<ComplianceRecord>, StateError>;
    /// Records passing `filter`, ordered by `project_id`.
    fn list_records(&self, filter: &RecordFilter) -> Result<Vec<ComplianceRecord>, StateError>;
    /// Insert or replace a record.
    fn put_record(&self, record: &ComplianceRecord) -> Result<(), StateError>;
    /// Number of stored records.
    fn record_count(&self) -> Result<usize, StateError>;

    /// Fetch one alert.
    fn get_alert(&self, alert_id: &str) -> Result<Option<Alert>, StateError>;
    /// All alerts, newest first.
    fn list_alerts(&self) -> Result<Vec<Alert>, StateError>;
    /// Insert or replace an alert.
    fn put_alert(&self, alert: &Alert) -> Result<(), StateError>;

    /// Append an audit entry.
    fn append_audit(&self, entry: &AuditEntry) -> Result<(), StateError>;
    /// Audit trail of one project, newest first.
    fn audit_for_project(&self, project_id: &str) -> Result<Vec<AuditEntry>, StateError>;

    /// Store a record together with its audit entries.
    fn put_record_with_audit(
        &self,
        record: &ComplianceRecord,
        entries: &[AuditEntry],
    ) -> Result<(), StateError> {
        self.put_record(record)?;
        for e in entries {
            self.append_audit(e)?;
        }
        Ok(())
    }
}

pub(crate) fn sort_alerts_newest_first(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.alert_id.cmp(&b.alert_id))
    });
}

#[derive(Default)]
struct Inner {
    records: BTreeMap<String, ComplianceRecord>,
    alerts: BTreeMap<String, Alert>,
    audit: BTreeMap<String, Vec<AuditEntry>>,
}

/// Process-local repository.
#[derive(Default)]
pub struct InMemoryRepository {
    inner: RwLock<Inner>,
}

impl InMemoryRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ComplianceRepository for InMemoryRepository {
    fn get_record(&self, project_id: &str) -> Result<Option<ComplianceRecord>, StateError> {
        let g = self.inner.read().map_err(|_| StateError::Lock)?;
        Ok(g.records.get(project_id).cloned())
    }

    fn list_records(&self, filter: &RecordFilter) -> Result<Vec<ComplianceRecord>, StateError> {
        let g = self.inner.read().map_err(|_| StateError::Lock)?;
        Ok(g.records.values().filter(|r| filter.matches(r)).cloned().collect())
    }

    fn put_record(&self, record: &ComplianceRecord) -> Result<(), StateError> {
        let mut g = self.inner.write().map_err(|_| StateError::Lock)?;
        g.records.insert(record.project_id.clone(), record.clone());
        Ok(())
    }

    fn record_count(&self) -> Result<usize, StateError> {
        let g = self.inner.read().map_err(|_| StateError::Lock)?;
        Ok(g.records.len())
    }

    fn get_alert(&self, alert_id: &str) -> Result<Option<Alert>, StateError> {
        let g = self.inner.read().map_err(|_| StateError::Lock)?;
        Ok(g.alerts.get(alert_id).cloned())
    }

    fn list_alerts(&self) -> Result<Vec<Alert>, StateError> {
        let g = self.inner.read().map_err(|_| StateError::Lock)?;
        let mut out: Vec<Alert> = g.alerts.values().cloned().collect();
        sort_alerts_newest_first(&mut out);
        Ok(out)
    }

    fn put_alert(&self, alert: &Alert) -> Result<(), StateError> {
        let mut g = self.inner.write().map_err(|_| StateError::Lock)?;
        g.alerts.insert(alert.alert_id.clone(), alert.clone());
        Ok(())
    }

    fn append_audit(&self, entry: &AuditEntry) -> Result<(), StateError> {
        let mut g = self.inner.write().map_err(|_| StateError::Lock)?;
        g.audit.entry(entry.project_id.clone()).or_default().push(entry.clone());
        Ok(())
    }

    fn audit_for_project(&self, project_id: &str) -> Result<Vec<AuditEntry>, StateError> {
        let g = self.inner.read().map_err(|_| StateError::Lock)?;
        Ok(g.audit
            .get(project_id)
            .map(|v| v.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    fn put_record_with_audit(
        &self,
        record: &ComplianceRecord,
        entries: &[AuditEntry],
    ) -> Result<(), StateError> {
        // Single write guard so readers never see the record without its trail.
        let mut g = self.inner.write().map_err(|_| StateError::Lock)?;
        g.records.insert(record.project_id.clone(), record.clone());
        let trail = g.audit.entry(record.project_id.clone()).or_default();
        trail.extend(entries.iter().cloned());
        Ok(())
    }
}
