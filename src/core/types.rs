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

//! Compliance domain types and canonical encoding helpers.

use bincode::Options;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Canonical serialization error.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("serialization")]
    Serialize,
    #[error("deserialization")]
    Deserialize,
    #[error("size limit exceeded")]
    TooLarge,
}

/// Canonical bincode options (deterministic).
fn bincode_opts() -> impl Options {
    // Fixint encoding provides a stable integer representation.
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encode with deterministic rules.
pub fn encode_canonical<T: Serialize>(v: &T) -> Result<Vec<u8>, CodecError> {
    bincode_opts()
        .serialize(v)
        .map_err(|_| CodecError::Serialize)
}

/// Decode with a hard size cap.
pub fn decode_canonical_limited<T: DeserializeOwned>(
    bytes: &[u8],
    max: usize,
) -> Result<T, CodecError> {
    if bytes.len() > max {
        return Err(CodecError::TooLarge);
    }
    // The limit also bounds container lengths claimed inside the payload.
    bincode_opts()
        .with_limit(max as u64)
        .deserialize(bytes)
        .map_err(|_| CodecError::Deserialize)
}

/// Upper bound for a single encoded record, alert, or audit entry.
pub const MAX_ENCODED_ITEM: usize = 64 * 1024;

/// Compliance status of a monitored project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComplianceStatus {
    /// Within tolerated degradation.
    Compliant,
    /// Degradation warrants an inspection.
    #[serde(rename = "Review Needed")]
    ReviewNeeded,
    /// Degradation beyond tolerance.
    #[serde(rename = "Non-Compliant")]
    NonCompliant,
    /// Credits suspended by a lifecycle action.
    Frozen,
    /// Credits permanently cancelled.
    Revoked,
}

impl ComplianceStatus {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliant => "Compliant",
            Self::ReviewNeeded => "Review Needed",
            Self::NonCompliant => "Non-Compliant",
            Self::Frozen => "Frozen",
            Self::Revoked => "Revoked",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk level derived from degradation magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Degradation <= 8%.
    Low,
    /// Degradation in (8%, 15%].
    Medium,
    /// Degradation in (15%, 25%].
    High,
    /// Degradation > 25%.
    Critical,
}

impl RiskLevel {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-project monitoring snapshot used for credit governance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    /// Record identifier.
    pub id: String,
    /// Project identifier (unique key).
    pub project_id: String,
    /// Human-readable project title.
    pub project_title: String,
    /// Owning company identifier.
    pub company_id: String,
    /// Owning company name.
    pub company_name: String,
    /// Credits issued for the project.
    pub total_credits: u64,
    /// NDVI at verification time.
    pub baseline_ndvi: f64,
    /// Latest observed NDVI.
    pub current_ndvi: f64,
    /// CO2 sequestration at verification time (tons).
    pub baseline_co2_tons: f64,
    /// Latest observed CO2 sequestration (tons).
    pub current_co2_tons: f64,
    /// Signed NDVI change in percent.
    pub ndvi_change_percent: f64,
    /// Signed CO2 change in percent.
    pub co2_change_percent: f64,
    /// Signed area change in percent.
    pub area_change_percent: f64,
    /// Confidence reported by the AI verifier.
    pub ai_confidence_score: f64,
    /// Aggregate compliance score.
    pub compliance_score: f64,
    /// Current compliance status.
    pub compliance_status: ComplianceStatus,
    /// Current risk level.
    pub risk_level: RiskLevel,
    /// Credits are suspended.
    pub credits_frozen: bool,
    /// Credits are permanently cancelled (implies frozen).
    pub credits_revoked: bool,
    /// Last inspection time.
    pub last_inspection: DateTime<Utc>,
    /// Next scheduled inspection.
    pub next_inspection_due: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
    /// Degradation message when flagged.
    pub flagged_reason: Option<String>,
    /// Ledger transaction of the latest lifecycle action.
    pub blockchain_tx_hash: Option<String>,
}

impl ComplianceRecord {
    /// True if status and the frozen/revoked flags agree with each other.
    pub fn lifecycle_consistent(&self) -> bool {
        if self.credits_revoked && !self.credits_frozen {
            return false;
        }
        match self.compliance_status {
            ComplianceStatus::Revoked => self.credits_revoked,
            ComplianceStatus::Frozen => self.credits_frozen && !self.credits_revoked,
            _ => !self.credits_frozen,
        }
    }
}

/// Alert category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    /// NDVI fell below threshold.
    NdviThresholdBreach,
    /// CO2 sequestration dropped.
    Co2SignificantDrop,
    /// Project area shrank.
    AreaReductionDetected,
    /// AI confidence under minimum.
    AiConfidenceLow,
}

impl AlertType {
    /// All alert types.
    pub const ALL: [AlertType; 4] = [
        AlertType::NdviThresholdBreach,
        AlertType::Co2SignificantDrop,
        AlertType::AreaReductionDetected,
        AlertType::AiConfidenceLow,
    ];

    /// Display title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::NdviThresholdBreach => "NDVI Threshold Breach Detected",
            Self::Co2SignificantDrop => "Significant CO2 Drop Detected",
            Self::AreaReductionDetected => "Project Area Reduction Detected",
            Self::AiConfidenceLow => "Low AI Confidence Score",
        }
    }

    /// Display message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NdviThresholdBreach => "Vegetation health has declined below acceptable thresholds",
            Self::Co2SignificantDrop => "Carbon sequestration capacity has significantly decreased",
            Self::AreaReductionDetected => "Project area has been reduced beyond acceptable limits",
            Self::AiConfidenceLow => "AI analysis confidence is below minimum requirements",
        }
    }
}

/// Alert severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertSeverity {
    /// Medium.
    Medium,
    /// High.
    High,
    /// Critical.
    Critical,
}

/// Alert handling status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertStatus {
    /// Awaiting acknowledgement.
    Active,
    /// Seen by an operator.
    Acknowledged,
}

/// Compliance alert raised against a project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert identifier.
    pub alert_id: String,
    /// Referenced project.
    pub project_id: String,
    /// Category.
    pub alert_type: AlertType,
    /// Severity.
    pub severity: AlertSeverity,
    /// Title derived from the category.
    pub title: String,
    /// Message derived from the category.
    pub message: String,
    /// Handling status.
    pub alert_status: AlertStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Acknowledgement time.
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// New active alert with title and message taken from its type.
    pub fn new(
        alert_id: String,
        project_id: String,
        alert_type: AlertType,
        severity: AlertSeverity,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            alert_id,
            project_id,
            alert_type,
            severity,
            title: alert_type.title().to_string(),
            message: alert_type.message().to_string(),
            alert_status: AlertStatus::Active,
            created_at,
            acknowledged_at: None,
        }
    }
}

/// Audited action kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Credits frozen.
    CreditsFrozen,
    /// Credits revoked.
    CreditsRevoked,
    /// Credits reactivated.
    CreditsReactivated,
    /// AI re-verification finished.
    AiReverificationCompleted,
    /// Status changed as a result of re-verification.
    ComplianceStatusChanged,
}

/// One audit trail line for a project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry identifier.
    pub log_id: String,
    /// Project the entry belongs to.
    pub project_id: String,
    /// Action.
    pub action_type: AuditAction,
    /// Actor name.
    pub performed_by_name: String,
    /// Actor role.
    pub performed_by_role: String,
    /// Status before the action.
    pub previous_status: ComplianceStatus,
    /// Status after the action.
    pub new_status: ComplianceStatus,
    /// Operator or system reason.
    pub reason: String,
    /// Ledger transaction, if any.
    pub blockchain_tx_hash: Option<String>,
    /// Time of the action.
    pub timestamp: DateTime<Utc>,
}

/// Ed25519 signature bytes (expected 64).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

/// Ledger transaction identifier, rendered as `0x` followed by 64 hex digits.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    /// Build from a 32-byte digest.
    pub fn from_digest(d: &[u8; 32]) -> Self {
        Self(format!("0x{}", hex::encode(d)))
    }

    /// Parse `0x` followed by 64 hex digits. Case is normalized to lower.
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix("0x")?;
        let raw: [u8; 32] = hex::decode(digits).ok()?.try_into().ok()?;
        Some(Self::from_digest(&raw))
    }

    /// Hex string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digest bytes, if the string is well formed.
    pub fn digest(&self) -> Option<[u8; 32]> {
        let raw = hex::decode(self.0.strip_prefix("0x")?).ok()?;
        raw.try_into().ok()
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
