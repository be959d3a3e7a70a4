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

//! Client for the external AI verification service.

use crate::core::config::VerifierConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Verifier errors.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("verifier returned status {0}")]
    Status(u16),
    #[error("verifier rejected request: {0}")]
    Rejected(String),
    #[error("decode response")]
    Decode,
}

/// GeoJSON polygon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPolygon {
    /// Always `Polygon`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Rings of `[lon, lat]` positions; the first ring is the outer boundary.
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

impl GeoPolygon {
    /// Closed polygon from an outer ring.
    pub fn from_ring(ring: Vec<[f64; 2]>) -> Self {
        Self { kind: "Polygon".to_string(), coordinates: vec![ring] }
    }
}

/// Request body of `POST /api/mrv/reverify`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VerifierRequest {
    /// Project to verify.
    pub project_id: String,
    /// Project boundary.
    pub coordinates: GeoPolygon,
    /// Ecosystem type, e.g. `mangrove_restoration`.
    pub project_type: String,
    /// NDVI at verification time.
    pub baseline_ndvi: f64,
    /// CO2 sequestration at verification time.
    pub baseline_co2_tons: f64,
    /// Area at verification time.
    pub baseline_area_hectares: f64,
    /// Why the check runs.
    pub reverification_type: String,
}

/// Response of `POST /api/mrv/reverify`.
///
/// Readings are required; a body without them fails to decode instead of
/// reading as zeros.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct VerifierResponse {
    /// Service-level success flag.
    pub success: bool,
    /// Observed NDVI.
    pub current_ndvi: f64,
    /// Observed CO2 sequestration.
    pub current_co2_tons: f64,
    /// Model confidence, 0-1.
    pub ai_confidence_score: f64,
    /// NDVI change against the submitted baseline.
    #[serde(default)]
    pub ndvi_change_percent: f64,
    /// CO2 change against the submitted baseline.
    #[serde(default)]
    pub co2_change_percent: f64,
    /// Area change against the submitted baseline.
    #[serde(default)]
    pub area_change_percent: f64,
    /// Service's own verdict.
    #[serde(default)]
    pub compliance_flag: Option<String>,
    /// Error or info text.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

impl VerifierResponse {
    /// Decode a response body. `success:false` is a rejection carrying the
    /// service's message; a successful body must carry every reading.
    pub fn from_json(body: &[u8]) -> Result<Self, VerifierError> {
        let envelope: Envelope = serde_json::from_slice(body).map_err(|_| VerifierError::Decode)?;
        if !envelope.success {
            let msg = envelope.message.unwrap_or_else(|| "verification failed".to_string());
            return Err(VerifierError::Rejected(msg));
        }
        serde_json::from_slice(body).map_err(|_| VerifierError::Decode)
    }
}

/// AI verification seam.
#[async_trait]
pub trait VerifierClient: Send + Sync {
    /// Run one re-verification.
    async fn reverify(&self, req: &VerifierRequest) -> Result<VerifierResponse, VerifierError>;
}

/// reqwest-backed verifier client.
#[derive(Clone)]
pub struct HttpVerifierClient {
    base: String,
    api_key: String,
    client: Client,
}

impl HttpVerifierClient {
    /// Build from the `[verifier]` section.
    pub fn new(cfg: &VerifierConfig) -> Result<Self, VerifierError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| VerifierError::Transport(e.to_string()))?;
        Ok(Self {
            base: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            client,
        })
    }
}

#[async_trait]
impl VerifierClient for HttpVerifierClient {
    async fn reverify(&self, req: &VerifierRequest) -> Result<VerifierResponse, VerifierError> {
        let url = format!("{}/api/mrv/reverify", self.base);
        let mut builder = self.client.post(&url).json(req);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| VerifierError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(VerifierError::Status(status.as_u16()));
        }
        let bytes = resp.bytes().await.map_err(|e| VerifierError::Transport(e.to_string()))?;
        VerifierResponse::from_json(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_without_readings_is_a_decode_error() {
        let err = VerifierResponse::from_json(br#"{"success":true}"#).unwrap_err();
        assert!(matches!(err, VerifierError::Decode));
        let err = VerifierResponse::from_json(br#"{"success":true,"current_ndvi":0.7}"#).unwrap_err();
        assert!(matches!(err, VerifierError::Decode));
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let body = br#"{"success":true,"current_ndvi":0.71,"current_co2_tons":120.5,"ai_confidence_score":0.9}"#;
        let resp = VerifierResponse::from_json(body).unwrap();
        assert_eq!(resp.current_ndvi, 0.71);
        assert_eq!(resp.area_change_percent, 0.0);
        assert!(resp.compliance_flag.is_none());
    }

    #[test]
    fn unsuccessful_body_is_a_rejection() {
        let err = VerifierResponse::from_json(br#"{"success":false,"message":"cloud cover"}"#).unwrap_err();
        assert!(matches!(err, VerifierError::Rejected(m) if m == "cloud cover"));
        assert!(matches!(VerifierResponse::from_json(b"not json"), Err(VerifierError::Decode)));
    }
}
