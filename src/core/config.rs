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

//! Service configuration (TOML) with environment overrides.
//!
//! Every section is optional; a missing file means defaults throughout.
//!
//! ```text
//! [node]
//! name = "bluecarbon-compliance"
//! data_dir = "./data"
//!
//! [http]
//! listen_addr = "0.0.0.0:8000"
//!
//! [storage]
//! backend = "memory"      # or "sled" (stored under data_dir/compliance.db)
//! ```

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config")]
    Read,
    #[error("parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration root.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Node settings.
    pub node: NodeSettings,
    /// HTTP endpoint.
    pub http: HttpConfig,
    /// Record store.
    pub storage: StorageConfig,
    /// Ledger submission.
    pub ledger: LedgerConfig,
    /// External AI verifier.
    pub verifier: VerifierConfig,
    /// Demo data seeding.
    pub fixtures: FixtureConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Node settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// Human-readable name.
    pub name: String,
    /// Data directory (db + keys).
    pub data_dir: String,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self { name: "bluecarbon-compliance".to_string(), data_dir: "./data".to_string() }
    }
}

/// HTTP config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Listen address, e.g. 0.0.0.0:8000.
    pub listen_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { listen_addr: "0.0.0.0:8000".to_string() }
    }
}

/// Storage backend selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; lost on restart.
    Memory,
    /// sled database under the data directory.
    Sled,
}

/// Storage config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend.
    pub backend: StorageBackend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::Memory }
    }
}

/// Ledger submission config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Simulated confirmation latency of the local ledger.
    pub confirm_delay_ms: u64,
    /// Attempts per submission while the ledger reports itself unavailable.
    pub max_attempts: u32,
    /// Base backoff between attempts; doubles per attempt.
    pub retry_backoff_ms: u64,
    /// Cap for a single backoff step.
    pub retry_backoff_max_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            confirm_delay_ms: 2_000,
            max_attempts: 3,
            retry_backoff_ms: 250,
            retry_backoff_max_ms: 4_000,
        }
    }
}

/// AI verifier config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Base URL of the AI verification service.
    pub base_url: String,
    /// Bearer token presented to the service.
    pub api_key: String,
    /// Request timeout.
    pub timeout_ms: u64,
    /// Delay before a queued job is dispatched.
    pub delay_ms: u64,
    /// Jobs processed concurrently by the worker.
    pub max_concurrency: usize,
    /// Pending jobs accepted before submissions are refused.
    pub queue_capacity: usize,
    /// Finished jobs kept for polling before the oldest are dropped.
    pub job_retention: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            api_key: String::new(),
            timeout_ms: 30_000,
            delay_ms: 2_000,
            max_concurrency: 4,
            queue_capacity: 256,
            job_retention: 1024,
        }
    }
}

/// Fixture seeding config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Seed fixtures when the store is empty.
    pub enabled: bool,
    /// Master seed.
    pub seed: u64,
    /// Number of records.
    pub records: u32,
    /// Number of alerts.
    pub alerts: u32,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self { enabled: true, seed: 42, records: 25, alerts: 8 }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable compact lines.
    Compact,
}

/// Logging config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (overridden by `RUST_LOG`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl ServiceConfig {
    /// Parse from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from `path` if it exists, otherwise defaults; then apply env overrides and validate.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let mut cfg = if Path::new(path).exists() {
            let s = std::fs::read_to_string(path).map_err(|_| ConfigError::Read)?;
            Self::from_toml_str(&s)?
        } else {
            Self::default()
        };
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `BLUECARBON_*` environment overrides.
    pub fn apply_env(&mut self) {
        if let Some(v) = env_nonempty("BLUECARBON_HTTP_ADDR") {
            self.http.listen_addr = v;
        }
        if let Some(v) = env_nonempty("BLUECARBON_DATA_DIR") {
            self.node.data_dir = v;
        }
        if let Some(v) = env_nonempty("BLUECARBON_AI_SERVICE_URL") {
            self.verifier.base_url = v;
        }
        if let Some(v) = env_nonempty("BLUECARBON_AI_SERVICE_KEY") {
            self.verifier.api_key = v;
        }
        if let Some(seed) = env_nonempty("BLUECARBON_SEED").and_then(|v| v.parse().ok()) {
            self.fixtures.seed = seed;
        }
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        if self.ledger.max_attempts == 0 {
            return Err(ConfigError::Invalid("ledger.max_attempts must be >= 1".into()));
        }
        if self.verifier.max_concurrency == 0 {
            return Err(ConfigError::Invalid("verifier.max_concurrency must be >= 1".into()));
        }
        if self.verifier.queue_capacity == 0 {
            return Err(ConfigError::Invalid("verifier.queue_capacity must be >= 1".into()));
        }
        if self.verifier.job_retention == 0 {
            return Err(ConfigError::Invalid("verifier.job_retention must be >= 1".into()));
        }
        if self.verifier.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("verifier.base_url is empty".into()));
        }
        Ok(())
    }

    /// Parsed HTTP listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.http
            .listen_addr
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("http.listen_addr {}", self.http.listen_addr)))
    }
}
