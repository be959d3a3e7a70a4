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

//! BlueCarbon compliance service entrypoint (systemd-friendly).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bluecarbon::api::{self, AppState};
use bluecarbon::core::compliance::lifecycle::{LifecycleController, RetryPolicy};
use bluecarbon::core::compliance::reverify::{ReverifyQueue, ReverifyWorker};
use bluecarbon::core::config::{ServiceConfig, StorageBackend};
use bluecarbon::core::fixtures;
use bluecarbon::core::ledger::LocalLedger;
use bluecarbon::core::security::keystore::{EphemeralEd25519Backend, FileEd25519Backend, SignerBackend};
use bluecarbon::core::state::persistent_state::SledRepository;
use bluecarbon::core::state::repository::{ComplianceRepository, InMemoryRepository};
use bluecarbon::core::verifier::HttpVerifierClient;
use bluecarbon::monitoring::{logging, metrics::Metrics};
use chrono::Utc;
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = "config/bluecarbon.toml";

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(err = %e, "ctrl_c handler failed");
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var("BLUECARBON_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let cfg = ServiceConfig::load(&config_path).with_context(|| format!("config {config_path}"))?;
    logging::init(&cfg.logging);

    let metrics = Arc::new(Metrics::new()?);

    let confirm_delay = Duration::from_millis(cfg.ledger.confirm_delay_ms);
    let mut sled_repo: Option<SledRepository> = None;
    let (repo, ledger): (Arc<dyn ComplianceRepository>, Arc<LocalLedger>) = match cfg.storage.backend {
        StorageBackend::Memory => {
            let key: Arc<dyn SignerBackend> = Arc::new(EphemeralEd25519Backend::generate()?);
            (
                Arc::new(InMemoryRepository::new()) as Arc<dyn ComplianceRepository>,
                Arc::new(LocalLedger::new(key, confirm_delay)),
            )
        }
        StorageBackend::Sled => {
            let db_path = PathBuf::from(&cfg.node.data_dir).join("compliance.db");
            let db = SledRepository::open(&db_path.to_string_lossy())
                .with_context(|| format!("open {}", db_path.display()))?;
            sled_repo = Some(db.clone());
            let key: Arc<dyn SignerBackend> = Arc::new(FileEd25519Backend::open_in(&cfg.node.data_dir)?);
            let ledger = LocalLedger::open(key, confirm_delay, Arc::new(db.clone()))
                .context("replay ledger")?;
            (Arc::new(db) as Arc<dyn ComplianceRepository>, Arc::new(ledger))
        }
    };

    let seeded = fixtures::seed_if_empty(repo.as_ref(), &cfg.fixtures, Utc::now())?;
    if seeded == 0 {
        info!(records = repo.record_count()?, "using existing records");
    }

    info!(signer = %hex::encode(ledger.public_key()), height = ledger.height(), "ledger ready");

    let lifecycle = LifecycleController::new(
        repo.clone(),
        ledger.clone(),
        metrics.clone(),
        RetryPolicy::from_config(&cfg.ledger),
    );

    let (queue, rx) = ReverifyQueue::new(
        repo.clone(),
        metrics.clone(),
        cfg.verifier.queue_capacity,
        cfg.verifier.job_retention,
    );
    let verifier = Arc::new(HttpVerifierClient::new(&cfg.verifier)?);
    let worker = ReverifyWorker::new(
        queue.clone(),
        verifier,
        Duration::from_millis(cfg.verifier.delay_ms),
        cfg.verifier.max_concurrency,
    );
    let worker_task = tokio::spawn(worker.run(rx));

    let state = Arc::new(AppState {
        service_name: cfg.node.name.clone(),
        repo,
        ledger,
        lifecycle,
        reverify: queue,
        metrics,
    });
    let app = api::router(state);

    let addr = cfg.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, storage = ?cfg.storage.backend, verifier = %cfg.verifier.base_url, "bluecarbon compliance service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    worker_task.abort();
    if let Some(db) = sled_repo {
        db.flush()?;
    }
    info!("stopped");
    Ok(())
}
