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

//! HTTP surface.
//!
//! `/api/compliance/*` carries the compliance operations; `/health` and
//! `/metrics` sit at the root.

pub mod error;
pub mod handlers;

use crate::core::compliance::lifecycle::LifecycleController;
use crate::core::compliance::reverify::ReverifyQueue;
use crate::core::ledger::LedgerClient;
use crate::core::state::repository::ComplianceRepository;
use crate::monitoring::metrics::Metrics;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state.
pub struct AppState {
    /// Name reported by `/health`.
    pub service_name: String,
    /// Record store.
    pub repo: Arc<dyn ComplianceRepository>,
    /// Ledger, for status and inclusion proofs.
    pub ledger: Arc<dyn LedgerClient>,
    /// Freeze / revoke / reactivate.
    pub lifecycle: LifecycleController,
    /// Re-verification submissions and job lookups.
    pub reverify: Arc<ReverifyQueue>,
    /// Metrics registry.
    pub metrics: Arc<Metrics>,
}

/// Routes under `/api/compliance`.
pub fn compliance_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/all", get(handlers::list_records))
        .route("/alerts", get(handlers::list_alerts))
        .route("/alerts/:alert_id/acknowledge", post(handlers::acknowledge_alert))
        .route("/reverify", post(handlers::reverify))
        .route("/reverify/:queue_id", get(handlers::reverify_job))
        .route("/freeze", post(handlers::freeze))
        .route("/revoke", post(handlers::revoke))
        .route("/reactivate", post(handlers::reactivate))
        .route("/project/:project_id", get(handlers::project))
        .route("/overview", get(handlers::overview))
        .route("/ledger", get(handlers::ledger))
        .route("/ledger/:tx_hash/proof", get(handlers::ledger_proof))
}

/// Full application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/compliance", compliance_routes())
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
