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
#![allow(missing_docs)]

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::core::compliance::lifecycle::success_message;
use crate::core::compliance::query;
use crate::core::compliance::reverify::ESTIMATED_COMPLETION;
use crate::core::ledger::LedgerAction;
use crate::core::state::repository::RecordFilter;
use crate::core::types::TxHash;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

type ApiResult = Result<Json<Value>, ApiError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e.body_text())))
}

#[derive(Debug, Default, Deserialize)]
pub struct LifecycleReq {
    pub project_id: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReverifyReq {
    pub project_id: Option<String>,
    pub reverification_type: Option<String>,
    pub priority: Option<String>,
}

pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResult {
    let filter = RecordFilter::from_query(
        params.get("status").map(String::as_str),
        params.get("risk_level").map(String::as_str),
        params.get("company_id").map(String::as_str),
    );
    let listing = query::list_records(state.repo.as_ref(), &filter)
        .map_err(|e| ApiError::from_compliance(e, "Failed to fetch compliance records"))?;
    Ok(Json(json!({
        "success": true,
        "data": listing,
        "filters_applied": params,
    })))
}

pub async fn list_alerts(State(state): State<Arc<AppState>>) -> ApiResult {
    let alerts = query::list_active_alerts(state.repo.as_ref())
        .map_err(|e| ApiError::from_compliance(e, "Failed to fetch alerts"))?;
    Ok(Json(json!({
        "success": true,
        "total_count": alerts.len(),
        "alerts": alerts,
    })))
}

pub async fn acknowledge_alert(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<String>,
) -> ApiResult {
    let alert = query::acknowledge_alert(state.repo.as_ref(), &alert_id, Utc::now())
        .map_err(|e| ApiError::from_compliance(e, "Failed to acknowledge alert"))?;
    info!(alert = %alert_id, "alert acknowledged");
    Ok(Json(json!({
        "success": true,
        "message": "Alert acknowledged successfully",
        "alert": alert,
    })))
}

pub async fn reverify(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReverifyReq>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let job = state
        .reverify
        .submit(
            req.project_id.as_deref().unwrap_or_default(),
            req.reverification_type.as_deref(),
            req.priority.as_deref(),
        )
        .map_err(|e| ApiError::from_compliance(e, "Failed to trigger re-verification"))?;
    Ok(Json(json!({
        "success": true,
        "message": "AI re-verification triggered successfully",
        "queue_id": job.queue_id,
        "estimated_completion_time": ESTIMATED_COMPLETION,
    })))
}

pub async fn reverify_job(
    State(state): State<Arc<AppState>>,
    Path(queue_id): Path<String>,
) -> ApiResult {
    let job = state
        .reverify
        .job(&queue_id)
        .map_err(|e| ApiError::from_compliance(e, "Failed to fetch re-verification job"))?;
    Ok(Json(json!({ "success": true, "job": job })))
}

async fn lifecycle(
    state: &AppState,
    action: LedgerAction,
    payload: Result<Json<LifecycleReq>, JsonRejection>,
    context: &str,
) -> ApiResult {
    let req = body(payload)?;
    let project_id = req.project_id.unwrap_or_default();
    let reason = req.reason.unwrap_or_default();
    let ctl = &state.lifecycle;
    let outcome = match action {
        LedgerAction::Freeze => ctl.freeze(&project_id, &reason).await,
        LedgerAction::Revoke => ctl.revoke(&project_id, &reason).await,
        LedgerAction::Reactivate => ctl.reactivate(&project_id, &reason).await,
    }
    .map_err(|e| ApiError::from_compliance(e, context))?;

    Ok(Json(json!({
        "success": true,
        "message": success_message(action),
        "blockchain_tx_hash": outcome.tx_hash,
    })))
}

pub async fn freeze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LifecycleReq>, JsonRejection>,
) -> ApiResult {
    lifecycle(&state, LedgerAction::Freeze, payload, "Failed to freeze credits").await
}

pub async fn revoke(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LifecycleReq>, JsonRejection>,
) -> ApiResult {
    lifecycle(&state, LedgerAction::Revoke, payload, "Failed to revoke credits").await
}

pub async fn reactivate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LifecycleReq>, JsonRejection>,
) -> ApiResult {
    lifecycle(&state, LedgerAction::Reactivate, payload, "Failed to reactivate credits").await
}

pub async fn project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> ApiResult {
    let detail = query::project_detail(state.repo.as_ref(), &project_id)
        .map_err(|e| ApiError::from_compliance(e, "Failed to fetch project compliance data"))?;
    Ok(Json(json!({ "success": true, "data": detail })))
}

pub async fn overview(State(state): State<Arc<AppState>>) -> ApiResult {
    let overview = query::overview(state.repo.as_ref())
        .map_err(|e| ApiError::from_compliance(e, "Failed to fetch overview"))?;
    Ok(Json(json!({
        "success": true,
        "analytics": { "overview": overview },
    })))
}

pub async fn ledger(State(state): State<Arc<AppState>>) -> ApiResult {
    let status = state
        .ledger
        .status()
        .ok_or_else(|| ApiError::NotFound("Ledger status unavailable".into()))?;
    Ok(Json(json!({ "success": true, "ledger": status })))
}

pub async fn ledger_proof(
    State(state): State<Arc<AppState>>,
    Path(tx_hash): Path<String>,
) -> ApiResult {
    let tx_hash = TxHash::parse(tx_hash.trim())
        .ok_or_else(|| ApiError::BadRequest("Invalid transaction hash".into()))?;
    let proof = state
        .ledger
        .proof(&tx_hash)
        .ok_or_else(|| ApiError::NotFound("Transaction not found".into()))?;
    Ok(Json(json!({ "success": true, "proof": proof })))
}

pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult {
    let records = state
        .repo
        .record_count()
        .map_err(|e| ApiError::from_compliance(e.into(), "Health check failed"))?;
    Ok(Json(json!({
        "status": "ok",
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "records": records,
        "build": {
            "timestamp": option_env!("VERGEN_BUILD_TIMESTAMP"),
            "rustc": option_env!("VERGEN_RUSTC_SEMVER"),
        },
    })))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    if let Ok(n) = state.repo.record_count() {
        state.metrics.records_monitored.set(n as i64);
    }
    if let Ok(alerts) = query::list_active_alerts(state.repo.as_ref()) {
        state.metrics.alerts_active.set(alerts.len() as i64);
    }
    let text = state
        .metrics
        .render()
        .map_err(|_| ApiError::Internal("Failed to render metrics".into()))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response())
}
