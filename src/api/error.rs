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

//! HTTP error shape: `{"success": false, "message": ...}`.

use crate::core::compliance::ComplianceError;
use crate::core::ledger::LedgerError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// Error returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    /// 400.
    BadRequest(String),
    /// 404.
    NotFound(String),
    /// 503.
    Unavailable(String),
    /// 500. The message is generic; details go to the log.
    Internal(String),
}

impl ApiError {
    /// Map a domain error. `context` is the client-facing message for
    /// internal failures, e.g. "Failed to freeze credits".
    pub fn from_compliance(err: ComplianceError, context: &str) -> Self {
        match err {
            ComplianceError::Validation(m) | ComplianceError::Conflict(m) => Self::BadRequest(m),
            ComplianceError::NotFound(m) => Self::NotFound(m),
            ComplianceError::QueueFull => {
                Self::Unavailable("Re-verification queue is full, try again later".into())
            }
            ComplianceError::Ledger(LedgerError::Rejected(m)) => {
                Self::BadRequest(format!("Ledger rejected transaction: {m}"))
            }
            other => {
                error!(err = %other, "{context}");
                Self::Internal(context.to_string())
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::BadRequest(m) | Self::NotFound(m) | Self::Unavailable(m) | Self::Internal(m) => m,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "success": false, "message": self.message() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::repository::StateError;

    #[test]
    fn full_queue_is_503_and_lock_failure_is_500() {
        let full = ApiError::from_compliance(ComplianceError::QueueFull, "Failed to queue re-verification");
        assert_eq!(full.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(full.message(), "Re-verification queue is full, try again later");

        let lock = ApiError::from_compliance(
            ComplianceError::Storage(StateError::Lock),
            "Failed to queue re-verification",
        );
        assert_eq!(lock.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(lock.message(), "Failed to queue re-verification");
    }

    #[test]
    fn ledger_rejection_is_400() {
        let e = ApiError::from_compliance(
            ComplianceError::Ledger(LedgerError::Rejected("bad nonce".into())),
            "Failed to freeze credits",
        );
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.message(), "Ledger rejected transaction: bad nonce");
    }
}
