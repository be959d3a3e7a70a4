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

//! BlueCarbon compliance service.
//!
//! This repository provides:
//! - Compliance classification of blue-carbon projects from NDVI and CO2 readings
//! - Credit lifecycle governance (freeze, revoke, reactivate) recorded on a signed ledger
//! - AI re-verification through a bounded job queue
//! - In-memory or sled-backed record storage with canonical encoding
//! - An axum HTTP surface, Prometheus metrics and structured logging

/// HTTP routes and handlers.
pub mod api;
/// Compliance primitives (types, rules, storage, ledger).
pub mod core;
/// Observability (metrics, structured logging).
pub mod monitoring;
