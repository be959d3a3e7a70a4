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

//! Create (or load) the ledger signing key and print its public key hex.
//!
//! Usage: `keygen [data_dir]` (default `data`). An existing key is never
//! overwritten.

use anyhow::{Context, Result};
use bluecarbon::core::security::keystore::{FileEd25519Backend, SignerBackend, LEDGER_KEY_FILE};
use std::path::PathBuf;

fn main() -> Result<()> {
    let data_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let key_path = PathBuf::from(&data_dir).join(LEDGER_KEY_FILE);
    let existed = key_path.exists();

    let backend = FileEd25519Backend::load_or_create(&key_path)
        .with_context(|| format!("ledger key at {}", key_path.display()))?;

    eprintln!(
        "{} {}",
        if existed { "loaded" } else { "created" },
        backend.path().display()
    );
    println!("{}", hex::encode(backend.public_key()));
    Ok(())
}
