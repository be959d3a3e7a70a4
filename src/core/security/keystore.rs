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
#![deny(missing_docs)]

//! Ledger signing keys.
//!
//! The service signs every ledger transaction it submits. The key lives in
//! `data_dir/ledger.key` as plaintext Ed25519 PKCS#8, written atomically with
//! owner-only permissions. Tests use an ephemeral in-memory key.

use ring::{
    rand::SystemRandom,
    signature::{Ed25519KeyPair, KeyPair, UnparsedPublicKey, ED25519},
};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::core::types::Signature;

/// File name of the ledger key inside the data directory.
pub const LEDGER_KEY_FILE: &str = "ledger.key";

/// Keystore errors.
#[derive(Debug, Error)]
pub enum KeystoreError {
    /// Key file could not be read or written.
    #[error("io")]
    Io,
    /// Key file is not Ed25519 PKCS#8.
    #[error("invalid key encoding")]
    InvalidKey,
    /// Key generation failed.
    #[error("crypto")]
    Crypto,
    /// Signature malformed or not valid for the key.
    #[error("bad signature")]
    BadSignature,
}

/// Signer backend abstraction (HSM compatible).
pub trait SignerBackend: Send + Sync {
    /// Return public key bytes (Ed25519, 32 bytes).
    fn public_key(&self) -> [u8; 32];
    /// Sign message bytes.
    fn sign(&self, msg: &[u8]) -> Result<Signature, KeystoreError>;
}

fn public_key_of(kp: &Ed25519KeyPair) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(kp.public_key().as_ref());
    out
}

/// Simple file-backed Ed25519 backend.
pub struct FileEd25519Backend {
    keypair: Ed25519KeyPair,
    path: PathBuf,
}

fn set_private_perms_best_effort(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
}

/// Atomic write to disk (best-effort fsync, then rename).
fn atomic_write_private(path: &Path, bytes: &[u8]) -> Result<(), KeystoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|_| KeystoreError::Io)?;
    }

    let mut tmp = path.to_path_buf();
    tmp.set_extension("tmp");

    {
        let mut f = fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp)
            .map_err(|_| KeystoreError::Io)?;
        f.write_all(bytes).map_err(|_| KeystoreError::Io)?;
        let _ = f.sync_all();
    }

    set_private_perms_best_effort(&tmp);
    fs::rename(&tmp, path).map_err(|_| KeystoreError::Io)?;
    set_private_perms_best_effort(path);
    Ok(())
}

impl FileEd25519Backend {
    /// Load or create an Ed25519 PKCS#8 key file.
    pub fn load_or_create(path: &Path) -> Result<Self, KeystoreError> {
        if path.exists() {
            let bytes = fs::read(path).map_err(|_| KeystoreError::Io)?;
            let kp = Ed25519KeyPair::from_pkcs8(&bytes).map_err(|_| KeystoreError::InvalidKey)?;
            return Ok(Self { keypair: kp, path: path.to_path_buf() });
        }

        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).map_err(|_| KeystoreError::Crypto)?;
        atomic_write_private(path, pkcs8.as_ref())?;

        let kp = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).map_err(|_| KeystoreError::InvalidKey)?;
        Ok(Self { keypair: kp, path: path.to_path_buf() })
    }

    /// Load or create `data_dir/ledger.key`.
    pub fn open_in(data_dir: &str) -> Result<Self, KeystoreError> {
        let mut key_path = PathBuf::from(data_dir);
        key_path.push(LEDGER_KEY_FILE);
        Self::load_or_create(&key_path)
    }

    /// Key file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SignerBackend for FileEd25519Backend {
    fn public_key(&self) -> [u8; 32] {
        public_key_of(&self.keypair)
    }

    fn sign(&self, msg: &[u8]) -> Result<Signature, KeystoreError> {
        let sig = self.keypair.sign(msg);
        Ok(Signature(sig.as_ref().to_vec()))
    }
}

/// In-memory Ed25519 key that is never written anywhere.
pub struct EphemeralEd25519Backend {
    keypair: Ed25519KeyPair,
}

impl EphemeralEd25519Backend {
    /// Fresh random key.
    pub fn generate() -> Result<Self, KeystoreError> {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).map_err(|_| KeystoreError::Crypto)?;
        let kp = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).map_err(|_| KeystoreError::InvalidKey)?;
        Ok(Self { keypair: kp })
    }
}

impl SignerBackend for EphemeralEd25519Backend {
    fn public_key(&self) -> [u8; 32] {
        public_key_of(&self.keypair)
    }

    fn sign(&self, msg: &[u8]) -> Result<Signature, KeystoreError> {
        Ok(Signature(self.keypair.sign(msg).as_ref().to_vec()))
    }
}

/// Verify signature given raw pubkey bytes.
pub fn verify_pubkey_bytes(pk_bytes: &[u8; 32], msg: &[u8], sig: &Signature) -> Result<(), KeystoreError> {
    // ring requires signature length 64 for Ed25519
    if sig.0.len() != 64 {
        return Err(KeystoreError::BadSignature);
    }
    let pk = UnparsedPublicKey::new(&ED25519, pk_bytes);
    pk.verify(msg, &sig.0).map_err(|_| KeystoreError::BadSignature)
}
