//! Admit-once store and fetch-and-destroy retrieve.
//!
//! Per lookup key the only transitions are
//! `ABSENT --store--> PRESENT --(retrieve | expiry)--> ABSENT`.
//! A store while PRESENT is rejected, never queued or overwritten.
//!
//! Whoever retrieves first wins. Anyone who learns or guesses a lookup key can
//! burn the message before its intended recipient does; that is inherent to
//! burn-after-reading and is not defended against here.

use std::time::Duration;

use tracing::debug;

use crate::error::{StoreError, VaultError};
use crate::store::{expiry, unix_now, Blob, KvStore, SecretRecord};

/// Fixed lifetime of an unread secret.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// How long an unread secret survives.
    pub ttl: Duration,
    /// Upper bound on lookup key length, in bytes.
    pub max_key_len: usize,
    /// Upper bound on each of `encrypted` and `iv`, in bytes.
    pub max_blob_len: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_key_len: 256,
            max_blob_len: 1_048_576,
        }
    }
}

/// The vault protocol over an injected backing store.
#[derive(Clone)]
pub struct Vault<S> {
    store: S,
    config: VaultConfig,
}

impl<S: KvStore> Vault<S> {
    pub fn new(store: S, config: VaultConfig) -> Self {
        Self { store, config }
    }

    /// Admit a secret under `key` if no unexpired secret holds it.
    pub fn store(&self, key: &str, encrypted: Blob, iv: Blob) -> Result<(), VaultError> {
        if key.is_empty() || encrypted.is_empty() || iv.is_empty() {
            return Err(VaultError::Validation("Missing required fields".into()));
        }
        if key.len() > self.config.max_key_len {
            return Err(VaultError::Validation(format!(
                "key must be 1–{} characters",
                self.config.max_key_len
            )));
        }
        if encrypted.len() > self.config.max_blob_len || iv.len() > self.config.max_blob_len {
            return Err(VaultError::Validation(format!(
                "payload exceeds {} byte limit",
                self.config.max_blob_len
            )));
        }

        let now = unix_now();
        let record = SecretRecord {
            encrypted,
            iv,
            created_at: now,
            expires_at: expiry(now, self.config.ttl.as_secs()),
        };
        let bytes = encode(&record)?;

        if self.store.insert_if_absent(key, &bytes, self.config.ttl)? {
            debug!(key = %key, "stored secret");
            Ok(())
        } else {
            debug!(key = %key, "store rejected: key occupied");
            Err(VaultError::Conflict)
        }
    }

    /// Fetch and destroy the secret under `key`.
    pub fn retrieve(&self, key: &str) -> Result<SecretRecord, VaultError> {
        if key.is_empty() {
            return Err(VaultError::Validation("Missing key".into()));
        }

        match self.store.take(key)? {
            Some(bytes) => {
                debug!(key = %key, "burned after read");
                Ok(decode(&bytes)?)
            }
            None => Err(VaultError::NotFound),
        }
    }
}

fn encode(record: &SecretRecord) -> Result<Vec<u8>, StoreError> {
    bincode::serde::encode_to_vec(record, bincode::config::standard())
        .map_err(|e| StoreError::Codec(format!("bincode encode: {e}")))
}

fn decode(bytes: &[u8]) -> Result<SecretRecord, StoreError> {
    let (record, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map_err(|e| StoreError::Codec(format!("bincode decode: {e}")))?;
    Ok(record)
}
