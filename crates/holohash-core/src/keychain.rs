//! Keychain - derived keys bound to the context that issued them
//!
//! ```text
//! Fingerprint [32] ──┐
//!                    ├── key[i] = rotl(fp[i] ⊕ n[i % 16], i % 8)
//! Nonce       [16] ──┘
//!
//! Key ──► (SessionParams, SystemState)   stored at generation
//! validate(Key, ctx) ⇔ stored ctx == ctx
//! ```
//!
//! The store is owned by the instance and guarded by one `RwLock`, so a shared
//! `Arc<Keychain>` can issue and validate keys from many threads.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::config::{HoloConfig, PlatformConfig};
use crate::hash::HolographicHash;
use crate::nonce::EmergentNonce;
use crate::platform::rotate_left;
use crate::types::{Fingerprint, Key, Nonce, SessionParams, SystemState};
use crate::Result;

/// The exact context a key was derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub session: SessionParams,
    pub state: SystemState,
}

/// Issues keys and validates them against a re-supplied context
pub struct Keychain {
    records: RwLock<HashMap<Key, KeyRecord>>,
    platform: PlatformConfig,
}

impl Default for Keychain {
    fn default() -> Self {
        Self::new()
    }
}

impl Keychain {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            platform: PlatformConfig::default(),
        }
    }

    pub fn with_config(config: &HoloConfig) -> Self {
        Self {
            records: RwLock::new(HashMap::with_capacity(config.keychain.initial_capacity)),
            platform: config.platform.clone(),
        }
    }

    /// Derive a key for `input` and remember the context it was issued under.
    ///
    /// A key colliding with an existing one replaces its record.
    pub fn generate_key(
        &self,
        input: &[u8],
        params: &SessionParams,
        state: &SystemState,
    ) -> Result<Key> {
        let fingerprint = HolographicHash::compute_with(input, params, &self.platform)?;
        let nonce = EmergentNonce::generate_with(input, state, &self.platform)?;
        let key = combine(&fingerprint, &nonce);

        let record = KeyRecord {
            session: params.clone(),
            state: state.clone(),
        };
        if let Some(previous) = self.write().insert(key, record) {
            if previous.session != *params || previous.state != *state {
                tracing::warn!(key = ?key, "replaced record for colliding key");
            }
        }

        tracing::debug!(key = ?key, "issued key");
        Ok(key)
    }

    /// True iff `key` was issued here under exactly this context.
    pub fn validate_key(&self, key: &Key, params: &SessionParams, state: &SystemState) -> bool {
        match self.read().get(key) {
            Some(record) => record.session == *params && record.state == *state,
            None => false,
        }
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.read().contains_key(key)
    }

    /// Copy of the context stored for `key`
    pub fn record(&self, key: &Key) -> Option<KeyRecord> {
        self.read().get(key).cloned()
    }

    /// Forget `key`. Returns whether it was present.
    pub fn revoke(&self, key: &Key) -> bool {
        match self.write().remove_entry(key) {
            Some((mut stored, _)) => {
                stored.zeroize();
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        zeroize_all(&mut self.write());
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // The map is only ever touched through single insert/remove calls, so a
    // panicking holder cannot leave it half-updated.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Key, KeyRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Key, KeyRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Keychain {
    fn drop(&mut self) {
        let records = self.records.get_mut().unwrap_or_else(PoisonError::into_inner);
        zeroize_all(records);
    }
}

impl std::fmt::Debug for Keychain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Keychain({} keys)", self.len())
    }
}

fn zeroize_all(records: &mut HashMap<Key, KeyRecord>) {
    for (mut key, _) in records.drain() {
        key.zeroize();
    }
}

fn combine(fingerprint: &Fingerprint, nonce: &Nonce) -> Key {
    let fp = fingerprint.as_bytes();
    let n = nonce.as_bytes();

    let mut key = [0u8; 32];
    for (i, byte) in key.iter_mut().enumerate() {
        *byte = rotate_left(fp[i] ^ n[i % n.len()], (i % 8) as u32);
    }
    Key::from_bytes(key)
}
