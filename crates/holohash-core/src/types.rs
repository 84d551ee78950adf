//! Context and value types
//!
//! `SessionParams` and `SystemState` are the caller-owned contexts. `Fingerprint`,
//! `Nonce` and `Key` are distinct newtypes over fixed byte arrays so one can never be
//! passed where another is expected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{Error, Result};

/// Network session context bound into a fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionParams {
    pub source_ip: String,
    pub dest_ip: String,
    pub timestamp: DateTime<Utc>,
    /// Opaque payload. Not mixed, but part of the context identity.
    #[serde(default)]
    pub metadata: Vec<u8>,
}

impl SessionParams {
    pub fn new(
        source_ip: impl Into<String>,
        dest_ip: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            source_ip: source_ip.into(),
            dest_ip: dest_ip.into(),
            timestamp,
            metadata: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: impl Into<Vec<u8>>) -> Self {
        self.metadata = metadata.into();
        self
    }
}

/// Runtime state bound into a nonce
///
/// Callers evolve this between calls (load, memory, previous nonce); the engines
/// only ever read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    pub content_hash: String,
    /// CPU load on a 0-100 scale
    pub cpu_load: f64,
    pub memory_usage: u64,
    pub timestamp: DateTime<Utc>,
    /// Bytes of the nonce this state evolves from (first 16 are used)
    #[serde(default)]
    pub previous_nonce: Vec<u8>,
}

impl SystemState {
    pub fn new(
        content_hash: impl Into<String>,
        cpu_load: f64,
        memory_usage: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            content_hash: content_hash.into(),
            cpu_load,
            memory_usage,
            timestamp,
            previous_nonce: Vec::new(),
        }
    }
}

macro_rules! byte_newtype {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Zeroize)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn from_hex(encoded: &str) -> Result<Self> {
                let decoded = hex::decode(encoded)
                    .map_err(|e| Error::InvalidInput(format!("Invalid hex: {}", e)))?;
                let bytes: [u8; $len] = decoded.as_slice().try_into().map_err(|_| {
                    Error::InvalidLength {
                        expected: $len,
                        got: decoded.len(),
                    }
                })?;
                Ok(Self(bytes))
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({}...)", stringify!($name), &self.to_hex()[..8])
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }
    };
}

byte_newtype!(
    /// 32-byte context-bound digest produced by `HolographicHash`
    Fingerprint,
    32
);

byte_newtype!(
    /// 16-byte state-bound value produced by `EmergentNonce`
    Nonce,
    16
);

byte_newtype!(
    /// 32-byte lookup token issued by a `Keychain`
    Key,
    32
);

impl Nonce {
    /// Thread this nonce into `state` so the next generation evolves from it.
    pub fn chain_into(&self, state: &mut SystemState) {
        state.previous_nonce = self.0.to_vec();
    }
}
