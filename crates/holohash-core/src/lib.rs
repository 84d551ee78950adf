//! # HoloHash Core
//!
//! Context-bound fingerprinting for sessions and runtime state.
//!
//! ## Pipeline
//!
//! ```text
//! input ──┬── HolographicHash (+ SessionParams) ──► Fingerprint [32]
//!         │                                            │
//!         └── EmergentNonce   (+ SystemState)   ──► Nonce [16]
//!                                                      │
//!                           Keychain: fp[i] ⊕ n[i % 16], rotl(i % 8)
//!                                                      │
//!                                                      ▼
//!                                                   Key [32] ──► validate(ctx) → bool
//! ```
//!
//! The mixing routines are bit-diffusion engines, not a vetted cryptographic hash.
//! They give deterministic context binding and a strong avalanche effect, nothing more.

pub mod config;
pub mod hash;
pub mod keychain;
pub mod nonce;
pub mod platform;
pub mod types;

#[cfg(test)]
mod property_tests;

pub use config::{HoloConfig, KeychainConfig, PlatformConfig};
pub use hash::HolographicHash;
pub use keychain::{KeyRecord, Keychain};
pub use nonce::EmergentNonce;
pub use types::{Fingerprint, Key, Nonce, SessionParams, SystemState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type for holohash-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in holohash-core
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Nonce generation failed: {0}")]
    NonceGenerationError(String),

    /// Reserved for keychain faults; lookups report absence as `false` instead.
    #[error("Keychain error: {0}")]
    KeychainError(String),

    #[error("Invalid byte length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
