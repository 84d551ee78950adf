//! Holographic Hash - session-bound fingerprints
//!
//! ```text
//! SessionParams ──► IV [16] ──► seed ──► PRNG
//!                      │                  │
//! input ──► acc [32] ──┴── 8 × (sample ⊕ → rotl 3 → + iv → neighbor mix)
//!                                         │
//!                          4 × neighbor mix ──► Fingerprint
//! ```
//!
//! Every accumulator byte ends up depending on every other one through the
//! circular neighbor mix, and the IV ties the result to both endpoints and the
//! session timestamp.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::config::PlatformConfig;
use crate::platform::{self, rotate_left, xor_block};
use crate::types::{Fingerprint, SessionParams};
use crate::{Error, Result};

const DIGEST_LEN: usize = 32;
const IV_LEN: usize = 16;
const DIFFUSION_ROUNDS: usize = 8;
const FINALIZATION_ROUNDS: usize = 4;

/// Fingerprint engine. Stateless; every call is independent.
pub struct HolographicHash;

impl HolographicHash {
    /// Compute the fingerprint of `input` under `params`.
    pub fn compute(input: &[u8], params: &SessionParams) -> Result<Fingerprint> {
        Self::compute_with(input, params, &PlatformConfig::default())
    }

    /// Same as [`HolographicHash::compute`], walking buffers in `platform.chunk_size` batches.
    pub fn compute_with(
        input: &[u8],
        params: &SessionParams,
        platform: &PlatformConfig,
    ) -> Result<Fingerprint> {
        if input.is_empty() {
            return Err(Error::InvalidInput("Input data cannot be empty".into()));
        }

        let iv = initialization_vector(params);
        let mut acc = [0u8; DIGEST_LEN];

        diffuse(input, &iv, &mut acc, platform.chunk_size);

        for _ in 0..FINALIZATION_ROUNDS {
            mix_round(&mut acc, platform.chunk_size);
        }

        tracing::debug!(
            input_len = input.len(),
            source = %params.source_ip,
            dest = %params.dest_ip,
            "computed fingerprint"
        );

        Ok(Fingerprint::from_bytes(acc))
    }
}

/// Fold endpoints and timestamp into the 16-byte IV.
fn initialization_vector(params: &SessionParams) -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];

    let endpoints = [(params.source_ip.as_bytes(), 0), (params.dest_ip.as_bytes(), 4)];
    for (bytes, offset) in endpoints {
        for (slot, byte) in iv[offset..offset + 4].iter_mut().zip(bytes) {
            *slot = rotate_left(*slot ^ byte, 3);
        }
    }

    platform::fold_word(&mut iv[8..], timestamp_word(params));

    iv
}

/// Nanoseconds since the epoch; dates outside the i64 nanosecond range use seconds.
fn timestamp_word(params: &SessionParams) -> u64 {
    params
        .timestamp
        .timestamp_nanos_opt()
        .unwrap_or_else(|| params.timestamp.timestamp()) as u64
}

fn diffuse(input: &[u8], iv: &[u8; IV_LEN], acc: &mut [u8; DIGEST_LEN], chunk_size: usize) {
    let mut rng = StdRng::seed_from_u64(platform::derive_seed(iv));
    let len = input.len() as u64;

    for (i, slot) in acc.iter_mut().enumerate() {
        *slot = input[i % input.len()];
    }

    for _ in 0..DIFFUSION_ROUNDS {
        for range in platform::chunks(DIGEST_LEN, chunk_size) {
            let mut sampled = [0u8; DIGEST_LEN];
            for slot in sampled.iter_mut().take(range.len()) {
                *slot = input[(rng.next_u64() % len) as usize];
            }
            xor_block(&mut acc[range.clone()], &sampled, range.len());

            for pos in range {
                acc[pos] = rotate_left(acc[pos], 3).wrapping_add(iv[pos % IV_LEN]);
            }
        }

        mix_round(acc, chunk_size);
    }
}

/// One in-place pass mixing each byte with its circular neighbors.
///
/// Positions are visited in ascending order, so `prev` is already updated for
/// every byte but the first while `next` is still the old value.
fn mix_round(data: &mut [u8; DIGEST_LEN], chunk_size: usize) {
    for range in platform::chunks(DIGEST_LEN, chunk_size) {
        for idx in range {
            let prev = data[(idx + DIGEST_LEN - 1) % DIGEST_LEN];
            let next = data[(idx + 1) % DIGEST_LEN];

            let mut byte = rotate_left(data[idx], 3) ^ prev;
            byte = rotate_left(byte, 2) ^ next;
            data[idx] = rotate_left(byte, 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn params() -> SessionParams {
        SessionParams::new(
            "127.0.0.1",
            "192.168.1.1",
            Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap(),
        )
    }

    #[test]
    fn test_deterministic() {
        let a = HolographicHash::compute(b"test data", &params()).unwrap();
        let b = HolographicHash::compute(b"test data", &params()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_empty_input() {
        let err = HolographicHash::compute(&[], &params()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_single_byte_input() {
        let fp = HolographicHash::compute(&[0x42], &params()).unwrap();
        assert_eq!(fp.as_bytes().len(), 32);
    }

    #[test]
    fn test_similar_inputs_differ() {
        let a = HolographicHash::compute(b"test data", &params()).unwrap();
        let b = HolographicHash::compute(b"test datA", &params()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_fields_change_fingerprint() {
        let base = params();
        let fp = HolographicHash::compute(b"payload", &base).unwrap();

        let mut other = base.clone();
        other.source_ip = "128.0.0.1".into();
        assert_ne!(fp, HolographicHash::compute(b"payload", &other).unwrap());

        let mut other = base.clone();
        other.dest_ip = "10.0.0.1".into();
        assert_ne!(fp, HolographicHash::compute(b"payload", &other).unwrap());

        let mut other = base.clone();
        other.timestamp = base.timestamp + chrono::Duration::nanoseconds(1);
        assert_ne!(fp, HolographicHash::compute(b"payload", &other).unwrap());
    }

    #[test]
    fn test_metadata_not_mixed() {
        let base = params();
        let tagged = base.clone().with_metadata(b"opaque".to_vec());
        assert_eq!(
            HolographicHash::compute(b"payload", &base).unwrap(),
            HolographicHash::compute(b"payload", &tagged).unwrap()
        );
    }

    #[test]
    fn test_degenerate_context_accepted() {
        let empty = SessionParams::new("", "", Utc.timestamp_opt(0, 0).unwrap());
        assert!(HolographicHash::compute(b"x", &empty).is_ok());
    }

    #[test]
    fn test_chunk_size_does_not_change_output() {
        let input: Vec<u8> = (0..=255u8).collect();
        let reference = HolographicHash::compute(&input, &params()).unwrap();

        for chunk_size in [1, 3, 8, 16, 31, 32, 4096] {
            let platform = PlatformConfig { chunk_size };
            let fp = HolographicHash::compute_with(&input, &params(), &platform).unwrap();
            assert_eq!(fp, reference, "chunk size {}", chunk_size);
        }
    }

    #[test]
    fn test_iv_uses_first_four_endpoint_bytes() {
        let mut a = params();
        let mut b = params();
        a.source_ip = "10.0.0.1".into();
        b.source_ip = "10.0.9.9".into();
        assert_eq!(initialization_vector(&a), initialization_vector(&b));

        b.source_ip = "10.1.0.1".into();
        assert_ne!(initialization_vector(&a), initialization_vector(&b));
    }
}
