//! Emergent Nonce - state-bound values that evolve across calls
//!
//! The nonce absorbs the content hash, CPU load and memory usage of a
//! `SystemState`, plus the previous nonce when the caller chains one in:
//!
//! ```text
//! state₀ ──► N₀
//! state₁ { previous_nonce: N₀, .. } ──► N₁
//! state₂ { previous_nonce: N₁, .. } ──► N₂
//! ```

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::config::PlatformConfig;
use crate::platform::{self, rotate_left, xor_block};
use crate::types::{Nonce, SystemState};
use crate::{Error, Result};

const NONCE_LEN: usize = 16;
const CONTENT_HASH_BYTES: usize = 8;

/// Nonce engine. Stateless; chaining is expressed through `SystemState::previous_nonce`.
pub struct EmergentNonce;

impl EmergentNonce {
    /// Generate a nonce for `input` under `state`.
    pub fn generate(input: &[u8], state: &SystemState) -> Result<Nonce> {
        Self::generate_with(input, state, &PlatformConfig::default())
    }

    /// Same as [`EmergentNonce::generate`], walking the buffer in `platform.chunk_size` batches.
    pub fn generate_with(
        input: &[u8],
        state: &SystemState,
        platform: &PlatformConfig,
    ) -> Result<Nonce> {
        if input.is_empty() {
            return Err(Error::NonceGenerationError(
                "Input data cannot be empty".into(),
            ));
        }

        let mut nonce = [0u8; NONCE_LEN];
        mix_system_state(state, &mut nonce);

        if !state.previous_nonce.is_empty() {
            let len = state.previous_nonce.len().min(NONCE_LEN);
            xor_block(&mut nonce, &state.previous_nonce, len);
        }

        recursive_transform(input, &mut nonce, platform.chunk_size);

        tracing::debug!(
            input_len = input.len(),
            chained = !state.previous_nonce.is_empty(),
            "generated nonce"
        );

        Ok(Nonce::from_bytes(nonce))
    }
}

fn mix_system_state(state: &SystemState, nonce: &mut [u8; NONCE_LEN]) {
    let content = state.content_hash.as_bytes();
    if !content.is_empty() {
        xor_block(nonce, content, content.len().min(CONTENT_HASH_BYTES));
    }

    nonce[8] ^= cpu_byte(state.cpu_load);
    platform::fold_word(&mut nonce[8..], state.memory_usage);
}

/// Scale a 0-100 load to 0-255. Out-of-range values clamp; NaN maps to zero.
fn cpu_byte(cpu_load: f64) -> u8 {
    if cpu_load.is_nan() {
        return 0;
    }
    (cpu_load.clamp(0.0, 100.0) / 100.0 * 255.0).round() as u8
}

fn recursive_transform(input: &[u8], nonce: &mut [u8; NONCE_LEN], chunk_size: usize) {
    let mut rng = StdRng::seed_from_u64(platform::derive_seed(input));
    let len = input.len() as u64;

    for range in platform::chunks(NONCE_LEN, chunk_size) {
        let mut temp = [0u8; NONCE_LEN];
        for slot in temp.iter_mut().take(range.len()) {
            // rotate after every absorbed byte, not once per position
            for k in 0..len {
                let idx = k.wrapping_add(rng.next_u64()) % len;
                *slot = rotate_left(*slot ^ input[idx as usize], 3);
            }
        }
        xor_block(&mut nonce[range.clone()], &temp, range.len());
    }
}
