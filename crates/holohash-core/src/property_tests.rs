//! Statistical and cross-component properties
//!
//! Inputs come from a seeded `StdRng` so every run sees the same data.

use std::collections::HashSet;

use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::{EmergentNonce, Error, HolographicHash, Keychain, SessionParams, SystemState};

fn params() -> SessionParams {
    SessionParams::new(
        "127.0.0.1",
        "192.168.1.1",
        Utc.timestamp_opt(1_700_000_000, 987_654_321).unwrap(),
    )
}

fn state() -> SystemState {
    SystemState::new(
        "content_hash",
        50.0,
        1024 * 1024,
        Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    )
}

fn random_data(rng: &mut StdRng, len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}

fn differing_bits(a: &[u8], b: &[u8]) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

#[test]
fn test_avalanche_single_bit_flips() {
    const TRIALS: usize = 1000;
    let mut rng = StdRng::seed_from_u64(0xA7A1_A7C4);
    let mut total = 0u64;

    for i in 0..TRIALS {
        let mut data = random_data(&mut rng, 64);
        let original = HolographicHash::compute(&data, &params()).unwrap();

        data[i % 64] ^= 1 << (i % 8);
        let flipped = HolographicHash::compute(&data, &params()).unwrap();

        total += differing_bits(original.as_bytes(), flipped.as_bytes()) as u64;
    }

    let ratio = total as f64 / (TRIALS * 256) as f64;
    assert!(ratio >= 0.45, "avalanche ratio {:.4}", ratio);
}

#[test]
fn test_no_collisions_under_fixed_context() {
    const INPUTS: usize = 10_000;
    let mut rng = StdRng::seed_from_u64(0xC011_1DE5);
    let mut seen = HashSet::with_capacity(INPUTS);
    let mut distinct_inputs = HashSet::with_capacity(INPUTS);

    for _ in 0..INPUTS {
        let data = random_data(&mut rng, 64);
        if !distinct_inputs.insert(data.clone()) {
            continue;
        }
        let fp = HolographicHash::compute(&data, &params()).unwrap();
        assert!(seen.insert(fp), "collision for input {}", hex::encode(&data));
    }
}

#[test]
fn test_empty_input_rejected_everywhere() {
    assert!(matches!(
        HolographicHash::compute(&[], &params()),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        EmergentNonce::generate(&[], &state()),
        Err(Error::NonceGenerationError(_))
    ));
}

#[test]
fn test_similar_inputs_produce_independent_keys() {
    const TRIALS: usize = 1000;
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let base = random_data(&mut rng, 64);
    let keychain = Keychain::new();
    let mut total = 0u64;

    for i in 0..TRIALS {
        let mut tweaked = base.clone();
        let at = i % tweaked.len();
        tweaked[at] ^= 1;

        let a = keychain.generate_key(&base, &params(), &state()).unwrap();
        let b = keychain.generate_key(&tweaked, &params(), &state()).unwrap();
        let diff = differing_bits(a.as_bytes(), b.as_bytes());
        assert!(diff >= 96, "only {} key bits differ after flipping byte {}", diff, at);
        total += diff as u64;
    }

    let average = total as f64 / TRIALS as f64;
    assert!(average >= 96.0, "average differing key bits {:.1}", average);
}

#[test]
fn test_key_binding_across_context_changes() {
    let keychain = Keychain::new();
    let key = keychain
        .generate_key(b"sensitive data", &params(), &state())
        .unwrap();

    let mut moved = params();
    moved.dest_ip = "10.0.0.2".into();
    let other = keychain
        .generate_key(b"sensitive data", &moved, &state())
        .unwrap();

    assert_ne!(key, other);
    assert!(keychain.validate_key(&key, &params(), &state()));
    assert!(!keychain.validate_key(&key, &moved, &state()));
    assert!(keychain.validate_key(&other, &moved, &state()));
}

#[test]
fn test_nonce_evolution_over_a_chain() {
    let mut state = state();
    let mut seen = HashSet::new();

    for step in 0..32u64 {
        let nonce = EmergentNonce::generate(b"evolving data", &state).unwrap();
        assert!(seen.insert(nonce), "nonce repeated at step {}", step);

        nonce.chain_into(&mut state);
        state.cpu_load = (state.cpu_load + 7.5) % 100.0;
        state.memory_usage += 4096;
    }
}
