//! Bit-level primitives shared by every engine
//!
//! Rotation, block XOR and the chunking helpers used by the mixing loops.
//! Chunk sizes are a throughput knob only: every engine produces the same bytes
//! whatever granularity it walks its buffers with.

use std::ops::Range;

use sha2::{Digest, Sha256};

/// Typical cache line on x86_64 and aarch64.
const CACHE_LINE_SIZE: usize = 64;

/// Circular left rotation of a byte by `count mod 8` bits.
#[inline]
pub const fn rotate_left(value: u8, count: u32) -> u8 {
    value.rotate_left(count & 7)
}

/// XOR `len` bytes of `src` into `dst` in place.
///
/// Works on 8-byte words first, then the tail byte by byte. The result is
/// identical to a naive per-byte loop.
///
/// # Panics
///
/// Panics if either buffer is shorter than `len`.
pub fn xor_block(dst: &mut [u8], src: &[u8], len: usize) {
    let dst = &mut dst[..len];
    let src = &src[..len];

    let mut dst_words = dst.chunks_exact_mut(8);
    let mut src_words = src.chunks_exact(8);
    for (d, s) in (&mut dst_words).zip(&mut src_words) {
        let mut lhs = [0u8; 8];
        let mut rhs = [0u8; 8];
        lhs.copy_from_slice(d);
        rhs.copy_from_slice(s);
        let mixed = u64::from_ne_bytes(lhs) ^ u64::from_ne_bytes(rhs);
        d.copy_from_slice(&mixed.to_ne_bytes());
    }

    for (d, s) in dst_words
        .into_remainder()
        .iter_mut()
        .zip(src_words.remainder())
    {
        *d ^= s;
    }
}

/// Batch size hint for the block-mixing loops.
#[inline]
pub const fn cache_granularity() -> usize {
    CACHE_LINE_SIZE
}

/// Check whether `ptr` sits on an `alignment`-byte boundary.
///
/// An alignment of zero is never satisfied.
pub fn is_aligned<T>(ptr: *const T, alignment: usize) -> bool {
    alignment != 0 && (ptr as usize) % alignment == 0
}

/// Split `0..len` into consecutive ranges of at most `granularity` bytes.
pub(crate) fn chunks(len: usize, granularity: usize) -> impl Iterator<Item = Range<usize>> {
    let step = granularity.max(1);
    (0..len)
        .step_by(step)
        .map(move |start| start..(start + step).min(len))
}

/// Fold the little-endian bytes of `word` into `dst`, rotating byte `i` by `i + 1`.
pub(crate) fn fold_word(dst: &mut [u8], word: u64) {
    for (i, (slot, byte)) in dst.iter_mut().zip(word.to_le_bytes()).enumerate() {
        *slot = rotate_left(*slot ^ byte, i as u32 + 1);
    }
}

/// 64-bit PRNG seed taken from the SHA-256 of `bytes`.
pub(crate) fn derive_seed(bytes: &[u8]) -> u64 {
    let digest = Sha256::digest(bytes);
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed)
}
