// SPDX-License-Identifier: Apache-2.0
//! Incremental MurmurHash2A state, for hashing content that arrives in
//! chunks (e.g. a file read in blocks, or a builder assembling a path).
//!
//! `Update` consumes bytes in three phases per the hash registry contract: complete a
//! pending tail first, then process whole blocks, then stash a new tail.
//! One-shot and incremental hashing of the same bytes must agree for
//! every possible chunk decomposition — this is the testable properties's first
//! universal invariant, exercised in `tests/incremental_matches_oneshot.rs`.

use crate::murmur::{M32_CONST as M32, M64_CONST as M64, R32_CONST as R32, R64_CONST as R64, mmix};
use crate::reverse::{self, ReverseWidth};

/// Maximum accumulated input length tracked by the debug reverse registry
/// (`DMHASH_MAX_REVERSE_LENGTH` in the source).
pub const MAX_REVERSE_LENGTH: usize = 1024;

/// Incremental 32-bit MurmurHash2A state.
#[derive(Debug, Clone)]
pub struct HashState32 {
    hash: u32,
    tail: u32,
    count: u32,
    size: u64,
    reverse: Option<Vec<u8>>,
}

impl HashState32 {
    /// Starts a new incremental hash. `reverse_hash` enables accumulating
    /// the input bytes for the debug reverse registry (ignored outside
    /// debug builds).
    #[must_use]
    pub fn new(reverse_hash: bool) -> Self {
        Self {
            hash: 0,
            tail: 0,
            count: 0,
            size: 0,
            reverse: reverse_hash.then(Vec::new),
        }
    }

    /// Feeds `buffer` into the running hash.
    pub fn update(&mut self, buffer: &[u8]) {
        self.size += buffer.len() as u64;
        if let Some(acc) = self.reverse.as_mut() {
            if self.size as usize <= MAX_REVERSE_LENGTH {
                acc.extend_from_slice(buffer);
            }
        }

        let mut data = buffer;
        mix_tail_32(self, &mut data);

        let mut chunks = data.chunks_exact(4);
        for block in &mut chunks {
            let mut k = u32::from(block[0])
                | u32::from(block[1]) << 8
                | u32::from(block[2]) << 16
                | u32::from(block[3]) << 24;
            mmix!(self.hash, k, M32, R32);
        }
        let mut rest = chunks.remainder();
        mix_tail_32(self, &mut rest);
    }

    /// Finalizes the hash, consuming this state.
    ///
    /// If reverse tracking was enabled and the accumulated size is within
    /// [`MAX_REVERSE_LENGTH`], the input is recorded in the process-wide
    /// reverse registry keyed by the produced hash.
    #[must_use]
    pub fn finalize(mut self) -> u32 {
        let size = self.size;
        let mut tail = self.tail;
        mmix!(self.hash, tail, M32, R32);
        let mut len = size as u32;
        mmix!(self.hash, len, M32, R32);

        self.hash ^= self.hash >> 13;
        self.hash = self.hash.wrapping_mul(M32);
        self.hash ^= self.hash >> 15;

        if let Some(acc) = self.reverse.take() {
            if size as usize <= MAX_REVERSE_LENGTH {
                reverse::record(ReverseWidth::W32(self.hash), acc);
            }
        }
        self.hash
    }
}

fn mix_tail_32(state: &mut HashState32, data: &mut &[u8]) {
    while !data.is_empty() && (data.len() < 4 || state.count != 0) {
        let d = data[0];
        state.tail |= u32::from(d) << (state.count * 8);
        state.count += 1;
        *data = &data[1..];

        if state.count == 4 {
            let mut tail = state.tail;
            mmix!(state.hash, tail, M32, R32);
            state.tail = 0;
            state.count = 0;
        }
    }
}

/// Incremental 64-bit MurmurHash2A state.
#[derive(Debug, Clone)]
pub struct HashState64 {
    hash: u64,
    tail: u64,
    count: u32,
    size: u64,
    reverse: Option<Vec<u8>>,
}

impl HashState64 {
    /// Starts a new incremental hash. `reverse_hash` enables accumulating
    /// the input bytes for the debug reverse registry.
    #[must_use]
    pub fn new(reverse_hash: bool) -> Self {
        Self {
            hash: 0,
            tail: 0,
            count: 0,
            size: 0,
            reverse: reverse_hash.then(Vec::new),
        }
    }

    /// Feeds `buffer` into the running hash.
    pub fn update(&mut self, buffer: &[u8]) {
        self.size += buffer.len() as u64;
        if let Some(acc) = self.reverse.as_mut() {
            if self.size as usize <= MAX_REVERSE_LENGTH {
                acc.extend_from_slice(buffer);
            }
        }

        let mut data = buffer;
        mix_tail_64(self, &mut data);

        let mut chunks = data.chunks_exact(8);
        for block in &mut chunks {
            let mut k = u64::from(block[0])
                | u64::from(block[1]) << 8
                | u64::from(block[2]) << 16
                | u64::from(block[3]) << 24
                | u64::from(block[4]) << 32
                | u64::from(block[5]) << 40
                | u64::from(block[6]) << 48
                | u64::from(block[7]) << 56;
            mmix!(self.hash, k, M64, R64);
        }
        let mut rest = chunks.remainder();
        mix_tail_64(self, &mut rest);
    }

    /// Finalizes the hash, consuming this state.
    #[must_use]
    pub fn finalize(mut self) -> u64 {
        let size = self.size;
        let mut tail = self.tail;
        mmix!(self.hash, tail, M64, R64);
        let mut len = size;
        mmix!(self.hash, len, M64, R64);

        self.hash ^= self.hash >> R64;
        self.hash = self.hash.wrapping_mul(M64);
        self.hash ^= self.hash >> R64;

        if let Some(acc) = self.reverse.take() {
            if size as usize <= MAX_REVERSE_LENGTH {
                reverse::record(ReverseWidth::W64(self.hash), acc);
            }
        }
        self.hash
    }

    /// Pseudo-modulo bucket hint used only by the debug reverse registry's
    /// capacity grower.
    ///
    /// This reproduces the source's `(hash + tail) % capacity` verbatim
    /// (the design notes's open question) rather than a proper 128-bit
    /// reduction of `(hash << 64 | tail)`. It is intentionally lossy and
    /// must never be used as a general-purpose hash combinator.
    #[must_use]
    pub fn bucket_hint(&self, capacity: u64) -> u64 {
        if capacity == 0 {
            return 0;
        }
        self.hash.wrapping_add(self.tail) % capacity
    }
}

fn mix_tail_64(state: &mut HashState64, data: &mut &[u8]) {
    while !data.is_empty() && (data.len() < 8 || state.count != 0) {
        let d = data[0];
        state.tail |= u64::from(d) << (state.count * 8);
        state.count += 1;
        *data = &data[1..];

        if state.count == 8 {
            let mut tail = state.tail;
            mmix!(state.hash, tail, M64, R64);
            state.tail = 0;
            state.count = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::murmur::{hash32, hash64};

    #[test]
    fn incremental_matches_oneshot_for_even_split() {
        let mut st = HashState32::new(false);
        st.update(b"hello ");
        st.update(b"world");
        assert_eq!(st.finalize(), hash32(b"hello world"));
    }

    #[test]
    fn incremental_matches_oneshot_64() {
        let mut st = HashState64::new(false);
        st.update(b"hello ");
        st.update(b"world");
        assert_eq!(st.finalize(), hash64(b"hello world"));
    }

    #[test]
    fn byte_at_a_time_matches_oneshot() {
        let input = b"the quick brown fox jumps over the lazy dog";
        let mut st = HashState32::new(false);
        for byte in input {
            st.update(std::slice::from_ref(byte));
        }
        assert_eq!(st.finalize(), hash32(input));
    }

    #[test]
    fn bucket_hint_is_commutative_with_itself() {
        let mut st = HashState64::new(false);
        st.update(b"abc");
        let a = st.bucket_hint(97);
        let b = st.bucket_hint(97);
        assert_eq!(a, b);
        assert_eq!(st.bucket_hint(0), 0);
    }
}
