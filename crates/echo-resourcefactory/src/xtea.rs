// SPDX-License-Identifier: Apache-2.0
//! Built-in XTEA decryption for encrypted archive entries, applied during
//! the archive read path's decrypt step.
//!
//! Grounded on the source's `dmCrypt::Decrypt(ALGORITHM_XTEA, ...)` call
//! in `resource_archive.cpp::Read`. XTEA is a 64-bit-block cipher with a
//! 128-bit key; no published crate owns this one small, fully-specified
//! primitive the way `lz4_flex` owns LZ4, so it is hand-rolled here
//! rather than pulled in as a dependency, same as the manifest reader in
//! `manifest.rs`.

const DELTA: u32 = 0x9E37_79B9;
const ROUNDS: u32 = 32;

/// The key baked into the archive format, matching the source's
/// `KEY = "aQj8CScgNP4VsfXK"` (16 ASCII bytes, used as a raw 128-bit key).
pub const BUILTIN_KEY: &[u8; 16] = b"aQj8CScgNP4VsfXK";

fn key_schedule(key: &[u8]) -> [u32; 4] {
    let mut schedule = [0u32; 4];
    for (i, word) in schedule.iter_mut().enumerate() {
        let base = i * 4;
        let mut bytes = [0u8; 4];
        for (j, b) in bytes.iter_mut().enumerate() {
            *b = key.get(base + j).copied().unwrap_or(0);
        }
        *word = u32::from_be_bytes(bytes);
    }
    schedule
}

fn decrypt_block(v0: u32, v1: u32, key: &[u32; 4]) -> (u32, u32) {
    let mut v0 = v0;
    let mut v1 = v1;
    let mut sum = DELTA.wrapping_mul(ROUNDS);
    for _ in 0..ROUNDS {
        v1 = v1.wrapping_sub(
            (v0.wrapping_shl(4) ^ v0.wrapping_shr(5))
                .wrapping_add(v0)
                ^ sum.wrapping_add(key[((sum >> 11) & 3) as usize]),
        );
        sum = sum.wrapping_sub(DELTA);
        v0 = v0.wrapping_sub(
            (v1.wrapping_shl(4) ^ v1.wrapping_shr(5))
                .wrapping_add(v1)
                ^ sum.wrapping_add(key[(sum & 3) as usize]),
        );
    }
    (v0, v1)
}

fn encrypt_block(v0: u32, v1: u32, key: &[u32; 4]) -> (u32, u32) {
    let mut v0 = v0;
    let mut v1 = v1;
    let mut sum: u32 = 0;
    for _ in 0..ROUNDS {
        v0 = v0.wrapping_add(
            (v1.wrapping_shl(4) ^ v1.wrapping_shr(5))
                .wrapping_add(v1)
                ^ sum.wrapping_add(key[(sum & 3) as usize]),
        );
        sum = sum.wrapping_add(DELTA);
        v1 = v1.wrapping_add(
            (v0.wrapping_shl(4) ^ v0.wrapping_shr(5))
                .wrapping_add(v0)
                ^ sum.wrapping_add(key[((sum >> 11) & 3) as usize]),
        );
    }
    (v0, v1)
}

/// Decrypts `data` in place with XTEA using `key`, operating on 8-byte
/// blocks. `data.len()` need not be a multiple of 8; any short trailing
/// block is left untouched, matching the source's block-aligned
/// ciphertext assumption (archive entries are padded to block size at
/// build time).
pub fn decrypt_in_place(data: &mut [u8], key: &[u8]) {
    let schedule = key_schedule(key);
    for block in data.chunks_exact_mut(8) {
        let v0 = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
        let v1 = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
        let (d0, d1) = decrypt_block(v0, v1, &schedule);
        block[0..4].copy_from_slice(&d0.to_be_bytes());
        block[4..8].copy_from_slice(&d1.to_be_bytes());
    }
}

/// Encrypts `data` in place with XTEA, the inverse of
/// [`decrypt_in_place`]. Used by tests and by liveupdate insertion when
/// mirroring an encrypted entry.
pub fn encrypt_in_place(data: &mut [u8], key: &[u8]) {
    let schedule = key_schedule(key);
    for block in data.chunks_exact_mut(8) {
        let v0 = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
        let v1 = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
        let (e0, e1) = encrypt_block(v0, v1, &schedule);
        block[0..4].copy_from_slice(&e0.to_be_bytes());
        block[4..8].copy_from_slice(&e1.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let mut data = *b"12345678ABCDEFGH";
        let original = data;
        encrypt_in_place(&mut data, BUILTIN_KEY);
        assert_ne!(data, original);
        decrypt_in_place(&mut data, BUILTIN_KEY);
        assert_eq!(data, original);
    }

    #[test]
    fn different_keys_produce_different_ciphertext() {
        let mut a = *b"blockblock";
        let mut b = a;
        encrypt_in_place(&mut a[..8], BUILTIN_KEY);
        encrypt_in_place(&mut b[..8], b"0123456789abcdef");
        assert_ne!(a, b);
    }
}
