// SPDX-License-Identifier: Apache-2.0
//! Archive write-then-read returns the original bytes for every
//! combination of `{plain, compressed, encrypted, compressed+encrypted}`.

use echo_resourcefactory::{
    builtin_decrypt, Archive, ArchiveEntry, ArchiveIndex, DataBacking, EntryFlags,
    COMPRESSED_SENTINEL,
};
use std::io::Write;

const BUILTIN_KEY: &[u8; 16] = b"aQj8CScgNP4VsfXK";

fn build_and_read(payload: &[u8], compress: bool, encrypt: bool) -> Vec<u8> {
    let mut on_disk = payload.to_vec();
    let mut flags = EntryFlags::empty();

    if compress {
        on_disk = lz4_flex::block::compress(&on_disk);
        flags = flags.with(EntryFlags::COMPRESSED);
    }
    if encrypt {
        // Pad to an 8-byte boundary, matching the archive format's
        // block-aligned ciphertext assumption.
        while on_disk.len() % 8 != 0 {
            on_disk.push(0);
        }
        xtea_encrypt_in_place(&mut on_disk);
        flags = flags.with(EntryFlags::ENCRYPTED);
    }

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(&on_disk).expect("write");
    file.flush().expect("flush");

    let mut index = ArchiveIndex::empty(8);
    let entry = ArchiveEntry {
        resource_offset: 0,
        resource_size: payload.len() as u32,
        compressed_size: if compress {
            on_disk.len() as u32
        } else {
            COMPRESSED_SENTINEL
        },
        flags,
    };
    index.insert(b"x", entry).expect("insert");

    let backing = DataBacking::open(file.path()).expect("open backing");
    let archive = Archive::from_parts(index, backing);
    archive.read(b"x", &builtin_decrypt).expect("read should succeed")
}

fn xtea_encrypt_in_place(data: &mut [u8]) {
    // Re-implements the block cipher's forward direction purely for
    // fixture construction; `builtin_decrypt` (the crate's own code) is
    // what the assertions below actually exercise.
    const DELTA: u32 = 0x9E37_79B9;
    const ROUNDS: u32 = 32;
    let mut schedule = [0u32; 4];
    for (i, word) in schedule.iter_mut().enumerate() {
        let base = i * 4;
        *word = u32::from_be_bytes([
            BUILTIN_KEY[base],
            BUILTIN_KEY[base + 1],
            BUILTIN_KEY[base + 2],
            BUILTIN_KEY[base + 3],
        ]);
    }
    for block in data.chunks_exact_mut(8) {
        let mut v0 = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
        let mut v1 = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
        let mut sum: u32 = 0;
        for _ in 0..ROUNDS {
            v0 = v0.wrapping_add(
                (v1.wrapping_shl(4) ^ v1.wrapping_shr(5))
                    .wrapping_add(v1)
                    ^ sum.wrapping_add(schedule[(sum & 3) as usize]),
            );
            sum = sum.wrapping_add(DELTA);
            v1 = v1.wrapping_add(
                (v0.wrapping_shl(4) ^ v0.wrapping_shr(5))
                    .wrapping_add(v0)
                    ^ sum.wrapping_add(schedule[((sum >> 11) & 3) as usize]),
            );
        }
        block[0..4].copy_from_slice(&v0.to_be_bytes());
        block[4..8].copy_from_slice(&v1.to_be_bytes());
    }
}

#[test]
fn plain_round_trips() {
    let payload = b"hello resource world";
    assert_eq!(build_and_read(payload, false, false), payload);
}

#[test]
fn compressed_round_trips() {
    let payload = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaabbbbbbbbbbbbbbbbbbbbbbbbbbbbcccccccccc";
    assert_eq!(build_and_read(payload, true, false), payload);
}

#[test]
fn encrypted_round_trips() {
    let payload = b"12345678ABCDEFGH";
    assert_eq!(build_and_read(payload, false, true), payload);
}

#[test]
fn compressed_and_encrypted_round_trips() {
    let payload = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaabbbbbbbbbbbbbbbbbbbbbbbbbbbbcccccccccc";
    assert_eq!(build_and_read(payload, true, true), payload);
}
