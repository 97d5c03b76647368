// SPDX-License-Identifier: Apache-2.0
//! The archive index: a sorted hash array and its parallel entry array
//! (the data model / the resource factory contract), parsed from / serialized to the `.arci` wire
//! format.
//!
//! Grounded on `original_source/engine/resource/src/resource_archive.cpp`
//! (`LoadArchive`, `FindEntry`, `CalcInsertionIndex`).

use super::format::{
    ArchiveEntry, EntryFlags, ARCHIVE_VERSION, ENTRY_RECORD_SIZE, HASH_SLOT_SIZE, HEADER_SIZE,
    INDEX_MD5_SIZE,
};
use crate::error::ResourceError;

/// An in-memory archive index: parallel `hashes`/`entries` arrays, both
/// sorted ascending by hash.
#[derive(Debug, Clone)]
pub struct ArchiveIndex {
    /// Meaningful byte width of each hash (≤ [`super::format::HASH_SLOT_SIZE`]).
    pub hash_length: usize,
    hashes: Vec<u8>,
    entries: Vec<ArchiveEntry>,
}

impl ArchiveIndex {
    /// Builds an empty index with the given hash width, used as the seed
    /// for a fresh liveupdate overlay.
    #[must_use]
    pub fn empty(hash_length: usize) -> Self {
        Self {
            hash_length,
            hashes: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Number of entries in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the index has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn hash_slot(&self, index: usize) -> &[u8] {
        &self.hashes[index * HASH_SLOT_SIZE..(index + 1) * HASH_SLOT_SIZE]
    }

    /// Parses an index from its `.arci` byte representation.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::VersionMismatch`] if the version word
    /// doesn't match [`ARCHIVE_VERSION`], or [`ResourceError::FormatError`]
    /// if the declared offsets/lengths don't fit within `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, ResourceError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ResourceError::FormatError(
                "index shorter than fixed header".into(),
            ));
        }

        let version = u32::from_be_bytes(field(bytes, 0));
        if version != ARCHIVE_VERSION {
            return Err(ResourceError::VersionMismatch {
                expected: ARCHIVE_VERSION,
                found: version,
            });
        }

        let entry_count = u32::from_be_bytes(field(bytes, 16)) as usize;
        let entry_offset = u32::from_be_bytes(field(bytes, 20)) as usize;
        let hash_offset = u32::from_be_bytes(field(bytes, 24)) as usize;
        let hash_length = u32::from_be_bytes(field(bytes, 28)) as usize;

        if hash_length > HASH_SLOT_SIZE {
            return Err(ResourceError::FormatError(format!(
                "hash_length {hash_length} exceeds max {HASH_SLOT_SIZE}"
            )));
        }

        let hashes_size = entry_count * HASH_SLOT_SIZE;
        let hashes_end = hash_offset
            .checked_add(hashes_size)
            .ok_or_else(|| ResourceError::FormatError("hash array overflow".into()))?;
        let entries_size = entry_count * ENTRY_RECORD_SIZE;
        let entries_end = entry_offset
            .checked_add(entries_size)
            .ok_or_else(|| ResourceError::FormatError("entry array overflow".into()))?;

        if hashes_end > bytes.len() || entries_end > bytes.len() {
            return Err(ResourceError::FormatError(
                "declared offsets exceed index length".into(),
            ));
        }

        let hashes = bytes[hash_offset..hashes_end].to_vec();

        let mut entries = Vec::with_capacity(entry_count);
        for i in 0..entry_count {
            let base = entry_offset + i * ENTRY_RECORD_SIZE;
            let resource_offset = u32::from_be_bytes(field(bytes, base));
            let resource_size = u32::from_be_bytes(field(bytes, base + 4));
            let compressed_size = u32::from_be_bytes(field(bytes, base + 8));
            let flags = u32::from_be_bytes(field(bytes, base + 12));
            entries.push(ArchiveEntry {
                resource_offset,
                resource_size,
                compressed_size,
                flags: EntryFlags::from_bits(flags as u8),
            });
        }

        Ok(Self {
            hash_length,
            hashes,
            entries,
        })
    }

    /// Serializes this index back to its `.arci` byte representation.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let entry_count = self.entries.len() as u32;
        let hash_offset = HEADER_SIZE as u32;
        let entry_offset = hash_offset + entry_count * HASH_SLOT_SIZE as u32;

        let mut out = Vec::with_capacity(entry_offset as usize + self.entries.len() * ENTRY_RECORD_SIZE);
        out.extend_from_slice(&ARCHIVE_VERSION.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes()); // pad
        out.extend_from_slice(&0u64.to_be_bytes()); // userdata, runtime-only
        out.extend_from_slice(&entry_count.to_be_bytes());
        out.extend_from_slice(&entry_offset.to_be_bytes());
        out.extend_from_slice(&hash_offset.to_be_bytes());
        out.extend_from_slice(&(self.hash_length as u32).to_be_bytes());
        out.extend_from_slice(&[0u8; INDEX_MD5_SIZE]);

        debug_assert_eq!(out.len(), HEADER_SIZE);
        out.extend_from_slice(&self.hashes);

        for entry in &self.entries {
            out.extend_from_slice(&entry.resource_offset.to_be_bytes());
            out.extend_from_slice(&entry.resource_size.to_be_bytes());
            out.extend_from_slice(&entry.compressed_size.to_be_bytes());
            out.extend_from_slice(&u32::from(entry.flags.bits()).to_be_bytes());
        }

        out
    }

    /// Binary-searches for `hash` (compared over the full padded 64-byte
    /// slot, which is equivalent to comparing only `hash_length` bytes
    /// since every slot is zero-padded identically beyond that width).
    #[must_use]
    pub fn find_entry(&self, hash: &[u8]) -> Option<ArchiveEntry> {
        self.binary_search(hash).ok().map(|idx| self.entries[idx])
    }

    fn padded(&self, hash: &[u8]) -> [u8; HASH_SLOT_SIZE] {
        let mut slot = [0u8; HASH_SLOT_SIZE];
        let n = hash.len().min(HASH_SLOT_SIZE);
        slot[..n].copy_from_slice(&hash[..n]);
        slot
    }

    fn binary_search(&self, hash: &[u8]) -> Result<usize, usize> {
        let needle = self.padded(hash);
        let mut first = 0usize;
        let mut last = self.entries.len();
        while first < last {
            let mid = first + (last - first) / 2;
            match self.hash_slot(mid).cmp(&needle[..]) {
                std::cmp::Ordering::Equal => return Ok(mid),
                std::cmp::Ordering::Less => first = mid + 1,
                std::cmp::Ordering::Greater => last = mid,
            }
        }
        Err(first)
    }

    /// Inserts a new `(hash, entry)` pair at its sorted position.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::AlreadyExists`] if `hash` is already
    /// present.
    pub fn insert(&mut self, hash: &[u8], entry: ArchiveEntry) -> Result<usize, ResourceError> {
        let idx = match self.binary_search(hash) {
            Ok(_) => {
                return Err(ResourceError::AlreadyExists(
                    "resource already stored".into(),
                ))
            }
            Err(idx) => idx,
        };

        let slot = self.padded(hash);
        let byte_pos = idx * HASH_SLOT_SIZE;
        self.hashes
            .splice(byte_pos..byte_pos, slot.iter().copied());
        self.entries.insert(idx, entry);
        Ok(idx)
    }
}

fn field<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_fixture() -> (ArchiveIndex, Vec<Vec<u8>>) {
        let mut idx = ArchiveIndex::empty(8);
        let hashes: Vec<Vec<u8>> = (0..5u64).map(|i| (i * 11).to_be_bytes().to_vec()).collect();
        let mut sorted = hashes.clone();
        sorted.sort();
        for (i, h) in sorted.iter().enumerate() {
            idx.insert(
                h,
                ArchiveEntry {
                    resource_offset: (i as u32) * 100,
                    resource_size: 10,
                    compressed_size: crate::archive::format::COMPRESSED_SENTINEL,
                    flags: EntryFlags::empty(),
                },
            )
            .expect("insert should succeed");
        }
        (idx, sorted)
    }

    #[test]
    fn find_entry_locates_each_inserted_hash() {
        let (idx, hashes) = build_fixture();
        for (i, h) in hashes.iter().enumerate() {
            let entry = idx.find_entry(h).expect("entry should be found");
            assert_eq!(entry.resource_offset, (i as u32) * 100);
        }
    }

    #[test]
    fn find_entry_reports_not_found_for_missing_hash() {
        let (idx, _) = build_fixture();
        assert!(idx.find_entry(&[0xffu8; 8]).is_none());
    }

    #[test]
    fn empty_index_always_misses() {
        let idx = ArchiveIndex::empty(8);
        assert!(idx.find_entry(b"anything").is_none());
    }

    #[test]
    fn insert_rejects_duplicate_hash() {
        let (mut idx, hashes) = build_fixture();
        let entry = ArchiveEntry {
            resource_offset: 0,
            resource_size: 0,
            compressed_size: crate::archive::format::COMPRESSED_SENTINEL,
            flags: EntryFlags::empty(),
        };
        assert!(matches!(
            idx.insert(&hashes[0], entry),
            Err(ResourceError::AlreadyExists(_))
        ));
    }

    #[test]
    fn serialize_then_parse_round_trips() {
        let (idx, hashes) = build_fixture();
        let bytes = idx.serialize();
        let parsed = ArchiveIndex::parse(&bytes).expect("should parse");
        for h in &hashes {
            assert_eq!(
                parsed.find_entry(h).map(|e| e.resource_offset),
                idx.find_entry(h).map(|e| e.resource_offset)
            );
        }
    }

    #[test]
    fn parse_rejects_wrong_version() {
        let (idx, _) = build_fixture();
        let mut bytes = idx.serialize();
        bytes[0..4].copy_from_slice(&99u32.to_be_bytes());
        assert!(matches!(
            ArchiveIndex::parse(&bytes),
            Err(ResourceError::VersionMismatch { .. })
        ));
    }
}
