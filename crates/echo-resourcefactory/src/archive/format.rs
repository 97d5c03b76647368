// SPDX-License-Identifier: Apache-2.0
//! On-disk archive index layout constants and the entry flag bitset.

/// Archive format version. Readers must reject any other value with
/// [`crate::error::ResourceError::VersionMismatch`].
pub const ARCHIVE_VERSION: u32 = 4;

/// Fixed storage width of a hash slot in the index's hash array — every
/// hash is zero-padded to this width regardless of the archive's
/// declared `hash_length`.
pub const HASH_SLOT_SIZE: usize = 64;

/// Byte size of one on-disk entry record (`{data_off, size, csize,
/// flags}`, each a `u32`).
pub const ENTRY_RECORD_SIZE: usize = 16;

/// Byte size of the index MD5 digest field.
pub const INDEX_MD5_SIZE: usize = 16;

/// Byte size of the fixed index header, before the hash and entry
/// arrays.
pub const HEADER_SIZE: usize = 4 // version
    + 4 // pad
    + 8 // userdata
    + 4 // entry_count
    + 4 // entry_offset
    + 4 // hash_offset
    + 4 // hash_length
    + INDEX_MD5_SIZE;

/// Sentinel `compressed_size` meaning "stored uncompressed".
pub const COMPRESSED_SENTINEL: u32 = 0xFFFF_FFFF;

/// Bitset of per-entry flags (the data model's `{encrypted, compressed,
/// liveupdate}`), hand-rolled as a `u8` rather than pulling in
/// `bitflags` for a 3-bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryFlags(u8);

impl EntryFlags {
    /// Entry payload is XTEA-encrypted.
    pub const ENCRYPTED: u8 = 1 << 0;
    /// Entry payload is LZ4-compressed (informational; the authoritative
    /// signal is `compressed_size != `[`COMPRESSED_SENTINEL`]).
    pub const COMPRESSED: u8 = 1 << 1;
    /// Entry was added via liveupdate and lives in the liveupdate data
    /// file, not the bundled one.
    pub const LIVEUPDATE: u8 = 1 << 2;

    /// An empty flag set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Builds a flag set from its raw bits.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns whether `flag` is set.
    #[must_use]
    pub const fn contains(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// Sets `flag`, returning the updated set.
    #[must_use]
    pub const fn with(self, flag: u8) -> Self {
        Self(self.0 | flag)
    }
}

/// A decoded archive entry: offsets/sizes into the paired data file plus
/// its flag bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Byte offset of the resource within its data file.
    pub resource_offset: u32,
    /// Uncompressed size in bytes.
    pub resource_size: u32,
    /// Compressed size, or [`COMPRESSED_SENTINEL`] if stored uncompressed.
    pub compressed_size: u32,
    /// Flag bitset.
    pub flags: EntryFlags,
}

impl ArchiveEntry {
    /// Returns whether this entry's payload is LZ4-compressed on disk.
    #[must_use]
    pub const fn is_compressed(self) -> bool {
        self.compressed_size != COMPRESSED_SENTINEL
    }
}
