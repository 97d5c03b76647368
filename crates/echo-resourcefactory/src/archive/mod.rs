// SPDX-License-Identifier: Apache-2.0
//! Archive file format: index (`.arci`), data (`.arcd`), lookup, and the
//! read pipeline (the resource factory contract / the external file formats).

mod format;
mod index;
mod io;

pub use format::{
    ArchiveEntry, EntryFlags, ARCHIVE_VERSION, COMPRESSED_SENTINEL, ENTRY_RECORD_SIZE,
    HASH_SLOT_SIZE, HEADER_SIZE, INDEX_MD5_SIZE,
};
pub use index::ArchiveIndex;
pub use io::{builtin_decrypt, read_entry, DataBacking, DecryptFn};

use crate::error::ResourceError;
use std::path::Path;

/// A loaded, read-only bundled archive: its index plus the data file
/// backing described by the resource factory contract.
pub struct Archive {
    index: ArchiveIndex,
    backing: DataBacking,
}

impl Archive {
    /// Opens an archive from a co-located `<stem>.arci`/`<stem>.arcd`
    /// pair, where `index_path` is the `.arci` file.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Io`] on a read failure or
    /// [`ResourceError::VersionMismatch`]/[`ResourceError::FormatError`]
    /// on a malformed index.
    pub fn open(index_path: &Path) -> Result<Self, ResourceError> {
        let index_bytes = std::fs::read(index_path)?;
        let index = ArchiveIndex::parse(&index_bytes)?;
        let data_path = index_path.with_extension("arcd");
        let backing = DataBacking::open(&data_path)?;
        Ok(Self { index, backing })
    }

    /// Wraps an already-parsed index and data backing directly, for
    /// tests and for callers that construct the archive in memory.
    #[must_use]
    pub fn from_parts(index: ArchiveIndex, backing: DataBacking) -> Self {
        Self { index, backing }
    }

    /// Looks up `hash` (the content-hash of a canonicalized resource
    /// path) and, on a hit, reads and fully decodes its bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] on a miss, or the read
    /// pipeline's errors on a hit (I/O, decrypt, decompress failures).
    pub fn read(&self, hash: &[u8], decrypt: &DecryptFn) -> Result<Vec<u8>, ResourceError> {
        let entry = self
            .index
            .find_entry(hash)
            .ok_or_else(|| ResourceError::NotFound(format!("{hash:02x?}")))?;
        read_entry(entry, &self.backing, decrypt)
    }

    /// Returns whether `hash` resolves to an entry, without reading it.
    #[must_use]
    pub fn contains(&self, hash: &[u8]) -> bool {
        self.index.find_entry(hash).is_some()
    }

    /// Number of entries in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns whether the archive has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
