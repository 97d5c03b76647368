// SPDX-License-Identifier: Apache-2.0
//! Liveupdate overlay: a second, writable `.arci`/`.arcd` pair that lets
//! resources be inserted into an already-loaded archive after ship
//! resources and the layout of the overlay's two co-located files.
//!
//! Grounded on `original_source/engine/resource/src/resource_archive.cpp`
//! (`InsertResource`) for the splice mechanics, and on
//! `echo-config-fs`'s use of the `directories` crate for locating a
//! platform "application support" directory.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::archive::{ArchiveEntry, ArchiveIndex, DataBacking, EntryFlags, COMPRESSED_SENTINEL};
use crate::error::ResourceError;

const INDEX_FILE_NAME: &str = "liveupdate.arci";
const DATA_FILE_NAME: &str = "liveupdate.arcd";

/// A writable overlay archive. Entries inserted here shadow bundled
/// entries with the same content hash: the resource factory contract's read path checks
/// the liveupdate provider before the bundled archive provider.
pub struct LiveupdateArchive {
    dir: PathBuf,
    index: ArchiveIndex,
    data_file: File,
    backing: DataBacking,
}

impl LiveupdateArchive {
    /// Opens (creating if absent) the liveupdate overlay rooted at
    /// `dir`, a platform application-support directory per the external file formats.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Io`] on a filesystem failure or
    /// [`ResourceError::FormatError`]/[`ResourceError::VersionMismatch`]
    /// if an existing index is corrupt.
    pub fn open(dir: &Path) -> Result<Self, ResourceError> {
        std::fs::create_dir_all(dir)?;
        let index_path = dir.join(INDEX_FILE_NAME);
        let data_path = dir.join(DATA_FILE_NAME);

        let index = if index_path.exists() {
            let bytes = std::fs::read(&index_path)?;
            ArchiveIndex::parse(&bytes)?
        } else {
            ArchiveIndex::empty(8)
        };

        let data_file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&data_path)?;

        // The overlay's backing is always a plain file handle: it is
        // written to after opening, and the resource factory contract step 1 requires
        // liveupdate data to never be mmapped.
        let backing = DataBacking::from_file(data_file.try_clone()?);

        Ok(Self {
            dir: dir.to_path_buf(),
            index,
            data_file,
            backing,
        })
    }

    /// Returns the backing the factory's read path should use for
    /// entries found in this overlay's index.
    #[must_use]
    pub fn backing(&self) -> &DataBacking {
        &self.backing
    }

    /// Looks up `hash` in the overlay's index.
    #[must_use]
    pub fn find_entry(&self, hash: &[u8]) -> Option<ArchiveEntry> {
        self.index.find_entry(hash)
    }

    /// Inserts `bytes` (already encoded to match `flags` — pre-encrypted
    /// and/or pre-compressed by the caller) under `hash`, appending to
    /// the liveupdate data file and persisting the updated index via
    /// write-temp-then-rename.
    ///
    /// `uncompressed_size` is the size to record for decompression;
    /// ignored (and should equal `bytes.len()`) when `flags` doesn't
    /// include [`EntryFlags::COMPRESSED`].
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::AlreadyExists`] if `hash` is already
    /// present, or [`ResourceError::Io`] on a filesystem failure.
    pub fn insert(
        &mut self,
        hash: &[u8],
        bytes: &[u8],
        flags: EntryFlags,
        uncompressed_size: u32,
    ) -> Result<(), ResourceError> {
        if self.index.find_entry(hash).is_some() {
            return Err(ResourceError::AlreadyExists(
                "resource already stored".into(),
            ));
        }

        let offset = self.data_file.seek(SeekFrom::End(0))?;
        self.data_file.write_all(bytes)?;
        self.data_file.flush()?;

        let compressed_size = if flags.contains(EntryFlags::COMPRESSED) {
            bytes.len() as u32
        } else {
            COMPRESSED_SENTINEL
        };

        let entry = ArchiveEntry {
            resource_offset: u32::try_from(offset)
                .map_err(|_| ResourceError::FormatError("liveupdate data file too large".into()))?,
            resource_size: uncompressed_size,
            compressed_size,
            flags: flags.with(EntryFlags::LIVEUPDATE),
        };

        self.index.insert(hash, entry)?;
        self.persist()?;
        debug!(entries = self.index.len(), "liveupdate: inserted resource");
        Ok(())
    }

    /// Atomically rewrites `liveupdate.arci` via a write-to-temp-then-
    /// rename, so a crash mid-write never leaves a half-written index on
    /// disk.
    fn persist(&self) -> Result<(), ResourceError> {
        let index_path = self.dir.join(INDEX_FILE_NAME);
        let tmp_path = self.dir.join(format!("{INDEX_FILE_NAME}.tmp"));
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&self.index.serialize())?;
            tmp.flush()?;
        }
        std::fs::rename(&tmp_path, &index_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_find_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut overlay = LiveupdateArchive::open(dir.path()).expect("should open");
        overlay
            .insert(b"hash-a", b"payload-a", EntryFlags::empty(), 9)
            .expect("should insert");

        let entry = overlay.find_entry(b"hash-a").expect("entry should exist");
        assert!(entry.flags.contains(EntryFlags::LIVEUPDATE));
        assert_eq!(entry.resource_size, 9);
    }

    #[test]
    fn insert_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let mut overlay = LiveupdateArchive::open(dir.path()).expect("should open");
            overlay
                .insert(b"hash-b", b"payload-b", EntryFlags::empty(), 9)
                .expect("should insert");
        }
        let reopened = LiveupdateArchive::open(dir.path()).expect("should reopen");
        assert!(reopened.find_entry(b"hash-b").is_some());
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut overlay = LiveupdateArchive::open(dir.path()).expect("should open");
        overlay
            .insert(b"hash-c", b"payload", EntryFlags::empty(), 7)
            .expect("first insert should succeed");
        assert!(matches!(
            overlay.insert(b"hash-c", b"other", EntryFlags::empty(), 5),
            Err(ResourceError::AlreadyExists(_))
        ));
    }
}
