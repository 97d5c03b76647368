// SPDX-License-Identifier: Apache-2.0
//! Resource providers: the sources a `Get` call tries, in a fixed
//! priority order — liveupdate overlay first (so an inserted resource
//! shadows the bundled one), then the bundled archive, then loose files.
//!
//! Grounded on `original_source/engine/resource`'s mount-provider split
//! (`provider_archive.h`, `mount_generic.cpp`).

use std::cell::RefCell;
use std::path::PathBuf;

use tracing::trace;

use crate::archive::{read_entry, Archive, DecryptFn};
use crate::error::ResourceError;
use crate::liveupdate::LiveupdateArchive;

/// One source of resource bytes, queried by `path` and/or by its
/// `content_hash`. Returns `Ok(None)` on a clean miss (try the next
/// provider) and `Err` on a hard failure (I/O error, corrupt entry).
pub trait ResourceProvider {
    /// Attempts to read the resource identified by `path`/`content_hash`.
    ///
    /// # Errors
    ///
    /// Returns an error for anything other than "not present here" —
    /// a miss is `Ok(None)`, not an error.
    fn read(&self, path: &str, content_hash: &[u8]) -> Result<Option<Vec<u8>>, ResourceError>;
}

/// Reads from a bundled, read-only archive by content hash.
pub struct ArchiveProvider {
    archive: Archive,
    decrypt: Box<DecryptFn>,
}

impl ArchiveProvider {
    /// Wraps `archive`, decrypting with the built-in XTEA key.
    #[must_use]
    pub fn new(archive: Archive) -> Self {
        Self {
            archive,
            decrypt: Box::new(crate::archive::builtin_decrypt),
        }
    }

    /// Wraps `archive`, decrypting with a custom hook — the resource factory contract
    /// step 3's "the decryption implementation is pluggable".
    #[must_use]
    pub fn with_decrypt(archive: Archive, decrypt: Box<DecryptFn>) -> Self {
        Self { archive, decrypt }
    }
}

impl ResourceProvider for ArchiveProvider {
    fn read(&self, _path: &str, content_hash: &[u8]) -> Result<Option<Vec<u8>>, ResourceError> {
        match self.archive.read(content_hash, &self.decrypt) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(ResourceError::NotFound(_)) => Ok(None),
            Err(other) => Err(other),
        }
    }
}

/// Reads from the liveupdate overlay, checked before the bundled
/// archive so a liveupdate resource shadows the bundled one.
pub struct LiveupdateProvider {
    overlay: RefCell<LiveupdateArchive>,
    decrypt: Box<DecryptFn>,
}

impl LiveupdateProvider {
    /// Wraps an already-open overlay.
    #[must_use]
    pub fn new(overlay: LiveupdateArchive) -> Self {
        Self {
            overlay: RefCell::new(overlay),
            decrypt: Box::new(crate::archive::builtin_decrypt),
        }
    }
}

impl ResourceProvider for LiveupdateProvider {
    fn read(&self, _path: &str, content_hash: &[u8]) -> Result<Option<Vec<u8>>, ResourceError> {
        let overlay = self.overlay.borrow();
        let Some(entry) = overlay.find_entry(content_hash) else {
            return Ok(None);
        };
        read_entry(entry, overlay.backing(), &self.decrypt).map(Some)
    }
}

/// Reads loose files from a filesystem root, joining `path` onto it.
/// Used for unpacked development builds; `content_hash` is ignored since
/// loose files are addressed by path, not by content hash.
pub struct FilesystemProvider {
    root: PathBuf,
}

impl FilesystemProvider {
    /// Roots lookups at `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl ResourceProvider for FilesystemProvider {
    fn read(&self, path: &str, _content_hash: &[u8]) -> Result<Option<Vec<u8>>, ResourceError> {
        let full_path = self.root.join(path);
        match std::fs::read(&full_path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                trace!(path, "filesystem provider: miss");
                Ok(None)
            }
            Err(err) => Err(ResourceError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesystem_provider_reads_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.txt"), b"hello").expect("write");
        let provider = FilesystemProvider::new(dir.path().to_path_buf());
        let bytes = provider.read("a.txt", &[]).expect("should not error");
        assert_eq!(bytes, Some(b"hello".to_vec()));
    }

    #[test]
    fn filesystem_provider_misses_cleanly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let provider = FilesystemProvider::new(dir.path().to_path_buf());
        assert_eq!(provider.read("missing.txt", &[]).expect("should not error"), None);
    }
}
