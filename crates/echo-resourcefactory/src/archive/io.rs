// SPDX-License-Identifier: Apache-2.0
//! The archive read path: mmap-or-pread, decrypt, decompress
//! (the resource factory contract steps 2-5).

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use echo_runtime_rt::RtMutex;
use memmap2::Mmap;

use super::format::ArchiveEntry;
use crate::error::ResourceError;
use crate::xtea;

/// Where a data file's bytes come from: memory-mapped (fast path when
/// available) or seek+read through a file handle.
///
/// the design notes treats "memory-mapped" as a storage-class tag rather
/// than a literal invariant an implementer must chase into every corner
/// — this enum is exactly that tag.
pub enum DataBacking {
    /// Memory-mapped data file.
    Mapped(Mmap),
    /// Plain file handle, read via seek + read (pread-equivalent),
    /// guarded by a mutex since a single `File` isn't `Sync`.
    File(RtMutex<File>),
}

impl DataBacking {
    /// Opens `path`, preferring an mmap and falling back to a plain file
    /// handle if mapping fails (e.g. a zero-length file).
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Io`] if the file cannot be opened.
    #[allow(unsafe_code)]
    pub fn open(path: &std::path::Path) -> Result<Self, ResourceError> {
        let file = File::open(path)?;
        // `memmap2::Mmap::map` is unsafe because the file may be
        // truncated or modified by another process while mapped; the
        // bundled archive data file is read-only for the process
        // lifetime in every caller of this crate, which this module is
        // the single, audited call site for.
        match unsafe { Mmap::map(&file) } {
            Ok(mapping) => Ok(Self::Mapped(mapping)),
            Err(_) => Ok(Self::File(RtMutex::new(file))),
        }
    }

    /// Wraps an already-open file handle, never mmapped — used for
    /// liveupdate data files, which are written to after opening and
    /// must never be mapped per the resource factory contract step 1.
    #[must_use]
    pub fn from_file(file: File) -> Self {
        Self::File(RtMutex::new(file))
    }

    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>, ResourceError> {
        match self {
            Self::Mapped(mapping) => {
                let start = usize::try_from(offset)
                    .map_err(|_| ResourceError::FormatError("offset overflow".into()))?;
                let end = start
                    .checked_add(len)
                    .ok_or_else(|| ResourceError::FormatError("length overflow".into()))?;
                if end > mapping.len() {
                    return Err(ResourceError::FormatError(
                        "entry range exceeds mapped data file".into(),
                    ));
                }
                Ok(mapping[start..end].to_vec())
            }
            Self::File(file) => {
                let mut guard = file.lock();
                guard.seek(SeekFrom::Start(offset))?;
                let mut buf = vec![0u8; len];
                guard.read_exact(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

/// Decryption hook signature (the resource factory contract step 3's "pluggable"
/// decryption function).
pub type DecryptFn = dyn Fn(&mut [u8]) -> Result<(), ResourceError> + Send + Sync;

/// The built-in XTEA decryptor, used unless the factory is configured
/// with a custom hook.
#[must_use]
pub fn builtin_decrypt(data: &mut [u8]) -> Result<(), ResourceError> {
    xtea::decrypt_in_place(data, xtea::BUILTIN_KEY);
    Ok(())
}

fn lz4_decompress(compressed: &[u8], expected_size: usize) -> Result<Vec<u8>, ResourceError> {
    let decompressed = lz4_flex::block::decompress(compressed, expected_size).map_err(|_| {
        ResourceError::BufferTooSmall {
            needed: expected_size,
            available: 0,
        }
    })?;
    if decompressed.len() != expected_size {
        return Err(ResourceError::BufferTooSmall {
            needed: expected_size,
            available: decompressed.len(),
        });
    }
    Ok(decompressed)
}

/// Reads and fully decodes one archive entry: raw bytes from `backing`,
/// then decrypt (if `ENCRYPTED`), then LZ4-decompress (if
/// `entry.is_compressed()`).
///
/// # Errors
///
/// Propagates I/O failures, returns
/// [`ResourceError::DecryptionFailed`] if `decrypt` fails, and
/// [`ResourceError::BufferTooSmall`] on a decompressed-size mismatch.
pub fn read_entry(
    entry: ArchiveEntry,
    backing: &DataBacking,
    decrypt: &DecryptFn,
) -> Result<Vec<u8>, ResourceError> {
    let on_disk_len = if entry.is_compressed() {
        entry.compressed_size as usize
    } else {
        entry.resource_size as usize
    };

    let mut bytes = backing.read_at(u64::from(entry.resource_offset), on_disk_len)?;

    if entry
        .flags
        .contains(super::format::EntryFlags::ENCRYPTED)
    {
        decrypt(&mut bytes).map_err(|_| ResourceError::DecryptionFailed)?;
    }

    if entry.is_compressed() {
        lz4_decompress(&bytes, entry.resource_size as usize)
    } else {
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::format::EntryFlags;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> (tempfile::NamedTempFile, std::path::PathBuf) {
        let mut file = tempfile::NamedTempFile::new().expect("should create temp file");
        file.write_all(bytes).expect("should write");
        file.flush().expect("should flush");
        let path = file.path().to_path_buf();
        (file, path)
    }

    #[test]
    fn plain_entry_round_trips_through_file_backing() {
        let payload = b"file1_data file1_data file1_data";
        let (_guard, path) = write_temp(payload);
        let backing = DataBacking::open(&path).expect("should open");
        let entry = ArchiveEntry {
            resource_offset: 0,
            resource_size: payload.len() as u32,
            compressed_size: super::super::format::COMPRESSED_SENTINEL,
            flags: EntryFlags::empty(),
        };
        let out = read_entry(entry, &backing, &builtin_decrypt).expect("should read");
        assert_eq!(out, payload);
    }

    #[test]
    fn encrypted_entry_decrypts_with_builtin_key() {
        let mut payload = *b"12345678ABCDEFGH";
        xtea::encrypt_in_place(&mut payload, xtea::BUILTIN_KEY);
        let (_guard, path) = write_temp(&payload);
        let backing = DataBacking::open(&path).expect("should open");
        let entry = ArchiveEntry {
            resource_offset: 0,
            resource_size: payload.len() as u32,
            compressed_size: super::super::format::COMPRESSED_SENTINEL,
            flags: EntryFlags::from_bits(EntryFlags::ENCRYPTED),
        };
        let out = read_entry(entry, &backing, &builtin_decrypt).expect("should read");
        assert_eq!(out, b"12345678ABCDEFGH");
    }

    #[test]
    fn compressed_entry_decompresses_to_expected_size() {
        let original = b"the quick brown fox jumps over the lazy dog, repeated, the quick brown fox jumps over the lazy dog";
        let compressed = lz4_flex::block::compress(original);
        let (_guard, path) = write_temp(&compressed);
        let backing = DataBacking::open(&path).expect("should open");
        let entry = ArchiveEntry {
            resource_offset: 0,
            resource_size: original.len() as u32,
            compressed_size: compressed.len() as u32,
            flags: EntryFlags::from_bits(EntryFlags::COMPRESSED),
        };
        let out = read_entry(entry, &backing, &builtin_decrypt).expect("should read");
        assert_eq!(out, original);
    }
}
