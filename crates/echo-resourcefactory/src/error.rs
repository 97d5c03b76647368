// SPDX-License-Identifier: Apache-2.0
//! Error taxonomy for the resource factory and archive (the error handling design).

use thiserror::Error;

/// Errors surfaced by archive lookup/read, liveupdate insertion, and the
/// typed-resource factory.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// No entry matches the requested path/hash.
    #[error("resource not found: {0:?}")]
    NotFound(String),

    /// A unique-key constraint was violated (duplicate loader extension,
    /// duplicate liveupdate insertion).
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Syntactically invalid input (bad extension, empty path).
    #[error("invalid: {0}")]
    Invalid(String),

    /// A bounded table (the factory's slot table) is exhausted.
    #[error("out of resources: {0}")]
    OutOfResources(String),

    /// The archive/manifest version word did not match the known constant.
    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// The version this build understands.
        expected: u32,
        /// The version actually read from the file.
        found: u32,
    },

    /// Bytes decoded but failed a structural check (bad offsets, short
    /// read past declared length).
    #[error("format error: {0}")]
    FormatError(String),

    /// A platform read/write failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A decompressed payload did not fit (or didn't exactly fill) the
    /// caller's buffer.
    #[error("buffer too small: need {needed}, have {available}")]
    BufferTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes the caller provided.
        available: usize,
    },

    /// A `Get` call recursively re-entered the same `name_hash` while it
    /// was still being constructed.
    #[error("resource loop detected for hash {0:#x}")]
    LoopError(u64),

    /// The manifest's signature did not verify.
    #[error("signature mismatch")]
    SignatureMismatch,

    /// A caller asked for a resource as a type it was not created as.
    #[error("type mismatch: expected {expected}, stored as {actual}")]
    TypeMismatch {
        /// The type name the caller requested.
        expected: &'static str,
        /// The extension of the loader that actually created the stored
        /// resource.
        actual: String,
    },

    /// Decryption failed (bad key, corrupt ciphertext).
    #[error("decryption failed")]
    DecryptionFailed,
}
