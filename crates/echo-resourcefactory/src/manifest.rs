// SPDX-License-Identifier: Apache-2.0
//! The signed manifest: a length-delimited, protobuf-style record
//! listing `{url, url_hash, content_hash, flags}` entries plus the
//! hash/signature algorithms and engine-version whitelist used to build
//! it (the external file formats).
//!
//! Hand-rolled over the documented field order rather than pulling in a
//! protobuf crate, same reasoning as the archive index: a single, fixed,
//! already-fully-specified record, not an evolving schema.

use crate::error::ResourceError;

/// Magic number every manifest must start with.
pub const MANIFEST_MAGIC: u32 = 0x4446_534d; // "DFSM"

/// Manifest format version this reader understands.
pub const MANIFEST_VERSION: u32 = 1;

/// Which digest function produced `url_hash`/`content_hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// MurmurHash2A, 32-bit (`echo-hashreg::hash32`).
    Murmur32,
    /// MurmurHash2A, 64-bit (`echo-hashreg::hash64`).
    Murmur64,
    /// SHA-256, used for `content_hash` on manifests that need a
    /// collision-resistant integrity check rather than a fast lookup key.
    Sha256,
}

impl HashAlgorithm {
    fn from_tag(tag: u8) -> Result<Self, ResourceError> {
        match tag {
            0 => Ok(Self::Murmur32),
            1 => Ok(Self::Murmur64),
            2 => Ok(Self::Sha256),
            other => Err(ResourceError::FormatError(format!(
                "unknown hash algorithm tag {other}"
            ))),
        }
    }
}

/// Which signature scheme covers the manifest payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// No signature; `signature` is empty and verification is skipped.
    ///
    /// Used by development builds; [`Manifest::verify`] still succeeds
    /// so the read path doesn't special-case dev builds, but callers
    /// that require signed content should reject this variant
    /// explicitly.
    None,
    /// RSA with SHA-256, matching the source's default signing scheme.
    RsaSha256,
}

impl SignatureAlgorithm {
    fn from_tag(tag: u8) -> Result<Self, ResourceError> {
        match tag {
            0 => Ok(Self::None),
            1 => Ok(Self::RsaSha256),
            other => Err(ResourceError::FormatError(format!(
                "unknown signature algorithm tag {other}"
            ))),
        }
    }
}

/// One entry in the manifest's resource table.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    /// The resource's logical URL, pre-canonicalization.
    pub url: String,
    /// Hash of `url` under the manifest's declared [`HashAlgorithm`].
    pub url_hash: Vec<u8>,
    /// Hash of the resource's content, the archive lookup key.
    pub content_hash: Vec<u8>,
    /// Per-entry flags (currently only `compressed`/`encrypted`, mirrored
    /// from the archive entry this manifest entry describes).
    pub flags: u32,
}

/// A parsed manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Algorithm used for `url_hash`/`content_hash`.
    pub resource_hash_algorithm: HashAlgorithm,
    /// Algorithm used for `signature`.
    pub signature_algorithm: SignatureAlgorithm,
    /// Engine versions this manifest was built against; a runtime should
    /// refuse to load a manifest that doesn't list its own version.
    pub engine_versions: Vec<String>,
    /// The resource table.
    pub entries: Vec<ManifestEntry>,
    signature: Vec<u8>,
    signed_payload: Vec<u8>,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ResourceError> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or_else(|| ResourceError::FormatError("manifest length overflow".into()))?;
        if end > self.bytes.len() {
            return Err(ResourceError::FormatError(
                "manifest truncated".into(),
            ));
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ResourceError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, ResourceError> {
        let field = self.take(4)?;
        Ok(u32::from_be_bytes([field[0], field[1], field[2], field[3]]))
    }

    /// Reads a length-delimited byte string: a `u32` length prefix
    /// followed by that many bytes.
    fn bytes_field(&mut self) -> Result<&'a [u8], ResourceError> {
        let len = self.u32()? as usize;
        self.take(len)
    }

    fn string_field(&mut self) -> Result<String, ResourceError> {
        let raw = self.bytes_field()?;
        String::from_utf8(raw.to_vec())
            .map_err(|_| ResourceError::FormatError("manifest field not valid utf-8".into()))
    }
}

impl Manifest {
    /// Parses a manifest from its length-delimited byte representation.
    ///
    /// Field order: magic, version, resource-hash-algorithm tag,
    /// signature-algorithm tag, engine-version whitelist (count + each as
    /// a length-delimited string), entry count, then that many
    /// `{url, url_hash, content_hash, flags}` records, followed by the
    /// signature itself as a trailing length-delimited byte string.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::VersionMismatch`] if the magic or version
    /// word doesn't match, [`ResourceError::FormatError`] on a truncated
    /// or structurally invalid record.
    pub fn parse(bytes: &[u8]) -> Result<Self, ResourceError> {
        let mut reader = Reader::new(bytes);

        let magic = reader.u32()?;
        if magic != MANIFEST_MAGIC {
            return Err(ResourceError::FormatError(format!(
                "bad manifest magic: {magic:#010x}"
            )));
        }

        let version = reader.u32()?;
        if version != MANIFEST_VERSION {
            return Err(ResourceError::VersionMismatch {
                expected: MANIFEST_VERSION,
                found: version,
            });
        }

        let resource_hash_algorithm = HashAlgorithm::from_tag(reader.u8()?)?;
        let signature_algorithm = SignatureAlgorithm::from_tag(reader.u8()?)?;

        let engine_version_count = reader.u32()? as usize;
        let mut engine_versions = Vec::with_capacity(engine_version_count);
        for _ in 0..engine_version_count {
            engine_versions.push(reader.string_field()?);
        }

        let payload_start = reader.pos;

        let entry_count = reader.u32()? as usize;
        let mut entries = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            let url = reader.string_field()?;
            let url_hash = reader.bytes_field()?.to_vec();
            let content_hash = reader.bytes_field()?.to_vec();
            let flags = reader.u32()?;
            entries.push(ManifestEntry {
                url,
                url_hash,
                content_hash,
                flags,
            });
        }

        let payload_end = reader.pos;
        let signed_payload = bytes[payload_start..payload_end].to_vec();
        let signature = reader.bytes_field()?.to_vec();

        Ok(Self {
            resource_hash_algorithm,
            signature_algorithm,
            engine_versions,
            entries,
            signature,
            signed_payload,
        })
    }

    /// Returns whether `engine_version` is listed in this manifest's
    /// whitelist.
    #[must_use]
    pub fn allows_engine_version(&self, engine_version: &str) -> bool {
        self.engine_versions.iter().any(|v| v == engine_version)
    }

    /// Verifies the manifest's signature over its resource table via
    /// `verify_fn`, which receives the signed payload bytes and the raw
    /// signature bytes.
    ///
    /// [`SignatureAlgorithm::None`] always verifies without calling
    /// `verify_fn`, matching unsigned development manifests.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::SignatureMismatch`] if `verify_fn`
    /// returns `false`.
    pub fn verify(
        &self,
        verify_fn: impl FnOnce(&[u8], &[u8]) -> bool,
    ) -> Result<(), ResourceError> {
        if self.signature_algorithm == SignatureAlgorithm::None {
            return Ok(());
        }
        if verify_fn(&self.signed_payload, &self.signature) {
            Ok(())
        } else {
            Err(ResourceError::SignatureMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(
        engine_versions: &[&str],
        entries: &[(&str, &[u8], &[u8], u32)],
        signature: &[u8],
    ) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MANIFEST_MAGIC.to_be_bytes());
        out.extend_from_slice(&MANIFEST_VERSION.to_be_bytes());
        out.push(1); // Murmur64
        out.push(0); // unsigned
        out.extend_from_slice(&(engine_versions.len() as u32).to_be_bytes());
        for v in engine_versions {
            out.extend_from_slice(&(v.len() as u32).to_be_bytes());
            out.extend_from_slice(v.as_bytes());
        }
        out.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        for (url, url_hash, content_hash, flags) in entries {
            out.extend_from_slice(&(url.len() as u32).to_be_bytes());
            out.extend_from_slice(url.as_bytes());
            out.extend_from_slice(&(url_hash.len() as u32).to_be_bytes());
            out.extend_from_slice(url_hash);
            out.extend_from_slice(&(content_hash.len() as u32).to_be_bytes());
            out.extend_from_slice(content_hash);
            out.extend_from_slice(&flags.to_be_bytes());
        }
        out.extend_from_slice(&(signature.len() as u32).to_be_bytes());
        out.extend_from_slice(signature);
        out
    }

    #[test]
    fn parses_entries_and_whitelist() {
        let bytes = build(
            &["1.2.3"],
            &[("main/go.goc", &[1, 2, 3, 4, 5, 6, 7, 8], &[9, 10], 0)],
            &[],
        );
        let manifest = Manifest::parse(&bytes).expect("should parse");
        assert!(manifest.allows_engine_version("1.2.3"));
        assert!(!manifest.allows_engine_version("9.9.9"));
        assert_eq!(manifest.entries.len(), 1);
        assert_eq!(manifest.entries[0].url, "main/go.goc");
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = build(&[], &[], &[]);
        bytes[0] = 0;
        assert!(matches!(
            Manifest::parse(&bytes),
            Err(ResourceError::FormatError(_))
        ));
    }

    #[test]
    fn rejects_wrong_version() {
        let mut bytes = build(&[], &[], &[]);
        bytes[4..8].copy_from_slice(&99u32.to_be_bytes());
        assert!(matches!(
            Manifest::parse(&bytes),
            Err(ResourceError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn unsigned_manifest_verifies_without_calling_callback() {
        let bytes = build(&[], &[], &[]);
        let manifest = Manifest::parse(&bytes).expect("should parse");
        manifest
            .verify(|_, _| panic!("should not be called for unsigned manifests"))
            .expect("unsigned manifest should verify trivially");
    }

    #[test]
    fn truncated_manifest_is_a_format_error() {
        let bytes = build(&["1.0"], &[], &[]);
        let truncated = &bytes[..bytes.len() - 2];
        assert!(matches!(
            Manifest::parse(truncated),
            Err(ResourceError::FormatError(_))
        ));
    }
}
