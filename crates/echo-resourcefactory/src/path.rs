// SPDX-License-Identifier: Apache-2.0
//! Path canonicalization, grounded on
//! `original_source/engine/resource/src/resource_util.cpp`.
//!
//! The archive lookup contract silently depends on canonical paths
//! producing the same `path_hash` the build pipeline used — a resource
//! requested as `//foo/bar` must hash identically to `/foo/bar`.

use echo_hashreg::hash_str64;

/// Strips a leading `/` and collapses any run of `/` into a single `/`,
/// the same normalization the build pipeline applies before hashing a
/// resource path.
#[must_use]
pub fn canonicalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut last_was_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if last_was_slash {
                continue;
            }
            last_was_slash = true;
        } else {
            last_was_slash = false;
        }
        out.push(ch);
    }
    if out.starts_with('/') {
        out.remove(0);
    }
    out
}

/// Hashes a resource path after canonicalizing it, matching what the
/// archive's build-time hash would have produced for the same logical
/// path.
#[must_use]
pub fn path_hash(path: &str) -> u64 {
    hash_str64(&canonicalize_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_slash() {
        assert_eq!(canonicalize_path("/foo/bar"), "foo/bar");
    }

    #[test]
    fn collapses_double_slashes() {
        assert_eq!(canonicalize_path("//foo//bar"), "foo/bar");
    }

    #[test]
    fn leaves_canonical_paths_untouched() {
        assert_eq!(canonicalize_path("foo/bar"), "foo/bar");
    }

    #[test]
    fn canonicalization_affects_hash_equality() {
        assert_eq!(path_hash("/foo/bar"), path_hash("foo/bar"));
        assert_eq!(path_hash("//foo//bar"), path_hash("foo/bar"));
    }
}
