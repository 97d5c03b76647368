// SPDX-License-Identifier: Apache-2.0
//! URL parsing: `[socket:]path[#fragment]` (the message bus contract).

use echo_hashreg::hash_str64;

use crate::error::MessageError;

/// Maximum length of the socket segment of a URL string.
pub const MAX_SOCKET_SEGMENT_LEN: usize = 63;

/// A parsed message URL: a socket name, a path, and an optional fragment,
/// each reduced to its 64-bit hash.
///
/// The socket name itself is resolved to a handle by the caller (a
/// [`Url`] only carries the hash so it can be constructed without bus
/// access); see [`crate::MessageBus::resolve_url`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedUrl<'a> {
    /// Socket name segment, if present.
    pub socket: Option<&'a str>,
    /// Path segment (may be empty).
    pub path: &'a str,
    /// Fragment segment, if present.
    pub fragment: Option<&'a str>,
}

/// Resolved URL addressing a socket + path + fragment by hash, matching
/// the `Message` data model's `{socket_handle, path_hash, fragment_hash}`
/// tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageUrl {
    /// Encoded socket handle (0 means "no socket", a local/self address).
    pub socket_handle: u32,
    /// Hash of the path segment.
    pub path_hash: u64,
    /// Hash of the fragment segment, or 0 if absent.
    pub fragment_hash: u64,
}

/// Parses a URL string into its socket/path/fragment segments without
/// resolving the socket name to a handle.
///
/// # Errors
///
/// Returns [`MessageError::MalformedUrl`] if there is more than one `:`
/// or `#`, if `#` precedes `:`, or if the socket segment exceeds
/// [`MAX_SOCKET_SEGMENT_LEN`].
pub fn parse(url: &str) -> Result<ParsedUrl<'_>, MessageError> {
    let colon = url.find(':');
    let hash_pos = url.find('#');

    if let (Some(c), Some(h)) = (colon, hash_pos) {
        if h < c {
            return Err(MessageError::MalformedUrl(url.to_string()));
        }
    }

    if url.matches(':').count() > 1 || url.matches('#').count() > 1 {
        return Err(MessageError::MalformedUrl(url.to_string()));
    }

    let (socket, rest) = match colon {
        Some(idx) => {
            let seg = &url[..idx];
            if seg.len() > MAX_SOCKET_SEGMENT_LEN {
                return Err(MessageError::MalformedUrl(url.to_string()));
            }
            (Some(seg), &url[idx + 1..])
        }
        None => (None, url),
    };

    let (path, fragment) = match rest.find('#') {
        Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
        None => (rest, None),
    };

    Ok(ParsedUrl {
        socket,
        path,
        fragment,
    })
}

/// Hashes a [`ParsedUrl`]'s path and fragment; the socket handle must be
/// resolved separately by the bus (a bare parse has no socket table).
#[must_use]
pub fn hash_parts(parsed: &ParsedUrl<'_>) -> (u64, u64) {
    let path_hash = hash_str64(parsed.path);
    let fragment_hash = parsed.fragment.map_or(0, hash_str64);
    (path_hash, fragment_hash)
}
