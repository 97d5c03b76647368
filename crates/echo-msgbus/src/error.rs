// SPDX-License-Identifier: Apache-2.0
//! Error taxonomy for the message bus (the error handling design).

use thiserror::Error;

/// Errors surfaced by socket creation, posting, and dispatch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// `NewSocket` was called with an empty name or one containing `#`/`:`.
    #[error("invalid socket name {0:?}")]
    InvalidSocketName(String),

    /// `NewSocket` was called with a name that is already registered.
    #[error("socket {0:?} already exists")]
    SocketAlreadyExists(String),

    /// The process-wide socket table (128 slots) is full.
    #[error("socket table is full (max {max} sockets)")]
    OutOfResources {
        /// Configured socket table capacity.
        max: u32,
    },

    /// A handle's version did not match the live socket occupying its
    /// slot, or no socket occupies that slot.
    #[error("socket not found")]
    SocketNotFound,

    /// A URL string violated the `[socket:]path[#fragment]` grammar.
    #[error("malformed url: {0:?}")]
    MalformedUrl(String),

    /// A message payload did not fit within a single allocator page.
    #[error("payload of {size} bytes exceeds the {capacity}-byte page size")]
    PayloadTooLarge {
        /// Requested payload size in bytes.
        size: usize,
        /// Page capacity in bytes.
        capacity: usize,
    },
}
