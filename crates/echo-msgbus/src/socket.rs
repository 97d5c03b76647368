// SPDX-License-Identifier: Apache-2.0
//! Socket handles and per-socket state (the data model / the message bus contract).

use std::collections::VecDeque;

use echo_runtime_rt::{RtCondvar, RtMutex};

use crate::message::Message;
use crate::page::PageAllocator;

/// Opaque handle to a socket: `(version << 16) | index`, version nonzero.
///
/// Matches the source's `HSocket` encoding exactly so that a stale handle
/// to a deleted-and-recreated slot is detected by version mismatch rather
/// than silently addressing the wrong socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketHandle(u32);

impl SocketHandle {
    pub(crate) fn encode(index: u16, version: u16) -> Self {
        Self((u32::from(version) << 16) | u32::from(index))
    }

    pub(crate) fn index(self) -> u16 {
        (self.0 & 0xffff) as u16
    }

    pub(crate) fn version(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Returns the raw encoded handle value.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Reconstructs a handle from a previously-encoded raw value.
    #[must_use]
    pub fn from_u32(raw: u32) -> Self {
        Self(raw)
    }
}

/// Mutable, lock-guarded socket state: the FIFO message queue and its
/// backing page allocator.
#[derive(Debug, Default)]
pub(crate) struct SocketInner {
    pub(crate) queue: VecDeque<Message>,
    pub(crate) allocator: PageAllocator,
}

/// A named socket: identity (name, hash, version) plus its mutex/condvar-
/// guarded queue, matching `MessageSocket` in the source.
#[derive(Debug)]
pub(crate) struct Socket {
    pub(crate) name: String,
    pub(crate) name_hash: u64,
    pub(crate) version: u16,
    pub(crate) inner: RtMutex<SocketInner>,
    pub(crate) condvar: RtCondvar,
}

impl Socket {
    pub(crate) fn new(name: String, name_hash: u64, version: u16) -> Self {
        Self {
            name,
            name_hash,
            version,
            inner: RtMutex::new(SocketInner::default()),
            condvar: RtCondvar::new(),
        }
    }
}
