// SPDX-License-Identifier: Apache-2.0
//! The resource descriptor (the data model "Resource descriptor").

use std::any::Any;

/// Live state for one loaded resource: `{name_hash, kind, type_handle,
/// resource_ptr, ref_count, mtime}` in the runtime contract terms, with `kind`/
/// `type_handle` collapsed into `extension` (the registry key already
/// identifies the loader, and this crate has no DDF/pointer distinction
/// to preserve since both are opaque `Box<dyn Any>` payloads here).
pub struct ResourceDescriptor {
    /// Content-addressed identity: the hash of the canonicalized path
    /// this resource was loaded from. Doubles as the handle callers hold
    /// (see `crate::factory` module docs for why no separate generation
    /// counter is needed).
    pub name_hash: u64,
    /// Extension of the loader that created this resource, used to find
    /// the right `destroy`/`recreate` implementation on release/reload.
    pub extension: String,
    /// The typed resource payload.
    pub resource: Box<dyn Any + Send + Sync>,
    /// Reference count; the descriptor is destroyed when this reaches
    /// zero.
    pub ref_count: u32,
    /// Last-modified time of the source bytes, in whatever unit the
    /// owning provider reports (unused by in-archive resources, which
    /// never change out from under a loaded process).
    pub mtime: u64,
}
