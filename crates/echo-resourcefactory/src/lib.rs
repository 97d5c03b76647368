// SPDX-License-Identifier: Apache-2.0
//! Content-addressed resource factory: typed loaders, reference
//! counting, hot-reload, and the packaged archive/liveupdate format.
//!
//! See `README.md` for the disclosed generalizations (a trait-object
//! provider chain in place of a hard-coded archive/filesystem if-else,
//! and a content-addressed handle — the resource's own hash — in place
//! of a separate generation counter).
#![deny(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_const_for_fn,
    clippy::unreadable_literal,
    clippy::missing_errors_doc
)]

mod archive;
mod config;
mod descriptor;
mod error;
mod factory;
mod liveupdate;
mod loader;
mod manifest;
mod path;
mod provider;
mod xtea;

pub use archive::{
    builtin_decrypt, read_entry, Archive, ArchiveEntry, ArchiveIndex, DataBacking, DecryptFn,
    EntryFlags, ARCHIVE_VERSION, COMPRESSED_SENTINEL,
};
pub use config::FactoryConfig;
pub use descriptor::ResourceDescriptor;
pub use error::ResourceError;
pub use factory::Factory;
pub use liveupdate::LiveupdateArchive;
pub use loader::{extension_of, LoaderRegistry, ResourceType};
pub use manifest::{HashAlgorithm, Manifest, ManifestEntry, SignatureAlgorithm};
pub use path::{canonicalize_path, path_hash};
pub use provider::{ArchiveProvider, FilesystemProvider, LiveupdateProvider, ResourceProvider};
