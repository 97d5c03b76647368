// SPDX-License-Identifier: Apache-2.0
//! Endian-neutral MurmurHash2A hash registry: one-shot and incremental
//! 32-/64-bit hashing, plus a debug-only reverse registry.
//!
//! One-shot and incremental hashing agree for every chunk decomposition
//! of the same bytes; the 64-bit incremental bucket-hint pseudo-modulo
//! is reproduced verbatim from the source rather than generalized into
//! a real modulo primitive (see `incremental.rs`).
#![forbid(unsafe_code)]
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
    clippy::unreadable_literal
)]

mod incremental;
mod murmur;
mod reverse;

pub use incremental::{HashState32, HashState64, MAX_REVERSE_LENGTH};
pub use murmur::{hash32, hash64, hash_str32, hash_str64};
pub use reverse::{is_enabled, len as reverse_len, reverse32, reverse64, set_enabled};
