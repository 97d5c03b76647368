// SPDX-License-Identifier: Apache-2.0
//! Shared runtime capabilities for the Echo core: a monotonic clock
//! abstraction and thin locking primitives.
//!
//! Every subsystem in the core runtime (hash registry, message bus,
//! resource factory, scene graph) is built against [`Clock`] rather than
//! calling `std::time::Instant::now()` directly, so tests can swap in
//! [`FakeClock`] and drive deterministic timing without real sleeps.
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
    clippy::missing_const_for_fn
)]

mod clock;
mod handle;
mod sync;

pub use clock::{Clock, FakeClock, SystemClock};
pub use handle::RuntimeHandle;
pub use sync::{RtCondvar, RtMutex, WaitTimeoutResult};
