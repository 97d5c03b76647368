// SPDX-License-Identifier: Apache-2.0
//! In-process message bus: named sockets, page-bumped message payloads,
//! and cooperative FIFO dispatch.
//!
//! See `README.md` for the one disclosed generalization (pages as a
//! safe byte budget, not a literal bump-allocated arena).
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

mod bus;
mod error;
mod message;
mod page;
mod socket;
mod url;

pub use bus::{MessageBus, MAX_SOCKETS};
pub use error::MessageError;
pub use message::Message;
pub use page::{message_footprint, ALIGNMENT, PAGE_SIZE};
pub use socket::SocketHandle;
pub use url::{hash_parts, parse, MessageUrl, ParsedUrl, MAX_SOCKET_SEGMENT_LEN};
