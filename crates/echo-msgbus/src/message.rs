// SPDX-License-Identifier: Apache-2.0
//! The `Message` data record (the data model).

use crate::url::MessageUrl;

/// A single posted message: sender/receiver URLs, an opaque id and
/// user-data word, an optional descriptor word, and an inline payload.
///
/// Lifetime: from `post` until the end of the dispatch pass that
/// consumes it (the data model) — payloads never outlive the socket that
/// queued them.
#[derive(Debug, Clone)]
pub struct Message {
    /// URL of the poster, or the default [`MessageUrl`] if none was given.
    pub sender: MessageUrl,
    /// URL this message was addressed to.
    pub receiver: MessageUrl,
    /// Hash identifying the message's meaning (its "id"), typically the
    /// 64-bit hash of a descriptor name.
    pub message_id: u64,
    /// Opaque word the poster may use for its own bookkeeping.
    pub user_data: u64,
    /// Opaque descriptor word (e.g. a reflection handle), if any.
    pub descriptor: Option<u64>,
    /// Inline payload bytes.
    pub payload: Vec<u8>,
}
