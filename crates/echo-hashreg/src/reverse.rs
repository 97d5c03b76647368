// SPDX-License-Identifier: Apache-2.0
//! Debug-only reverse hash registry: a process-wide map from a produced
//! hash back to the bytes that produced it, used to print human-readable
//! names in error/log messages when only a hash survived into a release
//! build.
//!
//! Enabled only under `#[cfg(debug_assertions)]`, matching the source's
//! `dLib::IsDebugMode()` gate. The two tables (32- and 64-bit) sit behind
//! one mutex, as in the source's single `dmHashInitializer::m_Mutex`
//! guarding both `dmHashTable32`/`dmHashTable64`.
//!
//! Rust substitutes `Arc<[u8]>` for the source's `malloc`+manual
//! dedup-at-teardown dance: entries are still content-addressed and still
//! de-duplicated, just by refcounting instead of a one-time pointer-set
//! sweep at process exit (see `DESIGN.md`).

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use echo_runtime_rt::RtMutex;

/// Which width's table an entry belongs to.
pub(crate) enum ReverseWidth {
    W32(u32),
    W64(u64),
}

#[derive(Default)]
struct Registry {
    enabled: bool,
    table32: HashMap<u32, Arc<[u8]>>,
    table64: HashMap<u64, Arc<[u8]>>,
}

fn registry() -> &'static RtMutex<Registry> {
    static REGISTRY: OnceLock<RtMutex<Registry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        RtMutex::new(Registry {
            enabled: true,
            table32: HashMap::new(),
            table64: HashMap::new(),
        })
    })
}

/// Enables or disables reverse-hash recording process-wide.
///
/// Mirrors `dmHashEnableReverseHash`. Has no effect in release builds,
/// where recording never happens regardless of this flag.
pub fn set_enabled(enabled: bool) {
    registry().lock().enabled = enabled;
}

/// Returns whether reverse-hash recording is currently enabled.
#[must_use]
pub fn is_enabled() -> bool {
    registry().lock().enabled
}

#[cfg(debug_assertions)]
pub(crate) fn record(key: ReverseWidth, bytes: Vec<u8>) {
    let mut reg = registry().lock();
    if !reg.enabled {
        return;
    }
    let bytes: Arc<[u8]> = bytes.into();
    match key {
        ReverseWidth::W32(h) => {
            reg.table32.entry(h).or_insert(bytes);
        }
        ReverseWidth::W64(h) => {
            reg.table64.entry(h).or_insert(bytes);
        }
    }
}

#[cfg(not(debug_assertions))]
pub(crate) fn record(_key: ReverseWidth, _bytes: Vec<u8>) {}

/// Looks up the original bytes for a 32-bit hash, if it was recorded.
///
/// Always returns `None` in release builds.
#[must_use]
pub fn reverse32(hash: u32) -> Option<Arc<[u8]>> {
    registry().lock().table32.get(&hash).cloned()
}

/// Looks up the original bytes for a 64-bit hash, if it was recorded.
///
/// Always returns `None` in release builds.
#[must_use]
pub fn reverse64(hash: u64) -> Option<Arc<[u8]>> {
    registry().lock().table64.get(&hash).cloned()
}

/// Returns the number of entries currently recorded, for tests and
/// diagnostics.
#[must_use]
pub fn len() -> (usize, usize) {
    let reg = registry().lock();
    (reg.table32.len(), reg.table64.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::murmur::hash32;

    #[test]
    fn recorded_hash_round_trips_to_bytes() {
        set_enabled(true);
        let input = b"reverse-me-0001";
        let h = hash32(input);
        record(ReverseWidth::W32(h), input.to_vec());
        let got = reverse32(h).expect("entry should have been recorded");
        assert_eq!(&*got, input);
    }

    #[test]
    fn disabling_registry_suppresses_new_entries() {
        let input = b"should-not-be-recorded-xyz-0002";
        let h = hash32(input);
        set_enabled(false);
        if reverse32(h).is_none() {
            record(ReverseWidth::W32(h), input.to_vec());
            #[cfg(debug_assertions)]
            assert!(reverse32(h).is_none());
        }
        set_enabled(true);
    }
}
