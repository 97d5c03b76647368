// SPDX-License-Identifier: Apache-2.0
//! Monotonic clock abstraction, microsecond resolution throughout.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A monotonic clock reporting microseconds since an arbitrary epoch.
///
/// The epoch is not comparable across `Clock` implementations; callers
/// must only compare values produced by the same instance.
pub trait Clock: Send + Sync {
    /// Returns the current time in microseconds.
    fn now_micros(&self) -> u64;
}

/// Real-time clock backed by `std::time::Instant`.
#[derive(Debug, Default)]
pub struct SystemClock {
    epoch: once_cell_like::OnceInstant,
}

impl SystemClock {
    /// Creates a new system clock; the epoch is pinned on first use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now_micros(&self) -> u64 {
        let epoch = self.epoch.get_or_init();
        u64::try_from(epoch.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

/// A clock that only advances when told to, for deterministic tests of
/// animation playback, dispatch timing, and glyph-cache frame counters.
#[derive(Debug, Default)]
pub struct FakeClock {
    micros: AtomicU64,
}

impl FakeClock {
    /// Creates a fake clock starting at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by `delta_micros` and returns the new reading.
    pub fn advance(&self, delta_micros: u64) -> u64 {
        self.micros.fetch_add(delta_micros, Ordering::SeqCst) + delta_micros
    }

    /// Sets the clock to an absolute reading.
    pub fn set(&self, micros: u64) {
        self.micros.store(micros, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_micros(&self) -> u64 {
        self.micros.load(Ordering::SeqCst)
    }
}

/// Minimal lazily-pinned `Instant`, avoiding a dependency on `once_cell`
/// for a single-field use site.
mod once_cell_like {
    use std::sync::OnceLock;
    use std::time::Instant;

    #[derive(Debug, Default)]
    pub struct OnceInstant(OnceLock<Instant>);

    impl OnceInstant {
        pub fn get_or_init(&self) -> Instant {
            *self.0.get_or_init(Instant::now)
        }
    }
}
