// SPDX-License-Identifier: Apache-2.0
//! A shared runtime handle: the explicit stand-in for process-global state.
//!
//! Every subsystem in this workspace that needs wall-clock time or a
//! shared logging/config context takes a `RuntimeHandle` rather than
//! reaching for a hidden `static`. Two independent `RuntimeHandle`s never
//! observe each other's clock, which is what lets tests run several
//! scenarios in the same process without a shared fake-clock race.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};

/// A cheaply-cloneable handle bundling the capabilities subsystems in this
/// workspace are built against, currently just a [`Clock`].
///
/// Constructing one is the only place a `dyn Clock` is chosen; everything
/// downstream (the message bus, the resource factory, the scene graph)
/// receives time through whichever handle its caller built them with.
#[derive(Clone)]
pub struct RuntimeHandle {
    clock: Arc<dyn Clock>,
}

impl RuntimeHandle {
    /// Builds a handle around an explicit clock, typically a
    /// [`crate::FakeClock`] in tests.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Builds a handle backed by the real system clock.
    #[must_use]
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock::new()))
    }

    /// Returns the current time in microseconds, per this handle's clock.
    #[must_use]
    pub fn now_micros(&self) -> u64 {
        self.clock.now_micros()
    }

    /// Returns the handle's clock, for callers that need to pass a `Clock`
    /// through independently of the rest of a `RuntimeHandle`.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }
}
