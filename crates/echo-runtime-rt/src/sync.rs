// SPDX-License-Identifier: Apache-2.0
//! Thin `Mutex`/`Condvar` wrappers standing in for the engine's abstract
//! thread/mutex/condvar capability set.
//!
//! `std::sync::Mutex::try_lock` already returns `Ok` iff the lock was
//! acquired (POSIX semantics). The source's Windows `TryLock` returned the
//! inverted value; this wrapper exists so
//! that inversion never leaks into the Rust port — `try_lock` here always
//! means "true ⇔ acquired".

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A mutex that never exposes poisoning to callers.
///
/// A panic inside a held lock cannot leave the Echo runtime in a state
/// callers need to reason about (no locking discipline in this codebase
/// holds a lock across a user callback — see the concurrency model), so poison is
/// recovered transparently rather than propagated.
#[derive(Debug, Default)]
pub struct RtMutex<T> {
    inner: Mutex<T>,
}

impl<T> RtMutex<T> {
    /// Wraps `value` in a new mutex.
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Blocks until the lock is acquired.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attempts to acquire the lock without blocking.
    ///
    /// Returns `true` iff the lock was acquired and `guard` now holds it.
    /// POSIX semantics: `true` ⇔ acquired, never inverted.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        match self.inner.try_lock() {
            Ok(guard) => Some(guard),
            Err(std::sync::TryLockError::Poisoned(p)) => Some(p.into_inner()),
            Err(std::sync::TryLockError::WouldBlock) => None,
        }
    }
}

/// Result of a condvar wait-with-timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTimeoutResult {
    /// The condvar was signalled before the timeout elapsed.
    Signalled,
    /// The timeout elapsed without a signal.
    TimedOut,
}

/// A condition variable paired with [`RtMutex`], used by the message bus's
/// `DispatchBlocking` (the message bus contract) and the log-server poll loop
/// (the concurrency model).
#[derive(Debug, Default)]
pub struct RtCondvar {
    inner: Condvar,
}

impl RtCondvar {
    /// Creates a new, unsignalled condition variable.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Condvar::new(),
        }
    }

    /// Blocks the calling thread until notified, re-acquiring `guard`'s
    /// lock before returning.
    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.inner
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until notified or `timeout` elapses.
    pub fn wait_timeout<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        timeout: Duration,
    ) -> (MutexGuard<'a, T>, WaitTimeoutResult) {
        let (guard, result) = self
            .inner
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner);
        let status = if result.timed_out() {
            WaitTimeoutResult::TimedOut
        } else {
            WaitTimeoutResult::Signalled
        };
        (guard, status)
    }

    /// Wakes one thread blocked in [`wait`](Self::wait).
    pub fn notify_one(&self) {
        self.inner.notify_one();
    }

    /// Wakes every thread blocked in [`wait`](Self::wait).
    pub fn notify_all(&self) {
        self.inner.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_lock_true_iff_acquired() {
        let m = RtMutex::new(0);
        let guard = m.lock();
        assert!(m.try_lock().is_none(), "held lock must not be re-acquired");
        drop(guard);
        assert!(m.try_lock().is_some(), "free lock must be acquirable");
    }

    #[test]
    fn condvar_notify_without_waiters_is_a_no_op() {
        let cv = RtCondvar::new();
        cv.notify_all();
        cv.notify_one();
    }
}
