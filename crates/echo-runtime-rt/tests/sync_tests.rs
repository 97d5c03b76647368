// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs)]

use std::sync::Arc;
use std::thread;

use echo_runtime_rt::{RtCondvar, RtMutex};

#[test]
fn condvar_wakes_waiter_across_threads() {
    let pair = Arc::new((RtMutex::new(false), RtCondvar::new()));
    let pair2 = Arc::clone(&pair);

    let handle = thread::spawn(move || {
        let (mutex, cv) = &*pair2;
        let mut ready = mutex.lock();
        while !*ready {
            ready = cv.wait(ready);
        }
    });

    {
        let (mutex, cv) = &*pair;
        let mut ready = mutex.lock();
        *ready = true;
        cv.notify_one();
        drop(ready);
    }

    handle.join().expect("waiter thread panicked");
}
