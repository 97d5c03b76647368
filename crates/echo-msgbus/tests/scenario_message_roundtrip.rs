// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs)]

//! the testable properties end-to-end scenario 2: `NewSocket("ping")`; `Post(sender=nil,
//! receiver={socket, 0, 0}, id=hash64("hi"), payload="x")`; `Dispatch` with a
//! callback that appends the received `message.id` to a list. Expected
//! list: `[hash64("hi")]`. `Dispatch` again on the drained socket returns 0.

use echo_hashreg::hash_str64;
use echo_msgbus::{MessageBus, MessageUrl};

#[test]
fn scenario_message_roundtrip() {
    let mut bus = MessageBus::new();
    let handle = bus.new_socket("ping").expect("socket should register");
    let receiver = MessageUrl {
        socket_handle: handle.as_u32(),
        path_hash: 0,
        fragment_hash: 0,
    };

    let id = hash_str64("hi");
    bus.post(None, receiver, id, 0, None, b"x")
        .expect("post should succeed");

    let mut received = Vec::new();
    let count = bus
        .dispatch(handle, |message| received.push(message.message_id))
        .expect("dispatch should succeed");

    assert_eq!(count, 1);
    assert_eq!(received, vec![id]);

    let second = bus.dispatch(handle, |_| ()).expect("second dispatch");
    assert_eq!(second, 0);
}
