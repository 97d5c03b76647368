// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs)]

//! the testable properties scenario 6: seven nested non-inverted clippers under one
//! inverted clipper all succeed; an eighth triggers the stencil-budget
//! warning and falls back to unclipped rendering for the excess.

use echo_gui::{assign_clipping_scopes, ClippingFlags, ClippingMode, Scene};

fn build_chain(scene: &mut Scene, depth: usize) -> Vec<echo_gui::NodeHandle> {
    let mut handles = Vec::new();
    let mut parent = None;
    for i in 0..depth {
        let handle = scene.new_node(u64::try_from(i).expect("fits u64") + 1).expect("node");
        if let Some(p) = parent {
            scene.set_parent(handle, Some(p));
        }
        let node = scene.get_mut(handle).expect("node");
        node.set_clipping(
            ClippingMode::Stencil,
            ClippingFlags {
                visible: true,
                inverted: i == 0,
            },
        );
        parent = Some(handle);
        handles.push(handle);
    }
    handles
}

#[test]
fn scenario_clipping_budget() {
    let mut scene = Scene::new();
    let chain = build_chain(&mut scene, 9);
    let scopes = assign_clipping_scopes(&scene);

    for window in chain[..8].windows(2) {
        let (parent, child) = (window[0], window[1]);
        assert_ne!(
            scopes[&parent].write_mask, scopes[&child].write_mask,
            "each of the first eight clippers gets a distinct scope"
        );
    }

    let seventh_idx = chain[7];
    let eighth_idx = chain[8];
    assert_eq!(
        scopes[&eighth_idx], scopes[&seventh_idx],
        "the ninth clipper in the chain overflows the 8-bit budget and inherits unclipped"
    );
}
