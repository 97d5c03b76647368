// SPDX-License-Identifier: Apache-2.0
//! Stencil clipping scope assignment: the bit-partitioning strategy
//! that turns nested clipping nodes into `{ref, write_mask, test_mask,
//! color_mask}` tuples within an 8-bit stencil budget.

use std::collections::HashMap;

use tracing::warn;

use crate::node::{ClippingMode, NodeHandle};
use crate::scene::Scene;

/// The stencil-test tuple applied while rendering a node (and, for
/// clippers, written while rendering their own shape).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClippingScope {
    /// The reference value descendants compare the stencil buffer against.
    pub ref_val: u8,
    /// Bits this scope writes into the stencil buffer.
    pub write_mask: u8,
    /// Bits descendants must match to be considered "inside".
    pub test_mask: u8,
    /// Bits of the color buffer enabled while drawing (0 for a
    /// clip-only, invisible clipper).
    pub color_mask: u8,
}

#[derive(Debug, Clone, Copy)]
struct StencilBudget {
    bottom: u8,
    top_reserved: u8,
}

impl StencilBudget {
    const fn new() -> Self {
        Self {
            bottom: 0,
            top_reserved: 0,
        }
    }

    fn available(self) -> u8 {
        8u8.saturating_sub(self.top_reserved)
    }

    fn alloc_bottom(self, width: u8) -> Option<(u8, Self)> {
        if width == 0 {
            return Some((self.bottom, self));
        }
        if self.bottom.checked_add(width)? > self.available() {
            return None;
        }
        Some((
            self.bottom,
            Self {
                bottom: self.bottom + width,
                top_reserved: self.top_reserved,
            },
        ))
    }

    fn alloc_top(self) -> Option<(u8, Self)> {
        if self.bottom + 1 > self.available() {
            return None;
        }
        let top_reserved = self.top_reserved + 1;
        Some((
            8 - top_reserved,
            Self {
                bottom: self.bottom,
                top_reserved,
            },
        ))
    }
}

fn bits_for_count(count: u8) -> u8 {
    let mut bits = 0u8;
    while (1u32 << bits) < u32::from(count) + 1 {
        bits += 1;
    }
    bits
}

/// Assigns every live node in `scene` a [`ClippingScope`]: the identity
/// scope for nodes outside any clipper, or the nearest ancestor
/// clipper's scope otherwise.
#[must_use]
pub fn assign_clipping_scopes(scene: &Scene) -> HashMap<NodeHandle, ClippingScope> {
    let mut out = HashMap::new();
    let roots: Vec<NodeHandle> = scene.roots().collect();
    let root_scope = ClippingScope {
        ref_val: 0,
        write_mask: 0,
        test_mask: 0,
        color_mask: 0xff,
    };
    assign_siblings(scene, &roots, root_scope, StencilBudget::new(), &mut out);
    out
}

fn assign_siblings(
    scene: &Scene,
    siblings: &[NodeHandle],
    inherited: ClippingScope,
    budget: StencilBudget,
    out: &mut HashMap<NodeHandle, ClippingScope>,
) {
    let non_inverted_count = siblings
        .iter()
        .filter(|h| is_non_inverted_clipper(scene, **h))
        .count();
    let bits_needed = bits_for_count(u8::try_from(non_inverted_count).unwrap_or(u8::MAX));
    let shared_alloc = budget.alloc_bottom(bits_needed);
    if shared_alloc.is_none() && non_inverted_count > 0 {
        warn!(
            bits_needed,
            available = budget.available(),
            "stencil clipping bit budget exceeded; excess clippers render unclipped"
        );
    }

    let mut next_index: u32 = 1;
    for &handle in siblings {
        let Some(node) = scene.get(handle) else {
            continue;
        };
        let (own_scope, child_budget) = if node.clipping_mode == ClippingMode::Stencil {
            if node.clipping_flags.inverted {
                match budget.alloc_top() {
                    Some((bit, new_budget)) => {
                        let mask = 1u8 << bit;
                        (
                            ClippingScope {
                                ref_val: inherited.ref_val | mask,
                                write_mask: inherited.write_mask | mask,
                                test_mask: inherited.test_mask | mask,
                                color_mask: if node.clipping_flags.visible { 0xff } else { 0 },
                            },
                            new_budget,
                        )
                    }
                    None => {
                        warn!("stencil clipping bit budget exceeded for inverted clipper");
                        (inherited, budget)
                    }
                }
            } else {
                match shared_alloc {
                    Some((offset, new_budget)) => {
                        let ref_delta = next_index.min(u32::from((1u32 << bits_needed) - 1));
                        next_index += 1;
                        let mask_delta = ((1u16 << bits_needed) - 1) as u8;
                        let mask = mask_delta << offset;
                        let ref_bits = (ref_delta as u8) << offset;
                        (
                            ClippingScope {
                                ref_val: inherited.ref_val | ref_bits,
                                write_mask: inherited.write_mask | mask,
                                test_mask: inherited.test_mask | mask,
                                color_mask: if node.clipping_flags.visible { 0xff } else { 0 },
                            },
                            new_budget,
                        )
                    }
                    None => (inherited, budget),
                }
            }
        } else {
            (inherited, budget)
        };

        out.insert(handle, own_scope);
        let children: Vec<NodeHandle> = scene.children(handle).collect();
        assign_siblings(scene, &children, own_scope, child_budget, out);
    }
}

fn is_non_inverted_clipper(scene: &Scene, handle: NodeHandle) -> bool {
    scene
        .get(handle)
        .is_some_and(|n| n.clipping_mode == ClippingMode::Stencil && !n.clipping_flags.inverted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ClippingFlags;

    fn make_stencil_chain(scene: &mut Scene, depth: usize, inverted_root: bool) -> Vec<NodeHandle> {
        let mut handles = Vec::new();
        let mut parent = None;
        for i in 0..depth {
            let h = scene.new_node(100 + i as u64).expect("node");
            if let Some(p) = parent {
                scene.set_parent(h, Some(p));
            }
            let n = scene.get_mut(h).expect("node");
            n.clipping_mode = ClippingMode::Stencil;
            n.clipping_flags = ClippingFlags {
                visible: true,
                inverted: i == 0 && inverted_root,
            };
            parent = Some(h);
            handles.push(h);
        }
        handles
    }

    #[test]
    fn seven_nested_non_inverted_under_one_inverted_all_succeed() {
        let mut scene = Scene::new();
        let chain = make_stencil_chain(&mut scene, 8, true);
        let scopes = assign_clipping_scopes(&scene);
        for h in &chain {
            assert_ne!(scopes[h].write_mask, 0, "every clipper in budget must get distinct bits");
        }
    }

    #[test]
    fn eighth_nested_clipper_overflows_and_degrades() {
        let mut scene = Scene::new();
        let chain = make_stencil_chain(&mut scene, 9, true);
        let scopes = assign_clipping_scopes(&scene);
        let seventh = chain[7];
        let eighth = chain[8];
        assert_eq!(
            scopes[&eighth].write_mask, scopes[&seventh].write_mask,
            "overflowed clipper inherits its parent's scope unchanged"
        );
    }

    #[test]
    fn non_clipper_inherits_parent_scope() {
        let mut scene = Scene::new();
        let clipper = scene.new_node(1).expect("clipper");
        scene.get_mut(clipper).expect("clipper").clipping_mode = ClippingMode::Stencil;
        let child = scene.new_node(2).expect("child");
        scene.set_parent(child, Some(clipper));
        let scopes = assign_clipping_scopes(&scene);
        assert_eq!(scopes[&child], scopes[&clipper]);
    }
}
