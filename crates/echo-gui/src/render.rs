// SPDX-License-Identifier: Apache-2.0
//! The render traversal: walks the scene depth-first, assigns each
//! live, enabled node its [`crate::render_key::render_key`], and
//! returns the flattened entry stream in ascending sort order (the
//! render pass contract).
//!
//! Clipping nodes contribute an extra [`RenderEntryKind::ClipWrite`]
//! entry immediately before their subtree, and inverted clippers that
//! are themselves visible contribute a trailing
//! [`RenderEntryKind::ClipVisible`] entry after their subtree, so the
//! mask is in place for descendants and the clipper's own shape still
//! draws on top once the exclusion it defines has been honored.

use std::collections::HashMap;

use crate::clipping::{assign_clipping_scopes, ClippingScope};
use crate::node::{ClippingMode, NodeHandle};
use crate::render_key::{render_key, RenderEntry, RenderEntryKind};
use crate::scene::Scene;
use crate::text::LAYER_ORDER;

/// Renders `scene`'s current state into a sorted entry stream.
///
/// Disabled nodes (and their entire subtrees, transitively) are
/// excluded, matching the animation system's disabled-ancestor freeze.
#[must_use]
pub fn render(scene: &Scene) -> Vec<RenderEntry> {
    let scopes = assign_clipping_scopes(scene);
    let mut ctx = RenderCtx {
        scene,
        scopes: &scopes,
        clip_ids: HashMap::new(),
        next_clip_id: 1,
        next_index: 0,
        entries: Vec::new(),
    };
    let roots: Vec<NodeHandle> = scene.roots().collect();
    for root in roots {
        ctx.visit(root, 0);
    }
    ctx.entries.sort_by_key(|e| e.key);
    ctx.entries
}

struct RenderCtx<'a> {
    scene: &'a Scene,
    scopes: &'a HashMap<NodeHandle, ClippingScope>,
    clip_ids: HashMap<NodeHandle, u8>,
    next_clip_id: u8,
    next_index: u16,
    entries: Vec<RenderEntry>,
}

impl RenderCtx<'_> {
    fn visit(&mut self, handle: NodeHandle, inherited_clip_id: u8) {
        let Some(node) = self.scene.get(handle) else {
            return;
        };
        if !node.enabled() {
            return;
        }

        let layer = u8::try_from(node.layer_index & 0x7).unwrap_or(0);
        let index = self.next_index;
        self.next_index = self.next_index.wrapping_add(1);

        let is_clipper = node.clipping_mode == ClippingMode::Stencil;
        let own_clip_id = if is_clipper {
            let id = self.next_clip_id;
            self.next_clip_id = self.next_clip_id.saturating_add(1);
            self.clip_ids.insert(handle, id);
            id
        } else {
            inherited_clip_id
        };

        let scope = self.scopes.get(&handle).copied().unwrap_or_default();

        if is_clipper {
            self.entries.push(RenderEntry {
                node: handle,
                key: render_key(layer, index, own_clip_id, 0, 0),
                kind: RenderEntryKind::ClipWrite,
            });
        }

        if scope.color_mask != 0 && !is_clipper {
            if node.text.is_some() {
                for (sub_layer, _name) in LAYER_ORDER.iter().enumerate() {
                    self.entries.push(RenderEntry {
                        node: handle,
                        key: render_key(
                            layer,
                            index,
                            own_clip_id,
                            u8::try_from(sub_layer).unwrap_or(0),
                            0,
                        ),
                        kind: RenderEntryKind::Draw,
                    });
                }
            } else {
                self.entries.push(RenderEntry {
                    node: handle,
                    key: render_key(layer, index, own_clip_id, 0, 0),
                    kind: RenderEntryKind::Draw,
                });
            }
        }

        let children: Vec<NodeHandle> = self.scene.children(handle).collect();
        for child in children {
            self.visit(child, own_clip_id);
        }

        if is_clipper && node.clipping_flags.visible && node.clipping_flags.inverted {
            // `index` outranks `clipper_id`/`sub_layer`/`sub_index` in the
            // key, so this entry must carry an index at least as high as
            // any assigned within the subtree just visited, or it sorts
            // before (not after) the descendants it's meant to follow.
            let trailing_index = self.next_index;
            self.entries.push(RenderEntry {
                node: handle,
                key: render_key(layer, trailing_index, own_clip_id, 0x7, 0x1ff),
                kind: RenderEntryKind::ClipVisible,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ClippingFlags;

    #[test]
    fn disabled_node_and_subtree_are_excluded() {
        let mut scene = Scene::new();
        let parent = scene.new_node(1).expect("parent");
        let child = scene.new_node(2).expect("child");
        scene.set_parent(child, Some(parent));
        scene.get_mut(parent).expect("parent").set_enabled(false);

        let entries = render(&scene);
        assert!(entries.iter().all(|e| e.node != parent && e.node != child));
    }

    #[test]
    fn clipper_emits_write_before_and_visible_after_subtree() {
        let mut scene = Scene::new();
        let clipper = scene.new_node(1).expect("clipper");
        {
            let n = scene.get_mut(clipper).expect("clipper");
            n.clipping_mode = ClippingMode::Stencil;
            n.clipping_flags = ClippingFlags {
                visible: true,
                inverted: true,
            };
        }
        let child = scene.new_node(2).expect("child");
        scene.set_parent(child, Some(clipper));

        let entries = render(&scene);
        let write_pos = entries
            .iter()
            .position(|e| e.node == clipper && e.kind == RenderEntryKind::ClipWrite)
            .expect("clip write entry");
        let visible_pos = entries
            .iter()
            .position(|e| e.node == clipper && e.kind == RenderEntryKind::ClipVisible)
            .expect("clip visible entry");
        let child_pos = entries
            .iter()
            .position(|e| e.node == child)
            .expect("child draw entry");
        assert!(write_pos < child_pos);
        assert!(child_pos < visible_pos);
    }

    #[test]
    fn entries_are_sorted_by_key() {
        let mut scene = Scene::new();
        let a = scene.new_node(1).expect("a");
        let b = scene.new_node(2).expect("b");
        scene.get_mut(a).expect("a").layer_index = 2;
        scene.get_mut(b).expect("b").layer_index = 0;

        let entries = render(&scene);
        for window in entries.windows(2) {
            assert!(window[0].key <= window[1].key);
        }
    }
}
