// SPDX-License-Identifier: Apache-2.0
//! Local/world transform computation: lazy dirty-flagged local
//! transforms, adjust-mode scaling, anchors, pivot, and the traversal
//! cache (the node transform contract).

use crate::math::{Mat4, Quat, Vec4};
use crate::node::{AdjustMode, AdjustReference, AnchorX, AnchorY, NodeHandle, Property};
use crate::scene::Scene;

/// Computes the `(x, y)` scale factor physical resolution `physical`
/// applies over authoring resolution `reference`, per `mode`.
#[must_use]
pub fn adjust_scale(mode: AdjustMode, reference: (f32, f32), physical: (f32, f32)) -> (f32, f32) {
    let (rw, rh) = reference;
    let (pw, ph) = physical;
    if rw <= 0.0 || rh <= 0.0 {
        return (1.0, 1.0);
    }
    let sx = pw / rw;
    let sy = ph / rh;
    match mode {
        AdjustMode::Fit => {
            let s = sx.min(sy);
            (s, s)
        }
        AdjustMode::Zoom => {
            let s = sx.max(sy);
            (s, s)
        }
        AdjustMode::Stretch => (sx, sy),
    }
}

fn effective_adjust_mode(scene: &Scene, node_is_root: bool, node_mode: AdjustMode) -> AdjustMode {
    if scene.adjust_reference == AdjustReference::Legacy || node_is_root {
        AdjustMode::Stretch
    } else {
        node_mode
    }
}

/// Additional translation applied on an anchored axis so the node holds
/// a fixed distance to the corresponding screen edge rather than
/// drifting under uniform (fit/zoom) adjust scaling.
fn anchor_offset(
    anchor_x: AnchorX,
    anchor_y: AnchorY,
    reference: (f32, f32),
    physical: (f32, f32),
    scale: (f32, f32),
) -> (f32, f32) {
    let extra_w = if scale.0 > 0.0 {
        physical.0 / scale.0 - reference.0
    } else {
        0.0
    };
    let extra_h = if scale.1 > 0.0 {
        physical.1 / scale.1 - reference.1
    } else {
        0.0
    };
    let ox = match anchor_x {
        AnchorX::None | AnchorX::Left => 0.0,
        AnchorX::Center => extra_w / 2.0,
        AnchorX::Right => extra_w,
    };
    let oy = match anchor_y {
        AnchorY::None | AnchorY::Top => 0.0,
        AnchorY::Center => extra_h / 2.0,
        AnchorY::Bottom => extra_h,
    };
    (ox, oy)
}

impl Scene {
    /// Recomputes `handle`'s local transform if its dirty flag is set
    /// (or it has no parent, since the adjust scale depends on scene
    /// state that can change between frames).
    fn ensure_local_transform(&mut self, handle: NodeHandle) {
        let is_root = self
            .slot(handle)
            .is_some_and(|n| n.parent.is_none());
        let reference = self.reference_size;
        let physical = self.physical_size;

        let Some(node) = self.slot(handle) else {
            return;
        };
        if !node.dirty_local {
            return;
        }
        let position = node.get_property(Property::Position);
        let rotation = node.get_property(Property::Rotation);
        let scale_prop = node.get_property(Property::Scale);
        let mode = effective_adjust_mode(self, is_root, node.adjust_mode);
        let (sx, sy) = adjust_scale(mode, reference, physical);
        let (ax, ay) = anchor_offset(node.anchor_x, node.anchor_y, reference, physical, (sx, sy));

        let translate = Vec4::new(position.x + ax, position.y + ay, position.z, 0.0);
        let rot = Quat::from_euler_radians(rotation.x, rotation.y, rotation.z);
        let scale = Vec4::new(scale_prop.x * sx, scale_prop.y * sy, scale_prop.z, 0.0);
        let local = Mat4::trs(translate, rot, scale);

        if let Some(node) = self.slot_mut(handle) {
            node.local_transform = local;
            node.dirty_local = false;
        }
    }

    /// Bumps the traversal cache version, invalidating every cached
    /// world transform. Call once per frame before traversing.
    pub fn begin_traversal(&mut self) {
        self.cache_version += 1;
    }

    /// Returns `handle`'s world transform and accumulated opacity,
    /// recomputing (and caching) it if the parent chain changed since
    /// the last [`begin_traversal`](Self::begin_traversal) call.
    pub fn world_transform(&mut self, handle: NodeHandle) -> (Mat4, f32) {
        let version = self.cache_version;
        if let Some(n) = self.slot(handle) {
            if n.cache_version == version {
                return (n.cached_world, n.cached_opacity);
            }
        }

        self.ensure_local_transform(handle);

        let parent = self.slot(handle).and_then(|n| n.parent);
        let (parent_world, parent_opacity) = match parent {
            Some(p) => self.world_transform(p),
            None => (Mat4::IDENTITY, 1.0),
        };

        let Some(node) = self.slot(handle) else {
            return (Mat4::IDENTITY, 1.0);
        };
        let alpha = node.get_property(Property::Color).w;
        let world = parent_world * node.local_transform;
        let opacity = parent_opacity * alpha;

        if let Some(n) = self.slot_mut(handle) {
            n.cache_version = version;
            n.cached_world = world;
            n.cached_opacity = opacity;
        }
        (world, opacity)
    }
}
