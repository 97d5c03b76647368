// SPDX-License-Identifier: Apache-2.0
//! Scene node data model: typed properties, pivot/anchor/adjust state,
//! clipping flags, and the slot handle encoding (the scene node contract).

use crate::math::{Mat4, Vec4};

/// Hard cap on live nodes per scene, imposed by the render key's 9-bit
/// index field (`2^9 == 512`).
pub const MAX_NODES: usize = 512;

/// Opaque handle to a node: `(version << 16) | slot_index`.
///
/// Reusing a freed slot bumps its version, so a handle captured before
/// the slot was reused is detected as stale rather than silently
/// addressing the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(u32);

impl NodeHandle {
    pub(crate) fn encode(index: u16, version: u16) -> Self {
        Self((u32::from(version) << 16) | u32::from(index))
    }

    pub(crate) fn index(self) -> usize {
        (self.0 & 0xffff) as usize
    }

    pub(crate) fn version(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Returns the raw encoded handle value.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Selects which typed property of a node is being read, written, or
/// animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Local position.
    Position,
    /// Euler rotation, radians, in `(x, y, z)`.
    Rotation,
    /// Local scale.
    Scale,
    /// RGBA tint/color.
    Color,
    /// Quad size.
    Size,
    /// Outline color (box/pie node border).
    Outline,
    /// Shadow color.
    Shadow,
    /// Nine-slice border insets.
    Slice9,
    /// Pie-node parameters (angle, inner radius, ...).
    PieParams,
}

/// Number of distinct [`Property`] slots, for fixed-size property arrays.
pub const PROPERTY_COUNT: usize = 9;

fn property_index(p: Property) -> usize {
    match p {
        Property::Position => 0,
        Property::Rotation => 1,
        Property::Scale => 2,
        Property::Color => 3,
        Property::Size => 4,
        Property::Outline => 5,
        Property::Shadow => 6,
        Property::Slice9 => 7,
        Property::PieParams => 8,
    }
}

/// Nine-point pivot, the origin offset subtracted from a node's quad
/// before the local transform is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pivot {
    /// Top-left corner.
    NorthWest,
    /// Top edge, centered.
    North,
    /// Top-right corner.
    NorthEast,
    /// Left edge, centered.
    West,
    /// Geometric center.
    #[default]
    Center,
    /// Right edge, centered.
    East,
    /// Bottom-left corner.
    SouthWest,
    /// Bottom edge, centered.
    South,
    /// Bottom-right corner.
    SouthEast,
}

impl Pivot {
    /// Returns the `(x, y)` offset, in unit quad space `[-0.5, 0.5]`,
    /// subtracted from the quad before the local transform.
    #[must_use]
    pub fn offset(self) -> (f32, f32) {
        let (x, y) = match self {
            Self::NorthWest => (-0.5, 0.5),
            Self::North => (0.0, 0.5),
            Self::NorthEast => (0.5, 0.5),
            Self::West => (-0.5, 0.0),
            Self::Center => (0.0, 0.0),
            Self::East => (0.5, 0.0),
            Self::SouthWest => (-0.5, -0.5),
            Self::South => (0.0, -0.5),
            Self::SouthEast => (0.5, -0.5),
        };
        (x, y)
    }
}

/// How a node rescales when the physical resolution differs from the
/// scene's authoring resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdjustMode {
    /// Minimum of x/y reference scales (preserves aspect, may letterbox).
    #[default]
    Fit,
    /// Maximum of x/y reference scales (preserves aspect, may crop).
    Zoom,
    /// Each axis scaled independently (legacy, may distort).
    Stretch,
}

/// Scene-wide adjust reference, orthogonal to a node's own
/// [`AdjustMode`] (see `gui.cpp`'s `AdjustReference` in the design
/// notes): a node's adjust computation short-circuits to legacy
/// behavior whenever the scene reference is `Legacy` or the node is a
/// root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdjustReference {
    /// Legacy per-axis behavior regardless of the node's own mode.
    Legacy,
    /// Honor the node's own [`AdjustMode`], relative to its parent.
    #[default]
    Parent,
}

/// Horizontal anchor: overrides the scaled x position to hold a fixed
/// edge distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorX {
    /// No horizontal anchor.
    #[default]
    None,
    /// Anchored to the left edge.
    Left,
    /// Anchored to the screen center.
    Center,
    /// Anchored to the right edge.
    Right,
}

/// Vertical anchor: overrides the scaled y position to hold a fixed
/// edge distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorY {
    /// No vertical anchor.
    #[default]
    None,
    /// Anchored to the top edge.
    Top,
    /// Anchored to the screen center.
    Center,
    /// Anchored to the bottom edge.
    Bottom,
}

/// Compositing mode for a node's draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Standard alpha blending.
    #[default]
    Alpha,
    /// Additive blending.
    Add,
    /// Multiplicative blending.
    Multiply,
    /// Screen blending.
    Screen,
}

/// Whether, and how, a node participates in stencil clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClippingMode {
    /// The node does not clip its descendants.
    #[default]
    None,
    /// The node's shape writes a stencil scope its descendants test
    /// against.
    Stencil,
}

/// Per-node clipping flags, orthogonal to [`ClippingMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClippingFlags {
    /// Whether the clipper itself is drawn (not just used as a mask).
    pub visible: bool,
    /// Whether the clip test is inverted (descendants visible *outside*
    /// the shape).
    pub inverted: bool,
}

/// Snapshot of every mutable, resettable field on a node, captured once
/// so `reset_nodes` can restore it verbatim.
#[derive(Debug, Clone, Copy)]
pub struct NodeSnapshot {
    pub(crate) properties: [Vec4; PROPERTY_COUNT],
    pub(crate) pivot: Pivot,
    pub(crate) anchor_x: AnchorX,
    pub(crate) anchor_y: AnchorY,
    pub(crate) adjust_mode: AdjustMode,
    pub(crate) blend_mode: BlendMode,
    pub(crate) enabled: bool,
}

/// A single scene-graph node.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) name_hash: u64,
    pub(crate) properties: [Vec4; PROPERTY_COUNT],
    pub(crate) pivot: Pivot,
    pub(crate) anchor_x: AnchorX,
    pub(crate) anchor_y: AnchorY,
    pub(crate) adjust_mode: AdjustMode,
    pub(crate) blend_mode: BlendMode,
    pub(crate) layer_index: u16,
    pub(crate) enabled: bool,

    pub(crate) parent: Option<NodeHandle>,
    pub(crate) first_child: Option<NodeHandle>,
    pub(crate) next_sibling: Option<NodeHandle>,
    pub(crate) prev_sibling: Option<NodeHandle>,

    pub(crate) clipping_mode: ClippingMode,
    pub(crate) clipping_flags: ClippingFlags,

    pub(crate) text: Option<String>,
    pub(crate) texture_hash: Option<u64>,
    pub(crate) texture_set_hash: Option<u64>,
    pub(crate) font_hash: Option<u64>,

    pub(crate) local_transform: Mat4,
    pub(crate) dirty_local: bool,

    /// Traversal cache: the world transform/opacity computed the last
    /// time this node's subtree was visited, valid only when
    /// `cache_version` equals the scene's current traversal version.
    pub(crate) cache_version: u64,
    pub(crate) cached_world: Mat4,
    pub(crate) cached_opacity: f32,

    pub(crate) reset_point: NodeSnapshot,
}

impl Node {
    pub(crate) fn new(name_hash: u64) -> Self {
        let properties = [
            Vec4::ZERO, // position
            Vec4::ZERO, // rotation
            Vec4::ONE,  // scale
            Vec4::ONE,  // color
            Vec4::ZERO, // size
            Vec4::ZERO, // outline
            Vec4::ZERO, // shadow
            Vec4::ZERO, // slice9
            Vec4::ZERO, // pie_params
        ];
        let snapshot = NodeSnapshot {
            properties,
            pivot: Pivot::default(),
            anchor_x: AnchorX::default(),
            anchor_y: AnchorY::default(),
            adjust_mode: AdjustMode::default(),
            blend_mode: BlendMode::default(),
            enabled: true,
        };
        Self {
            name_hash,
            properties,
            pivot: Pivot::default(),
            anchor_x: AnchorX::default(),
            anchor_y: AnchorY::default(),
            adjust_mode: AdjustMode::default(),
            blend_mode: BlendMode::default(),
            layer_index: 0,
            enabled: true,
            parent: None,
            first_child: None,
            next_sibling: None,
            prev_sibling: None,
            clipping_mode: ClippingMode::default(),
            clipping_flags: ClippingFlags::default(),
            text: None,
            texture_hash: None,
            texture_set_hash: None,
            font_hash: None,
            local_transform: Mat4::IDENTITY,
            dirty_local: true,
            cache_version: 0,
            cached_world: Mat4::IDENTITY,
            cached_opacity: 1.0,
            reset_point: snapshot,
        }
    }

    /// Reads a property's current value.
    #[must_use]
    pub fn get_property(&self, p: Property) -> Vec4 {
        self.properties[property_index(p)]
    }

    /// Writes a property's value and marks the local transform dirty.
    pub fn set_property(&mut self, p: Property, value: Vec4) {
        self.properties[property_index(p)] = value;
        self.dirty_local = true;
    }

    /// Returns a mutable pointer-equivalent: the float component of
    /// `p` addressed by `component` (0=x,1=y,2=z,3=w), the animation
    /// system's `target_float_ptr` equivalent.
    pub(crate) fn property_component_mut(&mut self, p: Property, component: u8) -> &mut f32 {
        self.dirty_local = true;
        let v = &mut self.properties[property_index(p)];
        match component {
            0 => &mut v.x,
            1 => &mut v.y,
            2 => &mut v.z,
            _ => &mut v.w,
        }
    }

    pub(crate) fn property_component(&self, p: Property, component: u8) -> f32 {
        let v = self.properties[property_index(p)];
        match component {
            0 => v.x,
            1 => v.y,
            2 => v.z,
            _ => v.w,
        }
    }

    /// Captures the current mutable state as the reset point.
    pub(crate) fn capture_reset_point(&mut self) {
        self.reset_point = NodeSnapshot {
            properties: self.properties,
            pivot: self.pivot,
            anchor_x: self.anchor_x,
            anchor_y: self.anchor_y,
            adjust_mode: self.adjust_mode,
            blend_mode: self.blend_mode,
            enabled: self.enabled,
        };
    }

    /// Restores every resettable field to the reset-point snapshot.
    pub(crate) fn reset(&mut self) {
        let s = self.reset_point;
        self.properties = s.properties;
        self.pivot = s.pivot;
        self.anchor_x = s.anchor_x;
        self.anchor_y = s.anchor_y;
        self.adjust_mode = s.adjust_mode;
        self.blend_mode = s.blend_mode;
        self.enabled = s.enabled;
        self.dirty_local = true;
    }

    /// Whether this node is enabled (disabled nodes and their
    /// descendants are skipped by animation and render traversal).
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets whether this node is enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns this node's pivot.
    #[must_use]
    pub fn pivot(&self) -> Pivot {
        self.pivot
    }

    /// Sets this node's pivot and marks the local transform dirty.
    pub fn set_pivot(&mut self, pivot: Pivot) {
        self.pivot = pivot;
        self.dirty_local = true;
    }

    /// Returns this node's horizontal anchor.
    #[must_use]
    pub fn anchor_x(&self) -> AnchorX {
        self.anchor_x
    }

    /// Returns this node's vertical anchor.
    #[must_use]
    pub fn anchor_y(&self) -> AnchorY {
        self.anchor_y
    }

    /// Sets this node's anchors and marks the local transform dirty.
    pub fn set_anchors(&mut self, x: AnchorX, y: AnchorY) {
        self.anchor_x = x;
        self.anchor_y = y;
        self.dirty_local = true;
    }

    /// Returns this node's adjust mode.
    #[must_use]
    pub fn adjust_mode(&self) -> AdjustMode {
        self.adjust_mode
    }

    /// Sets this node's adjust mode and marks the local transform dirty.
    pub fn set_adjust_mode(&mut self, mode: AdjustMode) {
        self.adjust_mode = mode;
        self.dirty_local = true;
    }

    /// Returns this node's blend mode.
    #[must_use]
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Sets this node's blend mode.
    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    /// Returns this node's layer index.
    #[must_use]
    pub fn layer_index(&self) -> u16 {
        self.layer_index
    }

    /// Sets this node's layer index.
    pub fn set_layer_index(&mut self, layer_index: u16) {
        self.layer_index = layer_index;
    }

    /// Returns this node's clipping mode.
    #[must_use]
    pub fn clipping_mode(&self) -> ClippingMode {
        self.clipping_mode
    }

    /// Returns this node's clipping flags.
    #[must_use]
    pub fn clipping_flags(&self) -> ClippingFlags {
        self.clipping_flags
    }

    /// Sets this node's clipping mode and flags.
    pub fn set_clipping(&mut self, mode: ClippingMode, flags: ClippingFlags) {
        self.clipping_mode = mode;
        self.clipping_flags = flags;
    }

    /// Returns this node's text, if it carries any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Sets this node's text.
    pub fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    /// Returns this node's texture hash, if it carries one.
    #[must_use]
    pub fn texture_hash(&self) -> Option<u64> {
        self.texture_hash
    }

    /// Sets this node's texture hash.
    pub fn set_texture_hash(&mut self, texture_hash: Option<u64>) {
        self.texture_hash = texture_hash;
    }

    /// Returns this node's texture-set hash, if it carries one.
    #[must_use]
    pub fn texture_set_hash(&self) -> Option<u64> {
        self.texture_set_hash
    }

    /// Sets this node's texture-set hash.
    pub fn set_texture_set_hash(&mut self, texture_set_hash: Option<u64>) {
        self.texture_set_hash = texture_set_hash;
    }

    /// Returns this node's font hash, if it carries one.
    #[must_use]
    pub fn font_hash(&self) -> Option<u64> {
        self.font_hash
    }

    /// Sets this node's font hash.
    pub fn set_font_hash(&mut self, font_hash: Option<u64>) {
        self.font_hash = font_hash;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_roundtrips_index_and_version() {
        let handle = NodeHandle::encode(37, 5);
        assert_eq!(handle.index(), 37);
        assert_eq!(handle.version(), 5);
    }

    #[test]
    fn pivot_offsets_are_within_unit_quad() {
        for pivot in [
            Pivot::NorthWest,
            Pivot::North,
            Pivot::NorthEast,
            Pivot::West,
            Pivot::Center,
            Pivot::East,
            Pivot::SouthWest,
            Pivot::South,
            Pivot::SouthEast,
        ] {
            let (x, y) = pivot.offset();
            assert!((-0.5..=0.5).contains(&x));
            assert!((-0.5..=0.5).contains(&y));
        }
        assert_eq!(Pivot::Center.offset(), (0.0, 0.0));
        assert_eq!(Pivot::NorthWest.offset(), (-0.5, 0.5));
    }

    #[test]
    fn set_property_marks_local_transform_dirty() {
        let mut node = Node::new(1);
        node.dirty_local = false;
        node.set_property(Property::Position, Vec4::new(1.0, 0.0, 0.0, 0.0));
        assert!(node.dirty_local);
        assert_eq!(node.get_property(Property::Position).x, 1.0);
    }

    #[test]
    fn property_component_accessors_address_the_right_slot() {
        let mut node = Node::new(1);
        *node.property_component_mut(Property::Scale, 1) = 2.0;
        assert_eq!(node.property_component(Property::Scale, 1), 2.0);
        assert_eq!(node.get_property(Property::Scale).y, 2.0);
    }
}
