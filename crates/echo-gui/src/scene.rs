// SPDX-License-Identifier: Apache-2.0
//! The scene: a slot array of nodes, the root list, name lookup, and the
//! resource registries a node can reference by hash (the scene graph
//! contract's top-level owner).

use std::collections::HashMap;

use tracing::warn;

use crate::animation::Animation;
use crate::error::SceneError;
use crate::node::{Node, NodeHandle, MAX_NODES};

struct Slot {
    version: u16,
    node: Option<Node>,
}

/// A registered texture's dimensions, looked up by content hash.
#[derive(Debug, Clone, Copy)]
pub struct TextureInfo {
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

/// A registered font's line metrics, looked up by content hash.
#[derive(Debug, Clone, Copy)]
pub struct FontInfo {
    /// Baseline-to-top ascent, in pixels.
    pub ascent: f32,
    /// Baseline-to-bottom descent, in pixels.
    pub descent: f32,
}

/// A scene graph: nodes, roots, animations, and the registries a node
/// can reference.
pub struct Scene {
    slots: Vec<Slot>,
    free_list: Vec<u16>,
    roots: Vec<NodeHandle>,
    name_to_handle: HashMap<u64, NodeHandle>,
    pub(crate) animations: Vec<Animation>,
    pub(crate) cache_version: u64,

    /// Authoring (reference) resolution used by adjust-mode scaling.
    pub reference_size: (f32, f32),
    /// Actual viewport resolution.
    pub physical_size: (f32, f32),
    /// Scene-wide adjust reference (orthogonal to each node's own mode).
    pub adjust_reference: crate::node::AdjustReference,

    textures: HashMap<u64, TextureInfo>,
    fonts: HashMap<u64, FontInfo>,
    layers: HashMap<u64, u16>,
    layouts: HashMap<u64, ()>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates an empty scene at 1:1 reference/physical resolution.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            roots: Vec::new(),
            name_to_handle: HashMap::new(),
            animations: Vec::new(),
            cache_version: 0,
            reference_size: (1280.0, 720.0),
            physical_size: (1280.0, 720.0),
            adjust_reference: crate::node::AdjustReference::default(),
            textures: HashMap::new(),
            fonts: HashMap::new(),
            layers: HashMap::new(),
            layouts: HashMap::new(),
        }
    }

    /// Creates a new root-level node named `name_hash`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::OutOfResources`] if the scene already holds
    /// [`MAX_NODES`] live nodes, and [`SceneError::AlreadyExists`]-shaped
    /// [`SceneError::Invalid`] if `name_hash` is already in use.
    pub fn new_node(&mut self, name_hash: u64) -> Result<NodeHandle, SceneError> {
        if self.name_to_handle.contains_key(&name_hash) {
            return Err(SceneError::Invalid(format!(
                "node name hash {name_hash:#x} already in use"
            )));
        }
        let handle = self.alloc_slot(name_hash)?;
        self.roots.push(handle);
        self.name_to_handle.insert(name_hash, handle);
        Ok(handle)
    }

    fn alloc_slot(&mut self, name_hash: u64) -> Result<NodeHandle, SceneError> {
        let node = Node::new(name_hash);
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return Ok(NodeHandle::encode(index, slot.version));
        }
        if self.slots.len() >= MAX_NODES {
            warn!(capacity = MAX_NODES, "scene node capacity exhausted");
            return Err(SceneError::OutOfResources(MAX_NODES));
        }
        let index = u16::try_from(self.slots.len()).unwrap_or(u16::MAX);
        self.slots.push(Slot {
            version: 1,
            node: Some(node),
        });
        Ok(NodeHandle::encode(index, 1))
    }

    pub(crate) fn slot(&self, handle: NodeHandle) -> Option<&Node> {
        self.slots
            .get(handle.index())
            .filter(|s| s.version == handle.version())
            .and_then(|s| s.node.as_ref())
    }

    pub(crate) fn slot_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.version == handle.version())
            .and_then(|s| s.node.as_mut())
    }

    /// Looks up a live node by handle.
    #[must_use]
    pub fn get(&self, handle: NodeHandle) -> Option<&Node> {
        self.slot(handle)
    }

    /// Looks up a live node by handle, mutably.
    #[must_use]
    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.slot_mut(handle)
    }

    /// Looks up a node's handle by its name hash.
    #[must_use]
    pub fn find(&self, name_hash: u64) -> Option<NodeHandle> {
        self.name_to_handle.get(&name_hash).copied()
    }

    /// Iterates the root-level nodes, in creation order.
    pub fn roots(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.roots.iter().copied()
    }

    /// Iterates `parent`'s direct children, in sibling order.
    pub fn children(&self, parent: NodeHandle) -> impl Iterator<Item = NodeHandle> + '_ {
        let first = self.slot(parent).and_then(|n| n.first_child);
        std::iter::successors(first, move |h| self.slot(*h).and_then(|n| n.next_sibling))
    }

    /// Reparents `child` under `new_parent` (or to the root list if
    /// `None`), appending it after any existing children.
    pub fn set_parent(&mut self, child: NodeHandle, new_parent: Option<NodeHandle>) {
        self.detach(child);
        match new_parent {
            Some(parent) => {
                let last_child = self.children(parent).last();
                if let Some(last) = last_child {
                    if let Some(n) = self.slot_mut(last) {
                        n.next_sibling = Some(child);
                    }
                    if let Some(n) = self.slot_mut(child) {
                        n.prev_sibling = Some(last);
                    }
                } else if let Some(n) = self.slot_mut(parent) {
                    n.first_child = Some(child);
                }
                if let Some(n) = self.slot_mut(child) {
                    n.parent = Some(parent);
                }
            }
            None => {
                self.roots.push(child);
            }
        }
    }

    fn detach(&mut self, handle: NodeHandle) {
        let (parent, prev, next) = match self.slot(handle) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(n) = self.slot_mut(p) {
                    n.next_sibling = next;
                }
            }
            None => match parent {
                Some(p) => {
                    if let Some(n) = self.slot_mut(p) {
                        n.first_child = next;
                    }
                }
                None => self.roots.retain(|h| *h != handle),
            },
        }
        if let Some(n) = next {
            if let Some(node) = self.slot_mut(n) {
                node.prev_sibling = prev;
            }
        }
        if let Some(n) = self.slot_mut(handle) {
            n.parent = None;
            n.prev_sibling = None;
            n.next_sibling = None;
        }
    }

    /// Deletes `handle` and its entire subtree, freeing their slots for
    /// reuse (bumping each slot's version).
    pub fn delete_node(&mut self, handle: NodeHandle) {
        let children: Vec<NodeHandle> = self.children(handle).collect();
        for child in children {
            self.delete_node(child);
        }
        self.detach(handle);
        self.roots.retain(|h| *h != handle);
        if let Some(slot) = self.slots.get_mut(handle.index()) {
            if slot.version == handle.version() {
                if let Some(node) = slot.node.take() {
                    self.name_to_handle.remove(&node.name_hash);
                }
                slot.version = slot.version.wrapping_add(1).max(1);
            }
        }
        self.animations.retain(|a| a.target != handle);
    }

    /// Restores every node's resettable properties to its captured
    /// reset point. Idempotent: a second call is a no-op.
    pub fn reset_nodes(&mut self) {
        for slot in &mut self.slots {
            if let Some(node) = slot.node.as_mut() {
                node.reset();
            }
        }
    }

    /// Captures the current state of every live node as its reset
    /// point, typically called once after initial scene construction.
    pub fn capture_reset_points(&mut self) {
        for slot in &mut self.slots {
            if let Some(node) = slot.node.as_mut() {
                node.capture_reset_point();
            }
        }
    }

    /// Registers a texture's dimensions under `name_hash`.
    pub fn register_texture(&mut self, name_hash: u64, info: TextureInfo) {
        self.textures.insert(name_hash, info);
    }

    /// Looks up a registered texture's dimensions.
    #[must_use]
    pub fn texture(&self, name_hash: u64) -> Option<TextureInfo> {
        self.textures.get(&name_hash).copied()
    }

    /// Registers a font's line metrics under `name_hash`.
    pub fn register_font(&mut self, name_hash: u64, info: FontInfo) {
        self.fonts.insert(name_hash, info);
    }

    /// Looks up a registered font's line metrics.
    #[must_use]
    pub fn font(&self, name_hash: u64) -> Option<FontInfo> {
        self.fonts.get(&name_hash).copied()
    }

    /// Registers a named render layer at a given sort index.
    pub fn register_layer(&mut self, name_hash: u64, index: u16) {
        self.layers.insert(name_hash, index);
    }

    /// Looks up a named render layer's sort index.
    #[must_use]
    pub fn layer(&self, name_hash: u64) -> Option<u16> {
        self.layers.get(&name_hash).copied()
    }

    /// Registers a named layout (box layout / grid / etc) placeholder,
    /// present so scripts can switch layouts by name; layout resolution
    /// itself is external.
    pub fn register_layout(&mut self, name_hash: u64) {
        self.layouts.insert(name_hash, ());
    }

    /// Whether a named layout has been registered.
    #[must_use]
    pub fn has_layout(&self, name_hash: u64) -> bool {
        self.layouts.contains_key(&name_hash)
    }

    /// Total number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }
}
