// SPDX-License-Identifier: Apache-2.0
//! Scene graph / GUI runtime: typed node properties, lazy world
//! transforms, animation, texture-set flipbook playback, stencil
//! clipping, the 64-bit render-key sort, and a glyph cache for text.
//!
//! See `README.md` for the disclosed generalizations (`AdjustReference`
//! split out as a scene-wide enum orthogonal to each node's own
//! `AdjustMode`, and a trait-object `GlyphSource`/`FlipbookUvLookup`
//! seam in place of hard-coded font/atlas callbacks).
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_const_for_fn,
    clippy::unreadable_literal
)]

mod animation;
mod clipping;
mod easing;
mod error;
mod flipbook;
mod math;
mod node;
mod render;
mod render_key;
mod scene;
mod text;
mod transform;

pub use animation::{Completion, PlaybackMode};
pub use clipping::{assign_clipping_scopes, ClippingScope};
pub use easing::EasingCurve;
pub use error::SceneError;
pub use flipbook::{FlipbookPlayer, FlipbookUvLookup};
pub use math::{Mat4, Quat, Vec4};
pub use node::{
    AdjustMode, AdjustReference, AnchorX, AnchorY, BlendMode, ClippingFlags, ClippingMode, Node,
    NodeHandle, Pivot, Property, MAX_NODES, PROPERTY_COUNT,
};
pub use render::render;
pub use render_key::{render_key, RenderEntry, RenderEntryKind};
pub use scene::{FontInfo, Scene, TextureInfo};
pub use text::{
    count_valid_glyphs, emit_layer_vertices, layer_vertex_offsets, word_wrap, CacheSlot,
    GlyphCache, GlyphMetrics, GlyphSource, GlyphVertex, LAYER_ORDER, VERTS_PER_GLYPH,
};
pub use transform::adjust_scale;
