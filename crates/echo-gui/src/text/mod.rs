// SPDX-License-Identifier: Apache-2.0
//! Text rendering: glyph caching and line layout.

pub mod glyph_cache;
pub mod layout;

pub use glyph_cache::{CacheSlot, GlyphCache};
pub use layout::{
    count_valid_glyphs, emit_layer_vertices, layer_vertex_offsets, word_wrap, GlyphMetrics,
    GlyphSource, GlyphVertex, LAYER_ORDER, VERTS_PER_GLYPH,
};
