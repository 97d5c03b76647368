// SPDX-License-Identifier: Apache-2.0
//! Text line layout: greedy word-wrap with trailing-whitespace trim, a
//! dry-run glyph count pass, and back-to-front multi-layer vertex
//! emission (face, outline, shadow) into a shared vertex buffer.

use crate::text::glyph_cache::GlyphCache;

/// Per-glyph layout metrics a font provides.
#[derive(Debug, Clone, Copy)]
pub struct GlyphMetrics {
    /// Horizontal distance to the next glyph's origin.
    pub advance: f32,
    /// Glyph quad width.
    pub width: f32,
    /// Glyph quad height.
    pub height: f32,
    /// Ascent above the baseline.
    pub ascent: f32,
    /// Descent below the baseline (positive value).
    pub descent: f32,
}

/// Supplies per-character layout metrics for a font.
pub trait GlyphSource {
    /// Returns `ch`'s metrics in `font_hash`, or `None` if the glyph is
    /// not present in the font (an "invalid" glyph, excluded from the
    /// dry-run count).
    fn metrics(&self, font_hash: u64, ch: char) -> Option<GlyphMetrics>;
}

/// A single rendered vertex quad for one glyph on one layer.
#[derive(Debug, Clone, Copy)]
pub struct GlyphVertex {
    /// Screen-space quad origin (lower-left, matching the pivot
    /// convention).
    pub x: f32,
    /// Screen-space quad origin y.
    pub y: f32,
    /// Quad width.
    pub width: f32,
    /// Quad height.
    pub height: f32,
    /// UV rectangle `(u0, v0, u1, v1)` from the glyph cache cell.
    pub uv: (f32, f32, f32, f32),
}

/// The three layers a font renders, emitted in this order ("back to
/// front" per the source's emission sequence).
pub const LAYER_ORDER: [&str; 3] = ["face", "outline", "shadow"];

/// Vertices per glyph quad (two triangles sharing no index buffer).
pub const VERTS_PER_GLYPH: usize = 6;

/// Greedily word-wraps `text` to fit within `max_width`, trimming
/// trailing whitespace from each produced line.
#[must_use]
pub fn word_wrap(text: &str, max_width: f32, font_hash: u64, glyphs: &dyn GlyphSource) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0.0_f32;
        for word in paragraph.split(' ') {
            let word_width: f32 = word
                .chars()
                .filter_map(|c| glyphs.metrics(font_hash, c))
                .map(|m| m.advance)
                .sum();
            let space_width = glyphs.metrics(font_hash, ' ').map_or(0.0, |m| m.advance);
            let extra = if current.is_empty() { 0.0 } else { space_width };

            if !current.is_empty() && current_width + extra + word_width > max_width {
                lines.push(current.trim_end().to_string());
                current = String::new();
                current_width = 0.0;
            }
            if !current.is_empty() {
                current.push(' ');
                current_width += space_width;
            }
            current.push_str(word);
            current_width += word_width;
        }
        lines.push(current.trim_end().to_string());
    }
    lines
}

/// Counts glyphs in `line` that have metrics in `font_hash` (the
/// dry-run pass establishing each layer's vertex-buffer offset before
/// emission).
#[must_use]
pub fn count_valid_glyphs(line: &str, font_hash: u64, glyphs: &dyn GlyphSource) -> usize {
    line.chars()
        .filter(|c| glyphs.metrics(font_hash, *c).is_some())
        .count()
}

/// Computes the vertex-buffer offset (in vertices) of each of the
/// three layers for a line with `glyph_count` valid glyphs.
#[must_use]
pub fn layer_vertex_offsets(glyph_count: usize) -> [usize; 3] {
    let stride = glyph_count * VERTS_PER_GLYPH;
    [0, stride, stride * 2]
}

/// Emits one layer's vertices for `line`, starting at `origin`,
/// looking up each glyph's cache cell via `cache` and `glyph_key_of`.
///
/// Glyphs absent from the font (no metrics) are skipped entirely, and
/// do not advance the cursor — they were already excluded from the
/// dry-run count, so offsets for later layers stay correct.
pub fn emit_layer_vertices(
    line: &str,
    font_hash: u64,
    origin: (f32, f32),
    glyphs: &dyn GlyphSource,
    cache: &GlyphCache,
    glyph_key_of: impl Fn(u64, char) -> u64,
    cell_of: impl Fn(u64) -> Option<usize>,
) -> Vec<GlyphVertex> {
    let mut out = Vec::new();
    let (mut x, y) = origin;
    for ch in line.chars() {
        let Some(metrics) = glyphs.metrics(font_hash, ch) else {
            continue;
        };
        let key = glyph_key_of(font_hash, ch);
        if let Some(index) = cell_of(key) {
            let (cx, cy, cw, ch_px) = cache.cell_rect(index);
            let atlas_w = (cache.atlas_width() as f32).max(1.0);
            let atlas_h = (cache.atlas_height() as f32).max(1.0);
            let uv = (
                cx as f32 / atlas_w,
                cy as f32 / atlas_h,
                (cx + cw) as f32 / atlas_w,
                (cy + ch_px) as f32 / atlas_h,
            );
            out.push(GlyphVertex {
                x,
                y: y - metrics.descent,
                width: metrics.width,
                height: metrics.height,
                uv,
            });
        }
        x += metrics.advance;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedFont;
    impl GlyphSource for FixedFont {
        fn metrics(&self, _font_hash: u64, ch: char) -> Option<GlyphMetrics> {
            if ch == '\u{0}' {
                return None;
            }
            Some(GlyphMetrics {
                advance: 10.0,
                width: 8.0,
                height: 12.0,
                ascent: 10.0,
                descent: 2.0,
            })
        }
    }

    #[test]
    fn word_wrap_breaks_at_width_and_trims_trailing_space() {
        let font = FixedFont;
        let lines = word_wrap("aa bb cc", 50.0, 1, &font);
        assert_eq!(lines, vec!["aa bb".to_string(), "cc".to_string()]);
        for line in &lines {
            assert!(!line.ends_with(' '));
        }
    }

    #[test]
    fn dry_run_count_excludes_invalid_glyphs() {
        let font = FixedFont;
        let count = count_valid_glyphs("ab\u{0}c", 1, &font);
        assert_eq!(count, 3);
    }

    #[test]
    fn layer_offsets_are_contiguous_blocks() {
        let offsets = layer_vertex_offsets(4);
        assert_eq!(offsets, [0, 24, 48]);
    }
}
