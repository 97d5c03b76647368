// SPDX-License-Identifier: Apache-2.0
//! Glyph cache: a fixed-dimension atlas partitioned into a grid of
//! cells sized to the maximum glyph, evicted round-robin with a
//! used-this-frame pin (the glyph cache contract).

use tracing::warn;

/// A single glyph-cache cell: which glyph (if any) currently occupies
/// it, and the frame it was last touched.
#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    occupant: Option<u64>,
    last_used_frame: u64,
}

/// A fixed-size grid of glyph cells, evicted round-robin.
#[derive(Debug)]
pub struct GlyphCache {
    cols: u32,
    rows: u32,
    cell_width: u32,
    cell_height: u32,
    padding: u32,
    cells: Vec<Cell>,
    cursor: usize,
    current_frame: u64,
}

/// The result of inserting (or re-touching) a glyph into the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSlot {
    /// The glyph was already resident; no upload needed.
    Resident(usize),
    /// The glyph was placed in a freshly evicted cell; the caller must
    /// upload its pixels.
    Evicted(usize),
    /// Every cell is pinned by the current frame; the glyph cannot be
    /// cached this frame.
    Rejected,
}

impl GlyphCache {
    /// Builds a `cols x rows` grid of cells sized `cell_width x
    /// cell_height`, each with `padding` pixels of border to avoid
    /// bilinear bleed between adjacent glyphs.
    #[must_use]
    pub fn new(cols: u32, rows: u32, cell_width: u32, cell_height: u32, padding: u32) -> Self {
        let count = (cols * rows) as usize;
        Self {
            cols,
            rows,
            cell_width,
            cell_height,
            padding,
            cells: vec![Cell::default(); count],
            cursor: 0,
            current_frame: 0,
        }
    }

    /// Starts a new frame; glyphs not touched after this are eligible
    /// for eviction.
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    /// Marks `glyph_key`'s cell (if resident) as used this frame, or
    /// inserts it, evicting the least-recently-inserted non-pinned
    /// cell starting at the round-robin cursor.
    pub fn get_or_insert(&mut self, glyph_key: u64) -> CacheSlot {
        if let Some(index) = self
            .cells
            .iter()
            .position(|c| c.occupant == Some(glyph_key))
        {
            self.cells[index].last_used_frame = self.current_frame;
            return CacheSlot::Resident(index);
        }

        let count = self.cells.len();
        if count == 0 {
            return CacheSlot::Rejected;
        }
        for step in 0..count {
            let index = (self.cursor + step) % count;
            if self.cells[index].last_used_frame != self.current_frame {
                self.cells[index] = Cell {
                    occupant: Some(glyph_key),
                    last_used_frame: self.current_frame,
                };
                self.cursor = (index + 1) % count;
                return CacheSlot::Evicted(index);
            }
        }
        warn!(
            grid_size = count,
            "glyph cache full: every cell pinned by the current frame"
        );
        CacheSlot::Rejected
    }

    /// Returns the pixel sub-rectangle `(x, y, w, h)` of cell `index`,
    /// inset by the configured padding.
    #[must_use]
    pub fn cell_rect(&self, index: usize) -> (u32, u32, u32, u32) {
        let col = (index as u32) % self.cols.max(1);
        let row = (index as u32) / self.cols.max(1);
        let x = col * self.cell_width + self.padding;
        let y = row * self.cell_height + self.padding;
        let w = self.cell_width.saturating_sub(2 * self.padding);
        let h = self.cell_height.saturating_sub(2 * self.padding);
        (x, y, w, h)
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Full atlas width in pixels (`cols * cell_width`), the denominator
    /// for normalizing a cell rect's `x`/`w` into UV space.
    #[must_use]
    pub fn atlas_width(&self) -> u32 {
        self.cols * self.cell_width
    }

    /// Full atlas height in pixels (`rows * cell_height`), the
    /// denominator for normalizing a cell rect's `y`/`h` into UV space.
    #[must_use]
    pub fn atlas_height(&self) -> u32 {
        self.rows * self.cell_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_glyph_is_evicted_slot() {
        let mut cache = GlyphCache::new(2, 2, 8, 8, 1);
        cache.begin_frame();
        assert_eq!(cache.get_or_insert(1), CacheSlot::Evicted(0));
    }

    #[test]
    fn repeated_lookup_is_resident() {
        let mut cache = GlyphCache::new(2, 2, 8, 8, 1);
        cache.begin_frame();
        cache.get_or_insert(1);
        assert_eq!(cache.get_or_insert(1), CacheSlot::Resident(0));
    }

    #[test]
    fn full_grid_pinned_this_frame_rejects_new_glyph() {
        let mut cache = GlyphCache::new(1, 1, 8, 8, 1);
        cache.begin_frame();
        cache.get_or_insert(1);
        assert_eq!(cache.get_or_insert(2), CacheSlot::Rejected);
    }

    #[test]
    fn next_frame_allows_eviction_of_previously_pinned_cell() {
        let mut cache = GlyphCache::new(1, 1, 8, 8, 1);
        cache.begin_frame();
        cache.get_or_insert(1);
        cache.begin_frame();
        assert_eq!(cache.get_or_insert(2), CacheSlot::Evicted(0));
    }

    #[test]
    fn cell_rect_is_inset_by_padding() {
        let cache = GlyphCache::new(2, 2, 10, 10, 1);
        assert_eq!(cache.cell_rect(0), (1, 1, 8, 8));
        assert_eq!(cache.cell_rect(1), (11, 1, 8, 8));
    }
}
