// SPDX-License-Identifier: Apache-2.0
//! Page-bumping allocator backing each socket's message queue
//! (the message bus contract, grounded on `original_source/engine/dlib/message.cpp`'s
//! `MemoryAllocator`/`MemoryPage`).
//!
//! `echo-msgbus` forbids unsafe code, so a [`Page`] here tracks a byte
//! budget rather than literal bump-allocated bytes — the actual message
//! payload lives in a `Vec<u8>` on the [`crate::message::Message`] itself.
//! What's preserved is the *shape* of the source's allocator: a fixed
//! page size, 16-byte-aligned allocation sizes, and the rule that full
//! pages return to a free-list (never the heap) once a dispatch pass
//! drains them. See `README.md` for why this is a disclosed
//! generalization, not a behavior change.

/// Page size in bytes (`DM_MESSAGE_PAGE_SIZE`).
pub const PAGE_SIZE: usize = 4096;

/// Allocation alignment in bytes (`DM_MESSAGE_ALIGNMENT`).
pub const ALIGNMENT: usize = 16;

/// Accounted size of a `Message` header's non-payload fields, used only
/// to size the byte budget an allocation consumes from a page — no
/// struct is actually laid out at this size.
const MESSAGE_HEADER_SIZE: usize = 64;

/// Rounds `size` up to the next multiple of [`ALIGNMENT`].
#[must_use]
pub fn align_up(size: usize) -> usize {
    (size + ALIGNMENT - 1) & !(ALIGNMENT - 1)
}

/// Returns the page-accounted size of a message with `payload_size` bytes
/// of payload.
#[must_use]
pub fn message_footprint(payload_size: usize) -> usize {
    align_up(MESSAGE_HEADER_SIZE + payload_size)
}

/// A single page's byte budget and cursor.
#[derive(Debug)]
pub(crate) struct Page {
    used: usize,
}

impl Page {
    fn new() -> Self {
        Self { used: 0 }
    }

    fn remaining(&self) -> usize {
        PAGE_SIZE - self.used
    }

    fn reset(&mut self) {
        self.used = 0;
    }
}

/// Per-socket page-bumping allocator: one current page, a free-list of
/// recycled pages, and the list of pages that filled up during the
/// current dispatch epoch.
#[derive(Debug, Default)]
pub(crate) struct PageAllocator {
    current: Option<Page>,
    free_pages: Vec<Page>,
    full_pages: Vec<Page>,
}

impl PageAllocator {
    /// Accounts for an allocation of `footprint` bytes, rolling onto a
    /// fresh page (from the free-list, or newly created) if it does not
    /// fit in the current one.
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if `footprint` exceeds [`PAGE_SIZE`] — a single
    /// message can never span pages.
    pub(crate) fn allocate(&mut self, footprint: usize) -> Result<(), ()> {
        if footprint > PAGE_SIZE {
            return Err(());
        }

        let fits = self
            .current
            .as_ref()
            .is_some_and(|page| page.remaining() >= footprint);

        if !fits {
            if let Some(old) = self.current.take() {
                self.full_pages.push(old);
            }
            let next = self.free_pages.pop().unwrap_or_else(Page::new);
            self.current = Some(next);
        }

        if let Some(page) = self.current.as_mut() {
            page.used += footprint;
        }

        Ok(())
    }

    /// Detaches the pages that filled up since the last recycle, for the
    /// caller to reclaim once dispatch of the messages they backed is
    /// complete.
    pub(crate) fn take_full_pages(&mut self) -> Vec<Page> {
        std::mem::take(&mut self.full_pages)
    }

    /// Returns drained pages to the free-list, resetting their cursors.
    pub(crate) fn recycle(&mut self, pages: Vec<Page>) {
        for mut page in pages {
            page.reset();
            self.free_pages.push(page);
        }
    }

    /// Drops every page (current, free, and full) — used by
    /// `DeleteSocket`, which discards all allocator state outright.
    pub(crate) fn clear(&mut self) {
        self.current = None;
        self.free_pages.clear();
        self.full_pages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_sixteen() {
        assert_eq!(align_up(0), 0);
        assert_eq!(align_up(1), 16);
        assert_eq!(align_up(16), 16);
        assert_eq!(align_up(17), 32);
    }

    #[test]
    fn oversized_allocation_is_rejected() {
        let mut alloc = PageAllocator::default();
        assert!(alloc.allocate(PAGE_SIZE + 1).is_err());
    }

    #[test]
    fn full_page_rolls_to_a_new_one_and_recycles() {
        let mut alloc = PageAllocator::default();
        // Fill the first page completely.
        let per_alloc = 64;
        let count = PAGE_SIZE / per_alloc;
        for _ in 0..count {
            alloc.allocate(per_alloc).expect("should fit exactly");
        }
        // One more forces a new page and retires the full one.
        alloc.allocate(per_alloc).expect("should roll to new page");
        let full = alloc.take_full_pages();
        assert_eq!(full.len(), 1);
        alloc.recycle(full);
        assert_eq!(alloc.free_pages.len(), 1);
    }
}
