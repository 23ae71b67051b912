//! # Frame Acquisition
//!
//! When a translation hits an empty table entry, a frame has to be found
//! for the missing child. One depth-first pass over the table tree decides
//! where it comes from, classified as a [`Placement`]:
//!
//! 1. **Empty table**: a table frame with every entry zero that is *not*
//!    part of the path currently being built. It is unlinked from its old
//!    parent and reused.
//! 2. **Untouched frame**: one past the highest frame the pass saw. Frames
//!    are handed out densely from index 0, so `max + 1` has never held
//!    anything and needs no unlinking.
//! 3. **Eviction**: the resident page with maximal cyclic distance from
//!    the page being faulted in is pushed to swap and its frame taken.
//!
//! The classes are strictly ordered (1 beats 2 beats 3). Within class 3,
//! ties on distance keep the first candidate in visit order, which is
//! ascending slot index at every level.
//!
//! The path filter in class 1 exists because the walker faults one level at
//! a time: a table that was zeroed and linked a moment ago for the very
//! page now being faulted in is empty, and without the filter the next
//! level's search would pick it and unlink the entry the walker just wrote.
//! A table sits on the target path exactly when the slot sequence leading
//! to it equals the target page's leading level indices; the search tracks
//! that sequence as an accumulated bit prefix. At leaf depth the same
//! prefix *is* the page number held by the frame, which is how eviction
//! candidates learn their victim.
//!
//! The root (frame 0) is scanned by the driver rather than visited, so it
//! can never become a candidate of any class.

use crate::PhysMemory;
use crate::addresses::{FrameNumber, PageNumber, SlotIndex};
use vmsim_info::memory::{OFFSET_WIDTH, PAGE_SIZE, TABLES_DEPTH};

/// The unique table slot currently referencing a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct ParentLink {
    pub frame: FrameNumber,
    pub slot: SlotIndex,
}

/// Where the next frame comes from, and what has to happen before it can
/// be linked into the tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Reuse an all-zero table after unlinking it from `parent`.
    EmptyTable {
        frame: FrameNumber,
        parent: ParentLink,
    },
    /// Take a frame nothing has ever referenced.
    Unused { frame: FrameNumber },
    /// Unlink `parent`, push `victim` to swap, take its frame.
    Evict {
        frame: FrameNumber,
        victim: PageNumber,
        parent: ParentLink,
    },
}

impl Placement {
    pub(crate) const fn frame(&self) -> FrameNumber {
        match self {
            Self::EmptyTable { frame, .. } | Self::Unused { frame } | Self::Evict { frame, .. } => {
                *frame
            }
        }
    }
}

/// Accumulators for one search, threaded through the recursion.
struct Search<'p, M: PhysMemory> {
    pm: &'p M,
    /// The page about to be brought in; its path is protected.
    target: PageNumber,
    /// Highest frame seen so far; `max + 1` is the untouched candidate.
    max_frame: FrameNumber,
    /// First qualifying empty table, if any.
    empty_table: Option<(FrameNumber, ParentLink)>,
    /// Best eviction candidate so far.
    evict: Option<EvictCandidate>,
}

struct EvictCandidate {
    frame: FrameNumber,
    victim: PageNumber,
    parent: ParentLink,
    distance: u64,
}

/// Select the frame that will receive the page or table being faulted in.
///
/// Returns `None` only when the pool is exhausted and holds nothing but
/// the target path itself, which the geometry assertions rule out for any
/// buildable configuration.
pub(crate) fn find_frame<M: PhysMemory>(pm: &M, target: PageNumber) -> Option<Placement> {
    let mut search = Search {
        pm,
        target,
        max_frame: FrameNumber::ROOT,
        empty_table: None,
        evict: None,
    };

    for i in 0..PAGE_SIZE as u16 {
        let slot = SlotIndex::new(i);
        let entry = pm.read(FrameNumber::ROOT.entry(slot));
        if entry != 0 {
            search.visit(
                FrameNumber::from_entry(entry),
                1,
                slot.as_u64(),
                ParentLink {
                    frame: FrameNumber::ROOT,
                    slot,
                },
            );
        }
    }

    if let Some((frame, parent)) = search.empty_table {
        return Some(Placement::EmptyTable { frame, parent });
    }
    if let Some(frame) = search.max_frame.successor() {
        return Some(Placement::Unused { frame });
    }
    search.evict.map(|c| Placement::Evict {
        frame: c.frame,
        victim: c.victim,
        parent: c.parent,
    })
}

impl<M: PhysMemory> Search<'_, M> {
    /// Visit the frame behind one non-zero entry. `depth` counts the slots
    /// consumed so far and `prefix` is their concatenation, most
    /// significant level first.
    fn visit(&mut self, frame: FrameNumber, depth: u32, prefix: u64, parent: ParentLink) {
        if frame.as_u64() > self.max_frame.as_u64() {
            self.max_frame = frame;
        }

        if depth == TABLES_DEPTH {
            self.consider_victim(frame, PageNumber::new(prefix), parent);
            return;
        }

        let mut is_empty = true;
        for i in 0..PAGE_SIZE as u16 {
            let slot = SlotIndex::new(i);
            let entry = self.pm.read(frame.entry(slot));
            if entry == 0 {
                continue;
            }
            is_empty = false;
            self.visit(
                FrameNumber::from_entry(entry),
                depth + 1,
                (prefix << OFFSET_WIDTH) | slot.as_u64(),
                ParentLink { frame, slot },
            );
        }

        if is_empty && !self.on_target_path(depth, prefix) && self.empty_table.is_none() {
            self.empty_table = Some((frame, parent));
        }
    }

    /// Whether a table reached by `prefix` lies on the path to the target
    /// page, i.e. its slot sequence equals the target's first `depth`
    /// level indices.
    fn on_target_path(&self, depth: u32, prefix: u64) -> bool {
        let shift = (TABLES_DEPTH - depth) * OFFSET_WIDTH;
        prefix == self.target.as_u64() >> shift
    }

    /// Offer a resident leaf page as an eviction candidate.
    fn consider_victim(&mut self, frame: FrameNumber, held: PageNumber, parent: ParentLink) {
        // Never the page that is being brought in right now.
        if held == self.target {
            return;
        }
        // Evictions lose to any empty table already found.
        if self.empty_table.is_some() {
            return;
        }
        let distance = self.target.cyclic_distance(held);
        // Strictly greater, so earlier candidates win ties.
        let better = match &self.evict {
            None => true,
            Some(best) => distance > best.distance,
        };
        if better {
            self.evict = Some(EvictCandidate {
                frame,
                victim: held,
                parent,
                distance,
            });
        }
    }
}
