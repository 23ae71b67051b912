//! # Address Space
//!
//! The table tree rooted at frame 0, and the word-level access surface on
//! top of it.
//!
//! This module provides:
//!
//! - [`AddressSpace::translate`]: the walk from the root to a leaf frame,
//!   faulting in missing tables and pages along the way.
//! - [`AddressSpace::read`] / [`AddressSpace::write`]: bounds-checked
//!   single-word accessors.
//! - [`AddressSpace::initialize`]: clear the root table; idempotent, and
//!   optional when the physical memory hands over zeroed frames.
//!
//! ## Design notes
//!
//! - All physical access goes through a borrowed [`PhysMemory`], so the
//!   walker neither knows nor cares how frames and swap are stored.
//! - A fault resolves in a fixed order: the chosen frame is unlinked from
//!   its former parent first, then (for an eviction) its page is pushed to
//!   swap, then the frame is prepared for its new role (zeroed when it
//!   will serve as a table, refilled from swap when it will hold the
//!   target page), and only then linked into the walk's current slot.
//!   Linking before unlinking would leave a moment with two parents, and
//!   the old parent's entry is what the frame search uses to find its way.
//! - Everything lives on the call stack; translation itself allocates
//!   nothing.

use crate::PhysMemory;
use crate::addresses::{FrameNumber, PageNumber, PhysicalAddress, SlotIndex, VirtualAddress};
use crate::frame_finder::{Placement, find_frame};
use vmsim_info::memory::{PAGE_SIZE, TABLES_DEPTH, Word};

/// A handle to the one address space of the simulated machine.
///
/// Stores nothing but the borrowed physical memory: the root is frame 0 by
/// construction and never moves.
pub struct AddressSpace<'p, M: PhysMemory> {
    pm: &'p mut M,
}

/// Why a virtual-memory access failed. Failures are local to one call and
/// leave no partial mutations behind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The address does not fall inside the simulated virtual memory.
    #[error("virtual address {0} is out of range")]
    OutOfRange(VirtualAddress),
    /// The frame pool could not yield a frame for the faulting page.
    #[error("no frame could be made available for page {0}")]
    NoUsableFrame(PageNumber),
}

impl<'p, M: PhysMemory> AddressSpace<'p, M> {
    #[inline]
    #[must_use]
    pub fn new(pm: &'p mut M) -> Self {
        Self { pm }
    }

    /// Borrow the underlying physical memory.
    #[inline]
    #[must_use]
    pub fn memory(&self) -> &M {
        self.pm
    }

    /// Clear every entry of the root table.
    ///
    /// Safe to call any number of times before the first access. Physical
    /// memory hands over zeroed frames, so skipping it entirely behaves
    /// identically.
    pub fn initialize(&mut self) {
        self.zero_frame(FrameNumber::ROOT);
    }

    /// Read the word at `va`.
    ///
    /// A read of a page that was never written succeeds and returns
    /// whatever the backing frame happens to hold.
    ///
    /// # Errors
    /// [`AccessError::OutOfRange`] if `va` is outside virtual memory, in
    /// which case physical memory is not touched.
    pub fn read(&mut self, va: VirtualAddress) -> Result<Word, AccessError> {
        let pa = self.translate(va)?;
        Ok(self.pm.read(pa))
    }

    /// Write `value` to the word at `va`.
    ///
    /// # Errors
    /// [`AccessError::OutOfRange`] if `va` is outside virtual memory, in
    /// which case physical memory is not touched.
    pub fn write(&mut self, va: VirtualAddress, value: Word) -> Result<(), AccessError> {
        let pa = self.translate(va)?;
        self.pm.write(pa, value);
        Ok(())
    }

    /// Walk the tree for `va`, faulting in whatever is missing, and return
    /// the physical address of its word.
    ///
    /// The result is always `< RAM_SIZE`: it is a frame base plus an
    /// in-frame offset.
    ///
    /// # Errors
    /// - [`AccessError::OutOfRange`] if `va` is outside virtual memory.
    /// - [`AccessError::NoUsableFrame`] if the pool cannot hold one more
    ///   path node; unreachable for any geometry the build accepts.
    pub fn translate(&mut self, va: VirtualAddress) -> Result<PhysicalAddress, AccessError> {
        if !va.is_in_bounds() {
            return Err(AccessError::OutOfRange(va));
        }

        let page = va.page();
        let mut frame = FrameNumber::ROOT;
        for depth in 0..TABLES_DEPTH {
            let slot = page.slot(depth);
            let entry = self.pm.read(frame.entry(slot));
            frame = if entry == 0 {
                self.fault(page, frame, slot, depth)?
            } else {
                FrameNumber::from_entry(entry)
            };
        }
        Ok(frame.join(va.offset()))
    }

    /// Resolve one missing entry: acquire a frame, prepare it for its role
    /// at this depth, and link it into `table[slot]`.
    fn fault(
        &mut self,
        target: PageNumber,
        table: FrameNumber,
        slot: SlotIndex,
        depth: u32,
    ) -> Result<FrameNumber, AccessError> {
        let placement =
            find_frame(&*self.pm, target).ok_or(AccessError::NoUsableFrame(target))?;
        let frame = placement.frame();

        match placement {
            Placement::EmptyTable { parent, .. } => {
                self.pm.write(parent.frame.entry(parent.slot), 0);
                log::trace!("page {target}: reusing empty table frame {frame}");
            }
            Placement::Unused { .. } => {
                log::trace!("page {target}: taking untouched frame {frame}");
            }
            Placement::Evict { victim, parent, .. } => {
                // Unlink strictly before the swap-out.
                self.pm.write(parent.frame.entry(parent.slot), 0);
                self.pm.evict(frame, victim);
                log::debug!("page {target}: evicted page {victim} from frame {frame}");
            }
        }

        if depth < TABLES_DEPTH - 1 {
            // The frame becomes an inner table and must start empty.
            self.zero_frame(frame);
        } else {
            // The frame receives the target page; a no-op if the page was
            // never swapped out.
            self.pm.restore(frame, target);
        }

        self.pm.write(table.entry(slot), frame.as_entry());
        Ok(frame)
    }

    fn zero_frame(&mut self, frame: FrameNumber) {
        for i in 0..PAGE_SIZE as u16 {
            self.pm.write(frame.entry(SlotIndex::new(i)), 0);
        }
    }
}
