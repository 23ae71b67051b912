//! # Virtual Memory Translation
//!
//! Demand-paged translation of virtual addresses over a fixed pool of
//! physical frames backed by an unbounded swap store.
//!
//! ## What you get
//! - Typed [`addresses`] (`u64` newtypes) so virtual, physical, page, frame
//!   and slot quantities cannot be mixed.
//! - An [`AddressSpace`] describing the page-table tree rooted at frame 0,
//!   with demand faulting of missing tables and pages.
//! - A tiny physical-memory interface ([`PhysMemory`]) so the translator
//!   stays agnostic of where frames and swap actually live.
//!
//! ## Virtual Address → Physical Address Walk
//!
//! A virtual address is divided into `TABLES_DEPTH` level indices of
//! `OFFSET_WIDTH` bits each, followed by the in-page offset:
//!
//! ```text
//! VA = [idx 0] [idx 1] ... [idx TABLES_DEPTH-1] [offset]
//! ```
//!
//! Each index selects one entry of a table frame, starting at the root
//! (frame 0). An entry is a whole frame number; entry value `0` means
//! "no child", which is why frame 0 can never appear as a child and is
//! permanently the root. Frames reached before the last level are tables;
//! a frame reached after consuming every index holds one page of data.
//!
//! ## Faulting
//!
//! When the walk hits an empty entry, a frame is acquired by a single
//! depth-first search of the tree, in strict priority order:
//! an unlinked empty table is reused, otherwise the first never-touched
//! frame is taken, otherwise the resident page with maximal cyclic
//! distance from the page being faulted in is evicted to swap. The frame
//! is then zeroed (table role) or refilled from swap (page role) and linked
//! into its parent slot.
//!
//! ## Invariants
//!
//! - Frame 0 is the root table and is never evicted or repurposed.
//! - Every non-zero table entry is the only reference to its child frame.
//! - A page is resident in a leaf frame or stored in swap, never both.
//! - Newly allocated table frames are all-zero before use.
//!
//! The crate is single-threaded by design: one translation reads and writes
//! the whole tree, so an embedding host that needs concurrency must
//! serialise calls externally.

#![cfg_attr(not(test), no_std)]

pub mod address_space;
pub mod addresses;
mod frame_finder;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::address_space::{AccessError, AddressSpace};
use crate::addresses::{FrameNumber, PageNumber, PhysicalAddress};
use vmsim_info::memory::Word;

/// Re-export the machine geometry as info module.
pub use vmsim_info::memory as info;

/// Minimal interface to the physical memory the translator operates on.
///
/// The implementation decides how frames and swap are stored (the workspace
/// ships an array-plus-map simulator; tests use doubles). The translator
/// relies on the following contracts:
///
/// - Frames are zero-initialised before the first access, so the root table
///   starts with every entry empty and never-touched frames can serve as
///   tables without explicit clearing.
/// - [`evict`](Self::evict) must not be called for a page that is already
///   swapped out; implementations are free to fail fast on that.
/// - [`restore`](Self::restore) for a page that was never swapped leaves
///   the frame contents unspecified. That case is benign: it only happens
///   when a page is faulted in for the very first time.
pub trait PhysMemory {
    /// Read one word. `pa` must be within physical memory.
    fn read(&self, pa: PhysicalAddress) -> Word;

    /// Write one word. `pa` must be within physical memory.
    fn write(&mut self, pa: PhysicalAddress, value: Word);

    /// Move the contents of `frame` into swap under key `page`.
    fn evict(&mut self, frame: FrameNumber, page: PageNumber);

    /// If `page` is in swap, move it back into `frame` and drop it from
    /// swap; otherwise do nothing.
    fn restore(&mut self, frame: FrameNumber, page: PageNumber);
}
