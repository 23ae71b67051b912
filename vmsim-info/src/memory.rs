//! # Memory Geometry
//!
//! The simulated machine addresses *words*, not bytes. A virtual address is
//! `VIRTUAL_ADDRESS_WIDTH` bits wide and splits into a page number and an
//! in-page offset of `OFFSET_WIDTH` bits; physical memory is `NUM_FRAMES`
//! frames of `PAGE_SIZE` words each. All widths are powers of two fixed
//! before build.

/// One machine word. Signed on purpose: stored table entries share this
/// representation, with bit-pattern zero reserved as the "empty entry"
/// sentinel.
pub type Word = i64;

/// Bits of intra-page offset. `PAGE_SIZE = 2^OFFSET_WIDTH`.
pub const OFFSET_WIDTH: u32 = 4;

/// Total bits of a physical address. `RAM_SIZE = 2^PHYSICAL_ADDRESS_WIDTH`.
pub const PHYSICAL_ADDRESS_WIDTH: u32 = 6;

/// Total bits of a virtual address.
/// `VIRTUAL_MEMORY_SIZE = 2^VIRTUAL_ADDRESS_WIDTH`.
pub const VIRTUAL_ADDRESS_WIDTH: u32 = 12;

/// Words per page (and per frame, and entries per table frame).
pub const PAGE_SIZE: u64 = 1 << OFFSET_WIDTH;

/// Words of physical memory.
pub const RAM_SIZE: u64 = 1 << PHYSICAL_ADDRESS_WIDTH;

/// Words of virtual memory.
pub const VIRTUAL_MEMORY_SIZE: u64 = 1 << VIRTUAL_ADDRESS_WIDTH;

/// Number of physical frames.
pub const NUM_FRAMES: u64 = RAM_SIZE / PAGE_SIZE;

/// Number of virtual pages.
pub const NUM_PAGES: u64 = VIRTUAL_MEMORY_SIZE / PAGE_SIZE;

/// Levels of the page-table tree. Each level consumes `OFFSET_WIDTH` bits
/// of the page number, most significant bits first.
pub const TABLES_DEPTH: u32 = (VIRTUAL_ADDRESS_WIDTH - OFFSET_WIDTH).div_ceil(OFFSET_WIDTH);

const _: () = {
    assert!(OFFSET_WIDTH > 0);
    assert!(OFFSET_WIDTH <= PHYSICAL_ADDRESS_WIDTH);
    assert!(OFFSET_WIDTH < VIRTUAL_ADDRESS_WIDTH);
    assert!(TABLES_DEPTH >= 1);
    // Every page-number bit must be covered by some level of the tree.
    assert!(TABLES_DEPTH * OFFSET_WIDTH >= VIRTUAL_ADDRESS_WIDTH - OFFSET_WIDTH);
    assert!(RAM_SIZE == NUM_FRAMES * PAGE_SIZE);
    assert!(VIRTUAL_MEMORY_SIZE == NUM_PAGES * PAGE_SIZE);
    // One full path (root + inner tables + leaf) must fit in physical
    // memory, or translation cannot make progress.
    assert!(NUM_FRAMES >= TABLES_DEPTH as u64 + 1);
};
