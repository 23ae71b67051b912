//! End-to-end demand-paging scenarios: the translator driving the
//! simulator, under light and heavy frame pressure.

use vmsim_pmem::SwapBackedMemory;
use vmsim_vmem::addresses::{FrameNumber, PageNumber, VirtualAddress};
use vmsim_vmem::info::{
    NUM_FRAMES, NUM_PAGES, OFFSET_WIDTH, PAGE_SIZE, RAM_SIZE, TABLES_DEPTH, VIRTUAL_MEMORY_SIZE,
    Word,
};
use vmsim_vmem::{AccessError, AddressSpace};

fn va(v: u64) -> VirtualAddress {
    VirtualAddress::new(v)
}

/// All (page, frame) pairs currently resident, found by walking the table
/// tree the same way the hardware would.
fn resident_pages(pm: &SwapBackedMemory) -> Vec<(u64, u64)> {
    fn collect(pm: &SwapBackedMemory, frame: u64, depth: u32, prefix: u64, out: &mut Vec<(u64, u64)>) {
        if depth == TABLES_DEPTH {
            out.push((prefix, frame));
            return;
        }
        for (slot, &entry) in pm.frame(FrameNumber::new(frame)).iter().enumerate() {
            if entry != 0 {
                collect(
                    pm,
                    entry as u64,
                    depth + 1,
                    (prefix << OFFSET_WIDTH) | slot as u64,
                    out,
                );
            }
        }
    }

    let mut out = Vec::new();
    collect(pm, 0, 0, 0, &mut out);
    out
}

#[test]
fn single_page_round_trip_needs_no_eviction() {
    let mut pm = SwapBackedMemory::new();
    let mut space = AddressSpace::new(&mut pm);
    space.initialize();

    space.write(va(13), 3).unwrap();
    assert_eq!(space.read(va(13)).unwrap(), 3);
    assert_eq!(space.memory().eviction_count(), 0);
}

#[test]
fn four_distinct_pages_survive_capacity_pressure() {
    let mut pm = SwapBackedMemory::new();
    let mut space = AddressSpace::new(&mut pm);

    space.write(va(0), 1).unwrap();
    space.write(va(256), 2).unwrap();
    space.write(va(512), 3).unwrap();
    space.write(va(768), 4).unwrap();

    assert_eq!(space.read(va(0)).unwrap(), 1);
    assert_eq!(space.read(va(256)).unwrap(), 2);
    assert_eq!(space.read(va(512)).unwrap(), 3);
    assert_eq!(space.read(va(768)).unwrap(), 4);

    // Four pages plus their tables cannot coexist in the pool.
    assert!(space.memory().eviction_count() >= 1);
}

#[test]
fn every_word_of_virtual_memory_round_trips() {
    let mut pm = SwapBackedMemory::new();
    let mut space = AddressSpace::new(&mut pm);

    for i in 0..VIRTUAL_MEMORY_SIZE {
        space.write(va(i), (i & 0xFF) as Word).unwrap();
    }
    for i in 0..VIRTUAL_MEMORY_SIZE {
        assert_eq!(space.read(va(i)).unwrap(), (i & 0xFF) as Word, "at {i}");
    }
}

#[test]
fn sequential_sweep_never_corrupts_the_incoming_page() {
    let mut pm = SwapBackedMemory::new();
    let mut space = AddressSpace::new(&mut pm);

    // Faulting page k must never evict page k itself; corruption here
    // would show up as a wrong value straight after the write.
    for p in 0..NUM_PAGES {
        space.write(va(p * PAGE_SIZE), p as Word).unwrap();
        assert_eq!(space.read(va(p * PAGE_SIZE)).unwrap(), p as Word, "page {p}");
    }
    for p in 0..NUM_PAGES {
        assert_eq!(space.read(va(p * PAGE_SIZE)).unwrap(), p as Word, "page {p}");
    }
}

#[test]
fn out_of_range_accesses_fail_and_change_nothing() {
    let mut pm = SwapBackedMemory::new();
    {
        let mut space = AddressSpace::new(&mut pm);
        space.initialize();
        space.write(va(7), 42).unwrap();
    }

    let frames_before: Vec<Vec<Word>> = (0..NUM_FRAMES)
        .map(|f| pm.frame(FrameNumber::new(f)).to_vec())
        .collect();
    let evictions_before = pm.eviction_count();
    let swapped_before = pm.swapped_pages();

    {
        let mut space = AddressSpace::new(&mut pm);
        assert_eq!(
            space.read(va(VIRTUAL_MEMORY_SIZE)),
            Err(AccessError::OutOfRange(va(VIRTUAL_MEMORY_SIZE)))
        );
        assert_eq!(
            space.write(va(VIRTUAL_MEMORY_SIZE + 1), 0),
            Err(AccessError::OutOfRange(va(VIRTUAL_MEMORY_SIZE + 1)))
        );
    }

    let frames_after: Vec<Vec<Word>> = (0..NUM_FRAMES)
        .map(|f| pm.frame(FrameNumber::new(f)).to_vec())
        .collect();
    assert_eq!(frames_before, frames_after);
    assert_eq!(pm.eviction_count(), evictions_before);
    assert_eq!(pm.swapped_pages(), swapped_before);
}

#[test]
fn reading_an_untouched_page_succeeds() {
    let mut pm = SwapBackedMemory::new();
    let mut space = AddressSpace::new(&mut pm);
    space.initialize();

    // The value is unspecified; the access must not fail.
    assert!(space.read(va(42)).is_ok());
}

#[test]
fn skipping_initialize_changes_nothing_observable() {
    let run = |init: bool| -> (Vec<Word>, u64) {
        let mut pm = SwapBackedMemory::new();
        let mut space = AddressSpace::new(&mut pm);
        if init {
            space.initialize();
        }
        let addresses = [13u64, 256, 512, 768, 1024, 13];
        for (i, &a) in addresses.iter().enumerate() {
            space.write(va(a), i as Word).unwrap();
        }
        let values = addresses.iter().map(|&a| space.read(va(a)).unwrap()).collect();
        (values, space.memory().eviction_count())
    };

    assert_eq!(run(true), run(false));
}

#[test]
fn pressured_pages_keep_their_last_written_values() {
    let mut pm = SwapBackedMemory::new();
    let mut space = AddressSpace::new(&mut pm);

    // Far more distinct pages than frames, spread across the ring.
    let pages: Vec<u64> = (0..20).map(|i| (i * 13) % NUM_PAGES).collect();
    for &p in &pages {
        space.write(va(p * PAGE_SIZE + 1), (p * 3) as Word).unwrap();
    }
    // Overwrite a few of them.
    for &p in pages.iter().take(5) {
        space.write(va(p * PAGE_SIZE + 1), (p * 3 + 1) as Word).unwrap();
    }

    // Read back in a scrambled order.
    for k in 0..pages.len() {
        let p = pages[(k * 7) % pages.len()];
        let expected = if pages.iter().take(5).any(|&q| q == p) {
            (p * 3 + 1) as Word
        } else {
            (p * 3) as Word
        };
        assert_eq!(space.read(va(p * PAGE_SIZE + 1)).unwrap(), expected, "page {p}");
    }
}

#[test]
fn translation_always_lands_inside_physical_memory() {
    let mut pm = SwapBackedMemory::new();
    let mut space = AddressSpace::new(&mut pm);

    for &a in &[0u64, 13, 255, 256, 1024, 2048, VIRTUAL_MEMORY_SIZE - 1] {
        let pa = space.translate(va(a)).unwrap();
        assert!(pa.as_u64() < RAM_SIZE);
        assert_eq!(pa.offset().as_u64(), a & (PAGE_SIZE - 1));
    }
}

#[test]
fn the_root_stays_a_valid_table_under_churn() {
    let mut pm = SwapBackedMemory::new();
    {
        let mut space = AddressSpace::new(&mut pm);
        for i in 0..VIRTUAL_MEMORY_SIZE {
            space.write(va((i * 97) % VIRTUAL_MEMORY_SIZE), i as Word).unwrap();
        }
    }

    for &entry in pm.frame(FrameNumber::ROOT) {
        assert!(
            entry == 0 || (entry > 0 && (entry as u64) < NUM_FRAMES),
            "root entry {entry} is not a valid frame reference"
        );
    }
}

#[test]
fn swap_and_residency_stay_disjoint() {
    let mut pm = SwapBackedMemory::new();
    {
        let mut space = AddressSpace::new(&mut pm);
        for p in [0u64, 16, 32, 48, 64, 5, 250, 128, 0, 16] {
            space.write(va(p * PAGE_SIZE), p as Word).unwrap();
        }
    }

    let resident = resident_pages(&pm);

    // No page is simultaneously resident and swapped.
    for &(page, _) in &resident {
        assert!(
            !pm.is_swapped(PageNumber::new(page)),
            "page {page} is both resident and swapped"
        );
    }

    // No two pages share a frame, and no page claims the root.
    for (i, &(_, frame)) in resident.iter().enumerate() {
        assert_ne!(frame, 0);
        for &(_, other) in &resident[i + 1..] {
            assert_ne!(frame, other, "two pages resident in frame {frame}");
        }
    }
}
