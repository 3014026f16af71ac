//! End-to-end tests for chained allocation and flat indexing.
//!
//! These go through the public surface only: `BlockFactory`, the
//! allocator's alloc/get/set/dispose operations, and handle resolution.

use cosmic_arena::{ArenaAllocator, ArenaError, ArenaState, BlockFactory, ItemLocation, MemoryBlock};

/// 16-byte blocks hold four `i32`s; at most three blocks.
fn small_arena() -> ArenaAllocator {
    BlockFactory::create_allocator(16, 3).unwrap()
}

#[test]
fn worked_example_four_ints_then_one_more() {
    let mut arena = small_arena();

    let first = arena.alloc_typed::<i32>(4).unwrap();
    first.copy_from_slice(&[10, 20, 30, 40]);
    assert_eq!(arena.block_count(), 1);

    arena.alloc_typed::<i32>(1).unwrap();
    assert_eq!(arena.block_count(), 2);
    let start_1 = arena.block(0).map(MemoryBlock::starting_offset).unwrap();
    let start_2 = arena.block(1).map(MemoryBlock::starting_offset).unwrap();
    assert_eq!(start_2, start_1 + 16);

    arena.set_item_in_all(4, 100i32).unwrap();
    assert_eq!(arena.get_item_in_all::<i32>(4), Ok(100));
    assert_eq!(arena.get_item_in_all::<i32>(2), Ok(30));
}

#[test]
fn used_stays_within_capacity_throughout() {
    let mut arena = BlockFactory::create_allocator(24, 16).unwrap();
    for size in [5, 7, 24, 1, 0, 13, 11, 24, 3] {
        arena.alloc(size).unwrap();
        for block in arena.blocks() {
            assert!(block.used() <= block.capacity());
        }
    }
    arena.reduce(100).unwrap_err();
    arena.reduce(3).unwrap();
    assert!(arena.blocks().all(|b| b.used() <= b.capacity()));
}

#[test]
fn block_count_matches_total_bytes() {
    let mut arena = BlockFactory::create_allocator(32, 64).unwrap();
    let mut total = 0;
    for _ in 0..37 {
        arena.alloc(8).unwrap();
        total += 8;
        assert_eq!(arena.block_count(), usize::div_ceil(total, 32));
    }
}

#[test]
fn every_index_round_trips_across_blocks() {
    let mut arena = BlockFactory::create_allocator(64, 32).unwrap();
    let count = 8 * 20;
    for _ in 0..count {
        arena.alloc_typed::<u64>(1).unwrap();
    }
    assert_eq!(arena.block_count(), 20);
    for i in 0..count {
        arena.set_item_in_all(i, (i as u64) * 3 + 1).unwrap();
    }
    for i in 0..count {
        assert_eq!(arena.get_item_in_all::<u64>(i), Ok((i as u64) * 3 + 1));
    }
}

#[test]
fn index_equal_to_items_per_block_lands_in_second_block() {
    let mut arena = small_arena();
    arena.alloc_typed::<u32>(4).unwrap();
    arena.alloc_typed::<u32>(4).unwrap();
    let per_block = arena.items_per_block::<u32>();
    assert_eq!(per_block, 4);
    assert_eq!(
        arena.get_arena_by_item_index(per_block, 4),
        Ok(ItemLocation {
            block_index: 1,
            local_index: 0,
            byte_offset: 0
        })
    );
    arena.set_item_in_all(per_block, 77u32).unwrap();
    assert_eq!(arena.block(1).unwrap().as_typed::<u32>().unwrap()[0], 77);
}

#[test]
fn second_dispose_changes_nothing() {
    let mut once = small_arena();
    let mut twice = small_arena();
    for arena in [&mut once, &mut twice] {
        arena.alloc_typed::<i32>(6).unwrap_err();
        arena.alloc_typed::<i32>(3).unwrap();
        arena.dispose();
    }
    twice.dispose();
    assert_eq!(once.state(), twice.state());
    assert_eq!(once.block_count(), twice.block_count());
    assert_eq!(once.memory_bytes(), twice.memory_bytes());
    assert_eq!(once.alloc(1), twice.alloc(1));
    assert_eq!(twice.state(), ArenaState::Disposed);
}

#[test]
fn growth_fails_exactly_at_the_extra_block() {
    let max_blocks = 5;
    let mut arena = BlockFactory::create_allocator(16, max_blocks).unwrap();
    for i in 0..(max_blocks as usize * 4) {
        assert!(arena.alloc_typed::<i32>(1).is_ok(), "allocation {i} failed early");
    }
    assert_eq!(arena.block_count(), max_blocks as usize);
    assert_eq!(
        arena.alloc_typed::<i32>(1).map(|s| s.len()),
        Err(ArenaError::CapacityExceeded {
            requested: 4,
            capacity: 80
        })
    );
    // The failed request left everything in place.
    assert_eq!(arena.total_used(), 80);
    assert_eq!(arena.get_item_in_all::<i32>(19), Ok(0));
}

#[test]
fn different_item_types_share_one_chain() {
    let mut arena = BlockFactory::create_allocator(1024, 3).unwrap();
    assert_eq!(arena.alloc_typed::<u8>(10).unwrap().len(), 10);
    assert_eq!(arena.alloc_typed::<i16>(5).unwrap().len(), 5);
    assert_eq!(arena.alloc_typed::<i64>(2).unwrap().len(), 2);
    assert_eq!(arena.alloc_typed::<f64>(5).unwrap().len(), 5);
    assert_eq!(arena.block_count(), 1);
}

#[test]
fn handles_survive_growth_but_not_reset() {
    let mut arena = small_arena();
    let handle = arena.alloc(12).unwrap();
    arena
        .region_mut(&handle)
        .unwrap()
        .as_typed_mut::<u32>()
        .unwrap()
        .copy_from_slice(&[1, 2, 3]);
    arena.alloc(16).unwrap();
    arena.alloc(16).unwrap();
    assert_eq!(arena.block_count(), 3);
    assert_eq!(arena.region(&handle).unwrap().get_item::<u32>(2), Ok(3));

    arena.reset().unwrap();
    assert!(matches!(
        arena.region(&handle),
        Err(ArenaError::StaleHandle { .. })
    ));
}

#[test]
fn dropped_allocator_releases_blocks() {
    let mut arena = small_arena();
    arena.alloc(16).unwrap();
    arena.alloc(16).unwrap();
    assert_eq!(arena.memory_bytes(), 32);
    drop(arena);
}
