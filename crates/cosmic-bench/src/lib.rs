//! Benchmark profiles for the cosmic arena allocator.
//!
//! Provides pre-built allocator shapes shared by the criterion benches:
//!
//! - [`frame_profile`]: 64 KiB blocks, room for a few thousand items per frame
//! - [`fragmented_profile`]: 256-byte blocks, so growth happens constantly

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cosmic_arena::{ArenaAllocator, ArenaError, BlockFactory};

/// Bytes per block in [`frame_profile`].
pub const FRAME_BLOCK_BYTES: usize = 64 * 1024;

/// Bytes per block in [`fragmented_profile`].
pub const FRAGMENTED_BLOCK_BYTES: usize = 256;

/// One allocator sized for a typical per-frame workload.
pub fn frame_profile() -> Result<ArenaAllocator, ArenaError> {
    BlockFactory::create_allocator(FRAME_BLOCK_BYTES, 64)
}

/// Small blocks with a long chain, to stress growth and index translation.
pub fn fragmented_profile() -> Result<ArenaAllocator, ArenaError> {
    BlockFactory::create_allocator(FRAGMENTED_BLOCK_BYTES, 4096)
}

/// Allocate `count` `u32` items one at a time and number them.
pub fn fill_sequential(arena: &mut ArenaAllocator, count: usize) -> Result<(), ArenaError> {
    for i in 0..count {
        arena.alloc_typed::<u32>(1)?[0] = i as u32;
    }
    Ok(())
}

/// Deterministic pseudo-random index sequence in `0..len`.
///
/// Strides by a prime so successive indices hop between blocks.
pub fn scattered_indices(len: usize, count: usize) -> Vec<usize> {
    const STRIDE: usize = 7919;
    (0..count).map(|i| (i * STRIDE) % len.max(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_build() {
        assert_eq!(frame_profile().unwrap().capacity_per_block(), FRAME_BLOCK_BYTES);
        assert_eq!(fragmented_profile().unwrap().max_blocks(), 4096);
    }

    #[test]
    fn fill_sequential_numbers_items() {
        let mut arena = fragmented_profile().unwrap();
        fill_sequential(&mut arena, 200).unwrap();
        assert_eq!(arena.block_count(), 4);
        assert_eq!(arena.get_item_in_all::<u32>(150), Ok(150));
    }

    #[test]
    fn scattered_indices_stay_in_range() {
        let indices = scattered_indices(100, 1000);
        assert_eq!(indices.len(), 1000);
        assert!(indices.iter().all(|&i| i < 100));
    }
}
