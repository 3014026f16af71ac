//! Construction entry points for blocks and allocators.

use crate::allocator::ArenaAllocator;
use crate::block::MemoryBlock;
use crate::config::ArenaConfig;
use crate::error::ArenaError;

/// Creates [`MemoryBlock`]s and [`ArenaAllocator`]s, validating their
/// parameters.
///
/// ```
/// use cosmic_arena::BlockFactory;
///
/// let mut arena = BlockFactory::create_allocator(16, 3).unwrap();
/// arena.alloc_typed::<i32>(4).unwrap().copy_from_slice(&[1, 2, 3, 4]);
/// arena.alloc_typed::<i32>(1).unwrap()[0] = 5;
/// assert_eq!(arena.block_count(), 2);
/// assert_eq!(arena.get_item_in_all::<i32>(4), Ok(5));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockFactory;

impl BlockFactory {
    /// Create a standalone block of `capacity` bytes.
    ///
    /// Returns `Err(ArenaError::InvalidArgument)` if `capacity` is zero.
    pub fn create_block(capacity: usize) -> Result<MemoryBlock, ArenaError> {
        MemoryBlock::new(capacity)
    }

    /// Create an allocator whose blocks hold `capacity` bytes each, chaining
    /// at most `max_blocks` blocks (zero is treated as 1).
    ///
    /// Returns `Err(ArenaError::InvalidArgument)` if `capacity` is zero.
    pub fn create_allocator(
        capacity: usize,
        max_blocks: u32,
    ) -> Result<ArenaAllocator, ArenaError> {
        Self::create_allocator_with_config(ArenaConfig::new(capacity).with_max_blocks(max_blocks))
    }

    /// Create an allocator with the default chain limit of
    /// [`ArenaConfig::DEFAULT_MAX_BLOCKS`].
    pub fn create_default_allocator(capacity: usize) -> Result<ArenaAllocator, ArenaError> {
        Self::create_allocator_with_config(ArenaConfig::new(capacity))
    }

    /// Create an allocator from a full config.
    pub fn create_allocator_with_config(config: ArenaConfig) -> Result<ArenaAllocator, ArenaError> {
        ArenaAllocator::new(config)
    }

    /// Release a standalone block that is not owned by an allocator.
    pub fn free_block(mut block: MemoryBlock) {
        block.free();
    }
}
