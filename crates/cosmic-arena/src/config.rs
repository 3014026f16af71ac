//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for an [`ArenaAllocator`](crate::ArenaAllocator).
///
/// Controls block sizing and the chain length limit. Validated at
/// construction; all values are immutable after creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Capacity of every block in the chain, in bytes.
    ///
    /// Must be non-zero. No single allocation may exceed this size.
    pub block_capacity: usize,

    /// Maximum number of blocks the chain may grow to.
    ///
    /// Default: 1024. Zero is treated as 1, since an active allocator
    /// always owns at least one block.
    pub max_blocks: u32,
}

impl ArenaConfig {
    /// Default maximum chain length.
    pub const DEFAULT_MAX_BLOCKS: u32 = 1024;

    /// Create a config with the given per-block capacity and the default
    /// chain limit.
    pub fn new(block_capacity: usize) -> Self {
        Self {
            block_capacity,
            max_blocks: Self::DEFAULT_MAX_BLOCKS,
        }
    }

    /// Replace the chain limit.
    pub fn with_max_blocks(mut self, max_blocks: u32) -> Self {
        self.max_blocks = max_blocks;
        self
    }

    /// Reject configurations no allocator can be built from.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.block_capacity == 0 {
            return Err(ArenaError::InvalidArgument {
                reason: "block capacity must be non-zero",
            });
        }
        Ok(())
    }

    /// Copy of this config with `max_blocks` clamped to at least 1.
    pub fn normalized(self) -> Self {
        Self {
            max_blocks: self.max_blocks.max(1),
            ..self
        }
    }

    /// Upper bound on the bytes the whole chain can hold.
    pub fn total_capacity_bytes(&self) -> usize {
        self.block_capacity.saturating_mul(self.max_blocks as usize)
    }
}
