//! Bounded, ordered registry of the blocks in one allocator's chain.

use std::slice;

use crate::block::MemoryBlock;
use crate::error::ArenaError;

/// Registry slots reserved up front; longer chains grow the registry.
const PREALLOCATED_SLOTS: usize = 64;

/// Append-only list of [`MemoryBlock`]s with a fixed length limit.
///
/// Block `i` is the `i`-th block ever chained. The last entry is always
/// the block currently being filled, so there is no separate "last block"
/// pointer to keep in sync.
#[derive(Debug)]
pub struct ChainIndex {
    blocks: Vec<MemoryBlock>,
    max_blocks: usize,
}

impl ChainIndex {
    /// Create an empty chain that can hold at most `max_blocks` blocks.
    ///
    /// `max_blocks` is clamped to at least 1.
    pub fn new(max_blocks: u32) -> Self {
        let max_blocks = max_blocks.max(1) as usize;
        Self {
            blocks: Vec::with_capacity(max_blocks.min(PREALLOCATED_SLOTS)),
            max_blocks,
        }
    }

    /// A chain with no storage that never accepts blocks.
    pub(crate) fn unallocated() -> Self {
        Self {
            blocks: Vec::new(),
            max_blocks: 0,
        }
    }

    /// Append a block and return its index.
    ///
    /// Returns `Err(ArenaError::CapacityExceeded)` if the chain is full.
    pub fn push(&mut self, block: MemoryBlock) -> Result<usize, ArenaError> {
        if self.is_full() {
            return Err(ArenaError::CapacityExceeded {
                requested: block.capacity(),
                capacity: self.blocks.iter().map(MemoryBlock::capacity).sum(),
            });
        }
        self.blocks.push(block);
        Ok(self.blocks.len() - 1)
    }

    /// Number of registered blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no block is registered.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Whether the chain has reached `max_blocks`.
    pub fn is_full(&self) -> bool {
        self.blocks.len() >= self.max_blocks
    }

    /// The chain length limit.
    pub fn max_blocks(&self) -> usize {
        self.max_blocks
    }

    /// Block at position `index`.
    pub fn get(&self, index: usize) -> Option<&MemoryBlock> {
        self.blocks.get(index)
    }

    /// Mutable block at position `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut MemoryBlock> {
        self.blocks.get_mut(index)
    }

    /// The block currently being filled.
    pub fn last(&self) -> Option<&MemoryBlock> {
        self.blocks.last()
    }

    /// Mutable access to the block currently being filled.
    pub fn last_mut(&mut self) -> Option<&mut MemoryBlock> {
        self.blocks.last_mut()
    }

    /// Blocks in registration order.
    pub fn iter(&self) -> slice::Iter<'_, MemoryBlock> {
        self.blocks.iter()
    }

    /// Drop every block after the first `len`, freeing their buffers.
    pub fn truncate(&mut self, len: usize) {
        for block in self.blocks.iter_mut().skip(len) {
            block.free();
        }
        self.blocks.truncate(len);
    }

    /// Free every block in registration order, then the registry storage.
    ///
    /// Returns the number of blocks freed. Calling it again frees nothing.
    pub fn release(&mut self) -> usize {
        let freed = self.blocks.len();
        for block in &mut self.blocks {
            block.free();
        }
        self.blocks = Vec::new();
        freed
    }

    /// Total bytes allocated across all blocks.
    pub fn total_used(&self) -> usize {
        self.blocks.iter().map(MemoryBlock::used).sum()
    }

    /// Total memory held by block buffers in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.blocks.iter().map(MemoryBlock::memory_bytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(capacity: usize) -> MemoryBlock {
        MemoryBlock::new(capacity).unwrap()
    }

    #[test]
    fn push_returns_sequential_indices() {
        let mut chain = ChainIndex::new(4);
        assert_eq!(chain.push(block(16)), Ok(0));
        assert_eq!(chain.push(block(16)), Ok(1));
        assert_eq!(chain.len(), 2);
        assert!(!chain.is_full());
    }

    #[test]
    fn push_fails_when_full() {
        let mut chain = ChainIndex::new(2);
        chain.push(block(16)).unwrap();
        chain.push(block(16)).unwrap();
        assert!(chain.is_full());
        assert_eq!(
            chain.push(block(16)),
            Err(ArenaError::CapacityExceeded {
                requested: 16,
                capacity: 32
            })
        );
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn zero_max_blocks_is_clamped() {
        let mut chain = ChainIndex::new(0);
        assert_eq!(chain.max_blocks(), 1);
        assert!(chain.push(block(8)).is_ok());
        assert!(chain.push(block(8)).is_err());
    }

    #[test]
    fn last_tracks_most_recent_push() {
        let mut chain = ChainIndex::new(3);
        chain.push(block(8)).unwrap();
        chain.push(block(16)).unwrap();
        assert_eq!(chain.last().map(MemoryBlock::capacity), Some(16));
        chain.last_mut().unwrap().alloc(4).unwrap();
        assert_eq!(chain.get(1).map(MemoryBlock::used), Some(4));
        assert_eq!(chain.total_used(), 4);
    }

    #[test]
    fn truncate_keeps_prefix() {
        let mut chain = ChainIndex::new(3);
        for _ in 0..3 {
            chain.push(block(8)).unwrap();
        }
        chain.truncate(1);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.memory_bytes(), 8);
    }

    #[test]
    fn release_is_idempotent() {
        let mut chain = ChainIndex::new(3);
        chain.push(block(8)).unwrap();
        chain.push(block(8)).unwrap();
        assert_eq!(chain.release(), 2);
        assert_eq!(chain.release(), 0);
        assert!(chain.is_empty());
        assert_eq!(chain.memory_bytes(), 0);
    }
}
