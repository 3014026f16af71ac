//! The chain-owning allocator.
//!
//! [`ArenaAllocator`] owns a [`ChainIndex`] of fixed-capacity
//! [`MemoryBlock`]s. Allocation bumps the last block; when it is full a new
//! block is chained behind it (up to `max_blocks`). Because every block has
//! the same capacity, a flat item index maps to `(block, offset)` in O(1):
//!
//! ```text
//! items_per_block = capacity_per_block / size_of::<T>()
//! block           = index / items_per_block
//! byte_offset     = (index % items_per_block) * size_of::<T>()
//! ```
//!
//! Bytes past `items_per_block * size_of::<T>()` in each block are never
//! addressed by index. No item ever spans two blocks.
//!
//! The allocator is single-owner: every method that mutates takes
//! `&mut self`. Share it between producers through
//! [`SharedArena`](crate::SharedArena).

use std::mem;
use std::slice;

use tracing::{debug, trace, warn};

use crate::block::MemoryBlock;
use crate::chain::ChainIndex;
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::handle::{AddressHandle, ArenaId, RegionHandle};
use crate::plain::Plain;
use crate::region::{item_size, Region, RegionMut};

/// Lifecycle state of an [`ArenaAllocator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArenaState {
    /// Default-constructed: no blocks. Allocation yields empty results.
    Uninitialized,
    /// At least one block; fully usable.
    Active,
    /// Every block has been freed. Only `dispose` and counters remain usable.
    Disposed,
}

/// Where a flat item index lands in the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemLocation {
    /// Position of the block in the chain.
    pub block_index: usize,
    /// Item index within that block.
    pub local_index: usize,
    /// Byte offset of the item within that block.
    pub byte_offset: usize,
}

/// Bump allocator over a bounded chain of equally-sized blocks.
pub struct ArenaAllocator {
    id: ArenaId,
    /// Advances on reset and dispose; handles from older epochs are stale.
    epoch: u64,
    config: ArenaConfig,
    chain: ChainIndex,
    state: ArenaState,
}

impl ArenaAllocator {
    /// Build an active allocator with one block registered.
    ///
    /// Prefer [`BlockFactory::create_allocator`](crate::BlockFactory::create_allocator).
    pub(crate) fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let config = config.normalized();

        let mut chain = ChainIndex::new(config.max_blocks);
        chain.push(MemoryBlock::new(config.block_capacity)?)?;

        let id = ArenaId::next();
        debug!(
            arena = %id,
            block_capacity = config.block_capacity,
            max_blocks = config.max_blocks,
            "arena allocator created"
        );
        Ok(Self {
            id,
            epoch: 0,
            config,
            chain,
            state: ArenaState::Active,
        })
    }

    /// Bump-allocate `size` bytes, chaining a new block if the last is full.
    ///
    /// Returns [`RegionHandle::ZERO`] on an uninitialised allocator.
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` if `size` is larger than one block, or if a new
    ///   block is needed and the chain already holds `max_blocks`.
    /// - `UseAfterDispose` once disposed.
    pub fn alloc(&mut self, size: usize) -> Result<RegionHandle, ArenaError> {
        match self.state {
            ArenaState::Disposed => return Err(ArenaError::UseAfterDispose),
            ArenaState::Uninitialized => return Ok(RegionHandle::ZERO),
            ArenaState::Active => {}
        }
        let (block, offset) = self.bump(size, 1)?;
        Ok(RegionHandle::new(self.address(block), offset, size))
    }

    /// Allocate room for `count` items of `T` and return them as a slice.
    ///
    /// The slice starts at an address aligned for `T`; any padding needed
    /// for that counts towards the block's `used`. Returns an empty slice
    /// on an uninitialised allocator.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `count` is zero or `T` is zero-sized.
    /// - `CapacityExceeded` as for [`alloc`](Self::alloc), including when
    ///   `size_of::<T>() * count` overflows.
    /// - `UseAfterDispose` once disposed.
    pub fn alloc_typed<T: Plain>(&mut self, count: usize) -> Result<&mut [T], ArenaError> {
        self.check_live()?;
        if count == 0 {
            return Err(ArenaError::InvalidArgument {
                reason: "item count must be non-zero",
            });
        }
        let size = item_size::<T>()?
            .checked_mul(count)
            .ok_or(ArenaError::CapacityExceeded {
                requested: usize::MAX,
                capacity: self.config.block_capacity,
            })?;
        if self.state == ArenaState::Uninitialized {
            return Ok(&mut []);
        }

        let (block, offset) = self.bump(size, mem::align_of::<T>())?;
        self.chain
            .get_mut(block)
            .and_then(|b| b.slice_mut(offset, size))
            .expect("bump returns a range inside a live block")
            .into_typed()
    }

    /// Place `size` bytes in the last block, growing the chain as needed.
    ///
    /// Returns `(block_index, byte_offset)`. Iterates instead of recursing:
    /// at most one new block is ever needed.
    fn bump(&mut self, size: usize, align: usize) -> Result<(usize, usize), ArenaError> {
        if size > self.config.block_capacity {
            return Err(ArenaError::CapacityExceeded {
                requested: size,
                capacity: self.config.block_capacity,
            });
        }

        let mut grown = false;
        loop {
            let index = self.chain.len().saturating_sub(1);
            let block = self
                .chain
                .last_mut()
                .ok_or(ArenaError::UseAfterDispose)?;
            if let Some(offset) = block.alloc_aligned(size, align)? {
                trace!(arena = %self.id, block = index, offset, size, "bump allocation");
                return Ok((index, offset));
            }
            if grown {
                // Alignment padding left a fresh block too small.
                return Err(ArenaError::CapacityExceeded {
                    requested: size,
                    capacity: self.config.block_capacity,
                });
            }
            self.grow(size)?;
            grown = true;
        }
    }

    /// Chain a new block behind the last one.
    fn grow(&mut self, requested: usize) -> Result<(), ArenaError> {
        if self.chain.is_full() {
            warn!(
                arena = %self.id,
                blocks = self.chain.len(),
                requested,
                "arena chain is full; refusing to grow"
            );
            return Err(ArenaError::CapacityExceeded {
                requested,
                capacity: self.config.total_capacity_bytes(),
            });
        }
        let starting_offset = self
            .chain
            .last()
            .map_or(0, |last| last.starting_offset() + self.config.block_capacity);
        let block = MemoryBlock::with_starting_offset(self.config.block_capacity, starting_offset)?;
        let index = self.chain.push(block)?;
        debug!(arena = %self.id, block = index, starting_offset, "chained new block");
        Ok(())
    }

    /// Shrink the last block's `used` by `size` bytes (clamped at zero).
    ///
    /// Only the block currently being filled can be reduced; earlier blocks
    /// are never touched and an emptied last block stays in the chain.
    pub fn reduce(&mut self, size: usize) -> Result<(), ArenaError> {
        self.check_live()?;
        match self.chain.last_mut() {
            Some(block) => block.reduce(size),
            None => Ok(()),
        }
    }

    /// Return to a single empty block, freeing every block after the first.
    ///
    /// Advances the epoch, so every handle issued before the reset becomes
    /// stale. A no-op on an uninitialised allocator.
    pub fn reset(&mut self) -> Result<(), ArenaError> {
        self.check_live()?;
        if self.state == ArenaState::Uninitialized {
            return Ok(());
        }
        let released = self.chain.len().saturating_sub(1);
        self.chain.truncate(1);
        if let Some(first) = self.chain.last_mut() {
            first.reset();
        }
        self.epoch += 1;
        debug!(arena = %self.id, released, epoch = self.epoch, "arena reset");
        Ok(())
    }

    /// Free every block in registration order, then the chain storage.
    ///
    /// Idempotent; a no-op unless the allocator is active.
    pub fn dispose(&mut self) {
        if self.state != ArenaState::Active {
            return;
        }
        let freed = self.chain.release();
        self.epoch += 1;
        self.state = ArenaState::Disposed;
        debug!(arena = %self.id, freed, "arena disposed");
    }

    /// Map a flat item index to its block and offset.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfRange` if the index lands beyond the last block.
    /// - `InvalidArgument` if `item_size` is zero or larger than one block.
    /// - `UseAfterDispose` once disposed.
    pub fn get_arena_by_item_index(
        &self,
        global_index: usize,
        item_size: usize,
    ) -> Result<ItemLocation, ArenaError> {
        self.check_live()?;
        if item_size == 0 {
            return Err(ArenaError::InvalidArgument {
                reason: "item size must be non-zero",
            });
        }
        if self.chain.is_empty() {
            return Err(ArenaError::IndexOutOfRange {
                index: global_index,
                len: 0,
            });
        }
        let items_per_block = self.config.block_capacity / item_size;
        if items_per_block == 0 {
            return Err(ArenaError::InvalidArgument {
                reason: "item size exceeds block capacity",
            });
        }

        let block_index = global_index / items_per_block;
        if block_index >= self.chain.len() {
            return Err(ArenaError::IndexOutOfRange {
                index: global_index,
                len: self.chain.len() * items_per_block,
            });
        }
        let local_index = global_index % items_per_block;
        Ok(ItemLocation {
            block_index,
            local_index,
            byte_offset: local_index * item_size,
        })
    }

    /// Read the item at flat index `index`, treating the chain as one
    /// contiguous sequence of `T`.
    ///
    /// The item must lie within its block's used range.
    pub fn get_item_in_all<T: Plain>(&self, index: usize) -> Result<T, ArenaError> {
        let location = self.get_arena_by_item_index(index, item_size::<T>()?)?;
        let block = self
            .chain
            .get(location.block_index)
            .ok_or(ArenaError::IndexOutOfRange {
                index,
                len: self.chain.len(),
            })?;
        block.region().get_item(location.local_index)
    }

    /// Overwrite the item at flat index `index`.
    ///
    /// The item must lie within its block's used range.
    pub fn set_item_in_all<T: Plain>(&mut self, index: usize, value: T) -> Result<(), ArenaError> {
        let location = self.get_arena_by_item_index(index, item_size::<T>()?)?;
        let len = self.chain.len();
        let block = self
            .chain
            .get_mut(location.block_index)
            .ok_or(ArenaError::IndexOutOfRange { index, len })?;
        block.region_mut().set_item(location.local_index, value)
    }

    /// Resolve a handle issued by [`alloc`](Self::alloc) into a view.
    ///
    /// The zero handle resolves to an empty view.
    ///
    /// # Errors
    ///
    /// - `StaleHandle` if the handle belongs to another allocator or
    ///   predates the last reset.
    /// - `IndexOutOfRange` if the range is no longer within its block's
    ///   used bytes (after [`reduce`](Self::reduce)).
    /// - `UseAfterDispose` once disposed.
    pub fn region(&self, handle: &RegionHandle) -> Result<Region<'_>, ArenaError> {
        self.check_live()?;
        if handle.is_zero() {
            return Ok(Region::new(&[], 0));
        }
        let block = self.resolve_block(&handle.address)?;
        block
            .slice(handle.offset, handle.len)
            .ok_or(ArenaError::IndexOutOfRange {
                index: handle.offset.saturating_add(handle.len),
                len: block.used(),
            })
    }

    /// Mutable counterpart of [`region`](Self::region).
    pub fn region_mut(&mut self, handle: &RegionHandle) -> Result<RegionMut<'_>, ArenaError> {
        self.check_live()?;
        if handle.is_zero() {
            return Ok(RegionMut::new(&mut [], 0));
        }
        self.check_address(&handle.address)?;
        let len = self.chain.len();
        let block = self
            .chain
            .get_mut(handle.address.block_index())
            .ok_or(ArenaError::IndexOutOfRange {
                index: handle.address.block_index(),
                len,
            })?;
        let used = block.used();
        block
            .slice_mut(handle.offset, handle.len)
            .ok_or(ArenaError::IndexOutOfRange {
                index: handle.offset.saturating_add(handle.len),
                len: used,
            })
    }

    /// Handle naming block `index` of this allocator.
    pub fn block_handle(&self, index: usize) -> Result<AddressHandle, ArenaError> {
        self.check_live()?;
        if index >= self.chain.len() {
            return Err(ArenaError::IndexOutOfRange {
                index,
                len: self.chain.len(),
            });
        }
        Ok(self.address(index))
    }

    /// The used region of the block a handle names.
    pub fn block_region(&self, address: &AddressHandle) -> Result<Region<'_>, ArenaError> {
        self.check_live()?;
        Ok(self.resolve_block(address)?.region())
    }

    /// Mutable used region of the block a handle names.
    pub fn block_region_mut(
        &mut self,
        address: &AddressHandle,
    ) -> Result<RegionMut<'_>, ArenaError> {
        self.check_live()?;
        self.check_address(address)?;
        let len = self.chain.len();
        self.chain
            .get_mut(address.block_index())
            .map(MemoryBlock::region_mut)
            .ok_or(ArenaError::IndexOutOfRange {
                index: address.block_index(),
                len,
            })
    }

    fn resolve_block(&self, address: &AddressHandle) -> Result<&MemoryBlock, ArenaError> {
        self.check_address(address)?;
        self.chain
            .get(address.block_index())
            .ok_or(ArenaError::IndexOutOfRange {
                index: address.block_index(),
                len: self.chain.len(),
            })
    }

    fn check_address(&self, address: &AddressHandle) -> Result<(), ArenaError> {
        if address.arena != self.id || address.epoch != self.epoch {
            return Err(ArenaError::StaleHandle {
                handle_epoch: address.epoch,
                current_epoch: self.epoch,
            });
        }
        Ok(())
    }

    fn check_live(&self) -> Result<(), ArenaError> {
        if self.state == ArenaState::Disposed {
            return Err(ArenaError::UseAfterDispose);
        }
        Ok(())
    }

    fn address(&self, block: usize) -> AddressHandle {
        AddressHandle::new(self.id, self.epoch, block as u32)
    }

    /// This allocator's unique id ([`ArenaId::NONE`] when uninitialised).
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// Current epoch; advances on reset and dispose.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ArenaState {
        self.state
    }

    /// Whether the allocator is usable.
    pub fn is_active(&self) -> bool {
        self.state == ArenaState::Active
    }

    /// The (normalised) configuration this allocator was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Capacity of each block in bytes.
    pub fn capacity_per_block(&self) -> usize {
        self.config.block_capacity
    }

    /// Chain length limit.
    pub fn max_blocks(&self) -> u32 {
        self.config.max_blocks
    }

    /// Number of blocks currently in the chain.
    pub fn block_count(&self) -> usize {
        self.chain.len()
    }

    /// How many `T` items each block holds for flat indexing.
    pub fn items_per_block<T>(&self) -> usize {
        self.config
            .block_capacity
            .checked_div(mem::size_of::<T>())
            .unwrap_or(0)
    }

    /// Number of whole `T` items allocated across the chain.
    pub fn item_count<T>(&self) -> usize {
        self.chain.iter().map(MemoryBlock::item_len::<T>).sum()
    }

    /// Block at position `index`.
    pub fn block(&self, index: usize) -> Option<&MemoryBlock> {
        self.chain.get(index)
    }

    /// The block currently being filled.
    pub fn last_block(&self) -> Option<&MemoryBlock> {
        self.chain.last()
    }

    /// Blocks in chain order.
    pub fn blocks(&self) -> slice::Iter<'_, MemoryBlock> {
        self.chain.iter()
    }

    /// Total bytes allocated across all blocks.
    pub fn total_used(&self) -> usize {
        self.chain.total_used()
    }

    /// Total memory held by block buffers in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.chain.memory_bytes()
    }
}

impl Default for ArenaAllocator {
    /// An uninitialised allocator with no blocks and no storage.
    fn default() -> Self {
        Self {
            id: ArenaId::NONE,
            epoch: 0,
            config: ArenaConfig {
                block_capacity: 0,
                max_blocks: 0,
            },
            chain: ChainIndex::unallocated(),
            state: ArenaState::Uninitialized,
        }
    }
}

impl Drop for ArenaAllocator {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for ArenaAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaAllocator")
            .field("id", &self.id)
            .field("epoch", &self.epoch)
            .field("state", &self.state)
            .field("block_capacity", &self.config.block_capacity)
            .field("max_blocks", &self.config.max_blocks)
            .field("block_count", &self.chain.len())
            .finish()
    }
}
