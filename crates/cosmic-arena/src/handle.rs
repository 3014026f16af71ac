//! Non-owning handles into an allocator's chain.
//!
//! An [`AddressHandle`] names one block of one allocator; a
//! [`RegionHandle`] names a byte range inside that block. Neither owns
//! memory and neither can be dereferenced on its own: they are resolved
//! through [`ArenaAllocator::region`](crate::ArenaAllocator::region), which
//! checks the arena id and epoch encoded in the handle. Handles from
//! another allocator, or from before a reset or dispose, are rejected
//! instead of touching memory that is no longer theirs.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`ArenaId`] allocation. Zero is reserved for the
/// zero sentinel. 64 bits wide so the counter never wraps back to it.
static ARENA_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for an allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId(u64);

impl ArenaId {
    /// The id carried by zero handles; never issued to an allocator.
    pub const NONE: Self = Self(0);

    /// Allocate a fresh, unique id. Thread-safe.
    pub fn next() -> Self {
        Self(ARENA_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to one block in an allocator's chain.
///
/// Comparable and hashable; [`AddressHandle::ZERO`] is the "no block"
/// sentinel and compares equal only to itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct AddressHandle {
    pub(crate) arena: ArenaId,
    pub(crate) epoch: u64,
    pub(crate) block: u32,
}

impl AddressHandle {
    /// The zero sentinel.
    pub const ZERO: Self = Self {
        arena: ArenaId::NONE,
        epoch: 0,
        block: 0,
    };

    pub(crate) fn new(arena: ArenaId, epoch: u64, block: u32) -> Self {
        Self {
            arena,
            epoch,
            block,
        }
    }

    /// Whether this is the zero sentinel.
    pub fn is_zero(&self) -> bool {
        self.arena == ArenaId::NONE
    }

    /// The allocator this handle was issued by.
    pub fn arena(&self) -> ArenaId {
        self.arena
    }

    /// Position of the block in the chain.
    pub fn block_index(&self) -> usize {
        self.block as usize
    }

    /// Allocator epoch at the time the handle was issued.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl Default for AddressHandle {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for AddressHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "AddressHandle(zero)");
        }
        write!(
            f,
            "AddressHandle(arena={}, epoch={}, block={})",
            self.arena, self.epoch, self.block
        )
    }
}

/// A byte range `offset..offset + len_bytes` inside one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionHandle {
    pub(crate) address: AddressHandle,
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

impl RegionHandle {
    /// The zero sentinel: no block, no bytes.
    pub const ZERO: Self = Self {
        address: AddressHandle::ZERO,
        offset: 0,
        len: 0,
    };

    pub(crate) fn new(address: AddressHandle, offset: usize, len: usize) -> Self {
        Self {
            address,
            offset,
            len,
        }
    }

    /// The block this region lives in.
    pub fn address(&self) -> AddressHandle {
        self.address
    }

    /// Byte offset of the region within its block.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the region in bytes.
    pub fn len_bytes(&self) -> usize {
        self.len
    }

    /// Whether the region covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether this is the zero sentinel.
    pub fn is_zero(&self) -> bool {
        self.address.is_zero()
    }
}

impl Default for RegionHandle {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for RegionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RegionHandle({}, off={}, len={})",
            self.address, self.offset, self.len
        )
    }
}
