//! Fixed-capacity memory blocks with bump allocation.
//!
//! A [`MemoryBlock`] is one contiguous, zero-initialised buffer with a bump
//! offset. Blocks never grow; when one is full the owning
//! [`ArenaAllocator`](crate::ArenaAllocator) chains a new block behind it.

use std::mem;

use crate::error::ArenaError;
use crate::plain::Plain;
use crate::raw::RawBuffer;
use crate::region::{Region, RegionMut};

/// A single fixed-capacity buffer with bump allocation.
///
/// Invariant: `0 <= used <= capacity` at every observable point. Blocks
/// owned by an allocator are released only when the allocator is disposed
/// (or reset, for blocks after the first).
pub struct MemoryBlock {
    /// Backing storage. `None` once the block has been freed.
    buffer: Option<RawBuffer>,
    /// Size of the buffer in bytes, fixed at creation.
    capacity: usize,
    /// Bump offset: bytes handed out so far.
    used: usize,
    /// Logical byte offset of this block within its chain.
    starting_offset: usize,
}

impl MemoryBlock {
    /// Create a block of `capacity` zeroed bytes.
    ///
    /// Returns `Err(ArenaError::InvalidArgument)` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ArenaError> {
        Self::with_starting_offset(capacity, 0)
    }

    pub(crate) fn with_starting_offset(
        capacity: usize,
        starting_offset: usize,
    ) -> Result<Self, ArenaError> {
        if capacity == 0 {
            return Err(ArenaError::InvalidArgument {
                reason: "block capacity must be non-zero",
            });
        }
        Ok(Self {
            buffer: Some(RawBuffer::zeroed(capacity)?),
            capacity,
            used: 0,
            starting_offset,
        })
    }

    /// Bump-allocate `size` bytes.
    ///
    /// Returns `Ok(Some(offset))` with the start of the new range,
    /// `Ok(None)` if the remaining room is too small (the caller decides
    /// whether to chain a new block), or `Err(CapacityExceeded)` if `size`
    /// is larger than the whole block.
    pub fn alloc(&mut self, size: usize) -> Result<Option<usize>, ArenaError> {
        self.alloc_aligned(size, 1)
    }

    /// Bump-allocate `size` bytes starting at an address aligned to `align`.
    ///
    /// Padding skipped to reach the alignment counts towards `used`.
    /// `align` must be a power of two.
    pub fn alloc_aligned(
        &mut self,
        size: usize,
        align: usize,
    ) -> Result<Option<usize>, ArenaError> {
        if !align.is_power_of_two() {
            return Err(ArenaError::InvalidArgument {
                reason: "alignment must be a power of two",
            });
        }
        if size > self.capacity {
            return Err(ArenaError::CapacityExceeded {
                requested: size,
                capacity: self.capacity,
            });
        }
        let Some(buffer) = &self.buffer else {
            return Err(ArenaError::UseAfterDispose);
        };
        let padding = buffer.as_bytes()[self.used..].as_ptr().align_offset(align);
        let Some(start) = self.used.checked_add(padding) else {
            return Ok(None);
        };
        match start.checked_add(size) {
            Some(end) if end <= self.capacity => {
                self.used = end;
                Ok(Some(start))
            }
            _ => Ok(None),
        }
    }

    /// Shrink `used` by `size` bytes without releasing anything.
    ///
    /// Clamps at zero. Used to pop the most recent allocation. Returns
    /// `Err(InvalidArgument)` if `size` is larger than the block itself.
    pub fn reduce(&mut self, size: usize) -> Result<(), ArenaError> {
        if size > self.capacity {
            return Err(ArenaError::InvalidArgument {
                reason: "cannot reduce by more than the block capacity",
            });
        }
        self.used = self.used.saturating_sub(size);
        Ok(())
    }

    /// Reset the bump offset to zero without deallocating.
    ///
    /// The whole buffer is zeroed, including bytes released earlier by
    /// [`reduce`](Self::reduce), so later typed reads start from a clean
    /// block.
    pub fn reset(&mut self) {
        if let Some(buffer) = &mut self.buffer {
            buffer.as_bytes_mut().fill(0);
        }
        self.used = 0;
    }

    /// Release the buffer. Repeated calls are no-ops.
    pub fn free(&mut self) {
        self.buffer = None;
        self.used = 0;
    }

    /// Whether [`free`](Self::free) has released the buffer.
    pub fn is_freed(&self) -> bool {
        self.buffer.is_none()
    }

    /// Number of bytes currently allocated.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remaining free capacity in bytes.
    pub fn remaining(&self) -> usize {
        self.capacity - self.used
    }

    /// Logical byte offset of this block within its chain.
    pub fn starting_offset(&self) -> usize {
        self.starting_offset
    }

    /// Memory held by the backing buffer in bytes (zero once freed).
    pub fn memory_bytes(&self) -> usize {
        self.buffer.as_ref().map_or(0, RawBuffer::len)
    }

    /// View of the used range `0..used`. Empty once freed.
    pub fn region(&self) -> Region<'_> {
        match &self.buffer {
            Some(buffer) => Region::new(&buffer.as_bytes()[..self.used], 0),
            None => Region::new(&[], 0),
        }
    }

    /// Mutable view of the used range `0..used`. Empty once freed.
    pub fn region_mut(&mut self) -> RegionMut<'_> {
        match &mut self.buffer {
            Some(buffer) => RegionMut::new(&mut buffer.as_bytes_mut()[..self.used], 0),
            None => RegionMut::new(&mut [], 0),
        }
    }

    /// View of `offset..offset + len`, if that range lies within `used`.
    pub fn slice(&self, offset: usize, len: usize) -> Option<Region<'_>> {
        let end = offset.checked_add(len).filter(|&end| end <= self.used)?;
        let buffer = self.buffer.as_ref()?;
        Some(Region::new(&buffer.as_bytes()[offset..end], offset))
    }

    /// Mutable view of `offset..offset + len`, if that range lies within `used`.
    pub fn slice_mut(&mut self, offset: usize, len: usize) -> Option<RegionMut<'_>> {
        let end = offset.checked_add(len).filter(|&end| end <= self.used)?;
        let buffer = self.buffer.as_mut()?;
        Some(RegionMut::new(&mut buffer.as_bytes_mut()[offset..end], offset))
    }

    /// Reinterpret the used range as a slice of `T`.
    ///
    /// Callers are expected to keep `used` a multiple of `size_of::<T>()`;
    /// a trailing partial item is not included.
    pub fn as_typed<T: Plain>(&self) -> Result<&[T], ArenaError> {
        self.region().as_typed()
    }

    /// Mutable counterpart of [`as_typed`](Self::as_typed).
    pub fn as_typed_mut<T: Plain>(&mut self) -> Result<&mut [T], ArenaError> {
        self.region_mut().into_typed()
    }

    /// Number of whole `T` items the used range holds.
    pub fn item_len<T>(&self) -> usize {
        self.used.checked_div(mem::size_of::<T>()).unwrap_or(0)
    }
}

impl std::fmt::Debug for MemoryBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBlock")
            .field("capacity", &self.capacity)
            .field("used", &self.used)
            .field("starting_offset", &self.starting_offset)
            .field("freed", &self.is_freed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            MemoryBlock::new(0),
            Err(ArenaError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn sequential_alloc() {
        let mut block = MemoryBlock::new(1024).unwrap();
        assert_eq!(block.alloc(100), Ok(Some(0)));
        assert_eq!(block.alloc(200), Ok(Some(100)));
        assert_eq!(block.used(), 300);
        assert_eq!(block.remaining(), 724);
    }

    #[test]
    fn alloc_signals_overflow_without_consuming() {
        let mut block = MemoryBlock::new(16).unwrap();
        assert_eq!(block.alloc(12), Ok(Some(0)));
        assert_eq!(block.alloc(8), Ok(None));
        assert_eq!(block.used(), 12);
        assert_eq!(block.alloc(4), Ok(Some(12)));
        assert_eq!(block.alloc(0), Ok(Some(16)));
    }

    #[test]
    fn oversized_alloc_is_capacity_exceeded() {
        let mut block = MemoryBlock::new(16).unwrap();
        assert_eq!(
            block.alloc(17),
            Err(ArenaError::CapacityExceeded {
                requested: 17,
                capacity: 16
            })
        );
        assert_eq!(block.used(), 0);
    }

    #[test]
    fn aligned_alloc_pads_to_alignment() {
        let mut block = MemoryBlock::new(32).unwrap();
        assert_eq!(block.alloc(1), Ok(Some(0)));
        assert_eq!(block.alloc_aligned(8, 8), Ok(Some(8)));
        assert_eq!(block.used(), 16);
        assert!(matches!(
            block.alloc_aligned(4, 3),
            Err(ArenaError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn aligned_alloc_counts_padding_against_capacity() {
        let mut block = MemoryBlock::new(16).unwrap();
        block.alloc(9).unwrap();
        // 9 rounds up to 12; 12 + 8 > 16.
        assert_eq!(block.alloc_aligned(8, 4), Ok(None));
        assert_eq!(block.used(), 9);
    }

    #[test]
    fn reduce_clamps_at_zero() {
        let mut block = MemoryBlock::new(16).unwrap();
        block.alloc(8).unwrap();
        block.reduce(4).unwrap();
        assert_eq!(block.used(), 4);
        block.reduce(10).unwrap();
        assert_eq!(block.used(), 0);
        assert!(matches!(
            block.reduce(17),
            Err(ArenaError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn reset_zeroes_and_allows_realloc() {
        let mut block = MemoryBlock::new(16).unwrap();
        block.alloc(8).unwrap();
        block.region_mut().set_item(0, 7u32).unwrap();
        block.reset();
        assert_eq!(block.used(), 0);
        block.alloc(8).unwrap();
        assert_eq!(block.region().get_item::<u32>(0), Ok(0));
    }

    #[test]
    fn reset_zeroes_bytes_above_a_reduced_used() {
        let mut block = MemoryBlock::new(16).unwrap();
        block.alloc(12).unwrap();
        block.region_mut().set_item(2, 9u32).unwrap();
        block.reduce(12).unwrap();
        block.reset();
        block.alloc(12).unwrap();
        assert_eq!(block.as_typed::<u32>().unwrap(), &[0, 0, 0]);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn unsatisfiable_capacity_is_an_error() {
        assert!(matches!(
            MemoryBlock::new(1 << 62),
            Err(ArenaError::CapacityExceeded { requested, .. }) if requested == 1 << 62
        ));
    }

    #[test]
    fn free_is_idempotent() {
        let mut block = MemoryBlock::new(16).unwrap();
        block.alloc(8).unwrap();
        block.free();
        block.free();
        assert!(block.is_freed());
        assert_eq!(block.used(), 0);
        assert_eq!(block.memory_bytes(), 0);
        assert!(block.region().is_empty());
        assert_eq!(block.alloc(1), Err(ArenaError::UseAfterDispose));
    }

    #[test]
    fn typed_view_covers_used_range() {
        let mut block = MemoryBlock::new(16).unwrap();
        block.alloc(12).unwrap();
        {
            let items = block.as_typed_mut::<u32>().unwrap();
            assert_eq!(items.len(), 3);
            items[2] = 9;
        }
        assert_eq!(block.as_typed::<u32>().unwrap(), &[0, 0, 9]);
        assert_eq!(block.item_len::<u32>(), 3);
    }

    #[test]
    fn slice_is_bounded_by_used() {
        let mut block = MemoryBlock::new(16).unwrap();
        block.alloc(8).unwrap();
        assert!(block.slice(4, 4).is_some());
        assert!(block.slice(4, 5).is_none());
        assert!(block.slice_mut(usize::MAX, 2).is_none());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn used_never_exceeds_capacity(
                capacity in 1usize..256,
                ops in proptest::collection::vec((any::<bool>(), 0usize..300), 1..50),
            ) {
                let mut block = MemoryBlock::new(capacity).unwrap();
                for (is_alloc, size) in ops {
                    if is_alloc {
                        let _ = block.alloc(size);
                    } else {
                        let _ = block.reduce(size);
                    }
                    prop_assert!(block.used() <= block.capacity());
                }
            }
        }
    }
}
