//! Borrowed typed views over a block's bytes.
//!
//! A [`Region`] or [`RegionMut`] is what a [`RegionHandle`](crate::RegionHandle)
//! resolves to. Views borrow from the owning allocator, so the borrow
//! checker rules out using one after the allocator is reset or disposed.
//! All typed access is bound-checked against `len_bytes / size_of::<T>()`.

use std::mem;
use std::ops::Range;

use crate::error::ArenaError;
use crate::plain::Plain;
use crate::raw;

/// Size of `T` in bytes, rejecting zero-sized types.
pub(crate) fn item_size<T>() -> Result<usize, ArenaError> {
    match mem::size_of::<T>() {
        0 => Err(ArenaError::InvalidArgument {
            reason: "item type must not be zero-sized",
        }),
        size => Ok(size),
    }
}

/// Byte range of item `index` in a region of `len_bytes`.
fn item_range<T>(len_bytes: usize, index: usize) -> Result<Range<usize>, ArenaError> {
    let size = item_size::<T>()?;
    let len = len_bytes / size;
    if index >= len {
        return Err(ArenaError::IndexOutOfRange { index, len });
    }
    let start = index * size;
    Ok(start..start + size)
}

/// Read-only view of a contiguous byte range within one block.
#[derive(Clone, Copy, Debug)]
pub struct Region<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Region<'a> {
    pub(crate) fn new(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    /// Byte offset of this region within its block.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the region in bytes.
    pub fn len_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the region covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The raw bytes of the region.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Number of whole `T` items in the region.
    pub fn item_len<T>(&self) -> usize {
        self.bytes.len().checked_div(mem::size_of::<T>()).unwrap_or(0)
    }

    /// Read item `index`, counting in units of `T` from the region start.
    pub fn get_item<T: Plain>(&self, index: usize) -> Result<T, ArenaError> {
        let range = item_range::<T>(self.bytes.len(), index)?;
        Ok(raw::read_item(&self.bytes[range]))
    }

    /// Reinterpret the whole region as a slice of `T`.
    ///
    /// Trailing bytes that do not form a whole item are not included.
    pub fn as_typed<T: Plain>(&self) -> Result<&'a [T], ArenaError> {
        item_size::<T>()?;
        raw::cast_slice(self.bytes).ok_or(ArenaError::Misaligned {
            offset: self.offset,
            align: mem::align_of::<T>(),
        })
    }
}

/// Mutable view of a contiguous byte range within one block.
#[derive(Debug)]
pub struct RegionMut<'a> {
    bytes: &'a mut [u8],
    offset: usize,
}

impl<'a> RegionMut<'a> {
    pub(crate) fn new(bytes: &'a mut [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    /// Byte offset of this region within its block.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the region in bytes.
    pub fn len_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the region covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of whole `T` items in the region.
    pub fn item_len<T>(&self) -> usize {
        self.bytes.len().checked_div(mem::size_of::<T>()).unwrap_or(0)
    }

    /// Shared view of the same bytes.
    pub fn as_region(&self) -> Region<'_> {
        Region::new(&*self.bytes, self.offset)
    }

    /// The raw bytes of the region.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.bytes
    }

    /// Read item `index`, counting in units of `T` from the region start.
    pub fn get_item<T: Plain>(&self, index: usize) -> Result<T, ArenaError> {
        self.as_region().get_item(index)
    }

    /// Overwrite item `index`, counting in units of `T` from the region start.
    pub fn set_item<T: Plain>(&mut self, index: usize, value: T) -> Result<(), ArenaError> {
        let range = item_range::<T>(self.bytes.len(), index)?;
        raw::write_item(&mut self.bytes[range], value);
        Ok(())
    }

    /// Reinterpret the whole region as a mutable slice of `T`.
    pub fn as_typed_mut<T: Plain>(&mut self) -> Result<&mut [T], ArenaError> {
        item_size::<T>()?;
        let offset = self.offset;
        raw::cast_slice_mut(&mut *self.bytes).ok_or(ArenaError::Misaligned {
            offset,
            align: mem::align_of::<T>(),
        })
    }

    /// Consume the view, keeping the typed slice for the full borrow.
    pub fn into_typed<T: Plain>(self) -> Result<&'a mut [T], ArenaError> {
        item_size::<T>()?;
        let offset = self.offset;
        raw::cast_slice_mut(self.bytes).ok_or(ArenaError::Misaligned {
            offset,
            align: mem::align_of::<T>(),
        })
    }
}
