//! Low-level primitives for arena memory operations.
//!
//! This is the only module that touches raw memory. Every `unsafe` block
//! carries a mandatory `// SAFETY:` comment. Everything above this layer
//! works on `&[u8]` / `&mut [u8]` borrowed from a [`RawBuffer`].

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::mem;
use std::ptr::NonNull;
use std::slice;

use crate::error::ArenaError;
use crate::plain::Plain;

/// Alignment of every block buffer. Covers every primitive `Plain` type,
/// so a typed view starting at byte 0 of a block is always aligned.
pub(crate) const BUFFER_ALIGN: usize = 16;

/// An owned, zero-initialised heap buffer with a fixed length.
///
/// The buffer is released on drop. Lengths are fixed at creation: there
/// is no reallocation, so borrowed slices never move while the buffer
/// lives.
pub(crate) struct RawBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: `RawBuffer` uniquely owns its allocation; moving it to another
// thread moves that ownership. Shared access only hands out `&[u8]`.
unsafe impl Send for RawBuffer {}
// SAFETY: `&RawBuffer` exposes read-only bytes; mutation needs `&mut`.
unsafe impl Sync for RawBuffer {}

impl RawBuffer {
    /// Allocate `len` zeroed bytes aligned to [`BUFFER_ALIGN`].
    ///
    /// Zero-initialisation means every byte is initialised from the start,
    /// so the buffer can be viewed as `&[u8]` without `MaybeUninit`.
    /// Returns `CapacityExceeded` with a capacity of zero if the system
    /// allocator cannot supply `len` bytes.
    pub(crate) fn zeroed(len: usize) -> Result<Self, ArenaError> {
        if len == 0 {
            return Err(ArenaError::InvalidArgument {
                reason: "buffer length must be non-zero",
            });
        }
        let layout = Layout::from_size_align(len, BUFFER_ALIGN).map_err(|_| {
            ArenaError::CapacityExceeded {
                requested: len,
                capacity: isize::MAX as usize - (BUFFER_ALIGN - 1),
            }
        })?;
        // SAFETY: `layout` has a non-zero size (checked above).
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(ptr) else {
            return Err(ArenaError::CapacityExceeded {
                requested: len,
                capacity: 0,
            });
        };
        Ok(Self { ptr, layout })
    }

    /// Length of the buffer in bytes.
    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        // SAFETY: `ptr` points to `len()` initialised bytes owned by `self`,
        // and the returned borrow is tied to `&self`.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len()) }
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as in `as_bytes`; `&mut self` guarantees exclusivity.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len()) }
    }
}

impl Drop for RawBuffer {
    fn drop(&mut self) {
        // SAFETY: `ptr` was returned by `alloc_zeroed` with exactly `layout`
        // and is released only here, once.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

/// Read one `T` from the start of `bytes`. No alignment is required.
///
/// # Panics
///
/// Panics if `bytes` is shorter than `size_of::<T>()`.
pub(crate) fn read_item<T: Plain>(bytes: &[u8]) -> T {
    let bytes = &bytes[..mem::size_of::<T>()];
    // SAFETY: `bytes` holds exactly `size_of::<T>()` initialised bytes, and
    // `T: Plain` accepts any bit pattern. `read_unaligned` has no alignment
    // requirement.
    unsafe { bytes.as_ptr().cast::<T>().read_unaligned() }
}

/// Write `value` over the start of `bytes`. No alignment is required.
///
/// # Panics
///
/// Panics if `bytes` is shorter than `size_of::<T>()`.
pub(crate) fn write_item<T: Plain>(bytes: &mut [u8], value: T) {
    let bytes = &mut bytes[..mem::size_of::<T>()];
    // SAFETY: `bytes` is an exclusive range of `size_of::<T>()` bytes.
    // `T: Plain` has no padding, so every written byte stays initialised.
    unsafe { bytes.as_mut_ptr().cast::<T>().write_unaligned(value) }
}

/// Reinterpret `bytes` as a slice of `T`, dropping any trailing partial item.
///
/// Returns `None` if `bytes` does not start at an address aligned for `T`.
/// Zero-sized `T` yields an empty slice.
pub(crate) fn cast_slice<T: Plain>(bytes: &[u8]) -> Option<&[T]> {
    let size = mem::size_of::<T>();
    if size == 0 {
        return Some(&[]);
    }
    if bytes.as_ptr().align_offset(mem::align_of::<T>()) != 0 {
        return None;
    }
    // SAFETY: the start is aligned for `T` (checked above), the slice covers
    // `len * size <= bytes.len()` initialised bytes, and `T: Plain` accepts
    // any bit pattern. The borrow is tied to `bytes`.
    Some(unsafe { slice::from_raw_parts(bytes.as_ptr().cast::<T>(), bytes.len() / size) })
}

/// Mutable counterpart of [`cast_slice`].
pub(crate) fn cast_slice_mut<T: Plain>(bytes: &mut [u8]) -> Option<&mut [T]> {
    let size = mem::size_of::<T>();
    if size == 0 {
        return Some(&mut []);
    }
    if bytes.as_ptr().align_offset(mem::align_of::<T>()) != 0 {
        return None;
    }
    // SAFETY: as in `cast_slice`; `bytes` is an exclusive borrow, so the
    // typed slice is the only live view of these bytes. `T: Plain` has no
    // padding, so writes through it keep every byte initialised.
    Some(unsafe {
        slice::from_raw_parts_mut(bytes.as_mut_ptr().cast::<T>(), bytes.len() / size)
    })
}
