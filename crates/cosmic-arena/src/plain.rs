//! Marker trait for item types that can live in arena bytes.

#![allow(unsafe_code)]

/// A `Copy` type that may be reinterpreted from, and written as, raw bytes.
///
/// Arena blocks hand out untyped byte ranges, and the typed accessors
/// (`get_item_in_all`, `RegionMut::set_item`, typed views) read and write
/// them as `T`. That is only sound for types without padding, without
/// pointers or references, and for which every bit pattern is valid.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - every byte pattern of length `size_of::<Self>()` is a valid `Self`;
/// - `Self` has no padding bytes;
/// - `Self` contains no references, pointers or interior mutability.
///
/// `#[repr(C)]` structs made only of `Plain` fields with no padding
/// between them satisfy these rules.
pub unsafe trait Plain: Copy + 'static {}

macro_rules! impl_plain {
    ($($ty:ty),* $(,)?) => {
        $(
            // SAFETY: primitive integers and floats accept every bit pattern
            // and have no padding.
            unsafe impl Plain for $ty {}
        )*
    };
}

impl_plain!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

// SAFETY: arrays of `Plain` elements are laid out contiguously without
// padding, so they inherit every guarantee of their element type.
unsafe impl<T: Plain, const N: usize> Plain for [T; N] {}
