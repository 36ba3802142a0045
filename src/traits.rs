//! `unsafe` traits for memory regions usable as transfer endpoints.
//!
//! These traits guarantee that a buffer handed to the transfer engine is a
//! stable pointer to real memory and (for destinations) that the element type
//! tolerates any byte pattern. They deliberately do not require `'static`,
//! so they stay usable for stack buffers; leak safety is enforced by the
//! [`TransferController`](crate::TransferController) bounds instead.

use as_slice::AsSlice;
use core::{
    mem::{self, MaybeUninit},
    ops::{Deref, DerefMut},
};
use stable_deref_trait::StableDeref;

/// Trait for buffers the engine reads from.
///
/// # Safety
///
/// The implementing type must be safe to use as a transfer source. This
/// means:
///
/// - It must be a pointer that references the actual buffer.
/// - The requirements documented on `source_region` must be fulfilled.
pub unsafe trait SourceBuffer {
    /// Provide the memory region the engine reads.
    ///
    /// The return value is:
    ///
    /// - pointer to the start of the buffer
    /// - buffer size in bytes
    ///
    /// # Safety
    ///
    /// - This function must always return the same values, if called multiple
    ///   times.
    /// - The memory specified by the returned pointer and size must be fully
    ///   readable by the transfer engine.
    fn source_region(&self) -> (*const u8, usize);
}

/// Trait for buffers the engine writes into.
///
/// # Safety
///
/// The implementing type must be safe to use as a transfer destination. This
/// means:
///
/// - It must be a pointer that references the actual buffer.
/// - The buffer's element type must be valid for any possible byte pattern.
/// - The requirements documented on `destination_region` must be fulfilled.
pub unsafe trait DestinationBuffer {
    /// Provide the memory region the engine writes.
    ///
    /// The return value is:
    ///
    /// - pointer to the start of the buffer
    /// - buffer size in bytes
    ///
    /// # Safety
    ///
    /// - This function must always return the same values, if called multiple
    ///   times.
    /// - The memory specified by the returned pointer and size must be fully
    ///   writable by the transfer engine.
    fn destination_region(&mut self) -> (*mut u8, usize);
}

/// Deref target for the buffer types accepted by the blanket
/// implementations.
///
/// # Safety
///
/// Types that implement this trait must be valid for every possible byte
/// pattern. This is to ensure that, whatever the engine writes into the
/// buffer, we won't get UB due to invalid values.
pub unsafe trait CopyTarget {}

unsafe impl CopyTarget for u8 {}
unsafe impl CopyTarget for u16 {}
unsafe impl CopyTarget for u32 {}
unsafe impl CopyTarget for u64 {}
unsafe impl CopyTarget for usize {}

unsafe impl CopyTarget for i8 {}
unsafe impl CopyTarget for i16 {}
unsafe impl CopyTarget for i32 {}
unsafe impl CopyTarget for i64 {}
unsafe impl CopyTarget for isize {}

unsafe impl<T: CopyTarget> CopyTarget for [T] {}
unsafe impl<T: CopyTarget> CopyTarget for MaybeUninit<T> {}
unsafe impl<T: CopyTarget, const N: usize> CopyTarget for [T; N] {}

// The blanket impls are slice-based rather than `AsRef`-based; an `AsRef`
// version leaves the element type unconstrained and does not compile.

unsafe impl<B, E> SourceBuffer for B
where
    B: Deref + StableDeref,
    B::Target: AsSlice<Element = E>,
    E: CopyTarget,
{
    fn source_region(&self) -> (*const u8, usize) {
        let target = self.as_slice();
        let len = mem::size_of_val(target);
        (target.as_ptr().cast(), len)
    }
}

unsafe impl<B, T> DestinationBuffer for B
where
    B: DerefMut<Target = T> + StableDeref,
    T: CopyTarget + ?Sized,
{
    fn destination_region(&mut self) -> (*mut u8, usize) {
        let target = self.deref_mut();
        let len = mem::size_of_val(target);
        ((target as *mut T).cast(), len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_reference_exposes_whole_region() {
        let data: &[u32; 4] = &[1, 2, 3, 4];
        let (ptr, len) = data.source_region();
        assert_eq!(ptr, data.as_ptr().cast());
        assert_eq!(len, 16);
    }

    #[test]
    fn slice_reference_length_is_in_bytes() {
        let data: [u16; 6] = [0; 6];
        let slice: &[u16] = &data;
        let (_, len) = slice.source_region();
        assert_eq!(len, 12);
    }

    #[test]
    fn destination_region_is_stable_across_calls() {
        let mut data = [0u32; 8];
        let mut dst: &mut [u32] = &mut data;
        let first = dst.destination_region();
        let second = dst.destination_region();
        assert_eq!(first, second);
    }

    #[test]
    fn maybe_uninit_destination_counts_payload_bytes() {
        let mut data: MaybeUninit<[u32; 8]> = MaybeUninit::uninit();
        let mut dst = &mut data;
        let (_, len) = dst.destination_region();
        assert_eq!(len, 32);
    }
}
