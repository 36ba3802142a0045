//! Post-transfer verification.

use crate::descriptor::ElementWidth;
use crate::Error;

/// Compares destination against source over the full transferred length.
///
/// Both slices must cover exactly the bytes the descriptor declared. The
/// comparison walks element-wise so a failure can name the first element
/// that differs; because the destination is zeroed before every transfer,
/// an engine that silently moved nothing fails here instead of passing on
/// stale data.
pub fn verify(source: &[u8], destination: &[u8], width: ElementWidth) -> Result<(), Error> {
    debug_assert_eq!(source.len(), destination.len());
    let bytes = width.bytes();
    let elements = source
        .chunks_exact(bytes)
        .zip(destination.chunks_exact(bytes));
    for (index, (src, dst)) in elements.enumerate() {
        if src != dst {
            return Err(Error::Mismatch { index });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_of(words: &[u32]) -> &[u8] {
        unsafe { core::slice::from_raw_parts(words.as_ptr().cast(), words.len() * 4) }
    }

    #[test]
    fn identical_regions_pass() {
        let src = [0x1000_0000u32, 0x1000_0001, 0x1000_0002, 0x1000_0003];
        let dst = src;
        assert_eq!(verify(bytes_of(&src), bytes_of(&dst), ElementWidth::Bits32), Ok(()));
    }

    #[test]
    fn single_corrupted_element_is_reported_by_index() {
        let src = [7u32; 16];
        let mut dst = src;
        dst[11] ^= 0x0100;
        assert_eq!(
            verify(bytes_of(&src), bytes_of(&dst), ElementWidth::Bits32),
            Err(Error::Mismatch { index: 11 })
        );
    }

    #[test]
    fn first_mismatch_wins() {
        let src = [1u32, 2, 3, 4];
        let dst = [1u32, 9, 3, 9];
        assert_eq!(
            verify(bytes_of(&src), bytes_of(&dst), ElementWidth::Bits32),
            Err(Error::Mismatch { index: 1 })
        );
    }

    #[test]
    fn index_counts_elements_not_bytes() {
        let src = [0u16, 0, 0, 0xAAAA];
        let mut dst = src;
        dst[3] = 0x5555;
        let src_bytes = unsafe { core::slice::from_raw_parts(src.as_ptr().cast(), 8) };
        let dst_bytes = unsafe { core::slice::from_raw_parts(dst.as_ptr().cast(), 8) };
        assert_eq!(
            verify(src_bytes, dst_bytes, ElementWidth::Bits16),
            Err(Error::Mismatch { index: 3 })
        );
    }

    #[test]
    fn all_zero_regions_compare_equal() {
        let zeros = [0u8; 64];
        assert_eq!(verify(&zeros, &zeros, ElementWidth::Bits8), Ok(()));
    }
}
