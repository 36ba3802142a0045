//! Transfer descriptors.
//!
//! A descriptor is the validated, hardware-independent description of one
//! copy: source address, destination address, element count and element
//! width. It is built once from a pair of buffers and handed to the engine
//! unchanged for every transfer; it never changes while a transfer is in
//! flight.

use crate::ConfigError;

/// Width of a single transferred element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementWidth {
    Bits8,
    Bits16,
    Bits32,
}

impl ElementWidth {
    /// Size of one element in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            ElementWidth::Bits8 => 1,
            ElementWidth::Bits16 => 2,
            ElementWidth::Bits32 => 4,
        }
    }
}

/// A validated description of one memory-to-memory copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferDescriptor {
    src: usize,
    dst: usize,
    count: usize,
    width: ElementWidth,
}

impl TransferDescriptor {
    /// Largest element count a channel transfer counter can hold.
    pub const MAX_COUNT: usize = 65_535;

    /// Builds a descriptor covering the whole source region.
    ///
    /// `src` and `dst` are (pointer, length in bytes) pairs as produced by
    /// the buffer traits. The transfer length is the source length; the
    /// destination only has to be at least that large. Anything the engine
    /// could choke on is rejected here, before any register is touched.
    pub fn from_regions(
        src: (*const u8, usize),
        dst: (*mut u8, usize),
        width: ElementWidth,
    ) -> Result<Self, ConfigError> {
        let (src_ptr, src_len) = src;
        let (dst_ptr, dst_len) = dst;
        let src_addr = src_ptr as usize;
        let dst_addr = dst_ptr as usize;
        let bytes = width.bytes();

        if src_len == 0 {
            return Err(ConfigError::EmptyTransfer);
        }
        if src_len % bytes != 0 {
            return Err(ConfigError::RaggedLength { len: src_len });
        }
        let count = src_len / bytes;
        if count > Self::MAX_COUNT {
            return Err(ConfigError::CountTooLarge { count });
        }
        if dst_len < src_len {
            return Err(ConfigError::DestinationTooSmall {
                needed: src_len,
                actual: dst_len,
            });
        }
        if src_addr % bytes != 0 {
            return Err(ConfigError::Misaligned { addr: src_addr });
        }
        if dst_addr % bytes != 0 {
            return Err(ConfigError::Misaligned { addr: dst_addr });
        }
        // Overlap is judged on the bytes the engine actually touches.
        if src_addr < dst_addr + src_len && dst_addr < src_addr + src_len {
            return Err(ConfigError::RegionsOverlap);
        }

        Ok(Self {
            src: src_addr,
            dst: dst_addr,
            count,
            width,
        })
    }

    pub fn source_addr(&self) -> usize {
        self.src
    }

    pub fn destination_addr(&self) -> usize {
        self.dst
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn width(&self) -> ElementWidth {
        self.width
    }

    /// Total number of bytes moved by one transfer.
    pub fn byte_len(&self) -> usize {
        self.count * self.width.bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions(src: &[u32], dst: &mut [u32]) -> ((*const u8, usize), (*mut u8, usize)) {
        (
            (src.as_ptr().cast(), src.len() * 4),
            (dst.as_mut_ptr().cast(), dst.len() * 4),
        )
    }

    #[test]
    fn accepts_well_formed_regions() {
        let src = [0u32; 32];
        let mut dst = [0u32; 32];
        let (s, d) = regions(&src, &mut dst);
        let desc = TransferDescriptor::from_regions(s, d, ElementWidth::Bits32).unwrap();
        assert_eq!(desc.count(), 32);
        assert_eq!(desc.byte_len(), 128);
        assert_eq!(desc.source_addr(), src.as_ptr() as usize);
        assert_eq!(desc.destination_addr(), dst.as_ptr() as usize);
    }

    #[test]
    fn destination_may_be_larger_than_source() {
        let src = [0u32; 8];
        let mut dst = [0u32; 32];
        let (s, d) = regions(&src, &mut dst);
        let desc = TransferDescriptor::from_regions(s, d, ElementWidth::Bits32).unwrap();
        assert_eq!(desc.count(), 8);
    }

    #[test]
    fn rejects_empty_source() {
        let src: [u32; 0] = [];
        let mut dst = [0u32; 4];
        let (s, d) = regions(&src, &mut dst);
        assert_eq!(
            TransferDescriptor::from_regions(s, d, ElementWidth::Bits32),
            Err(ConfigError::EmptyTransfer)
        );
    }

    #[test]
    fn rejects_length_not_divisible_by_width() {
        let src = [0u8; 7];
        let mut dst = [0u32; 4];
        assert_eq!(
            TransferDescriptor::from_regions(
                (src.as_ptr(), src.len()),
                (dst.as_mut_ptr().cast(), 16),
                ElementWidth::Bits32,
            ),
            Err(ConfigError::RaggedLength { len: 7 })
        );
    }

    #[test]
    fn rejects_count_beyond_channel_counter() {
        let src = [0u8; TransferDescriptor::MAX_COUNT + 1];
        let mut dst = [0u8; TransferDescriptor::MAX_COUNT + 1];
        assert_eq!(
            TransferDescriptor::from_regions(
                (src.as_ptr(), src.len()),
                (dst.as_mut_ptr(), dst.len()),
                ElementWidth::Bits8,
            ),
            Err(ConfigError::CountTooLarge {
                count: TransferDescriptor::MAX_COUNT + 1
            })
        );
    }

    #[test]
    fn rejects_short_destination() {
        let src = [0u32; 32];
        let mut dst = [0u32; 16];
        let (s, d) = regions(&src, &mut dst);
        assert_eq!(
            TransferDescriptor::from_regions(s, d, ElementWidth::Bits32),
            Err(ConfigError::DestinationTooSmall {
                needed: 128,
                actual: 64
            })
        );
    }

    #[test]
    fn rejects_misaligned_source() {
        let backing = [0u32; 16];
        let mut dst = [0u32; 8];
        // One byte past a word-aligned base cannot be word-aligned.
        let src_ptr = unsafe { backing.as_ptr().cast::<u8>().add(1) };
        let err = TransferDescriptor::from_regions(
            (src_ptr, 32),
            (dst.as_mut_ptr().cast(), 32),
            ElementWidth::Bits32,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Misaligned {
                addr: src_ptr as usize
            }
        );
    }

    #[test]
    fn rejects_overlapping_regions() {
        let mut backing = [0u32; 32];
        let base = backing.as_mut_ptr();
        // Destination starts halfway into the source.
        let err = TransferDescriptor::from_regions(
            (base.cast(), 64),
            (unsafe { base.add(8) }.cast(), 64),
            ElementWidth::Bits32,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::RegionsOverlap);
    }

    #[test]
    fn adjacent_regions_do_not_overlap() {
        let mut backing = [0u32; 16];
        let base = backing.as_mut_ptr();
        let desc = TransferDescriptor::from_regions(
            (base.cast(), 32),
            (unsafe { base.add(8) }.cast(), 32),
            ElementWidth::Bits32,
        )
        .unwrap();
        assert_eq!(desc.count(), 8);
    }
}
