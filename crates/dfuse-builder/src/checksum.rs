use crc::{CRC_32_ISO_HDLC, Crc};

use crate::{LLEncoder, dfuse::ll::Suffix};

/// Standard reflected CRC32, same as zlib
pub const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// DFU suffix checksum of `parts` taken in order.
///
/// The stored value is the complement of the CRC32.
#[must_use]
pub fn dfu_crc(parts: &[&[u8]]) -> u32 {
    let mut digest = CRC32.digest();
    for part in parts {
        digest.update(part);
    }
    !digest.finalize()
}

/// CRC stored in the last four bytes of `image`
#[must_use]
pub fn stored_crc(image: &[u8]) -> Option<u32> {
    let at = image.len().checked_sub(4)?;
    image[at..].try_into().ok().map(u32::from_le_bytes)
}

/// Recompute the checksum over everything before the CRC field and compare.
#[must_use]
pub fn verify(image: &[u8]) -> bool {
    if image.len() < Suffix::SIZE {
        return false;
    }
    let at = image.len() - 4;
    stored_crc(image) == Some(dfu_crc(&[&image[..at]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_check_value() {
        assert_eq!(CRC32.checksum(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn dfu_crc_is_complemented() {
        assert_eq!(dfu_crc(&[b"123456789"]), !0xCBF43926);
        assert_eq!(dfu_crc(&[b"1234", b"56789"]), dfu_crc(&[b"123456789"]));
    }

    #[test]
    fn stored_crc_reads_little_endian() {
        assert_eq!(stored_crc(&[0xAA, 0xef, 0x51, 0x2e, 0x8e]), Some(0x8e2e51ef));
        assert_eq!(stored_crc(&[1, 2, 3]), None);
    }

    #[test]
    fn verify_rejects_short_input() {
        assert!(!verify(&[0u8; 4]));
    }
}
