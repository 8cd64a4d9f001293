//! 24-bit address encoding

/// Number of address bytes sent after an addressed opcode
pub const ADDRESS_BYTES: usize = 3;

/// Highest address reachable with 3-byte addressing
pub const MAX_ADDRESS: u32 = 0x00FF_FFFF;

/// Encode an address as 3 big-endian bytes
///
/// Bits above 23 are dropped, as they are on the wire.
pub const fn encode_address(address: u32) -> [u8; ADDRESS_BYTES] {
    [(address >> 16) as u8, (address >> 8) as u8, address as u8]
}

/// Whether `len` bytes starting at `address` stay within 3-byte addressing
pub const fn fits_address_space(address: u32, len: usize) -> bool {
    if len > MAX_ADDRESS as usize + 1 {
        return false;
    }
    if len == 0 {
        return address <= MAX_ADDRESS;
    }
    match address.checked_add((len - 1) as u32) {
        Some(last) => last <= MAX_ADDRESS,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_big_endian() {
        assert_eq!(encode_address(0x01_2345), [0x01, 0x23, 0x45]);
        assert_eq!(encode_address(0xAB_00_00_10), [0x00, 0x00, 0x10]);
    }

    #[test]
    fn test_fits_address_space() {
        assert!(fits_address_space(0, 0x100_0000));
        assert!(fits_address_space(0xFF_FF00, 0x100));
        assert!(!fits_address_space(0xFF_FF00, 0x101));
        assert!(!fits_address_space(0x100_0000, 1));
        assert!(!fits_address_space(0, 0x100_0001));
    }
}
