//! CRC-32 primitives used to turn tokens into signature bit positions.
//!
//! Both variants share one read-only table built at compile time, so the
//! table can be shared freely between threads.

/// Reflected CRC-32 table for the IEEE polynomial.
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Traditional CRC-32 (the zlib/Ethernet checksum).
///
/// Used for hstore keys and values and for ltree labels.
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    crc ^ 0xFFFF_FFFF
}

/// Legacy CRC-32 variant: the reflected table driven in non-reflected order.
///
/// Text-search lexeme hashes have always been computed this way and the
/// values end up in index keys, so the quirk is kept.
#[must_use]
pub fn legacy_crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = (((crc >> 24) ^ u32::from(byte)) & 0xFF) as usize;
        crc = CRC32_TABLE[index] ^ (crc << 8);
    }
    crc ^ 0xFFFF_FFFF
}
