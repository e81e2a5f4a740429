//! # gistsig Codec
//!
//! On-disk layout for signature-based GiST index keys.
//!
//! Every key is a varlena value: a 4-byte little-endian size header followed
//! by a 32-bit flag word and a payload whose shape depends on the flags.
//!
//! ## Key forms
//!
//! - `ARRKEY`: sorted, de-duplicated `i32` hashes
//! - `SIGNKEY`: a `siglen`-byte bitmap
//! - `SIGNKEY | ALLISTRUE`: header only, every bit implicitly set
//! - `ONENODE`: a single ltree path (ltree leaves)
//!
//! Ltree internal keys additionally carry a left bound and, unless
//! `NORIGHT` is set, a right bound after the bitmap.
//!
//! ## Usage
//!
//! ```
//! use gistsig_codec::{flags, KeyDecoder, KeyEncoder};
//!
//! let mut encoder = KeyEncoder::new(flags::ARRKEY);
//! encoder.put_i32(42);
//! let bytes = encoder.finish().unwrap();
//!
//! let mut decoder = KeyDecoder::open(&bytes).unwrap();
//! assert_eq!(decoder.read_u32().unwrap(), flags::ARRKEY);
//! assert_eq!(decoder.read_i32().unwrap(), 42);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod crc;
mod decoder;
mod encoder;
mod error;

pub use crc::{crc32, legacy_crc32};
pub use decoder::KeyDecoder;
pub use encoder::KeyEncoder;
pub use error::{CodecError, CodecResult};

/// Size of the varlena length header.
pub const VARHDRSZ: usize = 4;

/// Size of the key header: varlena length plus flag word.
pub const GTHDRSIZE: usize = VARHDRSZ + 4;

/// Largest value a 4-byte varlena header may describe.
pub const MAX_VARLENA_SIZE: usize = 0x3FFF_FFFF;

/// Key flag bits.
pub mod flags {
    /// Payload is a sorted array of `i32` hashes.
    pub const ARRKEY: u32 = 0x01;
    /// Payload is a signature bitmap.
    pub const SIGNKEY: u32 = 0x02;
    /// Signature is saturated; no bitmap is stored.
    pub const ALLISTRUE: u32 = 0x04;
    /// Payload is a single ltree path.
    pub const ONENODE: u32 = 0x08;
    /// Ltree internal key stores only the left bound.
    pub const NORIGHT: u32 = 0x10;

    /// Every flag this codec understands.
    pub const KNOWN: u32 = ARRKEY | SIGNKEY | ALLISTRUE | ONENODE | NORIGHT;
}

/// Context needed to decode a key.
///
/// The bitmap length is an index option and is not stored in the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLayout {
    /// Signature length in bytes.
    pub siglen: usize,
}

impl KeyLayout {
    /// Create a layout for the given signature length.
    #[must_use]
    pub const fn new(siglen: usize) -> Self {
        Self { siglen }
    }
}

/// Trait for types that can be encoded to their on-disk form.
pub trait Encode {
    /// Encode this value to bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from their on-disk form.
pub trait Decode: Sized {
    /// Decode this value from bytes using `layout`.
    fn decode(bytes: &[u8], layout: &KeyLayout) -> CodecResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size() {
        assert_eq!(GTHDRSIZE, 8);
    }

    #[test]
    fn flags_are_disjoint() {
        let all = [
            flags::ARRKEY,
            flags::SIGNKEY,
            flags::ALLISTRUE,
            flags::ONENODE,
            flags::NORIGHT,
        ];
        let mut seen = 0;
        for flag in all {
            assert_eq!(seen & flag, 0);
            seen |= flag;
        }
        assert_eq!(seen, flags::KNOWN);
    }

    #[test]
    fn layout_constructor() {
        assert_eq!(KeyLayout::new(16).siglen, 16);
    }
}
