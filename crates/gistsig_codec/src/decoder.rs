//! Key decoder.

use crate::error::{CodecError, CodecResult};
use crate::VARHDRSZ;

/// Reads a varlena value produced by [`crate::KeyEncoder`].
///
/// The decoder validates that the size recorded in the header matches the
/// slice it was handed, and every read is bounds checked.
pub struct KeyDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> KeyDecoder<'a> {
    /// Open a varlena value. The header must describe exactly `data`.
    pub fn open(data: &'a [u8]) -> CodecResult<Self> {
        if data.len() < VARHDRSZ {
            return Err(CodecError::UnexpectedEof);
        }
        let declared = read_len(data)?;
        if declared != data.len() {
            return Err(CodecError::size_mismatch(declared, data.len()));
        }
        Ok(Self {
            data,
            pos: VARHDRSZ,
        })
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Read exactly `len` bytes.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(CodecError::UnexpectedEof)?;
        if end > self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Read a little-endian `u16`.
    pub fn read_u16(&mut self) -> CodecResult<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&mut self) -> CodecResult<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a little-endian `i32`.
    pub fn read_i32(&mut self) -> CodecResult<i32> {
        let bytes = self.read_bytes(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a nested varlena value and return a decoder positioned after
    /// its header.
    pub fn read_varlena(&mut self) -> CodecResult<KeyDecoder<'a>> {
        let rest = self.remaining();
        if rest.len() < VARHDRSZ {
            return Err(CodecError::UnexpectedEof);
        }
        let len = read_len(rest)?;
        if len < VARHDRSZ {
            return Err(CodecError::invalid_structure(format!(
                "nested varlena of {} bytes is shorter than its header",
                len
            )));
        }
        let bytes = self.read_bytes(len)?;
        KeyDecoder::open(bytes)
    }

    /// Fail unless every byte has been consumed.
    pub fn expect_end(&self) -> CodecResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CodecError::invalid_structure(format!(
                "{} trailing bytes",
                self.data.len() - self.pos
            )))
        }
    }
}

fn read_len(data: &[u8]) -> CodecResult<usize> {
    let header = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    usize::try_from(header).map_err(|_| CodecError::invalid_structure("varlena size overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{flags, KeyEncoder};

    #[test]
    fn open_validates_header() {
        assert!(matches!(
            KeyDecoder::open(&[]),
            Err(CodecError::UnexpectedEof)
        ));
        assert!(matches!(
            KeyDecoder::open(&[9, 0, 0, 0, 0, 0, 0, 0]),
            Err(CodecError::SizeMismatch {
                declared: 9,
                actual: 8
            })
        ));
    }

    #[test]
    fn reads_what_encoder_wrote() {
        let mut encoder = KeyEncoder::new(flags::SIGNKEY);
        encoder.put_u16(3);
        encoder.put_i32(-5);
        encoder.put_bytes(&[1, 2, 3]);
        let bytes = encoder.finish().unwrap();

        let mut decoder = KeyDecoder::open(&bytes).unwrap();
        assert_eq!(decoder.read_u32().unwrap(), flags::SIGNKEY);
        assert_eq!(decoder.read_u16().unwrap(), 3);
        assert_eq!(decoder.read_i32().unwrap(), -5);
        assert_eq!(decoder.read_bytes(3).unwrap(), &[1, 2, 3]);
        assert!(decoder.is_empty());
        decoder.expect_end().unwrap();
    }

    #[test]
    fn read_past_end_fails() {
        let bytes = KeyEncoder::new(0).finish().unwrap();
        let mut decoder = KeyDecoder::open(&bytes).unwrap();
        decoder.read_u32().unwrap();
        assert!(matches!(decoder.read_u16(), Err(CodecError::UnexpectedEof)));
    }

    #[test]
    fn nested_varlena_roundtrip() {
        let mut encoder = KeyEncoder::new(flags::ONENODE);
        encoder
            .put_varlena(|inner| {
                inner.put_bytes(b"xyz");
                Ok(())
            })
            .unwrap();
        encoder.put_u16(9);
        let bytes = encoder.finish().unwrap();

        let mut decoder = KeyDecoder::open(&bytes).unwrap();
        decoder.read_u32().unwrap();
        let mut nested = decoder.read_varlena().unwrap();
        assert_eq!(nested.read_bytes(3).unwrap(), b"xyz");
        assert!(nested.is_empty());
        assert_eq!(decoder.read_u16().unwrap(), 9);
    }

    #[test]
    fn truncated_nested_varlena() {
        // Outer header claims 12 bytes; nested header claims 16.
        let bytes = [12, 0, 0, 0, 0, 0, 0, 0, 16, 0, 0, 0];
        let mut decoder = KeyDecoder::open(&bytes).unwrap();
        decoder.read_u32().unwrap();
        assert!(matches!(
            decoder.read_varlena(),
            Err(CodecError::UnexpectedEof)
        ));
    }

    #[test]
    fn trailing_bytes_are_reported() {
        let mut encoder = KeyEncoder::new(0);
        encoder.put_bytes(&[0xFF]);
        let bytes = encoder.finish().unwrap();
        let mut decoder = KeyDecoder::open(&bytes).unwrap();
        decoder.read_u32().unwrap();
        assert!(matches!(
            decoder.expect_end(),
            Err(CodecError::InvalidStructure { .. })
        ));
    }
}
