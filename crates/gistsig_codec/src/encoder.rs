//! Key encoder.

use crate::error::{CodecError, CodecResult};
use crate::{MAX_VARLENA_SIZE, VARHDRSZ};

/// Builds the on-disk form of an index key.
///
/// Every key starts with a 4-byte little-endian varlena header holding the
/// total size in bytes (header included), followed by a 32-bit flag word.
/// The header is patched by [`KeyEncoder::finish`], so callers only append
/// the payload.
///
/// ```
/// use gistsig_codec::{flags, KeyEncoder, GTHDRSIZE};
///
/// let mut encoder = KeyEncoder::new(flags::SIGNKEY);
/// encoder.put_bytes(&[0xAA, 0x55]);
/// let bytes = encoder.finish().unwrap();
/// assert_eq!(bytes.len(), GTHDRSIZE + 2);
/// assert_eq!(&bytes[..4], &10u32.to_le_bytes());
/// ```
pub struct KeyEncoder {
    buffer: Vec<u8>,
}

impl KeyEncoder {
    /// Create a new encoder for a key carrying `flags`.
    pub fn new(flags: u32) -> Self {
        Self::with_capacity(flags, 0)
    }

    /// Create a new encoder with room for `payload` bytes after the header.
    pub fn with_capacity(flags: u32, payload: usize) -> Self {
        let mut buffer = Vec::with_capacity(crate::GTHDRSIZE + payload);
        buffer.extend_from_slice(&[0u8; VARHDRSZ]);
        buffer.extend_from_slice(&flags.to_le_bytes());
        Self { buffer }
    }

    /// Append raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Append a little-endian `u16`.
    pub fn put_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a little-endian `u32`.
    pub fn put_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a little-endian `i32`.
    pub fn put_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a nested varlena value whose payload is written by `write`.
    ///
    /// The nested value gets its own 4-byte size header.
    pub fn put_varlena<F>(&mut self, write: F) -> CodecResult<()>
    where
        F: FnOnce(&mut Self) -> CodecResult<()>,
    {
        let start = self.buffer.len();
        self.buffer.extend_from_slice(&[0u8; VARHDRSZ]);
        write(self)?;
        let len = self.buffer.len() - start;
        self.patch_header(start, len)
    }

    /// Number of bytes written so far, header included.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing beyond the header has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.len() <= crate::GTHDRSIZE
    }

    /// Patch the outer header and return the encoded key.
    pub fn finish(mut self) -> CodecResult<Vec<u8>> {
        let len = self.buffer.len();
        self.patch_header(0, len)?;
        Ok(self.buffer)
    }

    fn patch_header(&mut self, at: usize, len: usize) -> CodecResult<()> {
        if len > MAX_VARLENA_SIZE {
            return Err(CodecError::encoding_failed(format!(
                "value of {} bytes exceeds the varlena limit of {} bytes",
                len, MAX_VARLENA_SIZE
            )));
        }
        #[allow(clippy::cast_possible_truncation)]
        let header = (len as u32).to_le_bytes();
        self.buffer[at..at + VARHDRSZ].copy_from_slice(&header);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags;

    #[test]
    fn header_only_key() {
        let bytes = KeyEncoder::new(flags::SIGNKEY | flags::ALLISTRUE)
            .finish()
            .unwrap();
        assert_eq!(bytes, vec![8, 0, 0, 0, 0x06, 0, 0, 0]);
    }

    #[test]
    fn payload_is_appended_after_flags() {
        let mut encoder = KeyEncoder::new(flags::ARRKEY);
        encoder.put_i32(-1);
        encoder.put_i32(7);
        let bytes = encoder.finish().unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..4], &16u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &(-1i32).to_le_bytes());
        assert_eq!(&bytes[12..16], &7i32.to_le_bytes());
    }

    #[test]
    fn nested_varlena_has_its_own_header() {
        let mut encoder = KeyEncoder::new(flags::ONENODE);
        encoder
            .put_varlena(|inner| {
                inner.put_u16(1);
                inner.put_bytes(b"ab");
                Ok(())
            })
            .unwrap();
        let bytes = encoder.finish().unwrap();
        // outer header + flags + nested header + u16 + 2 bytes
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[8..12], &8u32.to_le_bytes());
        assert_eq!(&bytes[12..14], &1u16.to_le_bytes());
        assert_eq!(&bytes[14..], b"ab");
    }

    #[test]
    fn nested_error_propagates() {
        let mut encoder = KeyEncoder::new(0);
        let result = encoder.put_varlena(|_| Err(CodecError::encoding_failed("boom")));
        assert!(matches!(result, Err(CodecError::EncodingFailed { .. })));
    }

    #[test]
    fn empty_tracks_payload() {
        let mut encoder = KeyEncoder::new(0);
        assert!(encoder.is_empty());
        encoder.put_bytes(&[1]);
        assert!(!encoder.is_empty());
        assert_eq!(encoder.len(), 9);
    }
}
