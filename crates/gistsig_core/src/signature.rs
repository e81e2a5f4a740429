//! Fixed-width bit signatures.
//!
//! Bit `i` lives in byte `i / 8` at position `i % 8`. Tokens are reduced
//! modulo the bit length to pick their bit.

use crate::options::SigLen;
use std::fmt;

/// Maps a 32-bit token to a bit position in a signature of `siglen` bytes.
///
/// # Panics
///
/// Panics if `siglen` is zero.
#[inline]
#[must_use]
pub fn hash_bit(token: u32, siglen: usize) -> usize {
    token as usize % (siglen * 8)
}

/// A bitmap signature of a fixed number of bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    bytes: Box<[u8]>,
}

impl Signature {
    /// Creates an empty signature.
    #[must_use]
    pub fn new(siglen: SigLen) -> Self {
        Self {
            bytes: vec![0u8; siglen.bytes()].into_boxed_slice(),
        }
    }

    /// Wraps raw signature bytes.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }

    /// Creates a signature with every bit set.
    #[must_use]
    pub fn full(siglen: SigLen) -> Self {
        Self {
            bytes: vec![0xFF; siglen.bytes()].into_boxed_slice(),
        }
    }

    /// Builds a signature from a set of tokens.
    pub fn from_tokens(siglen: SigLen, tokens: impl IntoIterator<Item = u32>) -> Self {
        let mut sign = Self::new(siglen);
        for token in tokens {
            sign.add_token(token);
        }
        sign
    }

    /// Length in bytes.
    #[must_use]
    pub fn siglen(&self) -> usize {
        self.bytes.len()
    }

    /// Length in bits.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Sets bit `bit`.
    #[inline]
    pub fn set(&mut self, bit: usize) {
        self.bytes[bit / 8] |= 1 << (bit % 8);
    }

    /// Tests bit `bit`.
    #[inline]
    #[must_use]
    pub fn get(&self, bit: usize) -> bool {
        self.bytes[bit / 8] & (1 << (bit % 8)) != 0
    }

    /// Sets the bit of `token`.
    #[inline]
    pub fn add_token(&mut self, token: u32) {
        self.set(hash_bit(token, self.siglen()));
    }

    /// Tests the bit of `token`.
    #[inline]
    #[must_use]
    pub fn has_token(&self, token: u32) -> bool {
        self.get(hash_bit(token, self.siglen()))
    }

    /// Number of set bits.
    #[must_use]
    pub fn popcount(&self) -> u32 {
        self.bytes.iter().map(|b| b.count_ones()).sum()
    }

    /// Number of clear bits.
    #[must_use]
    pub fn unset_count(&self) -> u32 {
        self.bytes.iter().map(|b| b.count_zeros()).sum()
    }

    /// Bitwise OR of `other` into `self`.
    pub fn union_with(&mut self, other: &Signature) {
        for (dst, src) in self.bytes.iter_mut().zip(other.bytes.iter()) {
            *dst |= *src;
        }
    }

    /// Hamming distance to `other`.
    #[must_use]
    pub fn hamming(&self, other: &Signature) -> u32 {
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    /// Whether every bit of `self` is also set in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Signature) -> bool {
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .all(|(a, b)| a & !b == 0)
    }

    /// Whether every byte is `0xFF`.
    #[must_use]
    pub fn is_saturated(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0xFF)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(")?;
        for b in self.bytes.iter() {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

/// The set a key covers: a bitmap or every bit.
///
/// Penalty, union and picksplit work on covers so that array keys and
/// saturated keys are handled in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cover {
    /// Every bit set; no bitmap is materialised.
    AllTrue,
    /// An explicit bitmap.
    Bits(Signature),
}

impl Cover {
    /// Returns true for the all-ones cover.
    #[must_use]
    pub fn is_all_true(&self) -> bool {
        matches!(self, Self::AllTrue)
    }

    /// Hamming distance, with all-ones treated as every bit set.
    #[must_use]
    pub fn hemdist(&self, other: &Cover) -> u32 {
        match (self, other) {
            (Self::AllTrue, Self::AllTrue) => 0,
            (Self::AllTrue, Self::Bits(s)) | (Self::Bits(s), Self::AllTrue) => {
                s.unset_count()
            }
            (Self::Bits(a), Self::Bits(b)) => a.hamming(b),
        }
    }

    /// Absorbs `other`. An all-ones input makes the result all-ones.
    pub fn union_with(&mut self, other: &Cover) {
        match other {
            Self::AllTrue => *self = Self::AllTrue,
            Self::Bits(src) => {
                if let Self::Bits(dst) = self {
                    dst.union_with(src);
                }
            }
        }
    }

    /// Replaces a saturated bitmap by the all-ones cover.
    #[must_use]
    pub fn promote(self) -> Self {
        match self {
            Self::Bits(sign) if sign.is_saturated() => Self::AllTrue,
            other => other,
        }
    }

    /// Whether every bit of `self` is also covered by `other`.
    #[must_use]
    pub fn is_covered_by(&self, other: &Cover) -> bool {
        match (self, other) {
            (_, Self::AllTrue) => true,
            (Self::AllTrue, Self::Bits(s)) => s.is_saturated(),
            (Self::Bits(a), Self::Bits(b)) => a.is_subset_of(b),
        }
    }
}
