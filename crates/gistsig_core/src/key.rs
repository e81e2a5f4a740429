//! Index keys.
//!
//! A key is one of four shapes, told apart on disk by the flag word:
//!
//! | Variant | Flags | Payload |
//! |---|---|---|
//! | [`GistKey::Array`] | `ARRKEY` | sorted `i32` lexeme hashes |
//! | [`GistKey::Bitmap`] | `SIGNKEY` | `siglen` bytes, then optional path bounds |
//! | [`GistKey::AllTrue`] | `SIGNKEY \| ALLISTRUE` | optional path bounds |
//! | [`GistKey::OneNode`] | `ONENODE` | one path |
//!
//! Path bounds are two nested paths, or one when `NORIGHT` is set.

use crate::options::IndexOptions;
use crate::signature::{Cover, Signature};
use crate::value::Ltree;
use gistsig_codec::{flags, CodecError, CodecResult, Decode, Encode, KeyDecoder, KeyEncoder, KeyLayout};
use std::fmt;
use tracing::trace;

/// Smallest and largest leaf path below an ltree internal key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathRange {
    lower: Ltree,
    upper: Ltree,
}

impl PathRange {
    /// A range; `lower` must not sort after `upper`.
    pub fn new(lower: Ltree, upper: Ltree) -> Self {
        Self { lower, upper }
    }

    /// The range holding one path.
    pub fn single(path: Ltree) -> Self {
        Self {
            upper: path.clone(),
            lower: path,
        }
    }

    /// Left bound.
    pub fn lower(&self) -> &Ltree {
        &self.lower
    }

    /// Right bound.
    pub fn upper(&self) -> &Ltree {
        &self.upper
    }

    /// Whether `path` lies within the bounds.
    pub fn contains(&self, path: &Ltree) -> bool {
        path.compare(&self.lower) >= 0 && path.compare(&self.upper) <= 0
    }

    /// Widens the range to include `other`.
    pub fn extend(&mut self, other: &PathRange) {
        if other.lower.compare(&self.lower) < 0 {
            self.lower = other.lower.clone();
        }
        if other.upper.compare(&self.upper) > 0 {
            self.upper = other.upper.clone();
        }
    }

    fn is_single(&self) -> bool {
        self.lower == self.upper
    }
}

/// A GiST key produced by one of the signature opclasses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GistKey {
    /// tsvector leaf: sorted, de-duplicated lexeme hashes.
    Array(Vec<i32>),
    /// Explicit signature, with path bounds for ltree internal keys.
    Bitmap {
        /// The signature.
        sign: Signature,
        /// Path bounds (ltree only).
        range: Option<PathRange>,
    },
    /// Saturated signature, with path bounds for ltree internal keys.
    AllTrue {
        /// Path bounds (ltree only).
        range: Option<PathRange>,
    },
    /// ltree leaf holding the exact path.
    OneNode(Ltree),
}

impl GistKey {
    /// Builds a signature key, replacing a saturated bitmap by the all-true form.
    pub fn signature_key(cover: Cover, range: Option<PathRange>) -> Self {
        match cover {
            Cover::Bits(sign) if sign.is_saturated() => {
                trace!(siglen = sign.siglen(), "promoting saturated signature");
                Self::AllTrue { range }
            }
            Cover::Bits(sign) => Self::Bitmap { sign, range },
            Cover::AllTrue => Self::AllTrue { range },
        }
    }

    /// The set of bits this key stands for.
    ///
    /// Array and one-node keys are hashed into a fresh signature using the
    /// index options.
    pub fn cover(&self, options: &IndexOptions) -> Cover {
        match self {
            Self::Array(hashes) => Cover::Bits(Signature::from_tokens(
                options.siglen,
                hashes.iter().map(|&h| h as u32),
            )),
            Self::Bitmap { sign, .. } => Cover::Bits(sign.clone()),
            Self::AllTrue { .. } => Cover::AllTrue,
            Self::OneNode(path) => Cover::Bits(Signature::from_tokens(
                options.siglen,
                path.label_hashes(options.label_fold),
            )),
        }
    }

    /// The bitmap, if the key stores one.
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Self::Bitmap { sign, .. } => Some(sign),
            _ => None,
        }
    }

    /// Path bounds of an internal ltree key.
    pub fn range(&self) -> Option<&PathRange> {
        match self {
            Self::Bitmap { range, .. } | Self::AllTrue { range } => range.as_ref(),
            _ => None,
        }
    }

    /// Left bound; a one-node key is its own bound.
    pub fn lower(&self) -> Option<&Ltree> {
        match self {
            Self::OneNode(path) => Some(path),
            _ => self.range().map(PathRange::lower),
        }
    }

    /// Right bound; a one-node key is its own bound.
    pub fn upper(&self) -> Option<&Ltree> {
        match self {
            Self::OneNode(path) => Some(path),
            _ => self.range().map(PathRange::upper),
        }
    }

    /// Returns true for the all-true form.
    pub fn is_all_true(&self) -> bool {
        matches!(self, Self::AllTrue { .. })
    }

    /// Returns true for keys that summarise a single value.
    pub fn is_leaf_form(&self) -> bool {
        matches!(self, Self::Array(_) | Self::OneNode(_))
    }

    /// The flag word written in the key header.
    pub fn flags(&self) -> u32 {
        let noright = |range: &Option<PathRange>| match range {
            Some(r) if r.is_single() => flags::NORIGHT,
            _ => 0,
        };
        match self {
            Self::Array(_) => flags::ARRKEY,
            Self::Bitmap { range, .. } => flags::SIGNKEY | noright(range),
            Self::AllTrue { range } => flags::SIGNKEY | flags::ALLISTRUE | noright(range),
            Self::OneNode(_) => flags::ONENODE,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Array(_) => "array",
            Self::Bitmap { .. } => "bitmap",
            Self::AllTrue { .. } => "all-true",
            Self::OneNode(_) => "one-node",
        }
    }
}

impl Encode for GistKey {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut encoder = KeyEncoder::new(self.flags());
        match self {
            Self::Array(hashes) => {
                for &hash in hashes {
                    encoder.put_i32(hash);
                }
            }
            Self::Bitmap { sign, range } => {
                encoder.put_bytes(sign.as_bytes());
                write_range(&mut encoder, range.as_ref())?;
            }
            Self::AllTrue { range } => write_range(&mut encoder, range.as_ref())?,
            Self::OneNode(path) => path.write_to(&mut encoder)?,
        }
        encoder.finish()
    }
}

impl Decode for GistKey {
    fn decode(bytes: &[u8], layout: &KeyLayout) -> CodecResult<Self> {
        if layout.siglen == 0 {
            return Err(CodecError::invalid_structure("signature length must be positive"));
        }
        let mut decoder = KeyDecoder::open(bytes)?;
        let flag_word = decoder.read_u32()?;
        if flag_word & !flags::KNOWN != 0 {
            return Err(CodecError::InvalidFlags { flags: flag_word });
        }
        let noright = flag_word & flags::NORIGHT != 0;
        let key = match flag_word & !flags::NORIGHT {
            flags::ARRKEY if !noright => {
                let payload = decoder.remaining();
                if payload.len() % 4 != 0 {
                    return Err(CodecError::invalid_structure(format!(
                        "array payload of {} bytes is not a multiple of 4",
                        payload.len()
                    )));
                }
                let mut hashes = Vec::with_capacity(payload.len() / 4);
                while !decoder.is_empty() {
                    hashes.push(decoder.read_i32()?);
                }
                if hashes.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(CodecError::invalid_structure(
                        "array hashes are not strictly increasing",
                    ));
                }
                Self::Array(hashes)
            }
            flags::SIGNKEY => {
                let sign = Signature::from_bytes(decoder.read_bytes(layout.siglen)?.to_vec());
                let range = read_range(&mut decoder, noright, flag_word)?;
                Self::Bitmap { sign, range }
            }
            f if f == flags::SIGNKEY | flags::ALLISTRUE => {
                let range = read_range(&mut decoder, noright, flag_word)?;
                Self::AllTrue { range }
            }
            flags::ONENODE if !noright => Self::OneNode(Ltree::read_from(&mut decoder)?),
            _ => return Err(CodecError::InvalidFlags { flags: flag_word }),
        };
        decoder.expect_end()?;
        Ok(key)
    }
}

fn write_range(encoder: &mut KeyEncoder, range: Option<&PathRange>) -> CodecResult<()> {
    if let Some(range) = range {
        range.lower.write_to(encoder)?;
        if !range.is_single() {
            range.upper.write_to(encoder)?;
        }
    }
    Ok(())
}

fn read_range(
    decoder: &mut KeyDecoder<'_>,
    noright: bool,
    flag_word: u32,
) -> CodecResult<Option<PathRange>> {
    if decoder.is_empty() {
        if noright {
            return Err(CodecError::InvalidFlags { flags: flag_word });
        }
        return Ok(None);
    }
    let lower = Ltree::read_from(decoder)?;
    let upper = if noright {
        lower.clone()
    } else {
        Ltree::read_from(decoder)?
    };
    Ok(Some(PathRange::new(lower, upper)))
}

impl fmt::Display for GistKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array(hashes) => write!(f, "{} unique words", hashes.len()),
            Self::Bitmap { sign, .. } => write!(
                f,
                "{} true bits, {} false bits",
                sign.popcount(),
                sign.unset_count()
            ),
            Self::AllTrue { .. } => f.write_str("all true bits"),
            Self::OneNode(path) => write!(f, "{path}"),
        }
    }
}
