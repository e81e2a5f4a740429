//! Operator classes: the callbacks a GiST host invokes on index keys.
//!
//! Each opclass is a small value holding the resolved [`IndexOptions`] of one
//! index. The host calls [`OpClass::compress`] when a value is placed on a
//! leaf page, [`OpClass::union`] and [`OpClass::picksplit`] when pages change,
//! [`OpClass::penalty`] to choose an insertion path and
//! [`OpClass::consistent`] while searching. Candidates returned with the
//! recheck flag set must be verified with [`OpClass::recheck`].

mod hstore;
mod ltree;
mod ltree_array;
mod split;
mod tsvector;

pub use hstore::{HstoreOperand, HstoreOps};
pub use ltree::{LtreeOperand, LtreeOps};
pub use ltree_array::LtreeArrayOps;
pub use tsvector::{TsvectorOps, TOAST_INDEX_TARGET};

use crate::error::{IndexError, IndexResult};
use crate::key::GistKey;
use crate::options::{IndexOptions, OptionsBag, OptionsDescriptor};
use crate::signature::Cover;
use gistsig_codec::{Decode, Encode};

/// What `compress` is handed.
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a, V> {
    /// A user value arriving on a leaf page.
    Leaf(&'a V),
    /// A key that is already in index form.
    Key(&'a GistKey),
}

/// Outcome of `consistent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consistency {
    /// Whether the subtree may hold a match.
    pub matches: bool,
    /// Whether a match must be verified against the value.
    pub recheck: bool,
}

impl Consistency {
    /// A lossy answer.
    pub const fn lossy(matches: bool) -> Self {
        Self {
            matches,
            recheck: true,
        }
    }

    /// An answer that needs no verification.
    pub const fn exact(matches: bool) -> Self {
        Self {
            matches,
            recheck: false,
        }
    }
}

/// Outcome of `picksplit`: positions of the input keys on each side and the
/// key summarising each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Positions placed on the left page.
    pub left: Vec<usize>,
    /// Positions placed on the right page.
    pub right: Vec<usize>,
    /// Union of the left side.
    pub left_union: GistKey,
    /// Union of the right side.
    pub right_union: GistKey,
}

/// The callback table of a signature opclass.
pub trait OpClass {
    /// The indexed user value.
    type Value;
    /// The right-hand operand of the supported operators.
    type Operand;

    /// Opclass name used in errors and logs.
    const NAME: &'static str;

    /// Options accepted by the opclass, with their defaults.
    fn descriptor() -> OptionsDescriptor;

    /// Creates the callbacks for an index with resolved options.
    fn with_options(options: IndexOptions) -> Self
    where
        Self: Sized;

    /// Resolves the host's options bag and creates the callbacks.
    fn from_bag(bag: &OptionsBag) -> IndexResult<Self>
    where
        Self: Sized,
    {
        Ok(Self::with_options(Self::descriptor().resolve(bag)?))
    }

    /// The options of this index.
    fn options(&self) -> &IndexOptions;

    /// Turns a leaf value into a key, or normalises an existing key.
    fn compress(&self, entry: Entry<'_, Self::Value>) -> IndexResult<GistKey>;

    /// Inverse of `compress` for the host; keys are used as they are.
    fn decompress(&self, key: GistKey) -> GistKey {
        key
    }

    /// A key covering every key in `keys`.
    fn union(&self, keys: &[GistKey]) -> IndexResult<GistKey>;

    /// Whether two keys are interchangeable.
    fn same(&self, a: &GistKey, b: &GistKey) -> bool;

    /// Cost of adding `new` below `orig`; smaller is better.
    fn penalty(&self, orig: &GistKey, new: &GistKey) -> IndexResult<f32>;

    /// Partitions an overflowing page.
    fn picksplit(&self, keys: &[GistKey]) -> IndexResult<Split>;

    /// Whether the subtree under `key` may hold values matching
    /// `operand` under `strategy`.
    fn consistent(
        &self,
        key: &GistKey,
        strategy: u16,
        operand: &Self::Operand,
    ) -> IndexResult<Consistency>;

    /// The exact operator, applied to a candidate value.
    fn recheck(&self, value: &Self::Value, strategy: u16, operand: &Self::Operand)
        -> IndexResult<bool>;

    /// Serialises a key in on-disk form.
    fn encode_key(&self, key: &GistKey) -> IndexResult<Vec<u8>> {
        Ok(key.encode()?)
    }

    /// Reads a key in on-disk form written by an index with these options.
    fn decode_key(&self, bytes: &[u8]) -> IndexResult<GistKey> {
        Ok(GistKey::decode(bytes, &self.options().layout())?)
    }
}

fn key_mismatch(opclass: &'static str, key: &GistKey) -> IndexError {
    IndexError::key_mismatch(opclass, key.kind_name())
}

/// Rejects a bitmap whose length differs from the index signature length.
fn check_siglen(
    opclass: &'static str,
    key: &GistKey,
    options: &IndexOptions,
) -> IndexResult<()> {
    match key.signature() {
        Some(sign) if sign.siglen() != options.siglen.bytes() => {
            Err(IndexError::key_mismatch(opclass, "wrongly sized bitmap"))
        }
        _ => Ok(()),
    }
}

/// The cover of a key checked against the index signature length.
fn key_cover(
    opclass: &'static str,
    key: &GistKey,
    options: &IndexOptions,
) -> IndexResult<Cover> {
    check_siglen(opclass, key, options)?;
    Ok(key.cover(options))
}
