//! GiST signature opclass for hstore.

use super::split::guttman_split;
use super::{key_cover, key_mismatch, Consistency, Entry, OpClass, Split};
use crate::error::{IndexError, IndexResult};
use crate::key::GistKey;
use crate::options::{IndexOptions, OptionsDescriptor};
use crate::signature::{Cover, Signature};
use crate::strategy::HstoreStrategy;
use crate::value::{ArrayArg, Hstore};
use gistsig_codec::crc32;

const NAME: &str = "hstore";
const SPLIT_BIAS: f64 = 1e-4;

/// Right-hand operand of the hstore operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HstoreOperand {
    /// `@>`: pairs that must be present.
    Contains(Hstore),
    /// `?`: one key.
    Exists(String),
    /// `?|` and `?&`: a key array.
    Keys(ArrayArg<String>),
}

impl HstoreOperand {
    fn kind(&self) -> &'static str {
        match self {
            Self::Contains(_) => "hstore",
            Self::Exists(_) => "text",
            Self::Keys(_) => "text[]",
        }
    }
}

/// Signature opclass for hstore (`gist_hstore_ops`).
#[derive(Debug, Clone)]
pub struct HstoreOps {
    options: IndexOptions,
}

impl HstoreOps {
    fn bits(&self, key: &GistKey) -> IndexResult<Option<Signature>> {
        match key_cover(NAME, key, &self.options)? {
            Cover::AllTrue => Ok(None),
            Cover::Bits(sign) if !key.is_leaf_form() => Ok(Some(sign)),
            Cover::Bits(_) => Err(key_mismatch(NAME, key)),
        }
    }

    fn check(sign: &Signature, text: &str) -> bool {
        sign.has_token(crc32(text.as_bytes()))
    }
}

impl OpClass for HstoreOps {
    type Value = Hstore;
    type Operand = HstoreOperand;

    const NAME: &'static str = NAME;

    fn descriptor() -> OptionsDescriptor {
        OptionsDescriptor::new(NAME, 16)
    }

    fn with_options(options: IndexOptions) -> Self {
        Self { options }
    }

    fn options(&self) -> &IndexOptions {
        &self.options
    }

    fn compress(&self, entry: Entry<'_, Hstore>) -> IndexResult<GistKey> {
        let cover = match entry {
            Entry::Leaf(value) => Cover::Bits(Signature::from_tokens(
                self.options.siglen,
                value.tokens(),
            )),
            Entry::Key(key) => {
                self.bits(key)?;
                key_cover(NAME, key, &self.options)?
            }
        };
        Ok(GistKey::signature_key(cover, None))
    }

    fn union(&self, keys: &[GistKey]) -> IndexResult<GistKey> {
        let mut cover = Cover::Bits(Signature::new(self.options.siglen));
        for key in keys {
            match self.bits(key)? {
                None => return Ok(GistKey::AllTrue { range: None }),
                Some(sign) => cover.union_with(&Cover::Bits(sign)),
            }
        }
        Ok(GistKey::signature_key(cover, None))
    }

    fn same(&self, a: &GistKey, b: &GistKey) -> bool {
        match (a, b) {
            (GistKey::AllTrue { .. }, GistKey::AllTrue { .. }) => true,
            (GistKey::Bitmap { sign: x, .. }, GistKey::Bitmap { sign: y, .. }) => x == y,
            _ => false,
        }
    }

    fn penalty(&self, orig: &GistKey, new: &GistKey) -> IndexResult<f32> {
        self.bits(orig)?;
        self.bits(new)?;
        let distance =
            key_cover(NAME, orig, &self.options)?.hemdist(&key_cover(NAME, new, &self.options)?);
        Ok(distance as f32)
    }

    fn picksplit(&self, keys: &[GistKey]) -> IndexResult<Split> {
        for key in keys {
            self.bits(key)?;
        }
        let covers = keys
            .iter()
            .map(|k| key_cover(NAME, k, &self.options))
            .collect::<IndexResult<Vec<Cover>>>()?;
        let split = guttman_split(&covers, SPLIT_BIAS)?;
        Ok(Split {
            left: split.left,
            right: split.right,
            left_union: GistKey::signature_key(split.left_union, None),
            right_union: GistKey::signature_key(split.right_union, None),
        })
    }

    fn consistent(
        &self,
        key: &GistKey,
        strategy: u16,
        operand: &HstoreOperand,
    ) -> IndexResult<Consistency> {
        let parsed = HstoreStrategy::try_from(strategy)?;
        check_operand(parsed, strategy, operand)?;
        let Some(sign) = self.bits(key)? else {
            return Ok(Consistency::lossy(true));
        };
        let matches = match operand {
            HstoreOperand::Contains(query) => query.iter().all(|(k, v)| {
                Self::check(&sign, k) && v.map_or(true, |v| Self::check(&sign, v))
            }),
            HstoreOperand::Exists(k) => Self::check(&sign, k),
            HstoreOperand::Keys(keys) => match parsed {
                HstoreStrategy::ExistsAll => keys.non_null().all(|k| Self::check(&sign, k)),
                _ => keys.non_null().any(|k| Self::check(&sign, k)),
            },
        };
        Ok(Consistency::lossy(matches))
    }

    fn recheck(&self, value: &Hstore, strategy: u16, operand: &HstoreOperand) -> IndexResult<bool> {
        let parsed = HstoreStrategy::try_from(strategy)?;
        check_operand(parsed, strategy, operand)?;
        Ok(match operand {
            HstoreOperand::Contains(query) => value.contains(query),
            HstoreOperand::Exists(k) => value.exists(k),
            HstoreOperand::Keys(keys) => match parsed {
                HstoreStrategy::ExistsAll => value.exists_all(keys),
                _ => value.exists_any(keys),
            },
        })
    }
}

fn check_operand(
    strategy: HstoreStrategy,
    number: u16,
    operand: &HstoreOperand,
) -> IndexResult<()> {
    let expected = match strategy {
        HstoreStrategy::Contains => "hstore",
        HstoreStrategy::Exists => "text",
        HstoreStrategy::ExistsAny | HstoreStrategy::ExistsAll => "text[]",
    };
    if operand.kind() == expected {
        Ok(())
    } else {
        Err(IndexError::operand_mismatch(NAME, number, expected))
    }
}
