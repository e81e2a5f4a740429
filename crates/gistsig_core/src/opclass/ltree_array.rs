//! GiST signature opclass for ltree[].

use super::ltree::{check_operand, path_matches};
use super::split::guttman_split;
use super::{
    check_siglen, key_cover, key_mismatch, Consistency, Entry, LtreeOperand, OpClass, Split,
};
use crate::error::{IndexError, IndexResult};
use crate::key::GistKey;
use crate::options::{IndexOptions, OptionsDescriptor};
use crate::query::Lquery;
use crate::signature::{Cover, Signature};
use crate::strategy::LtreeStrategy;
use crate::value::{ArrayArg, Ltree};

const NAME: &str = "ltree[]";
const SPLIT_BIAS: f64 = 1e-5;

/// Signature opclass for arrays of paths (`gist__ltree_ops`).
///
/// Every label of every path is hashed into one signature; the operators
/// hold when any element of the array satisfies them.
#[derive(Debug, Clone)]
pub struct LtreeArrayOps {
    options: IndexOptions,
}

impl LtreeArrayOps {
    fn parse(strategy: u16) -> IndexResult<LtreeStrategy> {
        let parsed = LtreeStrategy::parse(NAME, strategy)?;
        if parsed.is_ordering() {
            return Err(IndexError::unsupported_strategy(NAME, strategy));
        }
        Ok(parsed)
    }

    fn bits(&self, key: &GistKey) -> IndexResult<Option<Signature>> {
        check_siglen(NAME, key, &self.options)?;
        match key {
            GistKey::AllTrue { range: None } => Ok(None),
            GistKey::Bitmap { sign, range: None } => Ok(Some(sign.clone())),
            _ => Err(key_mismatch(NAME, key)),
        }
    }

    fn lquery_passes(&self, sign: &Signature, query: &Lquery) -> bool {
        query.signature_may_match(sign, self.options.label_fold)
    }
}

impl OpClass for LtreeArrayOps {
    type Value = ArrayArg<Ltree>;
    type Operand = LtreeOperand;

    const NAME: &'static str = NAME;

    fn descriptor() -> OptionsDescriptor {
        OptionsDescriptor::new(NAME, 28).align(4).with_fold()
    }

    fn with_options(options: IndexOptions) -> Self {
        Self { options }
    }

    fn options(&self) -> &IndexOptions {
        &self.options
    }

    fn compress(&self, entry: Entry<'_, ArrayArg<Ltree>>) -> IndexResult<GistKey> {
        let cover = match entry {
            Entry::Leaf(paths) => {
                let fold = self.options.label_fold;
                let tokens = paths
                    .plain()?
                    .into_iter()
                    .flat_map(move |path| path.label_hashes(fold));
                Cover::Bits(Signature::from_tokens(self.options.siglen, tokens))
            }
            Entry::Key(key) => match self.bits(key)? {
                Some(sign) => Cover::Bits(sign),
                None => Cover::AllTrue,
            },
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
        let mut covers = Vec::with_capacity(keys.len());
        for key in keys {
            covers.push(match self.bits(key)? {
                Some(sign) => Cover::Bits(sign),
                None => Cover::AllTrue,
            });
        }
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
        operand: &LtreeOperand,
    ) -> IndexResult<Consistency> {
        let parsed = Self::parse(strategy)?;
        check_operand(NAME, parsed, operand)?;
        let lqueries = match operand {
            LtreeOperand::Lqueries(array) => Some(array.plain()?),
            _ => None,
        };
        let Some(sign) = self.bits(key)? else {
            return Ok(Consistency::lossy(true));
        };
        let fold = self.options.label_fold;
        let matches = match operand {
            LtreeOperand::Path(q) => q.label_hashes(fold).all(|h| sign.has_token(h)),
            LtreeOperand::Lquery(q) => self.lquery_passes(&sign, q),
            LtreeOperand::Ltxtquery(q) => q.check_signature(&sign, fold)?.is_possible(),
            LtreeOperand::Lqueries(_) => lqueries
                .unwrap_or_default()
                .into_iter()
                .any(|q| self.lquery_passes(&sign, q)),
        };
        Ok(Consistency::lossy(matches))
    }

    fn recheck(
        &self,
        value: &ArrayArg<Ltree>,
        strategy: u16,
        operand: &LtreeOperand,
    ) -> IndexResult<bool> {
        let parsed = Self::parse(strategy)?;
        check_operand(NAME, parsed, operand)?;
        for path in value.plain()? {
            let hit = match operand {
                // Any element below the query path.
                LtreeOperand::Path(q) => q.is_ancestor_of(path),
                _ => path_matches(path, parsed, operand)?,
            };
            if hit {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
