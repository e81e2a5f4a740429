//! GiST signature opclass for tsvector.
//!
//! Small documents are stored as their sorted lexeme hashes; larger ones and
//! all internal keys as signatures.

use super::split::guttman_split;
use super::{check_siglen, key_cover, key_mismatch, Consistency, Entry, OpClass, Split};
use crate::error::IndexResult;
use crate::key::GistKey;
use crate::options::{IndexOptions, OptionsDescriptor};
use crate::query::TsQuery;
use crate::signature::{Cover, Signature};
use crate::strategy::TsvectorStrategy;
use crate::value::TsVector;
use gistsig_codec::GTHDRSIZE;
use tracing::trace;

const NAME: &str = "tsvector";
const SPLIT_BIAS: f64 = 0.1;

/// Largest array-form key, in bytes.
pub const TOAST_INDEX_TARGET: usize = 510;

/// Signature opclass for tsvector (`gist_tsvector_ops`).
#[derive(Debug, Clone)]
pub struct TsvectorOps {
    options: IndexOptions,
}

impl TsvectorOps {
    fn check_key(key: &GistKey) -> IndexResult<()> {
        match key {
            GistKey::Array(_) | GistKey::Bitmap { range: None, .. } | GistKey::AllTrue { range: None } => {
                Ok(())
            }
            _ => Err(key_mismatch(NAME, key)),
        }
    }
}

impl OpClass for TsvectorOps {
    type Value = TsVector;
    type Operand = TsQuery;

    const NAME: &'static str = NAME;

    fn descriptor() -> OptionsDescriptor {
        OptionsDescriptor::new(NAME, 124)
    }

    fn with_options(options: IndexOptions) -> Self {
        Self { options }
    }

    fn options(&self) -> &IndexOptions {
        &self.options
    }

    fn compress(&self, entry: Entry<'_, TsVector>) -> IndexResult<GistKey> {
        match entry {
            Entry::Leaf(doc) => {
                let hashes = doc.hashes();
                if GTHDRSIZE + 4 * hashes.len() <= TOAST_INDEX_TARGET {
                    return Ok(GistKey::Array(hashes));
                }
                trace!(lexemes = hashes.len(), "encoding large document as signature");
                let sign = Signature::from_tokens(
                    self.options.siglen,
                    hashes.iter().map(|&h| h as u32),
                );
                Ok(GistKey::signature_key(Cover::Bits(sign), None))
            }
            Entry::Key(key @ GistKey::Array(_)) => Ok(key.clone()),
            Entry::Key(key) => {
                Self::check_key(key)?;
                Ok(GistKey::signature_key(key_cover(NAME, key, &self.options)?, None))
            }
        }
    }

    fn union(&self, keys: &[GistKey]) -> IndexResult<GistKey> {
        let mut cover = Cover::Bits(Signature::new(self.options.siglen));
        for key in keys {
            Self::check_key(key)?;
            if key.is_all_true() {
                return Ok(GistKey::AllTrue { range: None });
            }
            cover.union_with(&key_cover(NAME, key, &self.options)?);
        }
        Ok(GistKey::signature_key(cover, None))
    }

    fn same(&self, a: &GistKey, b: &GistKey) -> bool {
        match (a, b) {
            (GistKey::AllTrue { .. }, GistKey::AllTrue { .. }) => true,
            (GistKey::Bitmap { sign: x, .. }, GistKey::Bitmap { sign: y, .. }) => x == y,
            (GistKey::Array(x), GistKey::Array(y)) => x == y,
            _ => false,
        }
    }

    fn penalty(&self, orig: &GistKey, new: &GistKey) -> IndexResult<f32> {
        Self::check_key(orig)?;
        Self::check_key(new)?;
        let new_cover = key_cover(NAME, new, &self.options)?;
        if let (GistKey::AllTrue { .. }, GistKey::Array(_), Cover::Bits(sign)) =
            (orig, new, &new_cover)
        {
            let bits = sign.bit_len() as f32;
            return Ok((bits - sign.popcount() as f32) / (bits + 1.0));
        }
        Ok(key_cover(NAME, orig, &self.options)?.hemdist(&new_cover) as f32)
    }

    fn picksplit(&self, keys: &[GistKey]) -> IndexResult<Split> {
        for key in keys {
            Self::check_key(key)?;
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

    fn consistent(&self, key: &GistKey, strategy: u16, query: &TsQuery) -> IndexResult<Consistency> {
        TsvectorStrategy::try_from(strategy)?;
        Self::check_key(key)?;
        check_siglen(NAME, key, &self.options)?;
        if query.is_empty() {
            return Ok(Consistency::lossy(false));
        }
        let matches = match key {
            GistKey::AllTrue { .. } => true,
            GistKey::Array(hashes) => query.check_hashes(hashes)?.is_possible(),
            GistKey::Bitmap { sign, .. } => query.check_signature(sign)?.is_possible(),
            GistKey::OneNode(_) => return Err(key_mismatch(NAME, key)),
        };
        Ok(Consistency::lossy(matches))
    }

    fn recheck(&self, doc: &TsVector, strategy: u16, query: &TsQuery) -> IndexResult<bool> {
        TsvectorStrategy::try_from(strategy)?;
        if query.is_empty() {
            return Ok(false);
        }
        query.matches(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use crate::options::{OptionsBag, SigLen};
    use crate::query::{QueryExpr, TsAtom};

    type E = QueryExpr<TsAtom>;

    fn ops() -> TsvectorOps {
        TsvectorOps::from_bag(&OptionsBag::new()).unwrap()
    }

    fn word(w: &str) -> E {
        E::atom(TsAtom::new(w))
    }

    fn many_words(n: usize) -> TsVector {
        TsVector::from_words((0..n).map(|i| format!("w{i}")))
    }

    #[test]
    fn array_form_threshold() {
        let ops = ops();
        assert_eq!(ops.options().siglen.bytes(), 124);
        // 8 + 4 * 125 = 508 fits, 8 + 4 * 126 = 512 does not.
        let small = ops.compress(Entry::Leaf(&many_words(125))).unwrap();
        assert!(matches!(small, GistKey::Array(ref h) if h.len() == 125));
        let large = ops.compress(Entry::Leaf(&many_words(126))).unwrap();
        assert_eq!(large.kind_name(), "bitmap");
    }

    #[test]
    fn not_is_lossy_on_keys_and_exact_on_recheck() {
        let ops = ops();
        let doc = TsVector::from_words(["cat"]);
        let key = ops.compress(Entry::Leaf(&doc)).unwrap();
        let query: TsQuery = E::not(word("dog")).into();
        assert_eq!(ops.consistent(&key, 1, &query).unwrap(), Consistency::lossy(true));
        assert!(ops.recheck(&doc, 1, &query).unwrap());

        let parent = ops.union(&[key]).unwrap();
        assert!(ops.consistent(&parent, 1, &query).unwrap().matches);
    }

    #[test]
    fn empty_query_matches_nothing() {
        let ops = ops();
        let key = GistKey::AllTrue { range: None };
        assert!(!ops.consistent(&key, 1, &TsQuery::empty()).unwrap().matches);
        assert!(!ops.recheck(&TsVector::default(), 1, &TsQuery::empty()).unwrap());
    }

    #[test]
    fn array_and_bitmap_agree_on_absent_words() {
        let ops = ops();
        let doc = TsVector::from_words(["cat", "mouse"]);
        let array = ops.compress(Entry::Leaf(&doc)).unwrap();
        let bitmap = ops.union(&[array.clone()]).unwrap();
        let present: TsQuery = E::and(word("cat"), word("mouse")).into();
        assert!(ops.consistent(&array, 1, &present).unwrap().matches);
        assert!(ops.consistent(&bitmap, 1, &present).unwrap().matches);
        let absent: TsQuery = word("elephant").into();
        assert!(!ops.consistent(&array, 1, &absent).unwrap().matches);
        let prefix: TsQuery = E::atom(TsAtom::new("ele").prefix()).into();
        assert!(ops.consistent(&array, 1, &prefix).unwrap().matches);
    }

    #[test]
    fn penalty_against_all_true_is_normalised() {
        let ops = TsvectorOps::with_options(IndexOptions::new(SigLen::new(1).unwrap()));
        let doc = TsVector::from_words(["cat"]);
        let leaf = ops.compress(Entry::Leaf(&doc)).unwrap();
        let all = GistKey::AllTrue { range: None };
        assert_eq!(ops.penalty(&all, &leaf).unwrap(), 7.0 / 9.0);
        assert_eq!(ops.penalty(&leaf, &leaf).unwrap(), 0.0);
        let empty = ops.union(&[]).unwrap();
        assert_eq!(ops.penalty(&empty, &leaf).unwrap(), 1.0);
    }

    #[test]
    fn same_by_form() {
        let ops = ops();
        let a = GistKey::Array(vec![1, 2]);
        assert!(ops.same(&a, &GistKey::Array(vec![1, 2])));
        assert!(!ops.same(&a, &GistKey::Array(vec![1])));
        assert!(!ops.same(&a, &ops.union(&[a.clone()]).unwrap()));
    }

    #[test]
    fn key_display() {
        let ops = ops();
        let key = ops
            .compress(Entry::Leaf(&TsVector::from_words(["a", "b", "c"])))
            .unwrap();
        assert_eq!(key.to_string(), "3 unique words");
    }

    #[test]
    fn rejects_ltree_keys() {
        let ops = ops();
        let key = GistKey::OneNode("a".parse().unwrap());
        assert!(ops.consistent(&key, 1, &word("a").into()).is_err());
    }

    #[test]
    fn picksplit_bias_spreads_a_lone_bit_page() {
        let ops = ops();
        let mut sign = Signature::new(ops.options().siglen);
        sign.set(5);
        let mut keys = vec![GistKey::Bitmap { sign, range: None }];
        keys.extend((0..9).map(|_| ops.union(&[]).unwrap()));
        let split = ops.picksplit(&keys).unwrap();
        assert_eq!(split.left[0], 0);
        assert!(split.left.len().min(split.right.len()) >= 3);
    }

    #[test]
    fn rejects_bitmaps_of_another_length() {
        let ops = TsvectorOps::with_options(IndexOptions::new(SigLen::new(4).unwrap()));
        let empty = GistKey::Bitmap {
            sign: Signature::from_bytes(Vec::new()),
            range: None,
        };
        assert!(matches!(
            ops.consistent(&empty, 1, &word("a").into()),
            Err(IndexError::KeyMismatch { .. })
        ));
        assert!(ops.union(&[empty.clone()]).is_err());
        assert!(ops.compress(Entry::Key(&empty)).is_err());
    }
}
