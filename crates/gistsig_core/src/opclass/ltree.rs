//! GiST opclass for ltree.
//!
//! Leaves keep the exact path. Internal keys keep a signature of every label
//! below them together with the smallest and largest path, so ordering
//! operators are answered from the bounds and pattern operators from both.

use super::{check_siglen, key_cover, key_mismatch, Consistency, Entry, OpClass, Split};
use crate::error::{IndexError, IndexResult};
use crate::key::{GistKey, PathRange};
use crate::options::{IndexOptions, OptionsDescriptor};
use crate::query::{Lquery, Ltxtquery};
use crate::signature::{Cover, Signature};
use crate::strategy::LtreeStrategy;
use crate::value::{ArrayArg, Ltree};
use tracing::debug;

const NAME: &str = "ltree";

/// Right-hand operand of the ltree operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LtreeOperand {
    /// A path: ordering and ancestry operators.
    Path(Ltree),
    /// `~`
    Lquery(Lquery),
    /// `@`
    Ltxtquery(Ltxtquery),
    /// `?`: an array of lqueries.
    Lqueries(ArrayArg<Lquery>),
}

impl LtreeOperand {
    fn kind(&self) -> &'static str {
        match self {
            Self::Path(_) => "ltree",
            Self::Lquery(_) => "lquery",
            Self::Ltxtquery(_) => "ltxtquery",
            Self::Lqueries(_) => "lquery[]",
        }
    }
}

/// Rejects an operand whose type does not fit `strategy`.
pub(super) fn check_operand(
    opclass: &'static str,
    strategy: LtreeStrategy,
    operand: &LtreeOperand,
) -> IndexResult<()> {
    use LtreeStrategy as S;
    let expected = match strategy {
        S::Lquery | S::LqueryReversed => "lquery",
        S::Ltxtquery | S::LtxtqueryReversed => "ltxtquery",
        S::LqueryArray | S::LqueryArrayReversed => "lquery[]",
        _ => "ltree",
    };
    if operand.kind() == expected {
        Ok(())
    } else {
        Err(IndexError::operand_mismatch(
            opclass,
            strategy.number(),
            expected,
        ))
    }
}

/// The exact operator applied to one path.
pub(super) fn path_matches(
    path: &Ltree,
    strategy: LtreeStrategy,
    operand: &LtreeOperand,
) -> IndexResult<bool> {
    use LtreeStrategy as S;
    Ok(match (strategy, operand) {
        (S::Less, LtreeOperand::Path(q)) => q.compare(path) > 0,
        (S::LessEqual, LtreeOperand::Path(q)) => q.compare(path) >= 0,
        (S::Equal, LtreeOperand::Path(q)) => q.compare(path) == 0,
        (S::GreaterEqual, LtreeOperand::Path(q)) => q.compare(path) <= 0,
        (S::Greater, LtreeOperand::Path(q)) => q.compare(path) < 0,
        (S::IsParent, LtreeOperand::Path(q)) => path.is_ancestor_of(q),
        (S::IsDescendant, LtreeOperand::Path(q)) => q.is_ancestor_of(path),
        (_, LtreeOperand::Lquery(q)) => q.matches(path),
        (_, LtreeOperand::Ltxtquery(q)) => q.matches(path)?,
        (_, LtreeOperand::Lqueries(qs)) => qs.plain()?.into_iter().any(|q| q.matches(path)),
        (_, LtreeOperand::Path(_)) => {
            return Err(IndexError::unsupported_strategy(NAME, strategy.number()))
        }
    })
}

/// Signature opclass for ltree (`gist_ltree_ops`).
#[derive(Debug, Clone)]
pub struct LtreeOps {
    options: IndexOptions,
}

impl LtreeOps {
    fn union_of<'a>(&self, keys: impl IntoIterator<Item = &'a GistKey>) -> IndexResult<GistKey> {
        let mut cover = Cover::Bits(Signature::new(self.options.siglen));
        let mut range: Option<PathRange> = None;
        for key in keys {
            let key_range = match key {
                GistKey::OneNode(path) => PathRange::single(path.clone()),
                GistKey::Bitmap {
                    range: Some(r), ..
                }
                | GistKey::AllTrue { range: Some(r) } => r.clone(),
                _ => return Err(key_mismatch(NAME, key)),
            };
            if !cover.is_all_true() {
                cover.union_with(&key_cover(NAME, key, &self.options)?);
            }
            match range.as_mut() {
                Some(acc) => acc.extend(&key_range),
                None => range = Some(key_range),
            }
        }
        let range = range.ok_or(IndexError::TooFewEntries { count: 0 })?;
        Ok(GistKey::signature_key(cover, Some(range)))
    }

    fn internal_matches(
        &self,
        key: &GistKey,
        range: &PathRange,
        strategy: LtreeStrategy,
        operand: &LtreeOperand,
    ) -> IndexResult<bool> {
        use LtreeStrategy as S;
        let fold = self.options.label_fold;
        let sign = key.signature();
        let lower = range.lower();
        let upper = range.upper();
        let lquery_passes = |q: &Lquery| {
            sign.map_or(true, |s| q.signature_may_match(s, fold)) && q.range_may_match(lower, upper)
        };
        Ok(match (strategy, operand) {
            (S::Less | S::LessEqual, LtreeOperand::Path(q)) => q.compare(lower) >= 0,
            (S::Equal, LtreeOperand::Path(q)) => range.contains(q),
            (S::GreaterEqual | S::Greater, LtreeOperand::Path(q)) => q.compare(upper) <= 0,
            (S::IsParent, LtreeOperand::Path(q)) => {
                (0..=q.len()).rev().any(|i| range.contains(&q.prefix(i)))
            }
            (S::IsDescendant, LtreeOperand::Path(q)) => {
                q.compare(&lower.prefix(q.len())) >= 0 && q.compare(&upper.prefix(q.len())) <= 0
            }
            (_, LtreeOperand::Lquery(q)) => lquery_passes(q),
            (_, LtreeOperand::Ltxtquery(q)) => match sign {
                Some(s) => q.check_signature(s, fold)?.is_possible(),
                None => true,
            },
            (_, LtreeOperand::Lqueries(qs)) => qs.plain()?.into_iter().any(lquery_passes),
            (_, LtreeOperand::Path(_)) => {
                return Err(IndexError::unsupported_strategy(NAME, strategy.number()))
            }
        })
    }
}

impl OpClass for LtreeOps {
    type Value = Ltree;
    type Operand = LtreeOperand;

    const NAME: &'static str = NAME;

    fn descriptor() -> OptionsDescriptor {
        OptionsDescriptor::new(NAME, 8).align(4).with_fold()
    }

    fn with_options(options: IndexOptions) -> Self {
        Self { options }
    }

    fn options(&self) -> &IndexOptions {
        &self.options
    }

    fn compress(&self, entry: Entry<'_, Ltree>) -> IndexResult<GistKey> {
        match entry {
            Entry::Leaf(path) => Ok(GistKey::OneNode(path.clone())),
            Entry::Key(key @ GistKey::OneNode(_)) => Ok(key.clone()),
            Entry::Key(key) => {
                let range = key.range().ok_or_else(|| key_mismatch(NAME, key))?;
                Ok(GistKey::signature_key(
                    key_cover(NAME, key, &self.options)?,
                    Some(range.clone()),
                ))
            }
        }
    }

    fn union(&self, keys: &[GistKey]) -> IndexResult<GistKey> {
        self.union_of(keys)
    }

    fn same(&self, a: &GistKey, b: &GistKey) -> bool {
        match (a, b) {
            (GistKey::OneNode(x), GistKey::OneNode(y)) => x.compare(y) == 0,
            (GistKey::AllTrue { range: x }, GistKey::AllTrue { range: y }) => x == y,
            (
                GistKey::Bitmap {
                    sign: sx,
                    range: rx,
                },
                GistKey::Bitmap {
                    sign: sy,
                    range: ry,
                },
            ) => rx == ry && sx == sy,
            _ => false,
        }
    }

    fn penalty(&self, orig: &GistKey, new: &GistKey) -> IndexResult<f32> {
        fn bounds(key: &GistKey) -> IndexResult<(&Ltree, &Ltree)> {
            key.lower()
                .zip(key.upper())
                .ok_or_else(|| key_mismatch(NAME, key))
        }
        let (orig_lower, orig_upper) = bounds(orig)?;
        let (new_lower, new_upper) = bounds(new)?;
        let left = orig_lower.compare(new_lower).max(0);
        let right = new_upper.compare(orig_upper).max(0);
        Ok(left.saturating_add(right) as f32)
    }

    fn picksplit(&self, keys: &[GistKey]) -> IndexResult<Split> {
        if keys.len() < 2 {
            return Err(IndexError::TooFewEntries { count: keys.len() });
        }
        let mut lowers = Vec::with_capacity(keys.len());
        for key in keys {
            lowers.push(key.lower().ok_or_else(|| key_mismatch(NAME, key))?);
        }
        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by(|&a, &b| lowers[a].cmp(lowers[b]));

        let (left, right) = order.split_at(keys.len() / 2);
        let left_union = self.union_of(left.iter().map(|&i| &keys[i]))?;
        let right_union = self.union_of(right.iter().map(|&i| &keys[i]))?;
        debug!(left = left.len(), right = right.len(), "ltree picksplit");
        Ok(Split {
            left: left.to_vec(),
            right: right.to_vec(),
            left_union,
            right_union,
        })
    }

    fn consistent(
        &self,
        key: &GistKey,
        strategy: u16,
        operand: &LtreeOperand,
    ) -> IndexResult<Consistency> {
        let parsed = LtreeStrategy::parse(NAME, strategy)?;
        check_operand(NAME, parsed, operand)?;
        check_siglen(NAME, key, &self.options)?;
        let matches = match key {
            GistKey::OneNode(path) => path_matches(path, parsed, operand)?,
            GistKey::Bitmap {
                range: Some(range), ..
            }
            | GistKey::AllTrue { range: Some(range) } => {
                self.internal_matches(key, range, parsed, operand)?
            }
            _ => return Err(key_mismatch(NAME, key)),
        };
        Ok(Consistency {
            matches,
            recheck: !parsed.is_exact(),
        })
    }

    fn recheck(&self, value: &Ltree, strategy: u16, operand: &LtreeOperand) -> IndexResult<bool> {
        let parsed = LtreeStrategy::parse(NAME, strategy)?;
        check_operand(NAME, parsed, operand)?;
        path_matches(value, parsed, operand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{LabelFold, OptionsBag, SigLen};
    use crate::query::{LabelPattern, LqueryLevel, QueryExpr};

    fn p(s: &str) -> Ltree {
        s.parse().unwrap()
    }

    fn ops() -> LtreeOps {
        LtreeOps::from_bag(&OptionsBag::new()).unwrap()
    }

    fn leaves(ops: &LtreeOps, paths: &[&str]) -> Vec<GistKey> {
        paths
            .iter()
            .map(|s| ops.compress(Entry::Leaf(&p(s))).unwrap())
            .collect()
    }

    fn path(s: &str) -> LtreeOperand {
        LtreeOperand::Path(p(s))
    }

    #[test]
    fn descriptor_defaults() {
        let ops = ops();
        assert_eq!(ops.options().siglen.bytes(), 8);
        assert_eq!(ops.options().label_fold, LabelFold::Unicode);
        assert!(LtreeOps::from_bag(&"siglen=6".parse().unwrap()).is_err());
        let ascii = LtreeOps::from_bag(&"fold=ascii".parse().unwrap()).unwrap();
        assert_eq!(ascii.options().label_fold, LabelFold::Ascii);
    }

    #[test]
    fn union_tracks_bounds() {
        let ops = ops();
        let keys = leaves(&ops, &["d.e", "a.b", "a.c"]);
        let parent = ops.union(&keys).unwrap();
        assert_eq!(parent.lower(), Some(&p("a.b")));
        assert_eq!(parent.upper(), Some(&p("d.e")));
        let sign = parent.signature().unwrap();
        for label in ["a", "b", "c", "d", "e"] {
            assert!(sign.has_token(LabelFold::Unicode.label_hash(label)));
        }
        let single = ops.union(&leaves(&ops, &["x"])).unwrap();
        assert_eq!(single.range(), Some(&PathRange::single(p("x"))));
        assert!(ops.union(&[]).is_err());
    }

    #[test]
    fn containment_on_internal_node() {
        let ops = ops();
        let parent = ops.union(&leaves(&ops, &["a.b", "a.c", "d.e"])).unwrap();
        // a.b <@ key
        let result = ops.consistent(&parent, 11, &path("a.b")).unwrap();
        assert_eq!(result, Consistency::lossy(true));
        assert!(!ops.consistent(&parent, 11, &path("z")).unwrap().matches);
        // key @> a.b.c
        assert!(ops.consistent(&parent, 10, &path("a.b.c")).unwrap().matches);
        assert!(!ops.consistent(&parent, 10, &path("e.f")).unwrap().matches);
    }

    #[test]
    fn ordering_uses_bounds_and_is_exact() {
        let ops = ops();
        let parent = ops.union(&leaves(&ops, &["b", "c"])).unwrap();
        let less = ops.consistent(&parent, 1, &path("a")).unwrap();
        assert_eq!(less, Consistency::exact(false));
        assert!(ops.consistent(&parent, 1, &path("b.a")).unwrap().matches);
        assert!(ops.consistent(&parent, 5, &path("a")).unwrap().matches);
        assert!(!ops.consistent(&parent, 5, &path("d")).unwrap().matches);
        let eq = ops.consistent(&parent, 3, &path("bb")).unwrap();
        assert_eq!(eq, Consistency::lossy(true));

        let leaf = GistKey::OneNode(p("b"));
        assert!(ops.consistent(&leaf, 4, &path("b")).unwrap().matches);
        assert!(!ops.consistent(&leaf, 5, &path("b")).unwrap().matches);
        assert!(ops.consistent(&leaf, 2, &path("b")).unwrap().matches);
    }

    #[test]
    fn lquery_on_internal_node() {
        let ops = ops();
        let parent = ops.union(&leaves(&ops, &["alpha.beta"])).unwrap();
        let prefix = Lquery::new(vec![
            LqueryLevel::label("alpha"),
            LqueryLevel::pattern(LabelPattern::new("be").any_end()),
        ])
        .unwrap();
        let operand = LtreeOperand::Lquery(prefix);
        assert!(ops.consistent(&parent, 12, &operand).unwrap().matches);
        assert!(ops.recheck(&p("alpha.beta"), 12, &operand).unwrap());

        let other = Lquery::new(vec![LqueryLevel::label("gamma"), LqueryLevel::star()]).unwrap();
        assert!(!ops
            .consistent(&parent, 13, &LtreeOperand::Lquery(other))
            .unwrap()
            .matches);
    }

    #[test]
    fn ltxtquery_and_lquery_array() {
        let ops = ops();
        let parent = ops.union(&leaves(&ops, &["top.science"])).unwrap();
        let query: Ltxtquery = QueryExpr::atom(LabelPattern::new("science")).into();
        assert!(ops
            .consistent(&parent, 14, &LtreeOperand::Ltxtquery(query))
            .unwrap()
            .matches);

        let array = ArrayArg::new(vec![
            Some(Lquery::new(vec![LqueryLevel::label("nope")]).unwrap()),
            Some(Lquery::new(vec![LqueryLevel::star(), LqueryLevel::label("science")]).unwrap()),
        ]);
        assert!(ops
            .consistent(&parent, 16, &LtreeOperand::Lqueries(array))
            .unwrap()
            .matches);

        let with_null = LtreeOperand::Lqueries(ArrayArg::new(vec![None]));
        assert_eq!(
            ops.consistent(&parent, 17, &with_null),
            Err(IndexError::ArrayContainsNulls)
        );
    }

    #[test]
    fn all_true_still_checks_bounds() {
        let ops = ops();
        let key = GistKey::AllTrue {
            range: Some(PathRange::new(p("a"), p("b"))),
        };
        let query = Lquery::new(vec![LqueryLevel::label("c"), LqueryLevel::star()]).unwrap();
        assert!(!ops
            .consistent(&key, 12, &LtreeOperand::Lquery(query))
            .unwrap()
            .matches);
    }

    #[test]
    fn penalty_grows_outside_range() {
        let ops = ops();
        let parent = ops.union(&leaves(&ops, &["b", "d"])).unwrap();
        let inside = GistKey::OneNode(p("c"));
        assert_eq!(ops.penalty(&parent, &inside).unwrap(), 0.0);
        let below = GistKey::OneNode(p("a"));
        assert_eq!(ops.penalty(&parent, &below).unwrap(), 20.0);
        assert_eq!(ops.penalty(&parent, &parent).unwrap(), 0.0);
    }

    #[test]
    fn picksplit_halves_sorted_entries() {
        let ops = ops();
        let keys = leaves(&ops, &["d", "a", "c", "b", "e"]);
        let split = ops.picksplit(&keys).unwrap();
        assert_eq!(split.left, vec![1, 3]);
        assert_eq!(split.right, vec![2, 0, 4]);
        assert_eq!(split.left_union.lower(), Some(&p("a")));
        assert_eq!(split.left_union.upper(), Some(&p("b")));
        assert_eq!(split.right_union.lower(), Some(&p("c")));
        assert_eq!(split.right_union.upper(), Some(&p("e")));
    }

    #[test]
    fn same_and_compress() {
        let ops = ops();
        let keys = leaves(&ops, &["a", "b"]);
        let parent = ops.union(&keys).unwrap();
        assert!(ops.same(&parent, &parent.clone()));
        assert!(!ops.same(&parent, &keys[0]));
        assert!(ops.same(&keys[0], &GistKey::OneNode(p("a"))));

        let narrow = LtreeOps::with_options(IndexOptions::new(SigLen::new(4).unwrap()));
        let full = GistKey::Bitmap {
            sign: Signature::full(SigLen::new(4).unwrap()),
            range: Some(PathRange::single(p("a"))),
        };
        let compressed = narrow.compress(Entry::Key(&full)).unwrap();
        assert!(compressed.is_all_true());
        assert_eq!(compressed.range(), full.range());
    }

    #[test]
    fn wrong_operand() {
        let ops = ops();
        let leaf = GistKey::OneNode(p("a"));
        let query = Lquery::new(vec![LqueryLevel::label("a")]).unwrap();
        assert!(matches!(
            ops.consistent(&leaf, 1, &LtreeOperand::Lquery(query)),
            Err(IndexError::OperandMismatch { strategy: 1, .. })
        ));
        assert!(ops.consistent(&leaf, 6, &path("a")).is_err());
    }

    #[test]
    fn rejects_bitmaps_of_another_length() {
        let ops = ops();
        let key = GistKey::Bitmap {
            sign: Signature::from_bytes(Vec::new()),
            range: Some(PathRange::single(p("a"))),
        };
        assert!(matches!(
            ops.consistent(&key, 10, &LtreeOperand::Path(p("a"))),
            Err(IndexError::KeyMismatch { .. })
        ));
        assert!(ops.union(&[key.clone()]).is_err());
        assert!(ops.penalty(&key, &GistKey::OneNode(p("b"))).unwrap() > 0.0);
    }
}
