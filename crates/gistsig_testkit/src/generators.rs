//! Property-based test generators using proptest.
//!
//! Words and labels are drawn from small alphabets so that generated
//! queries hit generated values often enough to be interesting.

use gistsig_core::query::{LabelPattern, Lquery, LqueryLevel, Ltxtquery, QueryExpr, TsAtom, TsQuery};
use gistsig_core::value::{ArrayArg, Hstore, Lexeme, Ltree, TsVector, Weight, WeightMask, WordPos};
use gistsig_core::{Cover, SigLen, Signature};
use proptest::prelude::*;

/// Strategy for ltree labels.
pub fn label_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-d][a-d0-9_]{0,2}").expect("Invalid regex")
}

/// Strategy for paths of up to `max_levels` labels, the empty path included.
pub fn ltree_strategy(max_levels: usize) -> impl Strategy<Value = Ltree> {
    prop::collection::vec(label_strategy(), 0..=max_levels)
        .prop_map(|labels| Ltree::new(labels).expect("generated labels are valid"))
}

/// Strategy for one-dimensional arrays of paths without NULLs.
pub fn ltree_array_strategy() -> impl Strategy<Value = ArrayArg<Ltree>> {
    prop::collection::vec(ltree_strategy(4), 0..6).prop_map(|paths| paths.into_iter().collect())
}

/// Strategy for hstore keys.
pub fn hstore_key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-f]{1,2}").expect("Invalid regex")
}

/// Strategy for hstore values, some of them NULL.
pub fn hstore_strategy() -> impl Strategy<Value = Hstore> {
    prop::collection::vec(
        (
            hstore_key_strategy(),
            prop::option::weighted(
                0.8,
                prop::string::string_regex("[a-c]{0,2}").expect("Invalid regex"),
            ),
        ),
        0..8,
    )
    .prop_map(|pairs| pairs.into_iter().collect())
}

/// Strategy for text-search words.
pub fn word_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-e]{1,3}").expect("Invalid regex")
}

fn weight_strategy() -> impl Strategy<Value = Weight> {
    prop_oneof![
        Just(Weight::A),
        Just(Weight::B),
        Just(Weight::C),
        Just(Weight::D),
    ]
}

/// Strategy for documents with weighted positions.
pub fn tsvector_strategy(max_words: usize) -> impl Strategy<Value = TsVector> {
    prop::collection::vec(
        (
            word_strategy(),
            prop::collection::vec((1u16..200, weight_strategy()), 0..3),
        ),
        0..=max_words,
    )
    .prop_map(|words| {
        TsVector::new(
            words
                .into_iter()
                .map(|(word, positions)| {
                    let positions = positions
                        .into_iter()
                        .map(|(pos, weight)| WordPos::new(pos).weight(weight))
                        .collect();
                    Lexeme::with_positions(word, positions)
                })
                .collect(),
        )
    })
}

/// Strategy for tsquery atoms, sometimes prefix or weight restricted.
pub fn ts_atom_strategy() -> impl Strategy<Value = TsAtom> {
    (
        word_strategy(),
        any::<bool>(),
        prop::collection::vec(weight_strategy(), 0..2),
    )
        .prop_map(|(word, prefix, weights)| {
            let atom = TsAtom::new(word).weights(WeightMask::of(&weights));
            if prefix {
                atom.prefix()
            } else {
                atom
            }
        })
}

/// Wraps an atom strategy into boolean expressions of bounded depth.
pub fn bool_expr_strategy<A, S>(atoms: S) -> impl Strategy<Value = QueryExpr<A>>
where
    A: Clone + std::fmt::Debug + 'static,
    S: Strategy<Value = A> + 'static,
{
    atoms
        .prop_map(QueryExpr::atom)
        .prop_recursive(3, 16, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(QueryExpr::not),
                (inner.clone(), inner.clone()).prop_map(|(l, r)| QueryExpr::and(l, r)),
                (inner.clone(), inner).prop_map(|(l, r)| QueryExpr::or(l, r)),
            ]
        })
}

/// Strategy for non-empty text-search queries.
pub fn tsquery_strategy() -> impl Strategy<Value = TsQuery> {
    bool_expr_strategy(ts_atom_strategy()).prop_map(TsQuery::from)
}

/// Strategy for label patterns with random modifiers.
pub fn label_pattern_strategy() -> impl Strategy<Value = LabelPattern> {
    (label_strategy(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(text, any_end, case_insensitive, sublexeme)| {
            let mut pattern = LabelPattern::new(text);
            if any_end {
                pattern = pattern.any_end();
            }
            if case_insensitive {
                pattern = pattern.case_insensitive();
            }
            if sublexeme {
                pattern = pattern.sublexeme();
            }
            pattern
        },
    )
}

/// Strategy for label-search queries.
pub fn ltxtquery_strategy() -> impl Strategy<Value = Ltxtquery> {
    bool_expr_strategy(label_pattern_strategy()).prop_map(Ltxtquery::from)
}

fn lquery_level_strategy() -> impl Strategy<Value = LqueryLevel> {
    prop_oneof![
        4 => prop::collection::vec(label_pattern_strategy(), 1..3).prop_map(LqueryLevel::any_of),
        2 => Just(LqueryLevel::star()),
        1 => (0u16..2, 0u16..3).prop_map(|(low, extra)| LqueryLevel::any_labels(low, low + extra)),
        1 => label_strategy().prop_map(|l| LqueryLevel::label(l).negated()),
    ]
}

/// Strategy for lquery patterns.
pub fn lquery_strategy() -> impl Strategy<Value = Lquery> {
    prop::collection::vec(lquery_level_strategy(), 1..5)
        .prop_map(|levels| Lquery::new(levels).expect("generated levels are valid"))
}

/// An lquery that matches `path` exactly, with some levels replaced by `*{1}`.
/// The empty path has no such pattern.
pub fn lquery_matching(path: &Ltree, stars: &[bool]) -> Option<Lquery> {
    let levels = path
        .labels()
        .iter()
        .enumerate()
        .map(|(i, label)| {
            if stars.get(i).copied().unwrap_or(false) {
                LqueryLevel::any_labels(1, 1)
            } else {
                LqueryLevel::label(label.clone())
            }
        })
        .collect();
    Lquery::new(levels).ok()
}

/// Strategy for signature lengths in bytes.
pub fn siglen_strategy(max: usize) -> impl Strategy<Value = SigLen> {
    (1..=max).prop_map(|bytes| SigLen::new(bytes).expect("length within range"))
}

/// Strategy for arbitrary signatures of the given length.
pub fn signature_strategy(siglen: SigLen) -> impl Strategy<Value = Signature> {
    prop::collection::vec(any::<u8>(), siglen.bytes()).prop_map(Signature::from_bytes)
}

/// Strategy for covers of the given length, occasionally all-true.
pub fn cover_strategy(siglen: SigLen) -> impl Strategy<Value = Cover> {
    prop_oneof![
        9 => signature_strategy(siglen).prop_map(Cover::Bits),
        1 => Just(Cover::AllTrue),
    ]
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
