//! Path patterns (`lquery`).
//!
//! An lquery is a sequence of levels. A level matches a run of consecutive
//! labels whose length lies within its quantifier; each label in the run
//! must match one of the level's variants (or none of them, when the level
//! is negated). A level without variants is a `*` level and matches any
//! label.

use super::label::LabelPattern;
use crate::error::{IndexError, IndexResult};
use crate::options::LabelFold;
use crate::signature::Signature;
use crate::value::Ltree;
use std::cmp::Ordering;

/// Upper bound meaning "any number of labels".
pub const QUANTIFIER_MAX: u16 = u16::MAX;

/// One level of an lquery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LqueryLevel {
    variants: Vec<LabelPattern>,
    negated: bool,
    low: u16,
    high: u16,
}

impl LqueryLevel {
    /// A level matching exactly one label equal to one of `variants`.
    pub fn any_of(variants: impl IntoIterator<Item = LabelPattern>) -> Self {
        Self {
            variants: variants.into_iter().collect(),
            negated: false,
            low: 1,
            high: 1,
        }
    }

    /// A level matching exactly one label matching `pattern`.
    pub fn pattern(pattern: LabelPattern) -> Self {
        Self::any_of([pattern])
    }

    /// A level matching exactly one label equal to `text`.
    pub fn label(text: impl Into<String>) -> Self {
        Self::pattern(LabelPattern::new(text))
    }

    /// `*`: any number of labels.
    pub fn star() -> Self {
        Self::any_labels(0, QUANTIFIER_MAX)
    }

    /// `*{low,high}`: between `low` and `high` arbitrary labels.
    pub fn any_labels(low: u16, high: u16) -> Self {
        Self {
            variants: Vec::new(),
            negated: false,
            low,
            high,
        }
    }

    /// `!`: labels must match none of the variants.
    #[must_use]
    pub fn negated(mut self) -> Self {
        self.negated = true;
        self
    }

    /// `{low,high}`: repeat the level.
    #[must_use]
    pub fn repeat(mut self, low: u16, high: u16) -> Self {
        self.low = low;
        self.high = high;
        self
    }

    /// The variants; empty for `*` levels.
    pub fn variants(&self) -> &[LabelPattern] {
        &self.variants
    }

    /// Whether the level is negated.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Smallest number of labels consumed.
    pub fn low(&self) -> u16 {
        self.low
    }

    /// Largest number of labels consumed.
    pub fn high(&self) -> u16 {
        self.high
    }

    fn matches_label(&self, label: &str) -> bool {
        if self.variants.is_empty() {
            return true;
        }
        self.variants.iter().any(|v| v.matches(label)) != self.negated
    }

    /// Whether a subtree lacking every variant bit can be ruled out.
    fn can_look_sign(&self, fold: LabelFold) -> bool {
        !self.variants.is_empty()
            && !self.negated
            && self.low >= 1
            && self.variants.iter().all(|v| v.can_look_sign(fold))
    }

    /// A single case-sensitive whole label consumed exactly once.
    fn plain_label(&self) -> Option<&str> {
        match self.variants.as_slice() {
            [only]
                if !self.negated
                    && self.low == 1
                    && self.high == 1
                    && !only.is_any_end()
                    && !only.is_case_insensitive()
                    && !only.is_sublexeme() =>
            {
                Some(only.text())
            }
            _ => None,
        }
    }
}

/// A validated path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lquery {
    levels: Vec<LqueryLevel>,
    first_good: usize,
}

impl Lquery {
    /// Validates the levels.
    pub fn new(levels: Vec<LqueryLevel>) -> IndexResult<Self> {
        if levels.is_empty() {
            return Err(IndexError::malformed_query("lquery has no levels"));
        }
        for (i, level) in levels.iter().enumerate() {
            if level.low > level.high {
                return Err(IndexError::malformed_query(format!(
                    "level {i}: low limit {} is greater than high limit {}",
                    level.low, level.high
                )));
            }
            if level.negated && level.variants.is_empty() {
                return Err(IndexError::malformed_query(format!(
                    "level {i}: negation needs at least one label"
                )));
            }
            if level.variants.iter().any(|v| v.text().is_empty()) {
                return Err(IndexError::malformed_query(format!(
                    "level {i}: empty label"
                )));
            }
        }
        let first_good = levels
            .iter()
            .take_while(|l| l.plain_label().is_some())
            .count();
        Ok(Self { levels, first_good })
    }

    /// The levels.
    pub fn levels(&self) -> &[LqueryLevel] {
        &self.levels
    }

    /// Number of leading levels that each match one fixed label.
    pub fn first_good(&self) -> usize {
        self.first_good
    }

    /// Exact match against `path`.
    pub fn matches(&self, path: &Ltree) -> bool {
        let labels = path.labels();
        let n = labels.len();
        // reach[j]: the levels seen so far can consume exactly labels[..j].
        let mut reach = vec![false; n + 1];
        reach[0] = true;
        for level in &self.levels {
            let mut next = vec![false; n + 1];
            let low = usize::from(level.low);
            let high = usize::from(level.high);
            for start in (0..=n).filter(|&j| reach[j]) {
                if low == 0 {
                    next[start] = true;
                }
                let mut count = 0;
                while count < high
                    && start + count < n
                    && level.matches_label(&labels[start + count])
                {
                    count += 1;
                    if count >= low {
                        next[start + count] = true;
                    }
                }
            }
            if !next.contains(&true) {
                return false;
            }
            reach = next;
        }
        reach[n]
    }

    /// Signature test: every level that can be decided from label hashes
    /// must have one of its variant bits set.
    pub fn signature_may_match(&self, sign: &Signature, fold: LabelFold) -> bool {
        self.levels
            .iter()
            .filter(|level| level.can_look_sign(fold))
            .all(|level| {
                level
                    .variants
                    .iter()
                    .any(|v| sign.has_token(fold.label_hash(v.text())))
            })
    }

    /// Range test: the leading fixed labels must fall between the bounds.
    pub fn range_may_match(&self, lower: &Ltree, upper: &Ltree) -> bool {
        if self.first_good == 0 {
            return true;
        }
        self.cmp_leading(lower) != Ordering::Greater && self.cmp_leading(upper) != Ordering::Less
    }

    /// Compares the first `first_good` labels of `path` with the leading
    /// fixed labels. A path shorter than the fixed run sorts first.
    fn cmp_leading(&self, path: &Ltree) -> Ordering {
        let fixed = self.levels[..self.first_good]
            .iter()
            .filter_map(LqueryLevel::plain_label);
        for (label, expected) in path.labels().iter().zip(fixed) {
            match label.as_bytes().cmp(expected.as_bytes()) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        if path.len() < self.first_good {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }
}
