//! Text-search queries (`tsquery`).

use super::ternary::Ternary;
use super::walker::{BoolQuery, QueryExpr};
use crate::error::IndexResult;
use crate::signature::Signature;
use crate::value::{lexeme_hash, TsVector, WeightMask};

/// A lexeme operand of a text-search query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TsAtom {
    word: String,
    prefix: bool,
    weights: WeightMask,
    crc: i32,
}

impl TsAtom {
    /// An exact-word atom accepting any weight.
    pub fn new(word: impl Into<String>) -> Self {
        let word = word.into();
        let crc = lexeme_hash(&word);
        Self {
            word,
            prefix: false,
            weights: WeightMask::ANY,
            crc,
        }
    }

    /// Matches every lexeme starting with the word (`:*`).
    #[must_use]
    pub fn prefix(mut self) -> Self {
        self.prefix = true;
        self
    }

    /// Restricts the accepted weights.
    #[must_use]
    pub fn weights(mut self, weights: WeightMask) -> Self {
        self.weights = weights;
        self
    }

    /// The word.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Whether this is a prefix atom.
    pub fn is_prefix(&self) -> bool {
        self.prefix
    }

    /// Accepted weights.
    pub fn weight_mask(&self) -> WeightMask {
        self.weights
    }

    /// Hash of the word, as stored in index keys.
    pub fn crc(&self) -> i32 {
        self.crc
    }

    fn matches(&self, doc: &TsVector) -> bool {
        if self.prefix {
            doc.with_prefix(&self.word)
                .any(|lexeme| lexeme.has_weight(self.weights))
        } else {
            doc.find(&self.word)
                .is_some_and(|lexeme| lexeme.has_weight(self.weights))
        }
    }
}

/// A boolean expression over lexemes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsQuery {
    query: BoolQuery<TsAtom>,
}

impl TsQuery {
    /// Wraps a validated boolean query.
    pub fn new(query: BoolQuery<TsAtom>) -> Self {
        Self { query }
    }

    /// The query that matches nothing.
    pub fn empty() -> Self {
        Self::new(BoolQuery::empty())
    }

    /// Returns true if the query has no items.
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// The underlying query.
    pub fn query(&self) -> &BoolQuery<TsAtom> {
        &self.query
    }

    /// Exact evaluation against a document (`doc @@ query`).
    pub fn matches(&self, doc: &TsVector) -> IndexResult<bool> {
        let result = self
            .query
            .evaluate(true, |atom| Ternary::from_bool(atom.matches(doc)))?;
        Ok(result == Ternary::Yes)
    }

    /// Lossy evaluation against a bitmap signature.
    pub fn check_signature(&self, sign: &Signature) -> IndexResult<Ternary> {
        self.query.evaluate(false, |atom| {
            if atom.prefix {
                Ternary::Maybe
            } else if sign.has_token(atom.crc as u32) {
                Ternary::Maybe
            } else {
                Ternary::No
            }
        })
    }

    /// Lossy evaluation against a sorted array of lexeme hashes.
    pub fn check_hashes(&self, hashes: &[i32]) -> IndexResult<Ternary> {
        self.query.evaluate(false, |atom| {
            if atom.prefix || hashes.binary_search(&atom.crc).is_ok() {
                Ternary::Maybe
            } else {
                Ternary::No
            }
        })
    }
}

impl From<QueryExpr<TsAtom>> for TsQuery {
    fn from(expr: QueryExpr<TsAtom>) -> Self {
        Self::new(expr.into_query())
    }
}
