//! Text-search documents (`tsvector`).

use gistsig_codec::legacy_crc32;
use std::fmt;

/// Weight label of a lexeme position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Weight {
    /// Lowest weight, the default.
    #[default]
    D = 0,
    /// Weight C.
    C = 1,
    /// Weight B.
    B = 2,
    /// Highest weight.
    A = 3,
}

impl Weight {
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of weights a query atom accepts. Empty means any weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WeightMask(u8);

impl WeightMask {
    /// Accepts every weight.
    pub const ANY: Self = Self(0);

    /// Accepts exactly `weights`.
    pub fn of(weights: &[Weight]) -> Self {
        Self(weights.iter().fold(0, |mask, w| mask | w.bit()))
    }

    /// Returns true if no restriction applies.
    pub const fn is_any(self) -> bool {
        self.0 == 0
    }

    /// Whether `weight` passes the mask.
    pub const fn accepts(self, weight: Weight) -> bool {
        self.0 == 0 || self.0 & weight.bit() != 0
    }
}

/// A position of a lexeme within the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WordPos {
    /// 1-based word position.
    pub pos: u16,
    /// Weight label.
    pub weight: Weight,
}

impl WordPos {
    /// Creates a position with the default weight.
    pub const fn new(pos: u16) -> Self {
        Self {
            pos,
            weight: Weight::D,
        }
    }

    /// Sets the weight.
    #[must_use]
    pub const fn weight(mut self, weight: Weight) -> Self {
        self.weight = weight;
        self
    }
}

/// A normalized word with optional positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lexeme {
    word: String,
    positions: Vec<WordPos>,
}

impl Lexeme {
    /// A lexeme without positions.
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            positions: Vec::new(),
        }
    }

    /// A lexeme with positions.
    pub fn with_positions(word: impl Into<String>, positions: Vec<WordPos>) -> Self {
        Self {
            word: word.into(),
            positions,
        }
    }

    /// The word.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Positions, sorted and de-duplicated once inside a [`TsVector`].
    pub fn positions(&self) -> &[WordPos] {
        &self.positions
    }

    /// Whether some occurrence carries a weight accepted by `mask`.
    ///
    /// A lexeme without positions counts as one occurrence of weight D.
    pub fn has_weight(&self, mask: WeightMask) -> bool {
        if mask.is_any() {
            return true;
        }
        if self.positions.is_empty() {
            return mask.accepts(Weight::D);
        }
        self.positions.iter().any(|p| mask.accepts(p.weight))
    }
}

/// Hash of a lexeme as stored in index keys.
pub fn lexeme_hash(word: &str) -> i32 {
    legacy_crc32(word.as_bytes()) as i32
}

/// A sorted list of unique lexemes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TsVector {
    lexemes: Vec<Lexeme>,
}

impl TsVector {
    /// Builds a document; duplicated words have their positions merged.
    pub fn new(mut lexemes: Vec<Lexeme>) -> Self {
        lexemes.sort_by(|a, b| a.word.cmp(&b.word));
        let mut merged: Vec<Lexeme> = Vec::with_capacity(lexemes.len());
        for lexeme in lexemes {
            match merged.last_mut() {
                Some(last) if last.word == lexeme.word => last.positions.extend(lexeme.positions),
                _ => merged.push(lexeme),
            }
        }
        for lexeme in &mut merged {
            lexeme.positions.sort();
            lexeme.positions.dedup_by_key(|p| p.pos);
        }
        Self { lexemes: merged }
    }

    /// Builds a document of position-less words.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(words.into_iter().map(Lexeme::new).collect())
    }

    /// Number of distinct lexemes.
    pub fn len(&self) -> usize {
        self.lexemes.len()
    }

    /// Returns true for the empty document.
    pub fn is_empty(&self) -> bool {
        self.lexemes.is_empty()
    }

    /// Lexemes in sorted order.
    pub fn lexemes(&self) -> &[Lexeme] {
        &self.lexemes
    }

    /// Looks up a word.
    pub fn find(&self, word: &str) -> Option<&Lexeme> {
        self.lexemes
            .binary_search_by(|l| l.word.as_str().cmp(word))
            .ok()
            .map(|i| &self.lexemes[i])
    }

    /// Lexemes that start with `prefix`.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Lexeme> + 'a {
        let start = self
            .lexemes
            .partition_point(|l| l.word.as_str() < prefix);
        self.lexemes[start..]
            .iter()
            .take_while(move |l| l.word.starts_with(prefix))
    }

    /// Sorted, de-duplicated lexeme hashes.
    pub fn hashes(&self) -> Vec<i32> {
        let mut hashes: Vec<i32> = self.lexemes.iter().map(|l| lexeme_hash(&l.word)).collect();
        hashes.sort_unstable();
        hashes.dedup();
        hashes
    }
}

impl fmt::Display for TsVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, lexeme) in self.lexemes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "'{}'", lexeme.word)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_and_merged() {
        let doc = TsVector::new(vec![
            Lexeme::with_positions("dog", vec![WordPos::new(3)]),
            Lexeme::new("cat"),
            Lexeme::with_positions("dog", vec![WordPos::new(1), WordPos::new(3)]),
        ]);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.lexemes()[0].word(), "cat");
        let dog = doc.find("dog").unwrap();
        assert_eq!(dog.positions(), &[WordPos::new(1), WordPos::new(3)]);
        assert!(doc.find("cow").is_none());
    }

    #[test]
    fn prefix_scan() {
        let doc = TsVector::from_words(["supernova", "super", "sun", "zebra"]);
        let words: Vec<&str> = doc.with_prefix("sup").map(Lexeme::word).collect();
        assert_eq!(words, vec!["super", "supernova"]);
        assert_eq!(doc.with_prefix("x").count(), 0);
    }

    #[test]
    fn hash_is_legacy_crc() {
        assert_eq!(lexeme_hash("cat"), -563_489_263);
        let doc = TsVector::from_words(["cat", "cat"]);
        assert_eq!(doc.hashes(), vec![-563_489_263]);
    }

    #[test]
    fn weights() {
        let plain = Lexeme::new("x");
        assert!(plain.has_weight(WeightMask::ANY));
        assert!(plain.has_weight(WeightMask::of(&[Weight::D])));
        assert!(!plain.has_weight(WeightMask::of(&[Weight::A])));

        let weighted = Lexeme::with_positions("x", vec![WordPos::new(1).weight(Weight::B)]);
        assert!(weighted.has_weight(WeightMask::of(&[Weight::A, Weight::B])));
        assert!(!weighted.has_weight(WeightMask::of(&[Weight::C])));
    }

    #[test]
    fn display() {
        assert_eq!(TsVector::from_words(["b", "a"]).to_string(), "'a' 'b'");
    }
}
