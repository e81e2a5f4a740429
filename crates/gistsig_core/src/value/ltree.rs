//! Label paths (`ltree`).

use crate::error::{IndexError, IndexResult};
use crate::options::LabelFold;
use gistsig_codec::{CodecError, CodecResult, KeyDecoder, KeyEncoder};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Longest label, in characters.
pub const LABEL_MAX_CHARS: usize = 1000;

/// Largest number of labels in one path.
pub const MAX_LEVELS: usize = u16::MAX as usize;

/// A dotted path of labels such as `top.science.astronomy`.
///
/// Labels are non-empty runs of alphanumerics, `_` and `-`. The empty path
/// has no labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Ltree {
    labels: Vec<String>,
}

impl Ltree {
    /// Builds a path from labels, validating each one.
    pub fn new<I, S>(labels: I) -> IndexResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() > MAX_LEVELS {
            return Err(IndexError::invalid_path(format!(
                "number of levels ({}) exceeds the maximum allowed ({MAX_LEVELS})",
                labels.len()
            )));
        }
        for label in &labels {
            validate_label(label)?;
        }
        Ok(Self { labels })
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true for the empty path.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The labels in order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The first `levels` labels.
    #[must_use]
    pub fn prefix(&self, levels: usize) -> Ltree {
        Self {
            labels: self.labels[..levels.min(self.labels.len())].to_vec(),
        }
    }

    /// Whether `self` is an ancestor of `other` (or equal to it).
    pub fn is_ancestor_of(&self, other: &Ltree) -> bool {
        self.labels.len() <= other.labels.len()
            && self.labels.iter().zip(&other.labels).all(|(a, b)| a == b)
    }

    /// Weighted three-way comparison.
    ///
    /// The sign gives the total order: labels compare bytewise, a shorter
    /// label sorts first when it is a prefix of the other, and a shorter path
    /// sorts first when it is a prefix of the other. The magnitude grows with
    /// how early the paths diverge, which the penalty function relies on.
    pub fn compare(&self, other: &Ltree) -> i32 {
        let mut remaining = self.labels.len();
        for (a, b) in self.labels.iter().zip(&other.labels) {
            let weight = 10 * level_weight(remaining + 1);
            let common = a.len().min(b.len());
            match a.as_bytes()[..common].cmp(&b.as_bytes()[..common]) {
                Ordering::Less => return -weight,
                Ordering::Greater => return weight,
                Ordering::Equal if a.len() != b.len() => {
                    return len_diff(a.len(), b.len()).saturating_mul(weight);
                }
                Ordering::Equal => {}
            }
            remaining -= 1;
        }
        len_diff(self.labels.len(), other.labels.len())
            .saturating_mul(10 * level_weight(remaining + 1))
    }

    /// Hashes of every label under `fold`.
    pub fn label_hashes(&self, fold: LabelFold) -> impl Iterator<Item = u32> + '_ {
        self.labels.iter().map(move |label| fold.label_hash(label))
    }

    /// Writes the path as a nested varlena.
    ///
    /// Layout: `[u32 size][u16 levels][u16 pad]` then `[u16 len][bytes]` per
    /// label.
    pub(crate) fn write_to(&self, encoder: &mut KeyEncoder) -> CodecResult<()> {
        encoder.put_varlena(|inner| {
            inner.put_u16(to_u16(self.labels.len())?);
            inner.put_u16(0);
            for label in &self.labels {
                inner.put_u16(to_u16(label.len())?);
                inner.put_bytes(label.as_bytes());
            }
            Ok(())
        })
    }

    /// Reads a path written by [`Ltree::write_to`].
    pub(crate) fn read_from(decoder: &mut KeyDecoder<'_>) -> CodecResult<Self> {
        let mut inner = decoder.read_varlena()?;
        let levels = inner.read_u16()?;
        inner.read_u16()?;
        let mut labels = Vec::with_capacity(usize::from(levels));
        for _ in 0..levels {
            let len = inner.read_u16()?;
            let bytes = inner.read_bytes(usize::from(len))?;
            let label = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
            labels.push(label.to_owned());
        }
        inner.expect_end()?;
        Ok(Self { labels })
    }
}

fn validate_label(label: &str) -> IndexResult<()> {
    if label.is_empty() {
        return Err(IndexError::invalid_path("empty label"));
    }
    if label.chars().count() > LABEL_MAX_CHARS {
        return Err(IndexError::invalid_path(format!(
            "label exceeds {LABEL_MAX_CHARS} characters"
        )));
    }
    if let Some(c) = label
        .chars()
        .find(|c| !(c.is_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(IndexError::invalid_path(format!(
            "invalid character {c:?} in label \"{label}\""
        )));
    }
    Ok(())
}

fn level_weight(levels: usize) -> i32 {
    i32::try_from(levels).unwrap_or(i32::MAX / 10)
}

fn len_diff(a: usize, b: usize) -> i32 {
    let a = i32::try_from(a).unwrap_or(i32::MAX);
    let b = i32::try_from(b).unwrap_or(i32::MAX);
    a - b
}

fn to_u16(value: usize) -> CodecResult<u16> {
    u16::try_from(value)
        .map_err(|_| CodecError::encoding_failed(format!("{value} does not fit in 16 bits")))
}

impl Ord for Ltree {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other).cmp(&0)
    }
}

impl PartialOrd for Ltree {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Ltree {
    type Err = IndexError;

    /// Splits a dotted path. The empty string is the empty path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        Self::new(s.split('.'))
    }
}

impl fmt::Display for Ltree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.labels.join("."))
    }
}
