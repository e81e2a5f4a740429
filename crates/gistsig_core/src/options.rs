//! Per-index options.
//!
//! Every operator class exposes a signature length option (`siglen`). The
//! ltree family also accepts `fold`, which pins the label case folding used
//! when hashing labels. Both are fixed when the index is created and are
//! persisted with it through [`IndexOptions`].

use crate::error::{IndexError, IndexResult};
use gistsig_codec::{crc32, KeyLayout};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Largest accepted signature length in bytes.
///
/// This is the largest key that fits an 8 KiB GiST page.
pub const SIGLEN_MAX: usize = 2024;

/// Name of the signature length option.
pub const SIGLEN_OPTION: &str = "siglen";

/// Name of the label folding option.
pub const FOLD_OPTION: &str = "fold";

/// Signature length in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct SigLen(u16);

impl SigLen {
    /// Creates a signature length, checking it against `1..=SIGLEN_MAX`.
    pub fn new(bytes: usize) -> IndexResult<Self> {
        match u16::try_from(bytes) {
            Ok(raw) if (1..=SIGLEN_MAX).contains(&bytes) => Ok(Self(raw)),
            _ => Err(IndexError::option_out_of_range(
                SIGLEN_OPTION,
                i64::try_from(bytes).unwrap_or(i64::MAX),
                1,
                SIGLEN_MAX as i64,
            )),
        }
    }

    pub(crate) const fn from_const(bytes: u16) -> Self {
        Self(bytes)
    }

    /// Returns the length in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        self.0 as usize
    }

    /// Returns the length in bits.
    #[must_use]
    pub const fn bits(self) -> usize {
        self.0 as usize * 8
    }
}

impl TryFrom<u16> for SigLen {
    type Error = IndexError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(usize::from(value))
    }
}

impl From<SigLen> for u16 {
    fn from(value: SigLen) -> Self {
        value.0
    }
}

impl fmt::Display for SigLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Case folding applied to path labels before hashing.
///
/// Label hashes end up in index keys, so the folding is an index property
/// and never depends on the process locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelFold {
    /// Unicode lowercase.
    #[default]
    Unicode,
    /// ASCII-only lowercase.
    Ascii,
    /// Labels are hashed as stored.
    #[serde(rename = "none")]
    Preserve,
}

impl LabelFold {
    /// Folds a label.
    pub fn fold<'a>(&self, label: &'a str) -> Cow<'a, str> {
        match self {
            Self::Unicode => Cow::Owned(label.to_lowercase()),
            Self::Ascii if label.bytes().any(|b| b.is_ascii_uppercase()) => {
                Cow::Owned(label.to_ascii_lowercase())
            }
            Self::Ascii | Self::Preserve => Cow::Borrowed(label),
        }
    }

    /// Hashes a label under this folding.
    #[must_use]
    pub fn label_hash(&self, label: &str) -> u32 {
        crc32(self.fold(label).as_bytes())
    }

    /// Whether a case-insensitive pattern may be answered from label hashes.
    ///
    /// Exact case-insensitive comparison uses Unicode lowercase, so only the
    /// matching fold hashes such labels to the same bit.
    #[must_use]
    pub const fn supports_case_insensitive(&self) -> bool {
        matches!(self, Self::Unicode)
    }
}

impl FromStr for LabelFold {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unicode" => Ok(Self::Unicode),
            "ascii" => Ok(Self::Ascii),
            "none" => Ok(Self::Preserve),
            _ => Err(IndexError::invalid_option_value(FOLD_OPTION, s)),
        }
    }
}

impl fmt::Display for LabelFold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unicode => "unicode",
            Self::Ascii => "ascii",
            Self::Preserve => "none",
        };
        f.write_str(name)
    }
}

/// Resolved options of one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Signature length.
    pub siglen: SigLen,

    /// Label folding (ltree family only).
    #[serde(default)]
    pub label_fold: LabelFold,
}

impl IndexOptions {
    /// Creates options with the given signature length and default folding.
    #[must_use]
    pub const fn new(siglen: SigLen) -> Self {
        Self {
            siglen,
            label_fold: LabelFold::Unicode,
        }
    }

    /// Sets the signature length.
    #[must_use]
    pub const fn siglen(mut self, siglen: SigLen) -> Self {
        self.siglen = siglen;
        self
    }

    /// Sets the label folding.
    #[must_use]
    pub const fn label_fold(mut self, fold: LabelFold) -> Self {
        self.label_fold = fold;
        self
    }

    /// Returns the decoding context for keys of this index.
    #[must_use]
    pub const fn layout(&self) -> KeyLayout {
        KeyLayout::new(self.siglen.bytes())
    }
}

/// The host's option bag: `name=value` pairs separated by commas.
///
/// ```
/// use gistsig_core::options::OptionsBag;
///
/// let bag: OptionsBag = "siglen=32, fold=ascii".parse().unwrap();
/// assert_eq!(bag.get("siglen"), Some("32"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsBag {
    entries: Vec<(String, String)>,
}

impl OptionsBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an option.
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries
            .push((name.into().to_ascii_lowercase(), value.into()));
        self
    }

    /// Returns the value of `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the options in the order given.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns true if no option was given.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromStr for OptionsBag {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bag = Self::new();
        for item in s.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            let (name, value) = item
                .split_once('=')
                .ok_or_else(|| IndexError::invalid_option_value(item, ""))?;
            bag = bag.set(name.trim(), value.trim());
        }
        Ok(bag)
    }
}

/// Describes the options an operator class accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionsDescriptor {
    /// Operator class name.
    pub opclass: &'static str,
    /// Signature length used when the option is absent.
    pub default_siglen: SigLen,
    /// Required alignment of the signature length.
    pub align: usize,
    /// Whether the `fold` option is accepted.
    pub accepts_fold: bool,
}

impl OptionsDescriptor {
    /// Creates a descriptor with no alignment rule and no `fold` option.
    #[must_use]
    pub const fn new(opclass: &'static str, default_siglen: u16) -> Self {
        Self {
            opclass,
            default_siglen: SigLen::from_const(default_siglen),
            align: 1,
            accepts_fold: false,
        }
    }

    /// Requires the signature length to be a multiple of `align`.
    #[must_use]
    pub const fn align(mut self, align: usize) -> Self {
        self.align = align;
        self
    }

    /// Accepts the `fold` option.
    #[must_use]
    pub const fn with_fold(mut self) -> Self {
        self.accepts_fold = true;
        self
    }

    /// Options used when the bag is empty.
    #[must_use]
    pub const fn defaults(&self) -> IndexOptions {
        IndexOptions::new(self.default_siglen)
    }

    /// Validates `bag` and fills in defaults.
    pub fn resolve(&self, bag: &OptionsBag) -> IndexResult<IndexOptions> {
        let mut options = self.defaults();
        let mut seen_siglen = false;
        let mut seen_fold = false;

        for (name, value) in bag.iter() {
            match name {
                SIGLEN_OPTION => {
                    if std::mem::replace(&mut seen_siglen, true) {
                        return Err(IndexError::DuplicateOption { name: name.into() });
                    }
                    options.siglen = self.parse_siglen(value)?;
                }
                FOLD_OPTION if self.accepts_fold => {
                    if std::mem::replace(&mut seen_fold, true) {
                        return Err(IndexError::DuplicateOption { name: name.into() });
                    }
                    options.label_fold = value.parse()?;
                }
                _ => return Err(IndexError::unknown_option(name)),
            }
        }

        debug!(
            opclass = self.opclass,
            siglen = options.siglen.bytes(),
            fold = %options.label_fold,
            "resolved index options"
        );
        Ok(options)
    }

    fn parse_siglen(&self, value: &str) -> IndexResult<SigLen> {
        let raw: i64 = value
            .trim()
            .parse()
            .map_err(|_| IndexError::invalid_option_value(SIGLEN_OPTION, value))?;
        let bytes = usize::try_from(raw)
            .ok()
            .filter(|b| (1..=SIGLEN_MAX).contains(b))
            .ok_or_else(|| {
                IndexError::option_out_of_range(SIGLEN_OPTION, raw, 1, SIGLEN_MAX as i64)
            })?;
        if bytes % self.align != 0 {
            return Err(IndexError::MisalignedOption {
                name: SIGLEN_OPTION.into(),
                value: raw,
                align: self.align,
            });
        }
        SigLen::new(bytes)
    }
}
