//! Label patterns shared by lquery variants and ltxtquery atoms.

use crate::options::LabelFold;

/// A pattern matched against one path label.
///
/// Modifiers:
/// - `*` (`any_end`): the label may be longer than the pattern
/// - `@` (`case_insensitive`): compare Unicode-lowercased text
/// - `%` (`sublexeme`): match `_`-separated words of the label independently
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelPattern {
    text: String,
    any_end: bool,
    case_insensitive: bool,
    sublexeme: bool,
}

impl LabelPattern {
    /// A plain, case-sensitive, whole-label pattern.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            any_end: false,
            case_insensitive: false,
            sublexeme: false,
        }
    }

    /// Allows longer labels (`*`).
    #[must_use]
    pub fn any_end(mut self) -> Self {
        self.any_end = true;
        self
    }

    /// Ignores case (`@`).
    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Matches `_`-separated words (`%`).
    #[must_use]
    pub fn sublexeme(mut self) -> Self {
        self.sublexeme = true;
        self
    }

    /// The pattern text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether `*` is set.
    pub fn is_any_end(&self) -> bool {
        self.any_end
    }

    /// Whether `@` is set.
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Whether `%` is set.
    pub fn is_sublexeme(&self) -> bool {
        self.sublexeme
    }

    /// Whether the pattern can be answered by testing the bit of its hash.
    ///
    /// Prefix and word patterns match labels whose hash is unrelated to the
    /// pattern text.
    pub fn can_look_sign(&self, fold: LabelFold) -> bool {
        !self.any_end
            && !self.sublexeme
            && (!self.case_insensitive || fold.supports_case_insensitive())
    }

    /// Matches one label exactly.
    pub fn matches(&self, label: &str) -> bool {
        if self.sublexeme {
            self.text.split('_').all(|word| {
                label
                    .split('_')
                    .any(|candidate| self.word_matches(word, candidate))
            })
        } else {
            self.word_matches(&self.text, label)
        }
    }

    fn word_matches(&self, pattern: &str, word: &str) -> bool {
        if self.case_insensitive {
            let pattern = pattern.to_lowercase();
            let word = word.to_lowercase();
            compare(&pattern, &word, self.any_end)
        } else {
            compare(pattern, word, self.any_end)
        }
    }
}

fn compare(pattern: &str, word: &str, any_end: bool) -> bool {
    if any_end {
        word.starts_with(pattern)
    } else {
        word == pattern
    }
}
