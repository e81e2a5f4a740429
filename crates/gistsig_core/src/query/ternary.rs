//! Three-valued logic for lossy query evaluation.

use std::fmt;

/// Result of evaluating a query against a lossy summary.
///
/// `Maybe` means the summary cannot decide; at the index boundary it is
/// treated as a match that needs recheck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ternary {
    /// Definitely no match.
    No,
    /// Undecided.
    Maybe,
    /// Definitely a match.
    Yes,
}

impl Ternary {
    /// Converts an exact answer.
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }

    /// Kleene conjunction.
    #[must_use]
    pub const fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::No, _) | (_, Self::No) => Self::No,
            (Self::Yes, Self::Yes) => Self::Yes,
            _ => Self::Maybe,
        }
    }

    /// Kleene disjunction.
    #[must_use]
    pub const fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Yes, _) | (_, Self::Yes) => Self::Yes,
            (Self::No, Self::No) => Self::No,
            _ => Self::Maybe,
        }
    }

    /// Kleene negation.
    #[must_use]
    pub const fn not(self) -> Self {
        match self {
            Self::No => Self::Yes,
            Self::Maybe => Self::Maybe,
            Self::Yes => Self::No,
        }
    }

    /// True unless the answer is a definite no.
    #[must_use]
    pub const fn is_possible(self) -> bool {
        !matches!(self, Self::No)
    }
}

impl From<bool> for Ternary {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl fmt::Display for Ternary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::No => "no",
            Self::Maybe => "maybe",
            Self::Yes => "yes",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::Ternary::{Maybe, No, Yes};
    use super::*;

    #[test]
    fn and_table() {
        assert_eq!(Yes.and(Yes), Yes);
        assert_eq!(Yes.and(Maybe), Maybe);
        assert_eq!(Maybe.and(Maybe), Maybe);
        assert_eq!(Maybe.and(No), No);
        assert_eq!(No.and(Yes), No);
    }

    #[test]
    fn or_table() {
        assert_eq!(No.or(No), No);
        assert_eq!(No.or(Maybe), Maybe);
        assert_eq!(Maybe.or(Yes), Yes);
        assert_eq!(Yes.or(No), Yes);
    }

    #[test]
    fn not_keeps_maybe() {
        assert_eq!(Maybe.not(), Maybe);
        assert_eq!(Yes.not(), No);
        assert_eq!(No.not(), Yes);
    }

    #[test]
    fn possibility() {
        assert!(Yes.is_possible());
        assert!(Maybe.is_possible());
        assert!(!No.is_possible());
        assert_eq!(Ternary::from(true), Yes);
    }
}
