//! Strategy numbers understood by each operator class.

use crate::error::{IndexError, IndexResult};

/// Operators of the hstore opclass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HstoreStrategy {
    /// `@>` (and the legacy `@`).
    Contains,
    /// `?`
    Exists,
    /// `?|`
    ExistsAny,
    /// `?&`
    ExistsAll,
}

impl TryFrom<u16> for HstoreStrategy {
    type Error = IndexError;

    fn try_from(number: u16) -> IndexResult<Self> {
        match number {
            7 | 13 => Ok(Self::Contains),
            9 => Ok(Self::Exists),
            10 => Ok(Self::ExistsAny),
            11 => Ok(Self::ExistsAll),
            other => Err(IndexError::unsupported_strategy("hstore", other)),
        }
    }
}

/// Operators of the ltree and ltree[] opclasses.
///
/// For the array opclass the same numbers name the "any element" variant of
/// each operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LtreeStrategy {
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `=`
    Equal,
    /// `>=`
    GreaterEqual,
    /// `>`
    Greater,
    /// `key @> query`: the key is an ancestor of the query.
    IsParent,
    /// `key <@ query`: the key is a descendant of the query.
    IsDescendant,
    /// `~`
    Lquery,
    /// `~`, commuted.
    LqueryReversed,
    /// `@`
    Ltxtquery,
    /// `@`, commuted.
    LtxtqueryReversed,
    /// `?`: any lquery of an array.
    LqueryArray,
    /// `?`, commuted.
    LqueryArrayReversed,
}

impl LtreeStrategy {
    /// Whether the bounds alone decide the operator, so no recheck is needed.
    pub const fn is_exact(self) -> bool {
        matches!(
            self,
            Self::Less | Self::LessEqual | Self::GreaterEqual | Self::Greater
        )
    }

    /// Whether this is one of the ordering operators.
    pub const fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::Less | Self::LessEqual | Self::Equal | Self::GreaterEqual | Self::Greater
        )
    }

    /// The strategy number.
    pub const fn number(self) -> u16 {
        match self {
            Self::Less => 1,
            Self::LessEqual => 2,
            Self::Equal => 3,
            Self::GreaterEqual => 4,
            Self::Greater => 5,
            Self::IsParent => 10,
            Self::IsDescendant => 11,
            Self::Lquery => 12,
            Self::LqueryReversed => 13,
            Self::Ltxtquery => 14,
            Self::LtxtqueryReversed => 15,
            Self::LqueryArray => 16,
            Self::LqueryArrayReversed => 17,
        }
    }

    /// Parses a strategy number on behalf of `opclass`.
    pub(crate) fn parse(opclass: &'static str, number: u16) -> IndexResult<Self> {
        Self::from_number(number).ok_or_else(|| IndexError::unsupported_strategy(opclass, number))
    }

    fn from_number(number: u16) -> Option<Self> {
        Some(match number {
            1 => Self::Less,
            2 => Self::LessEqual,
            3 => Self::Equal,
            4 => Self::GreaterEqual,
            5 => Self::Greater,
            10 => Self::IsParent,
            11 => Self::IsDescendant,
            12 => Self::Lquery,
            13 => Self::LqueryReversed,
            14 => Self::Ltxtquery,
            15 => Self::LtxtqueryReversed,
            16 => Self::LqueryArray,
            17 => Self::LqueryArrayReversed,
            _ => return None,
        })
    }
}

impl TryFrom<u16> for LtreeStrategy {
    type Error = IndexError;

    fn try_from(number: u16) -> IndexResult<Self> {
        Self::parse("ltree", number)
    }
}

/// Operators of the tsvector opclass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TsvectorStrategy {
    /// `@@`
    Match,
}

impl TryFrom<u16> for TsvectorStrategy {
    type Error = IndexError;

    fn try_from(number: u16) -> IndexResult<Self> {
        match number {
            1 => Ok(Self::Match),
            other => Err(IndexError::unsupported_strategy("tsvector", other)),
        }
    }
}
