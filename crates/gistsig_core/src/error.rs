//! Error types for the index core.

use thiserror::Error;

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur while building or probing an index.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// Key codec error.
    #[error("codec error: {0}")]
    Codec(#[from] gistsig_codec::CodecError),

    /// Option value outside its permitted range.
    #[error("value {value} out of bounds for option \"{name}\": valid values are between {min} and {max}")]
    OptionOutOfRange {
        /// Option name.
        name: String,
        /// Supplied value.
        value: i64,
        /// Smallest permitted value.
        min: i64,
        /// Largest permitted value.
        max: i64,
    },

    /// Option value that does not parse.
    #[error("invalid value for option \"{name}\": \"{value}\"")]
    InvalidOptionValue {
        /// Option name.
        name: String,
        /// Supplied value.
        value: String,
    },

    /// Option not recognized by the operator class.
    #[error("unrecognized parameter \"{name}\"")]
    UnknownOption {
        /// Option name.
        name: String,
    },

    /// Option given more than once.
    #[error("parameter \"{name}\" specified more than once")]
    DuplicateOption {
        /// Option name.
        name: String,
    },

    /// Option value that violates an alignment rule.
    #[error("{name} value must be a multiple of {align}, got {value}")]
    MisalignedOption {
        /// Option name.
        name: String,
        /// Supplied value.
        value: i64,
        /// Required alignment.
        align: usize,
    },

    /// Array argument with more than one dimension.
    #[error("array must be one-dimensional")]
    ArrayNotOneDimensional,

    /// Array argument containing NULL elements.
    #[error("array must not contain nulls")]
    ArrayContainsNulls,

    /// Strategy number the operator class does not support.
    #[error("unrecognized strategy number {strategy} for {opclass}")]
    UnsupportedStrategy {
        /// Operator class name.
        opclass: &'static str,
        /// Strategy number.
        strategy: u16,
    },

    /// Operand kind does not match the strategy.
    #[error("strategy {strategy} of {opclass} expects {expected} operand")]
    OperandMismatch {
        /// Operator class name.
        opclass: &'static str,
        /// Strategy number.
        strategy: u16,
        /// Expected operand kind.
        expected: &'static str,
    },

    /// Key variant that cannot appear in this operator class.
    #[error("{opclass} cannot handle {found} key")]
    KeyMismatch {
        /// Operator class name.
        opclass: &'static str,
        /// Variant that was found.
        found: &'static str,
    },

    /// Query evaluation exceeded its bounded stack.
    #[error("stack depth limit exceeded ({limit} entries)")]
    StackDepthExceeded {
        /// Configured limit.
        limit: usize,
    },

    /// Query layout that does not describe a well-formed expression.
    #[error("malformed query: {message}")]
    MalformedQuery {
        /// Description of the problem.
        message: String,
    },

    /// Path value that violates the label rules.
    #[error("invalid path: {message}")]
    InvalidPath {
        /// Description of the problem.
        message: String,
    },

    /// Picksplit needs at least two entries.
    #[error("picksplit needs at least 2 entries, got {count}")]
    TooFewEntries {
        /// Number of entries supplied.
        count: usize,
    },
}

impl IndexError {
    /// Creates an option out of range error.
    pub fn option_out_of_range(name: impl Into<String>, value: i64, min: i64, max: i64) -> Self {
        Self::OptionOutOfRange {
            name: name.into(),
            value,
            min,
            max,
        }
    }

    /// Creates an invalid option value error.
    pub fn invalid_option_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidOptionValue {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates an unknown option error.
    pub fn unknown_option(name: impl Into<String>) -> Self {
        Self::UnknownOption { name: name.into() }
    }

    /// Creates an unsupported strategy error.
    pub fn unsupported_strategy(opclass: &'static str, strategy: u16) -> Self {
        Self::UnsupportedStrategy { opclass, strategy }
    }

    /// Creates an operand mismatch error.
    pub fn operand_mismatch(opclass: &'static str, strategy: u16, expected: &'static str) -> Self {
        Self::OperandMismatch {
            opclass,
            strategy,
            expected,
        }
    }

    /// Creates a key mismatch error.
    pub fn key_mismatch(opclass: &'static str, found: &'static str) -> Self {
        Self::KeyMismatch { opclass, found }
    }

    /// Creates a malformed query error.
    pub fn malformed_query(message: impl Into<String>) -> Self {
        Self::MalformedQuery {
            message: message.into(),
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPath {
            message: message.into(),
        }
    }
}
