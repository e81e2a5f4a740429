//! User values stored in the indexed columns.

mod array;
mod hstore;
mod ltree;
mod tsvector;

pub use array::ArrayArg;
pub use hstore::Hstore;
pub use ltree::{Ltree, LABEL_MAX_CHARS, MAX_LEVELS};
pub use tsvector::{lexeme_hash, Lexeme, TsVector, Weight, WeightMask, WordPos};
