//! # gistsig Core
//!
//! Signature-based GiST operator classes.
//!
//! This crate provides:
//! - Fixed-width bit signatures and the all-true shortcut
//! - Index keys and their on-disk form
//! - The hstore, ltree, ltree[] and tsvector operator classes
//! - lquery, ltxtquery and tsquery evaluators, exact and lossy
//! - Per-index options (`siglen`, `fold`)
//!
//! ## Usage
//!
//! ```
//! use gistsig_core::opclass::{Entry, HstoreOperand, HstoreOps, OpClass};
//! use gistsig_core::options::OptionsBag;
//! use gistsig_core::value::Hstore;
//!
//! let ops = HstoreOps::from_bag(&"siglen=32".parse::<OptionsBag>().unwrap()).unwrap();
//! let value: Hstore = [("a", Some("1")), ("b", Some("2"))].into_iter().collect();
//! let key = ops.compress(Entry::Leaf(&value)).unwrap();
//!
//! let query = HstoreOperand::Contains([("a", Some("1"))].into_iter().collect());
//! let result = ops.consistent(&key, 7, &query).unwrap();
//! assert!(result.matches && result.recheck);
//! assert!(ops.recheck(&value, 7, &query).unwrap());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod key;
pub mod opclass;
pub mod options;
pub mod query;
pub mod signature;
pub mod strategy;
pub mod value;

pub use error::{IndexError, IndexResult};
pub use key::{GistKey, PathRange};
pub use opclass::{Consistency, Entry, OpClass, Split};
pub use options::{IndexOptions, LabelFold, OptionsBag, OptionsDescriptor, SigLen, SIGLEN_MAX};
pub use signature::{hash_bit, Cover, Signature};
