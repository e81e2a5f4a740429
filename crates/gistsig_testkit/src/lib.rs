//! # gistsig Testkit
//!
//! Test utilities for gistsig operator classes.
//!
//! This crate provides:
//! - An in-memory GiST host that inserts, splits and searches
//! - Property-based test generators using proptest
//! - Key encoding test vectors
//! - Fuzz testing harnesses
//!
//! ## Usage
//!
//! ```
//! use gistsig_core::opclass::{LtreeOperand, LtreeOps, OpClass};
//! use gistsig_core::OptionsBag;
//! use gistsig_testkit::prelude::*;
//!
//! let ops = LtreeOps::from_bag(&OptionsBag::new()).unwrap();
//! let mut tree = GistTree::new(ops);
//! for path in ["top.science", "top.art", "top.science.astronomy"] {
//!     tree.insert(path.parse().unwrap()).unwrap();
//! }
//! let query = LtreeOperand::Path("top.science".parse().unwrap());
//! assert_eq!(tree.search(11, &query).unwrap().sorted_matches(), vec![0, 2]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use vectors::*;
