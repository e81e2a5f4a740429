//! Benchmarks for gistsig operator classes.
//!
//! The benches live in `benches/`; this library only holds the seeded data
//! generators they share.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
