//! Query languages and their evaluators.
//!
//! Every query exposes an exact evaluator, used for recheck, and a lossy one
//! that works against the contents of an index key.

mod label;
mod lquery;
mod ltxtquery;
mod ternary;
mod tsquery;
mod walker;

pub use label::LabelPattern;
pub use lquery::{Lquery, LqueryLevel, QUANTIFIER_MAX};
pub use ltxtquery::Ltxtquery;
pub use ternary::Ternary;
pub use tsquery::{TsAtom, TsQuery};
pub use walker::{BoolOp, BoolQuery, QueryExpr, QueryItem, MAX_STACK_DEPTH};
