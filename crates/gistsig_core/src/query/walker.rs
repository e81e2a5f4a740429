//! Boolean query layout and its evaluator.
//!
//! Queries are stored in polish notation: an operator is followed by its
//! right operand, and its left operand starts `left` items after the
//! operator. `NOT` takes the single operand that follows it.
//!
//! ```text
//! a & (b | !c)   =>   [&, |, !, c, b, a]     left offsets: & -> 5, | -> 3
//! ```
//!
//! Evaluation scans the items from the back with an explicit value stack,
//! so deeply nested queries cannot overflow the call stack.

use super::ternary::Ternary;
use crate::error::{IndexError, IndexResult};

/// Largest number of pending values during evaluation.
pub const MAX_STACK_DEPTH: usize = 4096;

/// Boolean operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
    /// Negation.
    Not,
}

/// One item of a polish-notation query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryItem<A> {
    /// An atom.
    Operand(A),
    /// An operator; `left` is the offset of the left operand (unused by `NOT`).
    Operator {
        /// The operator.
        op: BoolOp,
        /// Distance from this item to its left operand.
        left: usize,
    },
}

/// A validated polish-notation query over atoms of type `A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolQuery<A> {
    items: Vec<QueryItem<A>>,
}

impl<A> BoolQuery<A> {
    /// Validates a flat item list.
    pub fn new(items: Vec<QueryItem<A>>) -> IndexResult<Self> {
        let n = items.len();
        let mut size = vec![0usize; n];
        for i in (0..n).rev() {
            size[i] = match &items[i] {
                QueryItem::Operand(_) => 1,
                QueryItem::Operator { op, left } => {
                    let right = i + 1;
                    if right >= n {
                        return Err(IndexError::malformed_query(format!(
                            "operator at {i} has no operand"
                        )));
                    }
                    if *op == BoolOp::Not {
                        1 + size[right]
                    } else {
                        let at = i + left;
                        if *left == 0 || at >= n || right + size[right] != at {
                            return Err(IndexError::malformed_query(format!(
                                "left operand offset {left} of operator at {i} is invalid"
                            )));
                        }
                        1 + size[right] + size[at]
                    }
                }
            };
        }
        if n > 0 && size[0] != n {
            return Err(IndexError::malformed_query(format!(
                "expression covers {} of {n} items",
                size[0]
            )));
        }
        Ok(Self { items })
    }

    /// A query with no items.
    #[must_use]
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// The items in polish order.
    pub fn items(&self) -> &[QueryItem<A>] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true for the empty query.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the atoms.
    pub fn operands(&self) -> impl Iterator<Item = &A> {
        self.items.iter().filter_map(|item| match item {
            QueryItem::Operand(atom) => Some(atom),
            QueryItem::Operator { .. } => None,
        })
    }

    /// Evaluates the query.
    ///
    /// With `calcnot` unset every `NOT` yields `Yes`: a summary that says a
    /// token is present cannot prove that it is absent. The empty query
    /// evaluates to `No`.
    pub fn evaluate<F>(&self, calcnot: bool, mut check: F) -> IndexResult<Ternary>
    where
        F: FnMut(&A) -> Ternary,
    {
        let mut stack: Vec<Ternary> = Vec::new();
        for item in self.items.iter().rev() {
            let value = match item {
                QueryItem::Operand(atom) => check(atom),
                QueryItem::Operator { op, .. } => {
                    let right = pop(&mut stack)?;
                    match op {
                        BoolOp::Not if calcnot => right.not(),
                        BoolOp::Not => Ternary::Yes,
                        BoolOp::And => pop(&mut stack)?.and(right),
                        BoolOp::Or => pop(&mut stack)?.or(right),
                    }
                }
            };
            if stack.len() >= MAX_STACK_DEPTH {
                return Err(IndexError::StackDepthExceeded {
                    limit: MAX_STACK_DEPTH,
                });
            }
            stack.push(value);
        }
        Ok(stack.pop().unwrap_or(Ternary::No))
    }
}

fn pop(stack: &mut Vec<Ternary>) -> IndexResult<Ternary> {
    stack
        .pop()
        .ok_or_else(|| IndexError::malformed_query("operator without operand"))
}

/// Tree form of a boolean query, flattened by [`QueryExpr::into_query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpr<A> {
    /// An atom.
    Atom(A),
    /// Negation.
    Not(Box<QueryExpr<A>>),
    /// Conjunction.
    And(Box<QueryExpr<A>>, Box<QueryExpr<A>>),
    /// Disjunction.
    Or(Box<QueryExpr<A>>, Box<QueryExpr<A>>),
}

enum Task<A> {
    Visit(QueryExpr<A>),
    PatchLeft(usize),
}

impl<A> QueryExpr<A> {
    /// An atom.
    pub fn atom(atom: A) -> Self {
        Self::Atom(atom)
    }

    /// `!inner`.
    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// `left & right`.
    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    /// `left | right`.
    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    /// Flattens into polish notation.
    pub fn into_query(self) -> BoolQuery<A> {
        let mut items = Vec::new();
        let mut tasks = vec![Task::Visit(self)];
        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(Self::Atom(atom)) => items.push(QueryItem::Operand(atom)),
                Task::Visit(Self::Not(inner)) => {
                    items.push(QueryItem::Operator {
                        op: BoolOp::Not,
                        left: 0,
                    });
                    tasks.push(Task::Visit(*inner));
                }
                Task::Visit(Self::And(l, r)) => push_binary(&mut items, &mut tasks, BoolOp::And, *l, *r),
                Task::Visit(Self::Or(l, r)) => push_binary(&mut items, &mut tasks, BoolOp::Or, *l, *r),
                Task::PatchLeft(at) => {
                    let offset = items.len() - at;
                    if let Some(QueryItem::Operator { left, .. }) = items.get_mut(at) {
                        *left = offset;
                    }
                }
            }
        }
        BoolQuery { items }
    }
}

fn push_binary<A>(
    items: &mut Vec<QueryItem<A>>,
    tasks: &mut Vec<Task<A>>,
    op: BoolOp,
    left: QueryExpr<A>,
    right: QueryExpr<A>,
) {
    let at = items.len();
    items.push(QueryItem::Operator { op, left: 0 });
    tasks.push(Task::Visit(left));
    tasks.push(Task::PatchLeft(at));
    tasks.push(Task::Visit(right));
}

impl<A> From<QueryExpr<A>> for BoolQuery<A> {
    fn from(expr: QueryExpr<A>) -> Self {
        expr.into_query()
    }
}
