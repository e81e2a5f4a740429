//! An in-memory GiST host for exercising operator classes.
//!
//! [`GistTree`] plays the part of the index access method: it inserts by
//! descending along the smallest penalty, splits overflowing pages with the
//! opclass picksplit, and searches with consistent followed by recheck.

use gistsig_core::{Entry, GistKey, IndexResult, OpClass};
use std::sync::Once;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber once per process. `RUST_LOG` selects the level.
pub fn init_test_tracing() {
    static START: Once = Once::new();
    START.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Default number of entries per page.
pub const DEFAULT_PAGE_CAPACITY: usize = 8;

#[derive(Debug)]
enum Node {
    Leaf(Vec<LeafEntry>),
    Internal(Vec<Downlink>),
}

#[derive(Debug)]
struct LeafEntry {
    key: GistKey,
    tid: usize,
}

#[derive(Debug)]
struct Downlink {
    key: GistKey,
    child: Box<Node>,
}

/// Result of [`GistTree::search`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Row ids that satisfied the exact operator, in index order.
    pub matches: Vec<usize>,
    /// Leaf entries reported by consistent.
    pub candidates: usize,
    /// Candidates rejected by recheck.
    pub false_positives: usize,
    /// Pages read.
    pub pages_visited: usize,
}

impl SearchOutcome {
    /// Matching row ids in ascending order.
    pub fn sorted_matches(&self) -> Vec<usize> {
        let mut tids = self.matches.clone();
        tids.sort_unstable();
        tids
    }
}

/// A GiST index over values kept in an in-memory heap.
pub struct GistTree<O: OpClass> {
    ops: O,
    capacity: usize,
    root: Node,
    heap: Vec<O::Value>,
}

impl<O: OpClass> GistTree<O> {
    /// Creates an empty index with the default page capacity.
    pub fn new(ops: O) -> Self {
        Self::with_capacity(ops, DEFAULT_PAGE_CAPACITY)
    }

    /// Creates an empty index holding at most `capacity` entries per page.
    pub fn with_capacity(ops: O, capacity: usize) -> Self {
        Self {
            ops,
            capacity: capacity.max(2),
            root: Node::Leaf(Vec::new()),
            heap: Vec::new(),
        }
    }

    /// The opclass.
    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if no row has been inserted.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The row stored under `tid`.
    pub fn value(&self, tid: usize) -> Option<&O::Value> {
        self.heap.get(tid)
    }

    /// Number of levels; a tree with only a leaf root has height 1.
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = &self.root;
        while let Node::Internal(children) = node {
            height += 1;
            match children.first() {
                Some(first) => node = &first.child,
                None => break,
            }
        }
        height
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::Leaf(_) => 1,
                Node::Internal(children) => {
                    1 + children.iter().map(|d| count(&d.child)).sum::<usize>()
                }
            }
        }
        count(&self.root)
    }

    /// Inserts a row and returns its id.
    pub fn insert(&mut self, value: O::Value) -> IndexResult<usize> {
        let tid = self.heap.len();
        let key = self.ops.compress(Entry::Leaf(&value))?;
        self.heap.push(value);
        if let Some((left, right)) = insert_into(&self.ops, self.capacity, &mut self.root, key, tid)? {
            debug!(tid, "root split");
            self.root = Node::Internal(vec![left, right]);
        }
        Ok(tid)
    }

    /// Inserts every row.
    pub fn extend<I>(&mut self, values: I) -> IndexResult<Vec<usize>>
    where
        I: IntoIterator<Item = O::Value>,
    {
        values.into_iter().map(|v| self.insert(v)).collect()
    }

    /// Runs an index scan.
    pub fn search(&self, strategy: u16, operand: &O::Operand) -> IndexResult<SearchOutcome> {
        let mut outcome = SearchOutcome::default();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            outcome.pages_visited += 1;
            match node {
                Node::Internal(children) => {
                    for downlink in children {
                        if self.ops.consistent(&downlink.key, strategy, operand)?.matches {
                            stack.push(&downlink.child);
                        }
                    }
                }
                Node::Leaf(entries) => {
                    for entry in entries {
                        let result = self.ops.consistent(&entry.key, strategy, operand)?;
                        if !result.matches {
                            continue;
                        }
                        outcome.candidates += 1;
                        if !result.recheck
                            || self.ops.recheck(&self.heap[entry.tid], strategy, operand)?
                        {
                            outcome.matches.push(entry.tid);
                        } else {
                            outcome.false_positives += 1;
                        }
                    }
                }
            }
        }
        Ok(outcome)
    }

    /// Row ids for which the exact operator holds, found without the index.
    pub fn seq_scan(&self, strategy: u16, operand: &O::Operand) -> IndexResult<Vec<usize>> {
        let mut tids = Vec::new();
        for (tid, value) in self.heap.iter().enumerate() {
            if self.ops.recheck(value, strategy, operand)? {
                tids.push(tid);
            }
        }
        Ok(tids)
    }

    /// Union of every key on the root page.
    pub fn root_key(&self) -> IndexResult<Option<GistKey>> {
        let keys: Vec<GistKey> = match &self.root {
            Node::Leaf(entries) => entries.iter().map(|e| e.key.clone()).collect(),
            Node::Internal(children) => children.iter().map(|d| d.key.clone()).collect(),
        };
        if keys.is_empty() {
            return Ok(None);
        }
        self.ops.union(&keys).map(Some)
    }

    /// Checks that every downlink covers all keys below it.
    pub fn verify_inclusion(&self) -> Result<(), String> {
        fn walk<O: OpClass>(ops: &O, parent: Option<&GistKey>, node: &Node) -> Result<(), String> {
            let keys: Vec<&GistKey> = match node {
                Node::Leaf(entries) => entries.iter().map(|e| &e.key).collect(),
                Node::Internal(children) => children.iter().map(|d| &d.key).collect(),
            };
            if let Some(parent) = parent {
                for key in &keys {
                    covers(ops, parent, key)?;
                }
            }
            if let Node::Internal(children) = node {
                for downlink in children {
                    walk(ops, Some(&downlink.key), &downlink.child)?;
                }
            }
            Ok(())
        }
        walk(&self.ops, None, &self.root)
    }
}

fn covers<O: OpClass>(ops: &O, parent: &GistKey, child: &GistKey) -> Result<(), String> {
    let options = ops.options();
    if !child.cover(options).is_covered_by(&parent.cover(options)) {
        return Err(format!("signature of {child} is not covered by {parent}"));
    }
    if let Some(range) = parent.range() {
        let (Some(lower), Some(upper)) = (child.lower(), child.upper()) else {
            return Err(format!("{child} has no bounds under a bounded parent"));
        };
        if lower.compare(range.lower()) < 0 || upper.compare(range.upper()) > 0 {
            return Err(format!(
                "bounds [{lower}, {upper}] escape [{}, {}]",
                range.lower(),
                range.upper()
            ));
        }
    }
    Ok(())
}

fn insert_into<O: OpClass>(
    ops: &O,
    capacity: usize,
    node: &mut Node,
    key: GistKey,
    tid: usize,
) -> IndexResult<Option<(Downlink, Downlink)>> {
    match node {
        Node::Leaf(entries) => {
            entries.push(LeafEntry { key, tid });
            if entries.len() <= capacity {
                return Ok(None);
            }
            let keys: Vec<GistKey> = entries.iter().map(|e| e.key.clone()).collect();
            let split = ops.picksplit(&keys)?;
            let mut slots: Vec<Option<LeafEntry>> = entries.drain(..).map(Some).collect();
            let left = take_all(&mut slots, &split.left);
            let right = take_all(&mut slots, &split.right);
            debug!(left = left.len(), right = right.len(), "leaf page split");
            Ok(Some((
                downlink(ops, split.left_union, Node::Leaf(left))?,
                downlink(ops, split.right_union, Node::Leaf(right))?,
            )))
        }
        Node::Internal(children) => {
            let mut best = 0;
            let mut best_penalty = f32::INFINITY;
            for (i, child) in children.iter().enumerate() {
                let penalty = ops.penalty(&child.key, &key)?;
                if penalty < best_penalty {
                    best = i;
                    best_penalty = penalty;
                }
            }

            let widened = ops.union(&[children[best].key.clone(), key.clone()])?;
            match insert_into(ops, capacity, &mut children[best].child, key, tid)? {
                Some((left, right)) => {
                    children[best] = left;
                    children.insert(best + 1, right);
                }
                None => children[best].key = ops.compress(Entry::Key(&widened))?,
            }
            if children.len() <= capacity {
                return Ok(None);
            }
            let keys: Vec<GistKey> = children.iter().map(|d| d.key.clone()).collect();
            let split = ops.picksplit(&keys)?;
            let mut slots: Vec<Option<Downlink>> = children.drain(..).map(Some).collect();
            let left = take_all(&mut slots, &split.left);
            let right = take_all(&mut slots, &split.right);
            debug!(left = left.len(), right = right.len(), "internal page split");
            Ok(Some((
                downlink(ops, split.left_union, Node::Internal(left))?,
                downlink(ops, split.right_union, Node::Internal(right))?,
            )))
        }
    }
}

fn take_all<T>(slots: &mut [Option<T>], positions: &[usize]) -> Vec<T> {
    positions.iter().filter_map(|&i| slots.get_mut(i)?.take()).collect()
}

fn downlink<O: OpClass>(ops: &O, key: GistKey, child: Node) -> IndexResult<Downlink> {
    Ok(Downlink {
        key: ops.compress(Entry::Key(&key))?,
        child: Box::new(child),
    })
}
