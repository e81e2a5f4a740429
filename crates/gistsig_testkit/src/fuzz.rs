//! Fuzz testing harnesses for gistsig.
//!
//! These targets take raw bytes and can be driven by cargo-fuzz or by the
//! seeded loops in this module's tests.

use crate::fixtures::GistTree;
use gistsig_codec::{Decode, Encode, KeyLayout};
use gistsig_core::opclass::{HstoreOperand, HstoreOps, LtreeOps, OpClass, TsvectorOps};
use gistsig_core::query::{BoolOp, BoolQuery, QueryItem, Ternary};
use gistsig_core::value::Hstore;
use gistsig_core::{GistKey, IndexOptions, OptionsBag, SigLen};

/// Signature lengths tried by [`fuzz_key_decode`].
pub const FUZZ_SIGLENS: [usize; 4] = [1, 4, 16, 124];

/// Fuzz target for key decoding.
///
/// Arbitrary bytes either decode to a key or are rejected with an error.
/// A decoded key re-encodes to a form that decodes back to the same key.
/// Decoding never panics.
pub fn fuzz_key_decode(data: &[u8]) {
    for siglen in FUZZ_SIGLENS {
        let layout = KeyLayout::new(siglen);
        if let Ok(key) = GistKey::decode(data, &layout) {
            let encoded = key.encode().expect("decoded key re-encodes");
            let again = GistKey::decode(&encoded, &layout).expect("canonical form decodes");
            assert_eq!(again, key, "decode/encode mismatch at siglen {siglen}");
        }
    }
}

/// Fuzz target for boolean query validation and evaluation.
///
/// Each pair of bytes becomes one item: the first picks an operator or an
/// operand, the second is the left offset of binary operators. Validation
/// may reject the list; accepted queries must evaluate without error.
pub fn fuzz_bool_query(data: &[u8]) {
    let items = data
        .chunks(2)
        .map(|chunk| {
            let offset = usize::from(chunk.get(1).copied().unwrap_or(1));
            match chunk[0] % 6 {
                0 => QueryItem::Operator {
                    op: BoolOp::Not,
                    left: 0,
                },
                1 => QueryItem::Operator {
                    op: BoolOp::And,
                    left: offset,
                },
                2 => QueryItem::Operator {
                    op: BoolOp::Or,
                    left: offset,
                },
                other => QueryItem::Operand(other),
            }
        })
        .collect();
    let Ok(query) = BoolQuery::new(items) else {
        return;
    };
    for calcnot in [true, false] {
        let result = query.evaluate(calcnot, |atom| match atom % 3 {
            0 => Ternary::No,
            1 => Ternary::Yes,
            _ => Ternary::Maybe,
        });
        assert!(result.is_ok(), "validated query failed to evaluate: {result:?}");
    }
}

/// Fuzz target for option parsing.
///
/// Arbitrary text is either rejected or resolves to a signature length in
/// range.
pub fn fuzz_options(data: &[u8]) {
    let text = String::from_utf8_lossy(data);
    let Ok(bag) = text.parse::<OptionsBag>() else {
        return;
    };
    let resolved = [
        HstoreOps::descriptor().resolve(&bag),
        LtreeOps::descriptor().resolve(&bag),
        TsvectorOps::descriptor().resolve(&bag),
    ];
    for options in resolved.into_iter().flatten() {
        let bytes = options.siglen.bytes();
        assert!((1..=gistsig_core::SIGLEN_MAX).contains(&bytes));
    }
}

/// Fuzz target for an hstore index.
///
/// Bytes are read as small key/value pairs; every row is indexed and then
/// looked up by each of its own pairs, which must be found.
pub fn fuzz_hstore_index(data: &[u8]) {
    let siglen = SigLen::new(1 + usize::from(data.first().copied().unwrap_or(0) % 4))
        .expect("small signature length");
    let ops = HstoreOps::with_options(IndexOptions::new(siglen));
    let mut tree = GistTree::with_capacity(ops, 4);
    let rows: Vec<Hstore> = data
        .chunks(4)
        .map(|chunk| {
            chunk
                .chunks(2)
                .map(|pair| {
                    let key = format!("k{}", pair[0] % 8);
                    let value = pair.get(1).filter(|v| **v % 5 != 0).map(|v| format!("v{}", v % 4));
                    (key, value)
                })
                .collect()
        })
        .collect();
    for row in &rows {
        tree.insert(row.clone()).expect("hstore insert");
    }
    for (tid, row) in rows.iter().enumerate() {
        for (key, value) in row.iter() {
            let probe: Hstore = [(key, value)].into_iter().collect();
            let found = tree
                .search(7, &HstoreOperand::Contains(probe))
                .expect("hstore search");
            assert!(found.matches.contains(&tid), "row {tid} lost under {key}");
        }
    }
}
