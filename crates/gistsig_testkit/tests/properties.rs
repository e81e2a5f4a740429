//! Property tests for the opclass invariants.

use gistsig_codec::GTHDRSIZE;
use gistsig_core::opclass::{
    Entry, HstoreOperand, HstoreOps, LtreeArrayOps, LtreeOperand, LtreeOps, OpClass, TsvectorOps,
};
use gistsig_core::value::{ArrayArg, Hstore, Ltree};
use gistsig_core::{hash_bit, Cover, GistKey, IndexOptions, SigLen, Signature};
use gistsig_testkit::prelude::*;
use proptest::prelude::*;

fn hstore_ops(siglen: SigLen) -> HstoreOps {
    HstoreOps::with_options(IndexOptions::new(siglen))
}

fn bitmap(cover: Cover) -> GistKey {
    GistKey::signature_key(cover, None)
}

/// A probe built from some of the pairs of `value`, so it is contained.
fn sub_hstore(value: &Hstore, mask: &[bool]) -> Hstore {
    value
        .iter()
        .zip(mask.iter().chain(std::iter::repeat(&false)))
        .filter(|(_, keep)| **keep)
        .map(|(pair, _)| pair)
        .collect()
}

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn inclusion_holds_in_hstore_trees(
        siglen in siglen_strategy(8),
        rows in prop::collection::vec(hstore_strategy(), 1..40),
    ) {
        let mut tree = GistTree::with_capacity(hstore_ops(siglen), 4);
        tree.extend(rows).unwrap();
        prop_assert_eq!(tree.verify_inclusion(), Ok(()));
    }

    #[test]
    fn inclusion_holds_in_ltree_trees(rows in prop::collection::vec(ltree_strategy(4), 1..40)) {
        let mut tree = GistTree::with_capacity(LtreeOps::with_options(IndexOptions::new(SigLen::new(4).unwrap())), 3);
        tree.extend(rows).unwrap();
        prop_assert_eq!(tree.verify_inclusion(), Ok(()));
    }

    #[test]
    fn union_is_idempotent_and_commutative(
        a in cover_strategy(SigLen::new(4).unwrap()),
        b in cover_strategy(SigLen::new(4).unwrap()),
    ) {
        let ops = hstore_ops(SigLen::new(4).unwrap());
        let (a, b) = (bitmap(a), bitmap(b));
        let ab = ops.union(&[a.clone(), b.clone()]).unwrap();
        let ba = ops.union(&[b, a.clone()]).unwrap();
        prop_assert!(ops.same(&ab, &ba));
        let again = ops.union(&[ab.clone(), a]).unwrap();
        prop_assert!(ops.same(&again, &ab));
    }

    #[test]
    fn same_is_reflexive(
        value in hstore_strategy(),
        doc in tsvector_strategy(20),
        path in ltree_strategy(4),
    ) {
        let hstore = hstore_ops(SigLen::new(2).unwrap());
        let key = hstore.compress(Entry::Leaf(&value)).unwrap();
        prop_assert!(hstore.same(&key, &key.clone()));

        let tsvector = TsvectorOps::with_options(IndexOptions::new(SigLen::new(2).unwrap()));
        let key = tsvector.compress(Entry::Leaf(&doc)).unwrap();
        prop_assert!(tsvector.same(&key, &key.clone()));

        let ltree = LtreeOps::with_options(IndexOptions::new(SigLen::new(4).unwrap()));
        let leaf = ltree.compress(Entry::Leaf(&path)).unwrap();
        prop_assert!(ltree.same(&leaf, &leaf.clone()));
        let internal = ltree.union(&[leaf]).unwrap();
        prop_assert!(ltree.same(&internal, &internal.clone()));
    }

    #[test]
    fn penalty_is_non_negative_and_zero_on_itself(
        a in cover_strategy(SigLen::new(3).unwrap()),
        b in cover_strategy(SigLen::new(3).unwrap()),
        docs in prop::collection::vec(tsvector_strategy(10), 2),
        paths in prop::collection::vec(ltree_strategy(3), 2),
    ) {
        let hstore = hstore_ops(SigLen::new(3).unwrap());
        let (a, b) = (bitmap(a), bitmap(b));
        prop_assert!(hstore.penalty(&a, &b).unwrap() >= 0.0);
        prop_assert_eq!(hstore.penalty(&a, &a).unwrap(), 0.0);

        let tsvector = TsvectorOps::with_options(IndexOptions::new(SigLen::new(3).unwrap()));
        let keys: Vec<GistKey> = docs.iter().map(|d| tsvector.compress(Entry::Leaf(d)).unwrap()).collect();
        prop_assert!(tsvector.penalty(&keys[0], &keys[1]).unwrap() >= 0.0);
        prop_assert_eq!(tsvector.penalty(&keys[0], &keys[0]).unwrap(), 0.0);
        let all = GistKey::AllTrue { range: None };
        prop_assert!(tsvector.penalty(&all, &keys[1]).unwrap() >= 0.0);

        let ltree = LtreeOps::with_options(IndexOptions::new(SigLen::new(4).unwrap()));
        let leaves: Vec<GistKey> = paths.iter().map(|p| ltree.compress(Entry::Leaf(p)).unwrap()).collect();
        let parent = ltree.union(&leaves[..1]).unwrap();
        prop_assert!(ltree.penalty(&parent, &leaves[1]).unwrap() >= 0.0);
        prop_assert_eq!(ltree.penalty(&parent, &leaves[0]).unwrap(), 0.0);
    }

    #[test]
    fn all_true_absorbs_and_always_matches(
        cover in cover_strategy(SigLen::new(2).unwrap()),
        probe in hstore_strategy(),
        query in tsquery_strategy(),
        lquery in lquery_strategy(),
    ) {
        let ops = hstore_ops(SigLen::new(2).unwrap());
        let all = GistKey::AllTrue { range: None };
        let merged = ops.union(&[all.clone(), bitmap(cover)]).unwrap();
        prop_assert!(ops.same(&merged, &all));
        prop_assert!(ops.consistent(&all, 7, &HstoreOperand::Contains(probe)).unwrap().matches);

        let tsvector = TsvectorOps::with_options(IndexOptions::new(SigLen::new(2).unwrap()));
        prop_assert!(tsvector.consistent(&all, 1, &query).unwrap().matches);

        let arrays = LtreeArrayOps::with_options(IndexOptions::new(SigLen::new(4).unwrap()));
        prop_assert!(arrays.consistent(&all, 12, &LtreeOperand::Lquery(lquery)).unwrap().matches);
    }

    #[test]
    fn hstore_search_has_no_false_negatives(
        siglen in siglen_strategy(4),
        rows in prop::collection::vec(hstore_strategy(), 1..30),
        pick in any::<prop::sample::Index>(),
        mask in prop::collection::vec(any::<bool>(), 8),
        other in hstore_strategy(),
    ) {
        let mut tree = GistTree::with_capacity(hstore_ops(siglen), 4);
        tree.extend(rows.clone()).unwrap();
        let probes = [
            HstoreOperand::Contains(sub_hstore(&rows[pick.index(rows.len())], &mask)),
            HstoreOperand::Contains(other.clone()),
            HstoreOperand::Keys(other.iter().map(|(k, _)| k.to_owned()).collect()),
        ];
        for (strategy, operand) in [(7u16, &probes[0]), (7, &probes[1]), (10, &probes[2]), (11, &probes[2])] {
            let outcome = tree.search(strategy, operand).unwrap();
            prop_assert_eq!(outcome.sorted_matches(), tree.seq_scan(strategy, operand).unwrap());
        }
        for (key, _) in other.iter() {
            let operand = HstoreOperand::Exists(key.to_owned());
            prop_assert_eq!(tree.search(9, &operand).unwrap().sorted_matches(), tree.seq_scan(9, &operand).unwrap());
        }
    }

    #[test]
    fn tsvector_search_has_no_false_negatives(
        siglen in siglen_strategy(4),
        docs in prop::collection::vec(tsvector_strategy(12), 1..30),
        query in tsquery_strategy(),
    ) {
        let ops = TsvectorOps::with_options(IndexOptions::new(siglen));
        let mut tree = GistTree::with_capacity(ops, 4);
        tree.extend(docs).unwrap();
        let outcome = tree.search(1, &query).unwrap();
        prop_assert_eq!(outcome.sorted_matches(), tree.seq_scan(1, &query).unwrap());
    }

    #[test]
    fn ltree_search_has_no_false_negatives(
        paths in prop::collection::vec(ltree_strategy(4), 1..30),
        probe in ltree_strategy(3),
        lquery in lquery_strategy(),
        ltxtquery in ltxtquery_strategy(),
        stars in prop::collection::vec(any::<bool>(), 4),
    ) {
        let ops = LtreeOps::with_options(IndexOptions::new(SigLen::new(4).unwrap()));
        let mut tree = GistTree::with_capacity(ops, 3);
        tree.extend(paths.clone()).unwrap();
        let mut operands = vec![
            (1u16, LtreeOperand::Path(probe.clone())),
            (2, LtreeOperand::Path(probe.clone())),
            (3, LtreeOperand::Path(probe.clone())),
            (4, LtreeOperand::Path(probe.clone())),
            (5, LtreeOperand::Path(probe.clone())),
            (10, LtreeOperand::Path(probe.clone())),
            (11, LtreeOperand::Path(probe)),
            (12, LtreeOperand::Lquery(lquery.clone())),
            (14, LtreeOperand::Ltxtquery(ltxtquery)),
            (16, LtreeOperand::Lqueries(ArrayArg::new(vec![Some(lquery)]))),
        ];
        if let Some(exact) = lquery_matching(&paths[0], &stars) {
            operands.push((12, LtreeOperand::Lquery(exact)));
        }
        for (strategy, operand) in &operands {
            let outcome = tree.search(*strategy, operand).unwrap();
            prop_assert_eq!(
                outcome.sorted_matches(),
                tree.seq_scan(*strategy, operand).unwrap(),
                "strategy {}", strategy
            );
        }
    }

    #[test]
    fn ltree_array_search_has_no_false_negatives(
        rows in prop::collection::vec(ltree_array_strategy(), 1..20),
        probe in ltree_strategy(2),
        lquery in lquery_strategy(),
        ltxtquery in ltxtquery_strategy(),
    ) {
        let ops = LtreeArrayOps::with_options(IndexOptions::new(SigLen::new(4).unwrap()));
        let mut tree = GistTree::with_capacity(ops, 4);
        tree.extend(rows).unwrap();
        let operands = [
            (10u16, LtreeOperand::Path(probe.clone())),
            (11, LtreeOperand::Path(probe)),
            (12, LtreeOperand::Lquery(lquery.clone())),
            (14, LtreeOperand::Ltxtquery(ltxtquery)),
            (16, LtreeOperand::Lqueries(ArrayArg::new(vec![Some(lquery)]))),
        ];
        for (strategy, operand) in &operands {
            let outcome = tree.search(*strategy, operand).unwrap();
            prop_assert_eq!(outcome.sorted_matches(), tree.seq_scan(*strategy, operand).unwrap());
        }
    }

    #[test]
    fn picksplit_is_complete(covers in prop::collection::vec(cover_strategy(SigLen::new(2).unwrap()), 2..20)) {
        let ops = hstore_ops(SigLen::new(2).unwrap());
        let keys: Vec<GistKey> = covers.into_iter().map(bitmap).collect();
        let split = ops.picksplit(&keys).unwrap();
        prop_assert!(!split.left.is_empty() && !split.right.is_empty());
        let mut all: Vec<usize> = split.left.iter().chain(&split.right).copied().collect();
        all.sort_unstable();
        prop_assert_eq!(all, (0..keys.len()).collect::<Vec<_>>());
        let options = ops.options();
        for (side, union) in [(&split.left, &split.left_union), (&split.right, &split.right_union)] {
            for &i in side {
                prop_assert!(keys[i].cover(options).is_covered_by(&union.cover(options)));
            }
        }
    }

    #[test]
    fn encoded_keys_fit_the_signature_length(
        siglen in siglen_strategy(32),
        rows in prop::collection::vec(hstore_strategy(), 1..10),
    ) {
        let ops = hstore_ops(siglen);
        let mut keys: Vec<GistKey> = rows.iter().map(|r| ops.compress(Entry::Leaf(r)).unwrap()).collect();
        keys.push(ops.union(&keys).unwrap());
        for key in &keys {
            let len = ops.encode_key(key).unwrap().len();
            if key.is_all_true() {
                prop_assert_eq!(len, GTHDRSIZE);
            } else {
                prop_assert_eq!(len, GTHDRSIZE + siglen.bytes());
            }
            prop_assert_eq!(&ops.decode_key(&ops.encode_key(key).unwrap()).unwrap(), key);
        }
    }

    #[test]
    fn signature_holds_every_token(
        siglen in siglen_strategy(16),
        tokens in prop::collection::vec(any::<u32>(), 0..50),
    ) {
        let sign = Signature::from_tokens(siglen, tokens.iter().copied());
        for &token in &tokens {
            prop_assert!(sign.get(hash_bit(token, siglen.bytes())));
        }
    }

    #[test]
    fn union_of_singletons_is_the_pair(siglen in siglen_strategy(16), t1 in any::<u32>(), t2 in any::<u32>()) {
        let mut union = Cover::Bits(Signature::from_tokens(siglen, [t1]));
        union.union_with(&Cover::Bits(Signature::from_tokens(siglen, [t2])));
        prop_assert_eq!(union, Cover::Bits(Signature::from_tokens(siglen, [t1, t2])));
    }
}

#[test]
fn saturated_bitmap_is_promoted_by_compress() {
    for siglen in [1, 2, 16] {
        let siglen = SigLen::new(siglen).unwrap();
        let full = GistKey::Bitmap {
            sign: Signature::full(siglen),
            range: None,
        };
        let hstore = hstore_ops(siglen);
        assert!(hstore.compress(Entry::Key(&full)).unwrap().is_all_true());
        let tsvector = TsvectorOps::with_options(IndexOptions::new(siglen));
        assert!(tsvector.compress(Entry::Key(&full)).unwrap().is_all_true());
    }
    let arrays = LtreeArrayOps::with_options(IndexOptions::new(SigLen::new(4).unwrap()));
    let full = GistKey::Bitmap {
        sign: Signature::full(SigLen::new(4).unwrap()),
        range: None,
    };
    assert_eq!(arrays.compress(Entry::Key(&full)).unwrap(), GistKey::AllTrue { range: None });
}

#[test]
fn ltree_union_of_saturated_children_keeps_bounds() {
    let ops = LtreeOps::with_options(IndexOptions::new(SigLen::new(4).unwrap()));
    let children: Vec<Ltree> = (0..64).map(|i| format!("n{i}").parse().unwrap()).collect();
    let leaves: Vec<GistKey> = children
        .iter()
        .map(|p| ops.compress(Entry::Leaf(p)).unwrap())
        .collect();
    let parent = ops.union(&leaves).unwrap();
    assert!(parent.is_all_true());
    let range = parent.range().unwrap();
    assert_eq!(range.lower(), children.iter().min().unwrap());
    assert_eq!(range.upper(), children.iter().max().unwrap());
}
