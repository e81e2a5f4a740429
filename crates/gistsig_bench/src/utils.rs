//! Benchmark utilities.
//!
//! Every generator takes a seed so runs are comparable.

use gistsig_core::value::{Hstore, Ltree, TsVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A seeded random number generator.
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

fn word(rng: &mut StdRng, alphabet: u8, max_len: usize) -> String {
    let len = rng.gen_range(1..=max_len);
    (0..len)
        .map(|_| char::from(b'a' + rng.gen_range(0..alphabet)))
        .collect()
}

/// Generate `count` hstore values of `pairs` random pairs each.
pub fn generate_hstores(seed: u64, count: usize, pairs: usize) -> Vec<Hstore> {
    let mut rng = rng(seed);
    (0..count)
        .map(|_| {
            (0..pairs)
                .map(|_| {
                    let key = word(&mut rng, 26, 8);
                    let value = rng.gen_bool(0.9).then(|| word(&mut rng, 26, 12));
                    (key, value)
                })
                .collect()
        })
        .collect()
}

/// Generate `count` paths of up to `depth` labels drawn from a small
/// alphabet, so that prefixes are shared.
pub fn generate_paths(seed: u64, count: usize, depth: usize) -> Vec<Ltree> {
    let mut rng = rng(seed);
    (0..count)
        .map(|_| {
            let levels = rng.gen_range(1..=depth);
            let labels: Vec<String> = (0..levels).map(|_| word(&mut rng, 4, 3)).collect();
            Ltree::new(labels).unwrap_or_default()
        })
        .collect()
}

/// Generate `count` documents of `words` random lexemes each.
pub fn generate_documents(seed: u64, count: usize, words: usize) -> Vec<TsVector> {
    let mut rng = rng(seed);
    (0..count)
        .map(|_| TsVector::from_words((0..words).map(|_| word(&mut rng, 26, 10)).collect::<Vec<_>>()))
        .collect()
}
