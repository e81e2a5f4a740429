//! Quadratic page split over signature covers.

use crate::error::{IndexError, IndexResult};
use crate::signature::Cover;
use tracing::debug;

/// Result of [`guttman_split`]: entry positions and the cover of each side.
#[derive(Debug, Clone)]
pub(crate) struct CoverSplit {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    pub left_union: Cover,
    pub right_union: Cover,
}

/// Bias toward the smaller side, growing with the cube of the imbalance.
fn wish(nleft: usize, nright: usize, k: f64) -> f64 {
    let diff = nleft as f64 - nright as f64;
    -(diff * diff * diff) * k
}

/// Splits `covers` in two.
///
/// The pair of entries farthest apart seeds the two sides. Seeds are placed
/// first; the remaining entries are visited by ascending difference of their
/// distances to the seeds, and each joins the side whose running union it is
/// closer to, biased by [`wish`].
pub(crate) fn guttman_split(covers: &[Cover], k: f64) -> IndexResult<CoverSplit> {
    let n = covers.len();
    if n < 2 {
        return Err(IndexError::TooFewEntries { count: n });
    }

    let mut waste: i64 = -1;
    let (mut seed_1, mut seed_2) = (0, 1);
    for i in 0..n {
        for j in i + 1..n {
            let distance = i64::from(covers[i].hemdist(&covers[j]));
            if distance > waste {
                waste = distance;
                seed_1 = i;
                seed_2 = j;
            }
        }
    }
    debug!(seed_1, seed_2, distance = waste, "picksplit seeds");

    let mut costs: Vec<(usize, u32)> = (0..n)
        .filter(|&j| j != seed_1 && j != seed_2)
        .map(|j| {
            let alpha = covers[seed_1].hemdist(&covers[j]);
            let beta = covers[seed_2].hemdist(&covers[j]);
            (j, alpha.abs_diff(beta))
        })
        .collect();
    costs.sort_by_key(|&(_, cost)| cost);

    let mut left = vec![seed_1];
    let mut right = vec![seed_2];
    let mut left_union = covers[seed_1].clone();
    let mut right_union = covers[seed_2].clone();
    for (j, _) in costs {
        let alpha = f64::from(left_union.hemdist(&covers[j]));
        let beta = f64::from(right_union.hemdist(&covers[j]));
        if alpha < beta + wish(left.len(), right.len(), k) {
            left_union.union_with(&covers[j]);
            left.push(j);
        } else {
            right_union.union_with(&covers[j]);
            right.push(j);
        }
    }
    debug!(left = left.len(), right = right.len(), "picksplit partition");

    Ok(CoverSplit {
        left,
        right,
        left_union,
        right_union,
    })
}
