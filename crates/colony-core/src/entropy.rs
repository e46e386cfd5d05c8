//! Entropy and similarity primitives shared by the evaluator and the metrics.
//!
//! All functions here are total: empty inputs yield 0 rather than an error.

use crate::types::ObjectType;
use std::collections::BTreeMap;

/// Offset that keeps the positional proxy finite at coordinate 0
pub const POSITION_OFFSET: f64 = 0.01;

/// Moore radius for a neighborhood of `sigma_squared` cells
pub fn neighborhood_radius(sigma_squared: f64) -> i32 {
    let radius = ((sigma_squared.sqrt() - 1.0) / 2.0).floor();
    if radius.is_finite() && radius > 0.0 {
        radius as i32
    } else {
        0
    }
}

/// Discrete dissimilarity between two object types
pub fn dissimilarity(a: ObjectType, b: ObjectType) -> f64 {
    if a == b {
        0.0
    } else {
        1.0
    }
}

/// Similarity-weighted neighborhood density f*.
///
/// `reference` is the type the neighbors are compared against; with no
/// reference every neighbor counts as fully similar. A single neighbor whose
/// similarity is `<= 0` zeroes the whole score.
pub fn neighborhood_similarity<I>(
    reference: Option<ObjectType>,
    neighbor_types: I,
    alpha: f64,
    sigma_squared: f64,
) -> f64
where
    I: IntoIterator<Item = ObjectType>,
{
    let mut sum = 0.0;
    for neighbor in neighbor_types {
        let similarity = match reference {
            Some(reference) => 1.0 - dissimilarity(reference, neighbor) / alpha,
            None => 1.0,
        };
        if similarity <= 0.0 {
            return 0.0;
        }
        sum += similarity;
    }
    sum / sigma_squared
}

/// Shannon entropy (bits) of the relative type frequencies
pub fn shannon_entropy<I>(types: I) -> f64
where
    I: IntoIterator<Item = ObjectType>,
{
    let mut counts: BTreeMap<ObjectType, usize> = BTreeMap::new();
    let mut total = 0usize;
    for object_type in types {
        *counts.entry(object_type).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let entropy = counts
        .values()
        .map(|&count| {
            let p = count as f64 / total as f64;
            -p * p.log2()
        })
        .sum::<f64>();
    // a single type yields -0.0
    entropy.max(0.0)
}

/// Positional pseudo-entropy `-p * log2(p)` with `p = 1 / (coordinate + 0.01)`
pub fn positional_entropy(coordinate: i32) -> f64 {
    let p = 1.0 / (coordinate as f64 + POSITION_OFFSET);
    -p * p.log2()
}

pub fn carry_indicator(carrying: bool) -> f64 {
    if carrying {
        1.0
    } else {
        0.0
    }
}

/// Pickup probability `(k+ / (k+ + s))^2`
pub fn pickup_probability(pickup_threshold: f64, similarity: f64) -> f64 {
    (pickup_threshold / (pickup_threshold + similarity)).powi(2)
}

/// Drop probability `(s / (k- + s))^2`
pub fn drop_probability(drop_threshold: f64, similarity: f64) -> f64 {
    (similarity / (drop_threshold + similarity)).powi(2)
}
