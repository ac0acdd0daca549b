//! Seeded k-means++ initialization and reseeding of empty clusters.

use super::squared_distance;

use log::trace;
use rand::{distributions::WeightedIndex, prelude::Distribution};
use rand_distr::{weighted_alias::WeightedAliasIndex, Uniform};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// The number of pixels behind the color at index `i`.
#[inline]
pub(super) fn weight(counts: Option<&[u32]>, i: usize) -> u32 {
    counts.map_or(1, |counts| counts[i])
}

#[inline]
fn to_f64(color: [u8; 3]) -> [f64; 3] {
    color.map(f64::from)
}

/// Draws an index with probability proportional to `weights`.
///
/// Returns `None` if every weight is zero.
fn sample_weighted(weights: Vec<f64>, rng: &mut Xoroshiro128PlusPlus) -> Option<usize> {
    // WeightedIndex::new fails if:
    // - The vector is empty => callers have at least one color
    // - A weight is negative or not finite => squared distances times counts are neither
    // - The sum of weights is zero => every remaining color coincides with a centroid
    // Unlike the alias method, the cumulative search never draws a zero weight.
    WeightedIndex::new(weights)
        .ok()
        .map(|distribution| distribution.sample(rng))
}

/// Draws a pixel uniformly, so a deduplicated color is drawn proportional to its count.
fn sample_pixel(len: usize, counts: Option<&[u32]>, rng: &mut Xoroshiro128PlusPlus) -> usize {
    let alias = counts.and_then(|counts| {
        WeightedAliasIndex::new(counts.iter().copied().map(u64::from).collect()).ok()
    });

    match alias {
        Some(distribution) => distribution.sample(rng),
        None => Uniform::new(0, len).sample(rng),
    }
}

/// The weighted squared distance of every color to its nearest anchor.
fn weighted_distances(
    colors: &[[u8; 3]],
    counts: Option<&[u32]>,
    min_distance: impl Fn(usize, [f64; 3]) -> f64,
) -> Vec<f64> {
    colors
        .iter()
        .enumerate()
        .map(|(i, &color)| min_distance(i, to_f64(color)) * f64::from(weight(counts, i)))
        .collect()
}

/// Picks `k` initial centroids with k-means++.
///
/// The first centroid is a uniformly drawn pixel. Every following centroid is a pixel drawn with
/// probability proportional to its squared distance to the nearest centroid chosen so far.
/// Once every pixel coincides with a chosen centroid, the remaining centroids are drawn uniformly,
/// which yields duplicates that the update step sees as empty clusters.
///
/// `colors` must not be empty.
pub(super) fn kmeans_plus_plus(
    colors: &[[u8; 3]],
    counts: Option<&[u32]>,
    k: usize,
    rng: &mut Xoroshiro128PlusPlus,
) -> Vec<[f64; 3]> {
    let first = to_f64(colors[sample_pixel(colors.len(), counts, rng)]);

    let mut centroids = Vec::with_capacity(k);
    centroids.push(first);

    let mut nearest = colors
        .iter()
        .map(|&color| squared_distance(to_f64(color), first))
        .collect::<Vec<_>>();

    while centroids.len() < k {
        let weights = weighted_distances(colors, counts, |i, _| nearest[i]);
        let next = match sample_weighted(weights, rng) {
            Some(i) => i,
            None => {
                trace!(
                    "fewer distinct colors than clusters, drawing centroid {} uniformly",
                    centroids.len()
                );
                sample_pixel(colors.len(), counts, rng)
            }
        };

        let centroid = to_f64(colors[next]);
        for (dist, &color) in nearest.iter_mut().zip(colors) {
            *dist = dist.min(squared_distance(to_f64(color), centroid));
        }
        centroids.push(centroid);
    }

    centroids
}

/// Picks a new centroid for an empty cluster with the k-means++ rule,
/// measuring distances to the `anchors` (the centroids of non-empty clusters).
///
/// Returns `None` if every color coincides with an anchor.
pub(super) fn reseed(
    colors: &[[u8; 3]],
    counts: Option<&[u32]>,
    anchors: &[[f64; 3]],
    rng: &mut Xoroshiro128PlusPlus,
) -> Option<[f64; 3]> {
    let weights = weighted_distances(colors, counts, |_, color| {
        anchors
            .iter()
            .map(|&anchor| squared_distance(anchor, color))
            .fold(f64::INFINITY, f64::min)
    });

    sample_weighted(weights, rng).map(|i| to_f64(colors[i]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn kmeans_plus_plus_picks_distinct_colors() {
        let colors = [[0, 0, 0], [0, 0, 0], [90, 0, 0], [0, 90, 0], [0, 0, 90]];

        for seed in 0..32 {
            let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(seed);
            let mut centroids = kmeans_plus_plus(&colors, None, 4, rng);
            centroids.sort_by(|a, b| a.partial_cmp(b).unwrap());
            centroids.dedup();
            assert_eq!(centroids.len(), 4);
        }
    }

    #[test]
    fn kmeans_plus_plus_is_deterministic() {
        let colors = (0..=255).map(|c| [c, 255 - c, c / 2]).collect::<Vec<_>>();
        let counts = (1..=256).collect::<Vec<u32>>();

        let run = || {
            let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(3);
            kmeans_plus_plus(&colors, Some(counts.as_slice()), 8, rng)
        };

        let a = run();
        let b = run();
        assert_eq!(a, b);
    }

    #[test]
    fn duplicates_once_colors_run_out() {
        let colors = [[5, 5, 5], [200, 200, 200]];
        let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(0);
        let centroids = kmeans_plus_plus(&colors, Some(&[3, 1][..]), 3, rng);
        assert_eq!(centroids.len(), 3);
        assert!(centroids.iter().all(|c| *c == [5.0; 3] || *c == [200.0; 3]));
    }

    #[test]
    fn reseed_avoids_anchors() {
        let colors = [[1, 2, 3], [1, 2, 3], [40, 50, 60]];
        let anchors = [[1.0, 2.0, 3.0]];
        for seed in 0..16 {
            let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(seed);
            assert_eq!(reseed(&colors, None, &anchors, rng), Some([40.0, 50.0, 60.0]));
        }
    }

    #[test]
    fn reseed_fails_without_distinct_colors() {
        let colors = [[7, 7, 7]; 4];
        let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(0);
        assert_eq!(reseed(&colors, None, &[[7.0; 3]], rng), None);
    }
}
