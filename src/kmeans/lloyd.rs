use super::{seeding, squared_distance, Centroid, Clustering, KmeansOptions, StopReason};

use crate::{ColorComponents, ColorCounts, Error, PaletteSize, Result};

use std::marker::PhantomData;

use log::{debug, trace, warn};
use rand_xoshiro::Xoroshiro128PlusPlus;

#[cfg(feature = "threads")]
use rayon::prelude::*;

/// Returns the index of the centroid nearest to `color`, preferring the lowest index on ties.
#[inline]
fn nearest(centroids: &[[f64; 3]], color: [f64; 3]) -> u8 {
    let mut min_index = 0;
    let mut min_distance = f64::INFINITY;
    for (i, &centroid) in centroids.iter().enumerate() {
        let distance = squared_distance(centroid, color);
        if distance < min_distance {
            min_distance = distance;
            min_index = i;
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    {
        min_index as u8
    }
}

/// Channel sums and pixel count of one cluster.
///
/// Sums are exact integers, so they do not depend on the order pixels are added in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct ClusterSum {
    sum: [u64; 3],
    count: u64,
}

impl ClusterSum {
    #[inline]
    fn add(&mut self, color: [u8; 3], weight: u32) {
        let weight = u64::from(weight);
        for (sum, c) in self.sum.iter_mut().zip(color) {
            *sum += u64::from(c) * weight;
        }
        self.count += weight;
    }

    fn merge(mut self, other: Self) -> Self {
        for (sum, s) in self.sum.iter_mut().zip(other.sum) {
            *sum += s;
        }
        self.count += other.count;
        self
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean(self) -> Option<[f64; 3]> {
        (self.count > 0).then(|| {
            let count = self.count as f64;
            self.sum.map(|s| s as f64 / count)
        })
    }
}

/// The transient state of one clustering run.
pub(super) struct State<'a, Color, ColorCount>
where
    Color: ColorComponents<u8, 3>,
    ColorCount: ColorCounts<Color, u8, 3>,
{
    _phantom: PhantomData<Color>,
    color_counts: &'a ColorCount,
    options: &'a KmeansOptions,
    rng: Xoroshiro128PlusPlus,
    centroids: Vec<[f64; 3]>,
    /// Whether every pixel has the same color.
    single_color: bool,
    /// Pixels per cluster as of the last update step.
    counts: Vec<u32>,
    /// Cluster index for each entry of `color_counts.colors()`.
    labels: Vec<u8>,
}

impl<'a, Color, ColorCount> State<'a, Color, ColorCount>
where
    Color: ColorComponents<u8, 3>,
    ColorCount: ColorCounts<Color, u8, 3>,
{
    /// Seeds the centroids. `k` and `color_counts` must already be validated.
    pub(super) fn new(
        color_counts: &'a ColorCount,
        k: PaletteSize,
        options: &'a KmeansOptions,
        mut rng: Xoroshiro128PlusPlus,
    ) -> Self {
        let k = usize::from(k.into_inner());
        let colors = color_counts.color_components();

        let centroids = seeding::kmeans_plus_plus(colors, color_counts.counts(), k, &mut rng);
        let single_color = colors.iter().all(|&color| color == colors[0]);

        debug!(
            "seeded {k} centroids over {} colors ({} pixels)",
            color_counts.len(),
            color_counts.total_count(),
        );

        Self {
            _phantom: PhantomData,
            color_counts,
            options,
            rng,
            centroids,
            single_color,
            counts: vec![0; k],
            labels: vec![0; color_counts.len()],
        }
    }

    /// Assigns every color to its nearest centroid and returns how many colors changed cluster.
    pub(super) fn assign(&mut self) -> usize {
        let Self { color_counts, centroids, labels, .. } = self;
        let centroids = &*centroids;

        labels
            .iter_mut()
            .zip(color_counts.color_components())
            .map(|(label, color)| {
                let new = nearest(centroids, color.map(f64::from));
                let changed = *label != new;
                *label = new;
                usize::from(changed)
            })
            .sum()
    }

    /// Sums the colors assigned to each cluster.
    pub(super) fn accumulate(&self) -> Vec<ClusterSum> {
        let colors = self.color_counts.color_components();
        let counts = self.color_counts.counts();

        let mut sums = vec![ClusterSum::default(); self.centroids.len()];
        for (i, (&color, &label)) in colors.iter().zip(&self.labels).enumerate() {
            sums[usize::from(label)].add(color, seeding::weight(counts, i));
        }
        sums
    }

    /// Moves each centroid to the mean of its colors and reseeds empty clusters.
    ///
    /// Returns the summed distance the centroids moved.
    fn update(&mut self, sums: &[ClusterSum], iteration: u32) -> Result<f64> {
        let mut movement = 0.0;
        let mut empty = Vec::new();

        for (i, sum) in sums.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            {
                // at most MAX_PIXELS
                self.counts[i] = sum.count as u32;
            }

            if let Some(mean) = sum.mean() {
                movement += squared_distance(self.centroids[i], mean).sqrt();
                self.centroids[i] = mean;
            } else {
                empty.push(i);
            }
        }

        if empty.is_empty() {
            return Ok(movement);
        }

        let mut anchors = self
            .centroids
            .iter()
            .zip(&self.counts)
            .filter(|&(_, &count)| count > 0)
            .map(|(&centroid, _)| centroid)
            .collect::<Vec<_>>();

        for i in empty {
            let seed = seeding::reseed(
                self.color_counts.color_components(),
                self.color_counts.counts(),
                &anchors,
                &mut self.rng,
            );

            #[allow(clippy::cast_possible_truncation)]
            let cluster = i as u8;

            if let Some(seed) = seed {
                debug!("reseeded empty cluster {cluster} in iteration {iteration}");
                movement += squared_distance(self.centroids[i], seed).sqrt();
                self.centroids[i] = seed;
                anchors.push(seed);
            } else if !self.single_color {
                // fewer distinct colors than clusters, every color already has its own centroid
                debug!("no distinct color is left to reseed cluster {cluster}, keeping it empty");
            } else if self.options.keep_empty_clusters {
                warn!("the input is a single color, keeping cluster {cluster} empty");
            } else {
                return Err(Error::DegenerateReseedFailure { cluster, iteration });
            }
        }

        Ok(movement)
    }

    /// Runs Lloyd's algorithm with the given assignment and accumulation steps.
    ///
    /// Each step returns only once it has visited every color,
    /// so an update never observes a partially updated assignment.
    pub(super) fn run(
        mut self,
        mut assign: impl FnMut(&mut Self) -> usize,
        accumulate: impl Fn(&Self) -> Vec<ClusterSum>,
    ) -> Result<Clustering> {
        let mut stop_reason = StopReason::MaxIterations;
        let mut iterations = 0;

        for iteration in 0..self.options.max_iterations {
            iterations = iteration + 1;

            let changed = assign(&mut self);
            if iteration > 0 && changed == 0 {
                stop_reason = StopReason::Stable;
                break;
            }

            let sums = accumulate(&self);
            let movement = self.update(&sums, iteration)?;
            trace!(
                "iteration {iteration}: {changed} colors changed cluster, movement {movement}"
            );

            if movement < self.options.tolerance {
                stop_reason = StopReason::Tolerance;
                break;
            }
        }

        let inertia = self.inertia();
        debug!(
            "k-means stopped after {iterations} iterations with inertia {inertia}: {stop_reason}"
        );

        let Self { centroids, counts, labels, .. } = self;
        Ok(Clustering {
            centroids: centroids.into_iter().map(Centroid).collect(),
            assignment: labels,
            counts,
            inertia,
            iterations,
            stop_reason,
        })
    }

    /// The weighted sum of squared distances of every color to its assigned centroid.
    ///
    /// Summed sequentially so parallel runs get the same value.
    fn inertia(&self) -> f64 {
        let colors = self.color_counts.color_components();
        let counts = self.color_counts.counts();

        colors
            .iter()
            .zip(&self.labels)
            .enumerate()
            .map(|(i, (&color, &label))| {
                let distance =
                    squared_distance(self.centroids[usize::from(label)], color.map(f64::from));
                distance * f64::from(seeding::weight(counts, i))
            })
            .sum()
    }
}

#[cfg(feature = "threads")]
impl<'a, Color, ColorCount> State<'a, Color, ColorCount>
where
    Color: ColorComponents<u8, 3> + Send + Sync,
    ColorCount: ColorCounts<Color, u8, 3> + Sync,
{
    /// Parallel version of [`State::assign`].
    pub(super) fn assign_par(&mut self) -> usize {
        let Self { color_counts, centroids, labels, .. } = self;
        let centroids = &*centroids;

        labels
            .par_iter_mut()
            .zip(color_counts.color_components())
            .map(|(label, color)| {
                let new = nearest(centroids, color.map(f64::from));
                let changed = *label != new;
                *label = new;
                usize::from(changed)
            })
            .sum()
    }

    /// Parallel version of [`State::accumulate`].
    pub(super) fn accumulate_par(&self) -> Vec<ClusterSum> {
        let colors = self.color_counts.color_components();
        let counts = self.color_counts.counts();
        let k = self.centroids.len();

        colors
            .par_iter()
            .zip(&self.labels)
            .enumerate()
            .fold(
                || vec![ClusterSum::default(); k],
                |mut sums, (i, (&color, &label))| {
                    sums[usize::from(label)].add(color, seeding::weight(counts, i));
                    sums
                },
            )
            .reduce(
                || vec![ClusterSum::default(); k],
                |a, b| a.into_iter().zip(b).map(|(a, b)| a.merge(b)).collect(),
            )
    }
}
