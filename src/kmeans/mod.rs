//! Deterministic k-means clustering of RGB pixels.
//!
//! The clusterer runs Lloyd's algorithm in 3-dimensional RGB space:
//! 1. seed `k` centroids with k-means++, driven by [`KmeansOptions::seed`],
//! 2. assign every pixel to its nearest centroid (ties go to the lowest cluster index),
//! 3. move every centroid to the mean of its assigned pixels, reseeding clusters that became empty,
//! 4. repeat until no assignment changes, the centroids stop moving,
//!    or the iteration limit is reached.
//!
//! With [`KmeansOptions::restarts`], the whole loop runs several times from different seeds
//! and the run with the lowest [`Clustering::inertia`] is kept.
//!
//! The same pixels, `k`, and options always give the same [`Clustering`],
//! and [`cluster_par`] returns exactly what [`cluster`] returns.
//!
//! # Examples
//! ```
//! # use swatch::{kmeans::{self, KmeansOptions, StopReason}, ColorSlice, PaletteSize};
//! # use palette::Srgb;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pixels = vec![Srgb::new(10, 10, 10), Srgb::new(12, 12, 12), Srgb::new(250, 0, 0)];
//! let pixels = ColorSlice::try_from(pixels.as_slice())?;
//!
//! let clustering = kmeans::cluster(pixels, 2.into(), &KmeansOptions::new().seed(7))?;
//! assert_eq!(clustering.assignment[0], clustering.assignment[1]);
//! assert_ne!(clustering.assignment[0], clustering.assignment[2]);
//! assert_eq!(clustering.stop_reason, StopReason::Stable);
//! # Ok(())
//! # }
//! ```

mod lloyd;
mod seeding;

use crate::{
    summarize, ColorComponents, ColorCounts, ColorRecord, ColorSlice, Error, IndexedColorCounts,
    PaletteSize, Result,
};

use lloyd::State;

use log::debug;
use palette::{cast, Srgb};
use rand::SeedableRng;
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::{fmt, mem};

/// The mean point of a cluster in RGB space, with floating point channels.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(transparent)]
pub struct Centroid(pub [f64; 3]);

impl Centroid {
    /// Creates a new [`Centroid`] from its red, green, and blue channels.
    #[must_use]
    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self([red, green, blue])
    }

    /// Returns the channels as an array.
    #[must_use]
    pub const fn components(self) -> [f64; 3] {
        self.0
    }

    /// Rounds each channel half away from zero and clamps it to `[0, 255]`.
    #[must_use]
    pub fn to_srgb(self) -> Srgb<u8> {
        let [r, g, b] = self.0.map(round_channel);
        Srgb::new(r, g, b)
    }

    /// The squared Euclidean distance to `other`.
    #[must_use]
    pub fn squared_distance(self, other: Self) -> f64 {
        squared_distance(self.0, other.0)
    }
}

impl From<[u8; 3]> for Centroid {
    fn from(color: [u8; 3]) -> Self {
        Self(color.map(f64::from))
    }
}

impl From<Srgb<u8>> for Centroid {
    fn from(color: Srgb<u8>) -> Self {
        Self::from(cast::into_array(color))
    }
}

/// Rounds a channel value half away from zero and clamps it to `[0, 255]`.
///
/// `NaN` maps to `0`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_channel(value: f64) -> u8 {
    // float to int `as` casts saturate, and NaN becomes 0
    value.round() as u8
}

/// Sum of squared per-channel differences.
#[inline]
pub(crate) fn squared_distance<const N: usize>(x: [f64; N], y: [f64; N]) -> f64 {
    let mut dist = 0.0;
    for c in 0..N {
        let diff = x[c] - y[c];
        dist += diff * diff;
    }
    dist
}

/// Why the clustering loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// No pixel changed cluster between two consecutive iterations.
    Stable,
    /// The summed centroid movement of an iteration fell below [`KmeansOptions::tolerance`].
    Tolerance,
    /// [`KmeansOptions::max_iterations`] iterations were run.
    MaxIterations,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Stable => write!(f, "no assignment changed"),
            StopReason::Tolerance => write!(f, "centroid movement below tolerance"),
            StopReason::MaxIterations => write!(f, "reached the iteration limit"),
        }
    }
}

/// The result of [`cluster`]: final centroids and the cluster of every pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// One centroid per cluster, indexed by cluster.
    pub centroids: Vec<Centroid>,
    /// The cluster index of each input pixel, in input order.
    pub assignment: Vec<u8>,
    /// The number of pixels assigned to each cluster.
    pub counts: Vec<u32>,
    /// The sum of squared distances of every pixel to its cluster's centroid.
    pub inertia: f64,
    /// The number of assignment steps that were run (in the kept restart).
    pub iterations: u32,
    /// The condition that ended the loop.
    pub stop_reason: StopReason,
}

impl Clustering {
    /// Summarizes this clustering into an ordered list of [`ColorRecord`]s.
    ///
    /// # Errors
    /// See [`summarize`].
    pub fn summarize(&self) -> Result<Vec<ColorRecord>> {
        summarize(&self.centroids, &self.assignment)
    }
}

/// A builder struct to specify the parameters for k-means.
///
/// # Examples
/// ```
/// # use swatch::KmeansOptions;
/// let options = KmeansOptions::new()
///     .seed(42)
///     .max_iterations(100)
///     .tolerance(1e-3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KmeansOptions {
    /// The seed value for the random number generator.
    pub(crate) seed: u64,
    /// The maximum number of assign/update iterations.
    pub(crate) max_iterations: u32,
    /// The summed centroid movement below which the loop stops.
    pub(crate) tolerance: f64,
    /// Whether to cluster unique colors weighted by their counts instead of every pixel.
    pub(crate) dedup_pixels: bool,
    /// Whether an empty cluster that cannot be reseeded is kept instead of failing.
    pub(crate) keep_empty_clusters: bool,
    /// The number of independently seeded runs.
    pub(crate) restarts: u32,
}

impl Default for KmeansOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl KmeansOptions {
    /// Creates a new [`KmeansOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            seed: 0,
            max_iterations: 300,
            tolerance: 1e-4,
            dedup_pixels: true,
            keep_empty_clusters: false,
            restarts: 1,
        }
    }

    /// Sets the seed value for the random number generator.
    ///
    /// The default seed is `0`.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the maximum number of iterations.
    ///
    /// The default is `300`. A value of `0` is rejected by [`cluster`].
    #[must_use]
    pub const fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the convergence tolerance, in channel units.
    ///
    /// Clustering stops once the centroids of an iteration moved less than this in total.
    /// The default is `1e-4`. Negative or `NAN` tolerances are rejected by [`cluster`],
    /// and a tolerance of `0` disables this stop condition.
    #[must_use]
    pub const fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets whether to deduplicate pixels before clustering.
    ///
    /// Clustering unique colors weighted by their counts gives the same kind of partition
    /// as clustering every pixel, but is much faster on images with repeated colors.
    /// The random seeding draws over unique colors instead of pixel positions,
    /// so the two settings may pick different initial centroids for the same seed.
    ///
    /// The default is `true`.
    #[must_use]
    pub const fn dedup_pixels(mut self, dedup_pixels: bool) -> Self {
        self.dedup_pixels = dedup_pixels;
        self
    }

    /// Sets whether to keep empty clusters when the input is a single solid color.
    ///
    /// With fewer distinct colors than clusters, the surplus clusters cannot be reseeded.
    /// They keep a duplicate centroid and report zero pixels whenever the input has
    /// at least two distinct colors. For a single color input and `k > 1`,
    /// this option decides: if `false`, [`cluster`] fails with [`Error::DegenerateReseedFailure`],
    /// and if `true`, the surplus clusters are kept like above.
    ///
    /// The default is `false`.
    #[must_use]
    pub const fn keep_empty_clusters(mut self, keep_empty_clusters: bool) -> Self {
        self.keep_empty_clusters = keep_empty_clusters;
        self
    }

    /// Sets the number of independently seeded runs, keeping the one with the lowest inertia.
    ///
    /// The first run uses [`seed`](KmeansOptions::seed) as is, so `restarts(1)` gives the
    /// same result as a single run. Every further run continues from a random number generator
    /// state jumped ahead of the previous one. Equal inertias keep the earlier run.
    ///
    /// The default is `1`. A value of `0` is rejected by [`cluster`].
    #[must_use]
    pub const fn restarts(mut self, restarts: u32) -> Self {
        self.restarts = restarts;
        self
    }

    /// Checks that every option has a usable value.
    fn validate(&self) -> Result<()> {
        if self.restarts == 0 {
            Err(Error::InvalidParameter {
                name: "restarts",
                message: "must be at least 1",
            })
        } else if self.max_iterations == 0 {
            Err(Error::InvalidParameter {
                name: "max_iterations",
                message: "must be at least 1",
            })
        } else if self.tolerance.is_nan() || self.tolerance < 0.0 {
            Err(Error::InvalidParameter {
                name: "tolerance",
                message: "must be a non-negative number",
            })
        } else {
            Ok(())
        }
    }
}

/// Checks the input length and palette size shared by every entry point.
fn validate<Color>(
    color_counts: &impl ColorCounts<Color, u8, 3>,
    k: PaletteSize,
    options: &KmeansOptions,
) -> Result<()>
where
    Color: ColorComponents<u8, 3>,
{
    if color_counts.total_count() == 0 || color_counts.is_empty() {
        return Err(Error::EmptyInput);
    }
    k.clusters_for(color_counts.total_count())?;
    options.validate()
}

/// Runs `run` once per restart and keeps the clustering with the lowest inertia.
fn best_of_restarts(
    options: &KmeansOptions,
    mut run: impl FnMut(Xoroshiro128PlusPlus) -> Result<Clustering>,
) -> Result<Clustering> {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(options.seed);
    let mut best = run(rng.clone())?;

    for restart in 1..options.restarts {
        rng.jump();
        let clustering = run(rng.clone())?;
        debug!("restart {restart} finished with inertia {}", clustering.inertia);
        if clustering.inertia < best.inertia {
            best = clustering;
        }
    }

    Ok(best)
}

/// Clusters the colors of any [`ColorCounts`] into `k` groups.
///
/// The returned `assignment` has one entry per original pixel
/// (see [`ColorCounts::map_indices`]), not one per entry of `colors`.
///
/// The `dedup_pixels` option is ignored, since `color_counts` decides that already.
///
/// # Errors
/// - [`Error::EmptyInput`] if there are no pixels.
/// - [`Error::InvalidClusterCount`] if `k` is `0` or greater than the number of pixels.
/// - [`Error::InvalidParameter`] if an option has an unusable value.
/// - [`Error::DegenerateReseedFailure`] if `k > 1` for a single color input
///   (unless [`KmeansOptions::keep_empty_clusters`] is set).
pub fn cluster_color_counts<Color>(
    color_counts: &impl ColorCounts<Color, u8, 3>,
    k: PaletteSize,
    options: &KmeansOptions,
) -> Result<Clustering>
where
    Color: ColorComponents<u8, 3>,
{
    validate(color_counts, k, options)?;
    let mut clustering = best_of_restarts(options, |rng| {
        State::new(color_counts, k, options, rng).run(|s| s.assign(), |s| s.accumulate())
    })?;
    clustering.assignment = color_counts.map_indices(mem::take(&mut clustering.assignment));
    Ok(clustering)
}

/// Clusters `pixels` into `k` groups.
///
/// # Errors
/// - [`Error::EmptyInput`] if `pixels` is empty.
/// - [`Error::InvalidClusterCount`] if `k` is `0` or greater than the number of pixels.
/// - [`Error::InvalidParameter`] if an option has an unusable value.
/// - [`Error::DegenerateReseedFailure`] if `k > 1` for a single color input
///   (unless [`KmeansOptions::keep_empty_clusters`] is set).
pub fn cluster<Color>(
    pixels: ColorSlice<Color>,
    k: PaletteSize,
    options: &KmeansOptions,
) -> Result<Clustering>
where
    Color: ColorComponents<u8, 3>,
{
    validate(&pixels, k, options)?;
    if options.dedup_pixels {
        cluster_color_counts(&IndexedColorCounts::new(pixels), k, options)
    } else {
        cluster_color_counts(&pixels, k, options)
    }
}

/// Clusters the colors of any [`ColorCounts`] into `k` groups in parallel.
///
/// The output is identical to [`cluster_color_counts`].
///
/// # Errors
/// See [`cluster_color_counts`].
#[cfg(feature = "threads")]
pub fn cluster_color_counts_par<Color>(
    color_counts: &(impl ColorCounts<Color, u8, 3> + Sync),
    k: PaletteSize,
    options: &KmeansOptions,
) -> Result<Clustering>
where
    Color: ColorComponents<u8, 3> + Send + Sync,
{
    validate(color_counts, k, options)?;
    let mut clustering = best_of_restarts(options, |rng| {
        State::new(color_counts, k, options, rng).run(|s| s.assign_par(), |s| s.accumulate_par())
    })?;
    clustering.assignment = color_counts.map_indices(mem::take(&mut clustering.assignment));
    Ok(clustering)
}

/// Clusters `pixels` into `k` groups in parallel.
///
/// The output is identical to [`cluster`].
///
/// # Errors
/// See [`cluster`].
#[cfg(feature = "threads")]
pub fn cluster_par<Color>(
    pixels: ColorSlice<Color>,
    k: PaletteSize,
    options: &KmeansOptions,
) -> Result<Clustering>
where
    Color: ColorComponents<u8, 3> + Send + Sync,
{
    validate(&pixels, k, options)?;
    if options.dedup_pixels {
        let color_counts = IndexedColorCounts::new_par(pixels);
        let mut clustering = best_of_restarts(options, |rng| {
            State::new(&color_counts, k, options, rng)
                .run(|s| s.assign_par(), |s| s.accumulate_par())
        })?;
        clustering.assignment = color_counts.map_indices_par(&clustering.assignment);
        Ok(clustering)
    } else {
        cluster_color_counts_par(&pixels, k, options)
    }
}
