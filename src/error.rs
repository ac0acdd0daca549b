//! The error type shared by clustering and summarizing.

use std::{error, fmt};

/// Result alias for `swatch`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`kmeans::cluster`](crate::kmeans::cluster) and [`summarize`](crate::summarize).
///
/// None of these are retried internally: clustering is deterministic,
/// so running it again with the same inputs gives the same failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The pixel sequence (or the assignment passed to [`summarize`](crate::summarize)) was empty.
    EmptyInput,
    /// The requested number of clusters was zero or larger than the number of pixels.
    InvalidClusterCount {
        /// The requested number of clusters.
        requested: u16,
        /// The number of pixels available.
        pixels: u32,
    },
    /// More than one cluster was requested for an input made of a single solid color.
    ///
    /// Inputs with at least two distinct colors never fail this way: surplus clusters
    /// are kept with zero pixels instead. Lower `k` to `1` or enable
    /// [`KmeansOptions::keep_empty_clusters`](crate::KmeansOptions::keep_empty_clusters).
    DegenerateReseedFailure {
        /// The index of the cluster that could not be reseeded.
        cluster: u8,
        /// The iteration (starting at zero) in which reseeding failed.
        iteration: u32,
    },
    /// An assignment contained a cluster index with no matching centroid.
    LabelOutOfRange {
        /// The offending cluster index.
        label: u8,
        /// The number of centroids given.
        clusters: usize,
    },
    /// An option was set to an unusable value.
    InvalidParameter {
        /// The option name.
        name: &'static str,
        /// What is wrong with it.
        message: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::InvalidClusterCount { requested, pixels } => {
                write!(f, "cannot create {requested} clusters from {pixels} pixels")
            }
            Error::DegenerateReseedFailure { cluster, iteration } => write!(
                f,
                "cluster {cluster} became empty in iteration {iteration} of a single color input"
            ),
            Error::LabelOutOfRange { label, clusters } => {
                write!(f, "cluster index {label} is out of range for {clusters} centroids")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
        }
    }
}

impl error::Error for Error {}
