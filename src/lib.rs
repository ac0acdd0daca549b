//! A library for extracting the dominant colors of an image.
//!
//! `swatch` partitions the pixels of an image into `k` groups with Lloyd's k-means algorithm
//! in RGB space and summarizes the result as an ordered list of [`ColorRecord`]s,
//! each holding a representative color, its hex code, and the percentage of pixels it covers.
//!
//! Clustering is fully determined by a seed, so the same pixels, palette size,
//! and seed always produce the same palette (including when running in parallel).
//!
//! # Features
//! To reduce dependencies and compile times, `swatch` has several `cargo` features
//! that can be turned off or on:
//! - `pipelines`: exposes the [`PalettePipeline`] builder struct as the high-level API.
//! - `threads`: exposes parallel versions of most functions via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//!
//! # High-Level API
//! ```no_run
//! # use swatch::{PalettePipeline, KmeansOptions};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("some image")?.into_rgb8();
//!
//! let records = PalettePipeline::try_from(&img)?
//!     .palette_size(8.into())
//!     .kmeans_options(KmeansOptions::new().seed(42))
//!     .records_par()?;
//!
//! for record in &records {
//!     println!("{} {:.1}%", record.hex, record.frequency);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Low-Level API
//! The two core operations are [`kmeans::cluster`] and [`summarize`]:
//! ```
//! # use swatch::{kmeans::{self, KmeansOptions}, summarize, ColorSlice, PaletteSize};
//! # use palette::Srgb;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pixels = vec![
//!     Srgb::new(0, 0, 0),
//!     Srgb::new(0, 0, 0),
//!     Srgb::new(255, 255, 255),
//!     Srgb::new(255, 255, 255),
//! ];
//! let pixels = ColorSlice::try_from(pixels.as_slice())?;
//!
//! let clustering = kmeans::cluster(pixels, PaletteSize::from(2), &KmeansOptions::new())?;
//! let records = summarize(&clustering.centroids, &clustering.assignment)?;
//!
//! assert_eq!(records.len(), 2);
//! assert!(records.iter().all(|record| record.frequency == 50.0));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod color_counts;
mod error;
mod report;
mod summary;
mod traits;
mod types;

#[cfg(feature = "pipelines")]
mod api;

pub mod kmeans;

pub use color_counts::*;
pub use error::*;
pub use report::Report;
pub use summary::*;
pub use traits::*;
pub use types::*;

pub use kmeans::KmeansOptions;

#[cfg(feature = "pipelines")]
pub use api::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// The maximum supported number of palette colors is `256`.
pub const MAX_COLORS: u16 = u8::MAX as u16 + 1;

/// `MAX_COLORS` as a `usize` for array and `Vec` lengths.
pub(crate) const MAX_K: usize = MAX_COLORS as usize;
