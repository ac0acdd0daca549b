//! Contains the code for pixel deduplication and the trait that lets k-means
//! run over either raw pixels or deduplicated colors.

use crate::{ColorComponents, ColorSlice};
use palette::cast::{self, AsArrays};
#[cfg(feature = "threads")]
use rayon::prelude::*;
use std::marker::PhantomData;
#[cfg(feature = "image")]
use {crate::AboveMaxLen, image::RgbImage, palette::Srgb};

/// A generalization trait over regular [`ColorSlice`]s and deduplicated pixels like [`IndexedColorCounts`].
pub trait ColorCounts<Color, Component, const N: usize>
where
    Color: ColorComponents<Component, N>,
{
    /// The slice of colors to cluster.
    ///
    /// The colors need not be unique,
    /// but the length of this slice must not be greater than [`MAX_PIXELS`](crate::MAX_PIXELS).
    fn colors(&self) -> &[Color];

    /// The total number of pixels in the (original) color slice.
    ///
    /// For [`ColorSlice`]s, this is simply the length of the slice.
    /// For deduplicated pixels, this is the length of the input [`ColorSlice`] before deduplication.
    /// This must be equal to the sum of `counts` (or the length of `colors` if `counts` is `None`).
    fn total_count(&self) -> u32;

    /// The number of pixels corresponding to each `Color` in the slice returned by `colors`.
    ///
    /// For [`ColorSlice`]s, this returns `None`, indicating each `Color` has a count of `1`.
    /// Each count must be nonzero, and the returned slice (if any)
    /// must have the same length as the slice returned by `colors`.
    fn counts(&self) -> Option<&[u32]>;

    /// Converts a cluster index for each entry of `colors` into a cluster index for each original pixel.
    fn map_indices(&self, indices: Vec<u8>) -> Vec<u8>;

    /// The slice returned by `colors` casted to a slice of component arrays.
    fn color_components(&self) -> &[[Component; N]] {
        self.colors().as_arrays()
    }

    /// The length of the slice returned by `colors`.
    fn len(&self) -> usize {
        self.colors().len()
    }

    /// Whether or not the slice returned by `colors` is empty.
    fn is_empty(&self) -> bool {
        self.colors().is_empty()
    }
}

impl<'a, Color, Component, const N: usize> ColorCounts<Color, Component, N>
    for ColorSlice<'a, Color>
where
    Color: ColorComponents<Component, N>,
{
    fn colors(&self) -> &[Color] {
        self
    }

    fn total_count(&self) -> u32 {
        self.num_pixels()
    }

    fn counts(&self) -> Option<&[u32]> {
        None
    }

    fn map_indices(&self, indices: Vec<u8>) -> Vec<u8> {
        indices
    }
}

impl<Color, Component, const N: usize> ColorCounts<Color, Component, N>
    for IndexedColorCounts<Color, Component, N>
where
    Color: ColorComponents<Component, N>,
{
    fn colors(&self) -> &[Color] {
        &self.colors
    }

    fn counts(&self) -> Option<&[u32]> {
        Some(&self.counts)
    }

    fn total_count(&self) -> u32 {
        self.total_count
    }

    fn map_indices(&self, indices: Vec<u8>) -> Vec<u8> {
        self.indices.iter().map(|&i| indices[i as usize]).collect()
    }
}

/// Packs three 8-bit components into a single sort key.
#[inline]
fn pack([r, g, b]: [u8; 3]) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Deduplicated colors alongside their counts and an index into the deduplicated colors for each
/// pixel of the original input.
///
/// Clustering the weighted unique colors gives the same partition as clustering every pixel,
/// but each iteration only has to visit each distinct color once.
///
/// The unique colors are sorted by their components (red, then green, then blue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedColorCounts<Color, Component, const N: usize>
where
    Color: ColorComponents<Component, N>,
{
    /// The unique colors.
    colors: Vec<Color>,
    /// The number of times each unique color occurs.
    counts: Vec<u32>,
    /// The index into `colors` for each original pixel.
    indices: Vec<u32>,
    /// The sum of `counts`.
    total_count: u32,
    /// Marker for the component type.
    _phantom: PhantomData<Component>,
}

impl<Color, Component, const N: usize> IndexedColorCounts<Color, Component, N>
where
    Color: ColorComponents<Component, N>,
{
    /// Returns the slice of unique colors.
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Returns the count of each unique color.
    #[must_use]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Returns the index into `colors` for each pixel of the original input.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Returns the total number of pixels of the original input.
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }
}

impl<Color> IndexedColorCounts<Color, u8, 3>
where
    Color: ColorComponents<u8, 3>,
{
    /// Groups the pixel positions listed in `order`, which must be sorted by color.
    #[allow(clippy::cast_possible_truncation)]
    fn from_sorted_order(pixels: ColorSlice<Color>, order: &[u32]) -> Self {
        let components = cast::into_array_slice(pixels.as_slice());

        let mut colors = Vec::new();
        let mut counts = Vec::<u32>::new();
        let mut indices = vec![0; pixels.len()];
        let mut prev = None;

        for &i in order {
            let i = i as usize;
            let key = pack(components[i]);
            if prev != Some(key) {
                colors.push(pixels[i]);
                counts.push(0);
                prev = Some(key);
            }
            let last = counts.len() - 1;
            counts[last] += 1;
            indices[i] = last as u32;
        }

        Self {
            colors,
            counts,
            indices,
            total_count: pixels.num_pixels(),
            _phantom: PhantomData,
        }
    }

    /// Deduplicates the given pixels.
    #[must_use]
    pub fn new(pixels: ColorSlice<Color>) -> Self {
        let components = cast::into_array_slice(pixels.as_slice());
        let mut order = (0..pixels.num_pixels()).collect::<Vec<_>>();
        order.sort_unstable_by_key(|&i| pack(components[i as usize]));
        Self::from_sorted_order(pixels, &order)
    }
}

#[cfg(feature = "threads")]
impl<Color, Component, const N: usize> IndexedColorCounts<Color, Component, N>
where
    Color: ColorComponents<Component, N> + Send + Sync,
    Component: Send + Sync,
{
    /// Converts per-unique-color cluster indices into per-pixel cluster indices in parallel.
    #[must_use]
    pub fn map_indices_par(&self, indices: &[u8]) -> Vec<u8> {
        self.indices.par_iter().map(|&i| indices[i as usize]).collect()
    }
}

#[cfg(feature = "threads")]
impl<Color> IndexedColorCounts<Color, u8, 3>
where
    Color: ColorComponents<u8, 3> + Send + Sync,
{
    /// Deduplicates the given pixels in parallel.
    #[must_use]
    pub fn new_par(pixels: ColorSlice<Color>) -> Self {
        let components = cast::into_array_slice(pixels.as_slice());
        let mut order = (0..pixels.num_pixels()).into_par_iter().collect::<Vec<_>>();
        order.par_sort_unstable_by_key(|&i| pack(components[i as usize]));
        Self::from_sorted_order(pixels, &order)
    }
}

#[cfg(feature = "image")]
impl IndexedColorCounts<Srgb<u8>, u8, 3> {
    /// Deduplicates the pixels of an [`RgbImage`].
    ///
    /// # Errors
    /// Returns an error if the number of pixels in the image is above [`MAX_PIXELS`](crate::MAX_PIXELS).
    pub fn try_from_rgbimage(image: &RgbImage) -> Result<Self, AboveMaxLen<u32>> {
        Ok(Self::new(image.try_into()?))
    }

    /// Deduplicates the pixels of an [`RgbImage`] in parallel.
    ///
    /// # Errors
    /// Returns an error if the number of pixels in the image is above [`MAX_PIXELS`](crate::MAX_PIXELS).
    #[cfg(feature = "threads")]
    pub fn try_from_rgbimage_par(image: &RgbImage) -> Result<Self, AboveMaxLen<u32>> {
        Ok(Self::new_par(image.try_into()?))
    }
}
