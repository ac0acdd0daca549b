//! The input types of clustering: the pixel sequence and the number of clusters.

use crate::{Error, MAX_COLORS, MAX_PIXELS};
use std::{error, fmt, ops::Deref};
#[cfg(feature = "image")]
use {
    image::RgbImage,
    palette::{cast::ComponentsAs, Srgb},
};

/// The error returned when an input is longer than `swatch` can index.
///
/// The inner value is the largest supported length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AboveMaxLen<T>(pub T);

impl<T: fmt::Display> fmt::Display for AboveMaxLen<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "input is longer than the supported maximum of {}", self.0)
    }
}

impl<T: fmt::Debug + fmt::Display> error::Error for AboveMaxLen<T> {}

/// The pixels of an image as a borrowed, read-only sequence of colors.
///
/// A [`ColorSlice`] holds at most [`MAX_PIXELS`] pixels, so every pixel position and
/// every cluster size fits in a `u32`. Only the multiset of colors matters to clustering:
/// the row and column layout of the source image is never looked at.
///
/// An empty [`ColorSlice`] can be built, but clustering rejects it with [`Error::EmptyInput`].
///
/// # Examples
/// From a slice of colors:
/// ```
/// # use swatch::{ColorSlice, AboveMaxLen};
/// # use palette::Srgb;
/// # fn main() -> Result<(), AboveMaxLen<u32>> {
/// let srgb = vec![Srgb::new(255, 0, 0), Srgb::new(0, 0, 255)];
/// let pixels = ColorSlice::try_from(srgb.as_slice())?;
/// assert_eq!(pixels.num_pixels(), 2);
/// # Ok(())
/// # }
/// ```
///
/// From an image (needs the `image` feature to be enabled):
/// ```no_run
/// # use swatch::ColorSlice;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgb8();
/// let pixels = ColorSlice::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct ColorSlice<'a, Color>(&'a [Color]);

// manual impls avoid a `Color: Copy` bound
impl<Color> Clone for ColorSlice<'_, Color> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Color> Copy for ColorSlice<'_, Color> {}

impl<'a, Color> ColorSlice<'a, Color> {
    /// The number of pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn num_pixels(&self) -> u32 {
        // at most MAX_PIXELS
        self.0.len() as u32
    }

    /// Returns the pixels with the lifetime of the borrow they came from.
    #[must_use]
    pub const fn as_slice(&self) -> &'a [Color] {
        self.0
    }
}

impl<Color> Deref for ColorSlice<'_, Color> {
    type Target = [Color];

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<'a, Color> TryFrom<&'a [Color]> for ColorSlice<'a, Color> {
    type Error = AboveMaxLen<u32>;

    fn try_from(pixels: &'a [Color]) -> Result<Self, Self::Error> {
        if u32::try_from(pixels.len()).is_ok() {
            Ok(Self(pixels))
        } else {
            Err(AboveMaxLen(MAX_PIXELS))
        }
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbImage> for ColorSlice<'a, Srgb<u8>> {
    type Error = AboveMaxLen<u32>;

    fn try_from(image: &'a RgbImage) -> Result<Self, Self::Error> {
        let len = image.pixels().len();
        let bytes = image.as_raw().get(..len * 3).unwrap_or_default();
        let pixels: &[Srgb<u8>] = bytes.components_as();
        Self::try_from(pixels)
    }
}

/// The number of clusters `k`, which is also the number of records in the palette.
///
/// A [`PaletteSize`] is at most [`MAX_COLORS`] so that a cluster index fits in a `u8`.
/// Zero can be represented, but it is not a usable `k`: see [`PaletteSize::clusters_for`].
///
/// # Examples
/// ```
/// # use swatch::{PaletteSize, AboveMaxLen};
/// # fn main() -> Result<(), AboveMaxLen<u16>> {
/// let k = PaletteSize::from(8);
/// let k: PaletteSize = 8.into();
/// let k = PaletteSize::try_from(256u16)?;
/// assert!(PaletteSize::try_from(257u16).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PaletteSize(u16);

impl PaletteSize {
    /// The largest palette size, [`MAX_COLORS`].
    pub const MAX: Self = Self(MAX_COLORS);

    /// Five colors, the palette size used when none is given.
    pub const DEFAULT: Self = Self(5);

    /// Gets the inner `u16` value.
    #[must_use]
    pub const fn into_inner(self) -> u16 {
        self.0
    }

    /// Checks that this many clusters can be made from `pixels` pixels
    /// and returns the count as a `usize`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidClusterCount`] unless `1 <= k <= pixels`.
    ///
    /// # Examples
    /// ```
    /// # use swatch::{Error, PaletteSize};
    /// assert_eq!(PaletteSize::from(3).clusters_for(3), Ok(3));
    /// assert_eq!(
    ///     PaletteSize::from(4).clusters_for(3),
    ///     Err(Error::InvalidClusterCount { requested: 4, pixels: 3 }),
    /// );
    /// ```
    pub fn clusters_for(self, pixels: u32) -> Result<usize, Error> {
        let requested = self.0;
        if requested == 0 || u32::from(requested) > pixels {
            Err(Error::InvalidClusterCount { requested, pixels })
        } else {
            Ok(usize::from(requested))
        }
    }
}

impl Default for PaletteSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for PaletteSize {
    fn from(k: u8) -> Self {
        Self(k.into())
    }
}

impl TryFrom<u16> for PaletteSize {
    type Error = AboveMaxLen<u16>;

    fn try_from(k: u16) -> Result<Self, Self::Error> {
        if k <= MAX_COLORS {
            Ok(Self(k))
        } else {
            Err(AboveMaxLen(MAX_COLORS))
        }
    }
}

impl fmt::Display for PaletteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn palette_size_bounds() {
        assert_eq!(PaletteSize::try_from(257u16), Err(AboveMaxLen(MAX_COLORS)));
        assert_eq!(PaletteSize::try_from(256u16), Ok(PaletteSize::MAX));
        assert_eq!(PaletteSize::default(), PaletteSize::from(5));
        assert_eq!(PaletteSize::MAX.to_string(), "256");
    }

    #[test]
    fn clusters_for_pixel_count() {
        assert_eq!(
            PaletteSize::from(0).clusters_for(10),
            Err(Error::InvalidClusterCount { requested: 0, pixels: 10 })
        );
        assert_eq!(
            PaletteSize::from(1).clusters_for(0),
            Err(Error::InvalidClusterCount { requested: 1, pixels: 0 })
        );
        assert_eq!(PaletteSize::from(1).clusters_for(1), Ok(1));
        assert_eq!(PaletteSize::MAX.clusters_for(u32::MAX), Ok(256));
    }

    #[test]
    fn empty_slice_is_representable() {
        let pixels = ColorSlice::<[u8; 3]>::try_from(&[][..]).unwrap();
        assert_eq!(pixels.num_pixels(), 0);
        assert!(pixels.is_empty());
    }

    #[test]
    #[cfg(feature = "image")]
    fn image_pixels_in_row_order() {
        let image = RgbImage::from_fn(3, 2, |x, y| image::Rgb([x as u8, y as u8, 7]));
        let pixels = ColorSlice::try_from(&image).unwrap();
        assert_eq!(pixels.num_pixels(), 6);
        assert_eq!(pixels[4], Srgb::new(1, 1, 7));
    }
}
