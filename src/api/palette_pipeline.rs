use crate::{
    kmeans::{self, Clustering},
    ColorComponents, ColorRecord, ColorSlice, KmeansOptions, PaletteSize, Result,
};

#[cfg(feature = "image")]
use crate::AboveMaxLen;
#[cfg(feature = "image")]
use image::RgbImage;
#[cfg(feature = "image")]
use palette::Srgb;

/// A builder struct to extract the dominant colors of an image or slice of pixels.
///
/// # Examples
/// To start, create a [`PalettePipeline`] from a [`RgbImage`] (note that the `image` feature is needed):
/// ```no_run
/// # use swatch::PalettePipeline;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgb8();
/// let mut pipeline = PalettePipeline::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
///
/// Or, create a [`PalettePipeline`] from a [`ColorSlice`] of any color type
/// with three `u8` channels:
/// ```
/// # use swatch::{ColorSlice, PalettePipeline};
/// # use palette::Srgb;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let srgb = vec![Srgb::new(0, 0, 0); 4];
/// let colors = ColorSlice::try_from(srgb.as_slice())?;
/// let mut pipeline = PalettePipeline::new(colors);
/// # Ok(())
/// # }
/// ```
///
/// Then, change the settings as desired and run the pipeline
/// with [`records`](PalettePipeline::records) or [`records_par`](PalettePipeline::records_par):
/// ```
/// # use swatch::{ColorSlice, PalettePipeline, KmeansOptions};
/// # use palette::Srgb;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let srgb = [[0, 0, 0], [255, 255, 255], [1, 2, 3]].map(|[r, g, b]| Srgb::new(r, g, b));
/// # let colors = ColorSlice::try_from(srgb.as_slice())?;
/// let records = PalettePipeline::new(colors)
///     .palette_size(2.into())
///     .kmeans_options(KmeansOptions::new().seed(42))
///     .records()?;
///
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[0].count, 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PalettePipeline<'a, Color>
where
    Color: ColorComponents<u8, 3>,
{
    /// The input pixels.
    colors: ColorSlice<'a, Color>,
    /// The number of colors to extract.
    k: PaletteSize,
    /// The k-means parameters.
    options: KmeansOptions,
}

impl<'a, Color> PalettePipeline<'a, Color>
where
    Color: ColorComponents<u8, 3>,
{
    /// Creates a new [`PalettePipeline`] with default options.
    #[must_use]
    pub fn new(colors: ColorSlice<'a, Color>) -> Self {
        Self {
            colors,
            k: PaletteSize::default(),
            options: KmeansOptions::default(),
        }
    }

    /// Sets the number of colors to extract.
    ///
    /// The default is [`PaletteSize::DEFAULT`] (`5`).
    #[must_use]
    pub fn palette_size(mut self, size: PaletteSize) -> Self {
        self.k = size;
        self
    }

    /// Sets the k-means parameters.
    ///
    /// The default is [`KmeansOptions::default`].
    #[must_use]
    pub fn kmeans_options(mut self, options: KmeansOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs the pipeline and returns the full [`Clustering`].
    ///
    /// # Errors
    /// See [`kmeans::cluster`].
    pub fn clustering(&self) -> Result<Clustering> {
        kmeans::cluster(self.colors, self.k, &self.options)
    }

    /// Runs the pipeline and returns the palette as [`ColorRecord`]s,
    /// ordered by descending frequency.
    ///
    /// # Errors
    /// See [`kmeans::cluster`].
    pub fn records(&self) -> Result<Vec<ColorRecord>> {
        self.clustering()?.summarize()
    }
}

#[cfg(feature = "threads")]
impl<'a, Color> PalettePipeline<'a, Color>
where
    Color: ColorComponents<u8, 3> + Send + Sync,
{
    /// Runs the pipeline in parallel and returns the full [`Clustering`].
    ///
    /// The result is identical to [`clustering`](PalettePipeline::clustering).
    ///
    /// # Errors
    /// See [`kmeans::cluster`].
    pub fn clustering_par(&self) -> Result<Clustering> {
        kmeans::cluster_par(self.colors, self.k, &self.options)
    }

    /// Runs the pipeline in parallel and returns the palette as [`ColorRecord`]s.
    ///
    /// The result is identical to [`records`](PalettePipeline::records).
    ///
    /// # Errors
    /// See [`kmeans::cluster`].
    pub fn records_par(&self) -> Result<Vec<ColorRecord>> {
        self.clustering_par()?.summarize()
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbImage> for PalettePipeline<'a, Srgb<u8>> {
    type Error = AboveMaxLen<u32>;

    fn try_from(image: &'a RgbImage) -> std::result::Result<Self, Self::Error> {
        Ok(Self::new(image.try_into()?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{tests::*, Error};

    #[test]
    fn default_palette_size() {
        let pixels = blob_data(2048);
        let pixels = ColorSlice::try_from(pixels.as_slice()).unwrap();
        let records = PalettePipeline::new(pixels).records().unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records.iter().map(|r| r.count).sum::<u32>(), 2048);
    }

    #[test]
    fn blobs() {
        let pixels = blob_data(4096);
        let pixels = ColorSlice::try_from(pixels.as_slice()).unwrap();

        let records = PalettePipeline::new(pixels)
            .palette_size(4.into())
            .kmeans_options(KmeansOptions::new().seed(3))
            .records()
            .unwrap();

        let mut centers = records
            .iter()
            .map(|r| r.rgb.into_components())
            .collect::<Vec<_>>();
        centers.sort_unstable();

        let expected = [(20, 30, 40), (40, 200, 60), (220, 40, 30), (230, 230, 220)];
        for ((r, g, b), (er, eg, eb)) in centers.into_iter().zip(expected) {
            // jitter in [0, 10) shifts each channel mean by about 4.5
            assert!(r.abs_diff(er) <= 6 && g.abs_diff(eg) <= 6 && b.abs_diff(eb) <= 6);
        }

        for pair in records.windows(2) {
            assert!(pair[0].count >= pair[1].count);
        }
    }

    #[test]
    fn errors_propagate() {
        let pixels = repeat_colors(&[([1, 1, 1], 3)]);
        let pixels = ColorSlice::try_from(pixels.as_slice()).unwrap();

        assert_eq!(
            PalettePipeline::new(pixels).records(),
            Err(Error::InvalidClusterCount { requested: 5, pixels: 3 })
        );
        assert_eq!(
            PalettePipeline::new(pixels).palette_size(2.into()).records(),
            Err(Error::DegenerateReseedFailure { cluster: 1, iteration: 0 })
        );

        let records = PalettePipeline::new(pixels)
            .palette_size(2.into())
            .kmeans_options(KmeansOptions::new().keep_empty_clusters(true))
            .records()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].frequency, 100.0);
        assert_eq!(records[1].frequency, 0.0);
    }

    #[test]
    fn fewer_colors_than_palette_size() {
        let pixels = repeat_colors(&[([0, 0, 0], 3), ([200, 100, 0], 3)]);
        let pixels = ColorSlice::try_from(pixels.as_slice()).unwrap();

        let records = PalettePipeline::new(pixels).records().unwrap();
        assert_eq!(records.len(), 5);

        let frequencies = records.iter().map(|r| r.frequency).collect::<Vec<_>>();
        assert_eq!(frequencies, vec![50.0, 50.0, 0.0, 0.0, 0.0]);

        let mut hexes = records[..2].iter().map(|r| r.hex.as_str()).collect::<Vec<_>>();
        hexes.sort_unstable();
        assert_eq!(hexes, vec!["#000000", "#c86400"]);
    }

    #[test]
    #[cfg(feature = "threads")]
    fn single_and_multi_threaded_match() {
        let pixels = test_data_1024();
        let pixels = ColorSlice::try_from(pixels.as_slice()).unwrap();

        for seed in 0..4 {
            let pipeline = PalettePipeline::new(pixels)
                .palette_size(8.into())
                .kmeans_options(KmeansOptions::new().seed(seed));
            assert_eq!(pipeline.records().unwrap(), pipeline.records_par().unwrap());
        }
    }

    #[test]
    #[cfg(feature = "image")]
    fn from_image() {
        let image = RgbImage::from_fn(8, 4, |x, _| {
            if x < 2 {
                image::Rgb([200, 0, 0])
            } else {
                image::Rgb([0, 0, 200])
            }
        });

        let records = PalettePipeline::try_from(&image)
            .unwrap()
            .palette_size(2.into())
            .records()
            .unwrap();

        assert_eq!(records[0].hex, "#0000c8");
        assert_eq!(records[0].frequency, 75.0);
        assert_eq!(records[1].hex, "#c80000");
        assert_eq!(records[1].frequency, 25.0);
    }
}
