//! Turns a clustering into an ordered list of color records.

use crate::{kmeans::Centroid, Error, Result};
use palette::Srgb;
use std::{error, fmt};

/// One palette entry: a representative color and the share of pixels it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRecord {
    /// The cluster centroid, rounded to 8-bit channels.
    pub rgb: Srgb<u8>,
    /// `rgb` as a lowercase `#rrggbb` string.
    pub hex: String,
    /// The percentage of pixels assigned to this cluster, in `[0, 100]`.
    pub frequency: f64,
    /// The number of pixels assigned to this cluster.
    pub count: u32,
    /// The index of the cluster this record was made from.
    pub cluster: u8,
}

impl ColorRecord {
    /// Whether the color is light enough that dark text reads well on top of it
    /// (the mean of its channels is above `128`).
    #[must_use]
    pub fn is_light(&self) -> bool {
        let (r, g, b) = self.rgb.into_components();
        u32::from(r) + u32::from(g) + u32::from(b) > 3 * 128
    }
}

impl fmt::Display for ColorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b) = self.rgb.into_components();
        write!(f, "{} rgb({r}, {g}, {b}) {:.1}%", self.hex, self.frequency)
    }
}

/// Formats a color as a lowercase `#rrggbb` string.
///
/// # Examples
/// ```
/// # use swatch::to_hex;
/// # use palette::Srgb;
/// assert_eq!(to_hex(Srgb::new(255, 8, 160)), "#ff08a0");
/// ```
#[must_use]
pub fn to_hex(color: Srgb<u8>) -> String {
    let (r, g, b) = color.into_components();
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// The error returned by [`parse_hex`] for strings that are not of the form `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseHexError;

impl fmt::Display for ParseHexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected a color of the form #rrggbb")
    }
}

impl error::Error for ParseHexError {}

/// Parses a `#rrggbb` string (in either case) back into a color.
///
/// # Errors
/// Returns [`ParseHexError`] if the input is not a `#` followed by exactly six hex digits.
///
/// # Examples
/// ```
/// # use swatch::parse_hex;
/// # use palette::Srgb;
/// assert_eq!(parse_hex("#FF08a0"), Ok(Srgb::new(255, 8, 160)));
/// assert!(parse_hex("ff08a0").is_err());
/// ```
pub fn parse_hex(hex: &str) -> std::result::Result<Srgb<u8>, ParseHexError> {
    #[allow(clippy::cast_possible_truncation)]
    fn nibble(digit: u8) -> Option<u8> {
        char::from(digit).to_digit(16).map(|d| d as u8)
    }

    let digits = hex.strip_prefix('#').ok_or(ParseHexError)?.as_bytes();
    let [r1, r0, g1, g0, b1, b0] = <[u8; 6]>::try_from(digits).map_err(|_| ParseHexError)?;

    let channel = |hi, lo| {
        nibble(hi)
            .zip(nibble(lo))
            .map(|(hi, lo)| hi << 4 | lo)
            .ok_or(ParseHexError)
    };
    Ok(Srgb::new(channel(r1, r0)?, channel(g1, g0)?, channel(b1, b0)?))
}

/// Summarizes centroids and a per-pixel assignment into [`ColorRecord`]s.
///
/// There is one record per centroid, sorted by descending frequency.
/// Records with equal frequency are ordered by ascending cluster index.
/// Frequencies sum to `100` up to floating point rounding.
///
/// Centroid channels are rounded half away from zero (see [`round_channel`](crate::kmeans::round_channel)).
/// Records are not deduplicated, so two records may share a hex value.
///
/// # Errors
/// - [`Error::EmptyInput`] if `assignment` is empty.
/// - [`Error::InvalidClusterCount`] if `centroids` is empty or longer than [`MAX_COLORS`](crate::MAX_COLORS).
/// - [`Error::LabelOutOfRange`] if `assignment` contains an index with no centroid.
pub fn summarize(centroids: &[Centroid], assignment: &[u8]) -> Result<Vec<ColorRecord>> {
    #[allow(clippy::cast_possible_truncation)]
    let pixels = assignment.len().min(u32::MAX as usize) as u32;

    if assignment.is_empty() {
        return Err(Error::EmptyInput);
    }
    if centroids.is_empty() || centroids.len() > crate::MAX_K {
        #[allow(clippy::cast_possible_truncation)]
        return Err(Error::InvalidClusterCount {
            requested: centroids.len().min(usize::from(u16::MAX)) as u16,
            pixels,
        });
    }

    let mut counts = vec![0u32; centroids.len()];
    for &label in assignment {
        let count = counts.get_mut(usize::from(label)).ok_or(Error::LabelOutOfRange {
            label,
            clusters: centroids.len(),
        })?;
        *count += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let total = assignment.len() as f64;

    let mut records = centroids
        .iter()
        .zip(counts)
        .enumerate()
        .map(|(i, (centroid, count))| {
            let rgb = centroid.to_srgb();
            // at most MAX_COLORS centroids
            #[allow(clippy::cast_possible_truncation)]
            let cluster = i as u8;
            ColorRecord {
                rgb,
                hex: to_hex(rgb),
                frequency: f64::from(count) / total * 100.0,
                count,
                cluster,
            }
        })
        .collect::<Vec<_>>();

    // frequency is monotonic in count, and integer keys keep the order exact
    records.sort_by(|a, b| b.count.cmp(&a.count).then(a.cluster.cmp(&b.cluster)));

    Ok(records)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn centroids(colors: &[[u8; 3]]) -> Vec<Centroid> {
        colors.iter().copied().map(Centroid::from).collect()
    }

    #[test]
    fn half_and_half() {
        let records = summarize(&centroids(&[[0, 0, 0], [255, 255, 255]]), &[0, 0, 1, 1]).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].hex, "#000000");
        assert_eq!(records[1].hex, "#ffffff");
        for record in &records {
            assert_eq!(record.frequency, 50.0);
            assert_eq!(record.count, 2);
        }
    }

    #[test]
    fn ordered_by_frequency() {
        let colors = [[10, 0, 0], [0, 10, 0], [0, 0, 10]];
        let records = summarize(&centroids(&colors), &[2, 1, 2, 1, 0, 2]).unwrap();

        let order = records.iter().map(|r| r.cluster).collect::<Vec<_>>();
        assert_eq!(order, vec![2, 1, 0]);

        let frequencies = records
            .iter()
            .map(|r| format!("{:.1}", r.frequency))
            .collect::<Vec<_>>();
        assert_eq!(frequencies, vec!["50.0", "33.3", "16.7"]);

        let total = records.iter().map(|r| r.frequency).sum::<f64>();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_cluster_order() {
        let colors = [[1, 1, 1], [2, 2, 2], [3, 3, 3], [4, 4, 4]];
        let records = summarize(&centroids(&colors), &[3, 1, 2, 0, 1, 3]).unwrap();
        let order = records.iter().map(|r| r.cluster).collect::<Vec<_>>();
        assert_eq!(order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn empty_cluster_is_reported() {
        let records = summarize(&centroids(&[[9, 9, 9], [8, 8, 8]]), &[1, 1, 1]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].frequency, 100.0);
        assert_eq!(records[1].frequency, 0.0);
        assert_eq!(records[1].cluster, 0);
    }

    #[test]
    fn rounds_centroids() {
        let centroids = [Centroid::new(0.5, 127.5, 254.49), Centroid::new(-1.0, 300.0, 1.5)];
        let records = summarize(&centroids, &[0, 1]).unwrap();
        assert_eq!(records[0].rgb, Srgb::new(1, 128, 254));
        assert_eq!(records[1].rgb, Srgb::new(0, 255, 2));
        assert_eq!(records[1].hex, "#00ff02");
    }

    #[test]
    fn errors() {
        let two = centroids(&[[0, 0, 0], [1, 1, 1]]);
        assert_eq!(summarize(&two, &[]), Err(Error::EmptyInput));
        assert_eq!(
            summarize(&[], &[0]),
            Err(Error::InvalidClusterCount { requested: 0, pixels: 1 })
        );
        assert_eq!(
            summarize(&two, &[0, 2]),
            Err(Error::LabelOutOfRange { label: 2, clusters: 2 })
        );
    }

    #[test]
    fn hex_round_trip() {
        for color in [[0, 0, 0], [255, 255, 255], [1, 35, 171], [254, 16, 15]] {
            let [r, g, b] = color;
            let color = Srgb::new(r, g, b);
            let hex = to_hex(color);
            assert_eq!(hex.len(), 7);
            assert_eq!(hex, hex.to_lowercase());
            assert_eq!(parse_hex(&hex), Ok(color));
            assert_eq!(parse_hex(&hex.to_uppercase()), Ok(color));
        }
    }

    #[test]
    fn invalid_hex() {
        for hex in ["", "#", "000000", "#00000", "#0000000", "#00000g", "#+12345", "#ééé"] {
            assert_eq!(parse_hex(hex), Err(ParseHexError), "{hex}");
        }
    }

    #[test]
    fn lightness() {
        let record = |r, g, b| ColorRecord {
            rgb: Srgb::new(r, g, b),
            hex: to_hex(Srgb::new(r, g, b)),
            frequency: 100.0,
            count: 1,
            cluster: 0,
        };

        assert!(record(255, 255, 255).is_light());
        assert!(record(129, 128, 128).is_light());
        assert!(!record(128, 128, 128).is_light());
        assert!(!record(255, 0, 0).is_light());
    }
}
