use crate::ColorRecord;

use std::fmt;

/// A plain text rendering of a palette, one block per [`ColorRecord`].
///
/// Without a [`source`](Report::source) the title gives the number of colors over a 60 wide rule.
/// With one, the title names the source over a 50 wide rule.
///
/// # Examples
/// ```
/// # use swatch::{ColorRecord, Report};
/// # use palette::Srgb;
/// let records = [ColorRecord {
///     rgb: Srgb::new(255, 0, 128),
///     hex: "#ff0080".to_owned(),
///     frequency: 100.0,
///     count: 4,
///     cluster: 0,
/// }];
///
/// let text = Report::new(&records).source("photo.png").to_string();
/// assert!(text.starts_with("Color Palette for: photo.png\n"));
/// assert!(text.contains("  RGB: (255, 0, 128)\n  HEX: #ff0080\n  Frequency: 100.0%\n"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    records: &'a [ColorRecord],
    source: Option<&'a str>,
}

impl<'a> Report<'a> {
    /// Creates a new [`Report`] over the given records, in the order given.
    #[must_use]
    pub const fn new(records: &'a [ColorRecord]) -> Self {
        Self { records, source: None }
    }

    /// Names the image the palette was extracted from in the title.
    #[must_use]
    pub const fn source(mut self, source: &'a str) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = match self.source {
            Some(source) => {
                writeln!(f, "Color Palette for: {source}")?;
                50
            }
            None => {
                writeln!(f, "Color Palette ({} colors):", self.records.len())?;
                60
            }
        };
        writeln!(f, "{}", "=".repeat(rule))?;

        for (i, record) in self.records.iter().enumerate() {
            let (r, g, b) = record.rgb.into_components();
            writeln!(f)?;
            writeln!(f, "Color {}:", i + 1)?;
            writeln!(f, "  RGB: ({r}, {g}, {b})")?;
            writeln!(f, "  HEX: {}", record.hex)?;
            writeln!(f, "  Frequency: {:.1}%", record.frequency)?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{kmeans::Centroid, summarize};

    #[test]
    fn layout() {
        let centroids = [[0u8, 0, 0], [250, 250, 250], [10, 20, 30]].map(Centroid::from);
        let records = summarize(&centroids, &[1, 2, 1, 0, 1, 2]).unwrap();

        let expected = "\
Color Palette (3 colors):
============================================================

Color 1:
  RGB: (250, 250, 250)
  HEX: #fafafa
  Frequency: 50.0%

Color 2:
  RGB: (10, 20, 30)
  HEX: #0a141e
  Frequency: 33.3%

Color 3:
  RGB: (0, 0, 0)
  HEX: #000000
  Frequency: 16.7%
";
        assert_eq!(Report::new(&records).to_string(), expected);
    }

    #[test]
    fn empty() {
        let text = Report::new(&[]).source("empty.png").to_string();
        assert_eq!(text, format!("Color Palette for: empty.png\n{}\n", "=".repeat(50)));
    }
}
