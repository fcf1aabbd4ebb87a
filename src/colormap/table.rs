//! Discrete lookup tables sampled from a gradient.

use rgb::RGB8;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::gradient::ColorGradient;
use crate::error::{CoronaError, Result};
use crate::normalize::Ceiling;

/// Uniform endpoint-inclusive sampling positions: `k / (n - 1)` for `k < n`.
fn sample_positions(n: usize) -> Result<impl Iterator<Item = f64>> {
    if n < 2 {
        return Err(CoronaError::invalid(format!(
            "lookup table needs at least 2 entries, got {}",
            n
        )));
    }
    let last = (n - 1) as f64;
    Ok((0..n).map(move |k| {
        // Exact at the last entry regardless of rounding in k * (1/last)
        if k == n - 1 {
            1.0
        } else {
            k as f64 / last
        }
    }))
}

/// Convert gradient output in \[0, 1\] to 8-bit channels (truncating).
fn to_rgb8(c: [f64; 3]) -> RGB8 {
    RGB8 {
        r: (c[0] * 255.0) as u8,
        g: (c[1] * 255.0) as u8,
        b: (c[2] * 255.0) as u8,
    }
}

/// Format a color the way declarative plotting systems expect it.
fn css_rgb(c: RGB8) -> String {
    format!("rgb({}, {}, {})", c.r, c.g, c.b)
}

/// Parse `rgb(R, G, B)` (spaces optional) into a color.
fn parse_css_rgb(s: &str) -> Result<RGB8> {
    let bad = || CoronaError::invalid(format!("not an rgb() color: {:?}", s));

    let inner = s
        .trim()
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(bad)?;

    let mut channels = [0u8; 3];
    let mut parts = inner.split(',');
    for channel in channels.iter_mut() {
        let part = parts.next().ok_or_else(bad)?;
        *channel = part.trim().parse::<u8>().map_err(|_| bad())?;
    }
    if parts.next().is_some() {
        return Err(bad());
    }
    Ok(RGB8::new(channels[0], channels[1], channels[2]))
}

/// Ordered `(position, "rgb(R, G, B)")` pairs describing a colorscale.
///
/// Serializes to the plotly colorscale shape `[[0.0, "rgb(0, 0, 0)"], ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradientDescriptor {
    entries: Vec<(f64, String)>,
}

impl GradientDescriptor {
    /// Sample `n` evenly spaced colors from `gradient`.
    pub fn build(gradient: &impl ColorGradient, n: usize) -> Result<Self> {
        Ok(ColorLookupTable::build(gradient, n)?.descriptor())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the descriptor has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `(position, color)` pairs.
    pub fn entries(&self) -> &[(f64, String)] {
        &self.entries
    }
}

/// Fixed-size table mapping an intensity index to an 8-bit RGB color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorLookupTable {
    entries: Vec<RGB8>, // Invariant: len ≥ 2
}

impl ColorLookupTable {
    /// Sample `n` evenly spaced colors from `gradient`.
    ///
    /// Entry 0 is the gradient at 0.0 and entry `n - 1` the gradient at 1.0.
    pub fn build(gradient: &impl ColorGradient, n: usize) -> Result<Self> {
        let entries: Vec<RGB8> = sample_positions(n)?
            .map(|t| to_rgb8(gradient.color_at(t)))
            .collect();
        debug!(entries = entries.len(), "built color lookup table");
        Ok(Self { entries })
    }

    /// Build a table directly from colors.
    pub fn from_colors(entries: Vec<RGB8>) -> Result<Self> {
        if entries.len() < 2 {
            return Err(CoronaError::invalid(format!(
                "lookup table needs at least 2 entries, got {}",
                entries.len()
            )));
        }
        Ok(Self { entries })
    }

    /// Recover a table from a descriptor by parsing its color strings.
    pub fn from_descriptor(descriptor: &GradientDescriptor) -> Result<Self> {
        let entries = descriptor
            .entries()
            .iter()
            .map(|(_, color)| parse_css_rgb(color))
            .collect::<Result<Vec<_>>>()?;
        Self::from_colors(entries)
    }

    /// The descriptor parallel to this table: same length, positions `k / (n - 1)`.
    pub fn descriptor(&self) -> GradientDescriptor {
        let n = self.entries.len();
        let entries = sample_positions(n)
            .map(|positions| {
                positions
                    .zip(self.entries.iter())
                    .map(|(t, &c)| (t, css_rgb(c)))
                    .collect()
            })
            .unwrap_or_default();
        GradientDescriptor { entries }
    }

    /// Remap the table for gamma, leaving pixel indices untouched.
    ///
    /// `new[i] = self[floor(K * (i / K) ^ (1 / gamma))]` for `i` in `[0, K]`,
    /// where `K` is the normalization ceiling. Entries above `K` are never
    /// reached by a normalized index and are kept as they are. A gamma
    /// change then costs O(K) instead of O(pixels), quantized through the
    /// table.
    pub fn with_index_gamma(&self, gamma: f64, ceiling: Ceiling) -> Result<Self> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(CoronaError::invalid(format!(
                "gamma must be a positive finite number, got {}",
                gamma
            )));
        }
        let k = ceiling.get() as usize;
        if k >= self.entries.len() {
            return Err(CoronaError::invalid(format!(
                "table of {} entries cannot hold indices up to ceiling {}",
                self.entries.len(),
                k
            )));
        }
        if gamma == 1.0 {
            return Ok(self.clone());
        }

        let kf = k as f64;
        let exponent = 1.0 / gamma;
        let mut entries = self.entries.clone();
        for (i, slot) in entries.iter_mut().take(k + 1).enumerate() {
            let j = floor_index((i as f64 / kf).powf(exponent) * kf, k);
            *slot = self.entries[j];
        }
        Ok(Self { entries })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; tables hold at least two entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Color at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<RGB8> {
        self.entries.get(index).copied()
    }

    /// All colors in index order.
    pub fn entries(&self) -> &[RGB8] {
        &self.entries
    }
}

/// Floor `x` to an index in `[0, max]`, absorbing float error just below an integer.
pub(crate) fn floor_index(x: f64, max: usize) -> usize {
    const SNAP: f64 = 1e-9;
    if x.is_nan() || x <= 0.0 {
        return 0;
    }
    let i = (x + SNAP).floor() as usize;
    i.min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::LinearGradient;

    fn black_white() -> LinearGradient {
        LinearGradient::two_stop([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])
    }

    #[test]
    fn table_has_requested_size_and_exact_endpoints() {
        let g = |t: f64| [t, 1.0 - t, 0.5];
        for n in [2, 3, 17, 255, 256, 1000] {
            let table = ColorLookupTable::build(&g, n).unwrap();
            assert_eq!(table.len(), n);
            assert_eq!(table.get(0), Some(to_rgb8(g(0.0))));
            assert_eq!(table.get(n - 1), Some(to_rgb8(g(1.0))));
        }
    }

    #[test]
    fn two_stop_black_white_255() {
        let table = ColorLookupTable::build(&black_white(), 255).unwrap();
        assert_eq!(table.get(0), Some(RGB8::new(0, 0, 0)));
        assert_eq!(table.get(254), Some(RGB8::new(255, 255, 255)));
    }

    #[test]
    fn channels_are_truncated_not_rounded() {
        let g = |_t: f64| [0.999, 0.5, 0.0039];
        let table = ColorLookupTable::build(&g, 2).unwrap();
        // 0.999 * 255 = 254.7, 0.5 * 255 = 127.5, 0.0039 * 255 = 0.99
        assert_eq!(table.get(0), Some(RGB8::new(254, 127, 0)));
    }

    #[test]
    fn degenerate_sizes_are_rejected() {
        assert!(ColorLookupTable::build(&black_white(), 0).unwrap_err().is_invalid_argument());
        assert!(ColorLookupTable::build(&black_white(), 1).unwrap_err().is_invalid_argument());
        assert!(GradientDescriptor::build(&black_white(), 1).is_err());
    }

    #[test]
    fn descriptor_parallels_table() {
        let table = ColorLookupTable::build(&black_white(), 5).unwrap();
        let descriptor = table.descriptor();
        let positions: Vec<f64> = descriptor.entries().iter().map(|e| e.0).collect();
        assert_eq!(positions, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(descriptor.entries()[0].1, "rgb(0, 0, 0)");
        assert_eq!(descriptor.entries()[4].1, "rgb(255, 255, 255)");
        assert_eq!(ColorLookupTable::from_descriptor(&descriptor).unwrap(), table);
    }

    #[test]
    fn descriptor_serializes_as_plotly_colorscale() {
        let descriptor = GradientDescriptor::build(&black_white(), 2).unwrap();
        let json = serde_json::to_string(&descriptor).unwrap();
        assert_eq!(json, r#"[[0.0,"rgb(0, 0, 0)"],[1.0,"rgb(255, 255, 255)"]]"#);
    }

    #[test]
    fn parse_accepts_compact_and_rejects_garbage() {
        assert_eq!(parse_css_rgb("rgb(1,2,3)").unwrap(), RGB8::new(1, 2, 3));
        assert_eq!(parse_css_rgb(" rgb( 10, 20 ,30 ) ").unwrap(), RGB8::new(10, 20, 30));
        assert!(parse_css_rgb("rgb(1,2)").is_err());
        assert!(parse_css_rgb("rgb(1,2,3,4)").is_err());
        assert!(parse_css_rgb("rgb(256,0,0)").is_err());
        assert!(parse_css_rgb("#ff0000").is_err());
    }

    #[test]
    fn index_gamma_identity_at_one() {
        let table = ColorLookupTable::build(&|t: f64| [t, t * t, 1.0 - t], 256).unwrap();
        assert_eq!(table.with_index_gamma(1.0, Ceiling::default()).unwrap(), table);
    }

    #[test]
    fn index_gamma_follows_formula() {
        let table = ColorLookupTable::build(&black_white(), 256).unwrap();
        let gamma = 2.0;
        let remapped = table.with_index_gamma(gamma, Ceiling::default()).unwrap();
        assert_eq!(remapped.len(), 256);
        for i in 0..256usize {
            let j = ((i as f64 / 255.0).powf(1.0 / gamma) * 255.0 + 1e-9).floor() as usize;
            assert_eq!(remapped.get(i), table.get(j.min(255)), "entry {}", i);
        }
        // Endpoints are fixed points of the remap
        assert_eq!(remapped.get(0), table.get(0));
        assert_eq!(remapped.get(255), table.get(255));
    }

    #[test]
    fn index_gamma_scales_by_ceiling_not_table_length() {
        let table = ColorLookupTable::from_colors((0..=255u8).map(|i| RGB8::new(i, i, i)).collect())
            .unwrap();
        let k = Ceiling::new(15).unwrap();
        let remapped = table.with_index_gamma(2.0, k).unwrap();
        for i in 0..=15usize {
            let j = ((i as f64 / 15.0).sqrt() * 15.0 + 1e-9).floor() as u8;
            assert_eq!(remapped.get(i), Some(RGB8::new(j, j, j)), "entry {}", i);
        }
        // The top of the index range still reads the ceiling's own color
        assert_eq!(remapped.get(15), table.get(15));
        // Entries past the ceiling are untouched
        assert_eq!(&remapped.entries()[16..], &table.entries()[16..]);
    }

    #[test]
    fn index_gamma_rejects_bad_arguments() {
        let table = ColorLookupTable::build(&black_white(), 16).unwrap();
        let k = Ceiling::new(15).unwrap();
        assert!(table.with_index_gamma(0.0, k).is_err());
        assert!(table.with_index_gamma(-1.0, k).is_err());
        assert!(table.with_index_gamma(f64::NAN, k).is_err());
        let err = table.with_index_gamma(2.0, Ceiling::new(16).unwrap()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn floor_index_snaps_and_clamps() {
        assert_eq!(floor_index(126.99999999999, 255), 127);
        assert_eq!(floor_index(126.5, 255), 126);
        assert_eq!(floor_index(-0.1, 255), 0);
        assert_eq!(floor_index(f64::NAN, 255), 0);
        assert_eq!(floor_index(300.0, 255), 255);
    }
}
