//! Image normalizer.
//!
//! Maps raw intensities onto the integer index scale `[0, K]` by min-max
//! scaling, with an optional power-law (gamma) response.
//!
//! Two gamma strategies exist and are not equivalent:
//!
//! - [`GammaStrategy::OnValue`] raises each normalized pixel to `gamma`.
//!   Exact, but every gamma change renormalizes the whole stack.
//! - [`GammaStrategy::OnTable`] keeps the base indices and remaps the color
//!   lookup table instead (see
//!   [`ColorLookupTable::with_index_gamma`](crate::colormap::ColorLookupTable::with_index_gamma)).
//!   A gamma change costs O(K); the curve is quantized through the table.
//!   The remap is scaled by K, so it holds for tables longer than K + 1.

mod downsample;
mod stack;

use std::fmt;
use std::str::FromStr;

use ndarray::{Array3, Zip};
use tracing::debug;

use crate::colormap::floor_index;
use crate::config::DEFAULT_CEILING;
use crate::error::{CoronaError, Result};

pub use downsample::downsample_stack;
pub use stack::ImageStack;

/// Normalization ceiling K: indices are produced in `[0, K]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ceiling(u8);

impl Ceiling {
    /// A ceiling of at least 1.
    pub fn new(k: u8) -> Result<Self> {
        if k == 0 {
            return Err(CoronaError::invalid("ceiling must be at least 1"));
        }
        Ok(Self(k))
    }

    /// The ceiling value K.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Ceiling {
    fn default() -> Self {
        Self(DEFAULT_CEILING)
    }
}

/// Where the gamma curve is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GammaStrategy {
    /// Exponent applied to every normalized pixel value.
    OnValue,
    /// Exponent folded into the color lookup table; pixel indices untouched.
    #[default]
    OnTable,
}

impl GammaStrategy {
    /// Command-line name.
    pub fn name(self) -> &'static str {
        match self {
            GammaStrategy::OnValue => "value",
            GammaStrategy::OnTable => "table",
        }
    }
}

impl fmt::Display for GammaStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GammaStrategy {
    type Err = CoronaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "value" | "on-value" => Ok(GammaStrategy::OnValue),
            "table" | "on-table" | "index" => Ok(GammaStrategy::OnTable),
            other => Err(CoronaError::invalid(format!(
                "unknown gamma strategy {:?} (expected \"value\" or \"table\")",
                other
            ))),
        }
    }
}

/// Observed intensity bounds used for min-max scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityRange {
    vmin: f64,
    vmax: f64,
}

impl IntensityRange {
    /// Explicit bounds. Requires finite `vmin < vmax`.
    pub fn new(vmin: f64, vmax: f64) -> Result<Self> {
        if !vmin.is_finite() || !vmax.is_finite() {
            return Err(CoronaError::invalid(format!(
                "intensity range must be finite, got [{}, {}]",
                vmin, vmax
            )));
        }
        if vmax <= vmin {
            return Err(CoronaError::invalid(format!(
                "degenerate intensity range [{}, {}]",
                vmin, vmax
            )));
        }
        Ok(Self { vmin, vmax })
    }

    /// Min and max over every finite pixel of every frame.
    pub fn of_stack(stack: &ImageStack) -> Result<Self> {
        let (vmin, vmax) = stack
            .data()
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        if vmin > vmax {
            return Err(CoronaError::invalid("image stack has no finite pixels"));
        }
        let range = Self::new(vmin, vmax)?;
        debug!(vmin, vmax, "computed intensity range");
        Ok(range)
    }

    /// Lower bound.
    pub fn vmin(&self) -> f64 {
        self.vmin
    }

    /// Upper bound.
    pub fn vmax(&self) -> f64 {
        self.vmax
    }

    /// Position of `v` in the range, clamped to \[0, 1\].
    fn unit(&self, v: f64) -> f64 {
        ((v - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0)
    }
}

/// Map one raw value to its index in `[0, K]`.
///
/// `floor(((v - vmin) / (vmax - vmin)) ^ gamma * K)`. Non-finite values map
/// to 0; values outside the range clamp to the nearest bound.
pub fn normalize_value(v: f64, range: &IntensityRange, ceiling: Ceiling, gamma: f64) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    let unit = range.unit(v);
    let curved = if gamma == 1.0 { unit } else { unit.powf(gamma) };
    let k = ceiling.get();
    floor_index(curved * k as f64, k as usize) as u8
}

/// Normalize a whole stack to indices in `[0, K]`.
///
/// Pass `gamma = 1.0` for the base normalization used by
/// [`GammaStrategy::OnTable`].
pub fn normalize_stack(
    stack: &ImageStack,
    range: &IntensityRange,
    ceiling: Ceiling,
    gamma: f64,
) -> Result<Array3<u8>> {
    if !gamma.is_finite() || gamma <= 0.0 {
        return Err(CoronaError::invalid(format!(
            "gamma must be a positive finite number, got {}",
            gamma
        )));
    }

    let mut indices = Array3::<u8>::zeros(stack.dim());
    Zip::from(&mut indices)
        .and(stack.data())
        .par_for_each(|out, &v| *out = normalize_value(v, range, ceiling, gamma));

    debug!(
        frames = stack.frames(),
        height = stack.height(),
        width = stack.width(),
        gamma,
        ceiling = ceiling.get(),
        "normalized image stack"
    );
    Ok(indices)
}
