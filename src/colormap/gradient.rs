//! Continuous color gradients.

use crate::error::{CoronaError, Result};

/// A continuous range of colors parametrized by reals in \[0, 1\].
///
/// Channels are returned as floats in \[0, 1\]; conversion to 8-bit happens
/// when a lookup table is sampled from the gradient.
pub trait ColorGradient {
    /// Returns the color corresponding to `t` ∈ \[0, 1\].
    fn color_at(&self, t: f64) -> [f64; 3];
}

impl<F> ColorGradient for F
where
    F: Fn(f64) -> [f64; 3],
{
    fn color_at(&self, t: f64) -> [f64; 3] {
        self(t)
    }
}

/// A color stop: position in \[0, 1\] and its RGB channels in \[0, 1\].
pub type Stop = (f64, [f64; 3]);

/// Piecewise-linear gradient through a list of color stops.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    stops: Vec<Stop>, // Invariant: len ≥ 2, sorted, first at 0.0, last at 1.0
}

fn check_stops(stops: &[Stop]) -> Result<()> {
    if stops.len() < 2 {
        return Err(CoronaError::invalid(format!(
            "gradient needs at least 2 stops, got {}",
            stops.len()
        )));
    }
    if stops.windows(2).any(|w| w[1].0 < w[0].0 || w[0].0.is_nan()) {
        return Err(CoronaError::invalid("gradient stops must be sorted"));
    }
    let first = stops[0].0;
    let last = stops[stops.len() - 1].0;
    if first != 0.0 || last != 1.0 {
        return Err(CoronaError::invalid(format!(
            "gradient stops must span [0, 1], got [{}, {}]",
            first, last
        )));
    }
    Ok(())
}

impl LinearGradient {
    /// Build a gradient from ordered stops.
    ///
    /// The first stop must sit at 0.0, the last at 1.0, and positions must be
    /// non-decreasing. Two stops at the same position produce a hard edge.
    pub fn new(stops: Vec<Stop>) -> Result<Self> {
        check_stops(&stops)?;
        Ok(Self { stops })
    }

    /// Gradient over a built-in stop list, checked by the palette tests.
    pub(super) fn from_static(stops: &'static [Stop]) -> Self {
        debug_assert!(check_stops(stops).is_ok());
        Self {
            stops: stops.to_vec(),
        }
    }

    /// Gradient between two colors.
    pub fn two_stop(c0: [f64; 3], c1: [f64; 3]) -> Self {
        Self {
            stops: vec![(0.0, c0), (1.0, c1)],
        }
    }

    /// The stops this gradient interpolates.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }
}

impl ColorGradient for LinearGradient {
    fn color_at(&self, t: f64) -> [f64; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        // First segment whose right end reaches t
        let i = self
            .stops
            .windows(2)
            .position(|w| t <= w[1].0)
            .unwrap_or(self.stops.len() - 2);
        let (p0, c0) = self.stops[i];
        let (p1, c1) = self.stops[i + 1];

        let span = p1 - p0;
        let f = if span > 0.0 { (t - p0) / span } else { 1.0 };
        [
            c0[0] + f * (c1[0] - c0[0]),
            c0[1] + f * (c1[1] - c0[1]),
            c0[2] + f * (c1[2] - c0[2]),
        ]
    }
}
