//! Rendering configuration: defaults and parameter limits.

use crate::colormap::Palette;
use crate::error::{CoronaError, Result};
use crate::normalize::{Ceiling, GammaStrategy};
use crate::render::{PlaybackDirection, SaturationWindow};

/// Default number of lookup table entries (one per index in `[0, 255]`).
pub const DEFAULT_TABLE_SIZE: usize = 256;

/// Default normalization ceiling K. The full 8-bit range, no reserved value.
pub const DEFAULT_CEILING: u8 = 255;

/// Smallest accepted gamma.
pub const MIN_GAMMA: f64 = 0.01;

/// Largest accepted gamma.
pub const MAX_GAMMA: f64 = 5.0;

/// User-controlled parameters for one rendered view of a stack.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewParams {
    /// Palette from the registry.
    pub palette: Palette,
    /// Lookup table size N. Must be at least K + 1.
    pub table_size: usize,
    /// Normalization ceiling K.
    pub ceiling: Ceiling,
    /// Power-law exponent applied to normalized intensity.
    pub gamma: f64,
    /// Where gamma is applied.
    pub gamma_strategy: GammaStrategy,
    /// Optional display-range window over indices.
    pub window: Option<SaturationWindow>,
    /// Displayed frame.
    pub frame: usize,
    /// Playback direction for animation.
    pub direction: PlaybackDirection,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            table_size: DEFAULT_TABLE_SIZE,
            ceiling: Ceiling::default(),
            gamma: 1.0,
            gamma_strategy: GammaStrategy::default(),
            window: None,
            frame: 0,
            direction: PlaybackDirection::default(),
        }
    }
}

impl ViewParams {
    /// Check every precondition against a stack with `frames` frames.
    pub fn validate(&self, frames: usize) -> Result<()> {
        let k = self.ceiling.get();
        if self.table_size < k as usize + 1 {
            return Err(CoronaError::invalid(format!(
                "table size {} cannot hold indices up to ceiling {}",
                self.table_size, k
            )));
        }
        validate_gamma(self.gamma)?;
        if let Some(window) = self.window {
            if window.high() > k {
                return Err(CoronaError::invalid(format!(
                    "saturation window [{}, {}] exceeds ceiling {}",
                    window.low(),
                    window.high(),
                    k
                )));
            }
        }
        if self.frame >= frames {
            return Err(CoronaError::invalid(format!(
                "frame {} out of bounds for {} frames",
                self.frame, frames
            )));
        }
        Ok(())
    }
}

/// Gamma must be finite and within `[MIN_GAMMA, MAX_GAMMA]`.
pub fn validate_gamma(gamma: f64) -> Result<()> {
    if !gamma.is_finite() || !(MIN_GAMMA..=MAX_GAMMA).contains(&gamma) {
        return Err(CoronaError::invalid(format!(
            "gamma {} outside [{}, {}]",
            gamma, MIN_GAMMA, MAX_GAMMA
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ViewParams::default().validate(1).is_ok());
    }

    #[test]
    fn frame_must_be_in_bounds() {
        let params = ViewParams {
            frame: 3,
            ..ViewParams::default()
        };
        assert!(params.validate(4).is_ok());
        assert!(params.validate(3).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn table_must_cover_ceiling() {
        let params = ViewParams {
            table_size: 255,
            ..ViewParams::default()
        };
        assert!(params.validate(1).is_err());

        let params = ViewParams {
            table_size: 255,
            ceiling: Ceiling::new(254).unwrap(),
            ..ViewParams::default()
        };
        assert!(params.validate(1).is_ok());
    }

    #[test]
    fn gamma_limits() {
        assert!(validate_gamma(0.01).is_ok());
        assert!(validate_gamma(5.0).is_ok());
        assert!(validate_gamma(0.0).is_err());
        assert!(validate_gamma(5.5).is_err());
        assert!(validate_gamma(f64::INFINITY).is_err());
    }

    #[test]
    fn window_must_fit_ceiling() {
        let params = ViewParams {
            ceiling: Ceiling::new(200).unwrap(),
            table_size: 201,
            window: Some(SaturationWindow::clamp(10, 250).unwrap()),
            ..ViewParams::default()
        };
        assert!(params.validate(1).is_err());
    }
}
