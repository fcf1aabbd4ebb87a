//! Saturation windows over the index scale.

use std::fmt;

use crate::error::{CoronaError, Result};

/// How indices inside and outside a window reach the color table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowMode {
    /// Indices below `low` show the color of `low`, above `high` the color of `high`.
    #[default]
    Clamp,
    /// `[low, high]` is stretched over the whole table; outside saturates to
    /// the first or last entry.
    Stretch,
}

/// An inclusive `[low, high]` index window applied at display time.
///
/// The color table is not rebuilt; the window only changes which entry each
/// index reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SaturationWindow {
    low: u8,
    high: u8,
    mode: WindowMode,
}

impl SaturationWindow {
    /// A window with `low <= high`.
    pub fn new(low: u8, high: u8, mode: WindowMode) -> Result<Self> {
        if low > high {
            return Err(CoronaError::invalid(format!(
                "saturation window low {} above high {}",
                low, high
            )));
        }
        Ok(Self { low, high, mode })
    }

    /// A clamping window.
    pub fn clamp(low: u8, high: u8) -> Result<Self> {
        Self::new(low, high, WindowMode::Clamp)
    }

    /// A stretching window.
    pub fn stretch(low: u8, high: u8) -> Result<Self> {
        Self::new(low, high, WindowMode::Stretch)
    }

    /// Lower bound.
    pub fn low(&self) -> u8 {
        self.low
    }

    /// Upper bound.
    pub fn high(&self) -> u8 {
        self.high
    }

    /// Clamp or stretch.
    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    /// Table entry read by `index` when the table's last entry is `last`.
    pub fn apply(&self, index: u8, last: usize) -> usize {
        match self.mode {
            WindowMode::Clamp => index.clamp(self.low, self.high) as usize,
            WindowMode::Stretch => {
                if index <= self.low {
                    if index < self.low || self.low < self.high {
                        return 0;
                    }
                    return last;
                }
                if index >= self.high {
                    return last;
                }
                let span = (self.high - self.low) as usize;
                (index - self.low) as usize * last / span
            }
        }
    }

    /// The remap for every possible index, for a table whose last entry is `last`.
    pub fn index_map(&self, last: usize) -> [usize; 256] {
        let mut map = [0usize; 256];
        for (i, slot) in map.iter_mut().enumerate() {
            *slot = self.apply(i as u8, last);
        }
        map
    }
}

impl fmt::Display for SaturationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}
