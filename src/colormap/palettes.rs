//! Named instrument palettes.
//!
//! Each palette is a piecewise-linear approximation of the color table used
//! for the instrument's quick-look imagery, defined by a handful of stops.

use std::fmt;
use std::str::FromStr;

use super::gradient::{LinearGradient, Stop};
use crate::error::CoronaError;

/// Palette registry for false-color rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Palette {
    /// Linear black to white.
    Gray,
    /// SOHO/LASCO C2: black through red-brown and orange to white.
    #[default]
    LascoC2,
    /// SOHO/LASCO C3: black through deep blue to white.
    LascoC3,
    /// STEREO/SECCHI COR1: black through teal to pale cyan.
    StereoCor1,
    /// STEREO/SECCHI COR2: black through dark red and amber to cream.
    StereoCor2,
    /// SOHO/EIT 195 Å: black through green to pale green.
    Eit195,
}

const GRAY: &[Stop] = &[(0.0, [0.0, 0.0, 0.0]), (1.0, [1.0, 1.0, 1.0])];

const LASCO_C2: &[Stop] = &[
    (0.0, [0.0, 0.0, 0.0]),
    (0.35, [0.55, 0.16, 0.0]),
    (0.6, [0.85, 0.45, 0.1]),
    (0.85, [1.0, 0.8, 0.45]),
    (1.0, [1.0, 1.0, 1.0]),
];

const LASCO_C3: &[Stop] = &[
    (0.0, [0.0, 0.0, 0.0]),
    (0.4, [0.1, 0.2, 0.55]),
    (0.7, [0.45, 0.65, 0.9]),
    (1.0, [1.0, 1.0, 1.0]),
];

const STEREO_COR1: &[Stop] = &[
    (0.0, [0.0, 0.0, 0.0]),
    (0.5, [0.1, 0.45, 0.5]),
    (1.0, [0.85, 1.0, 1.0]),
];

const STEREO_COR2: &[Stop] = &[
    (0.0, [0.0, 0.0, 0.0]),
    (0.4, [0.6, 0.1, 0.0]),
    (0.7, [0.95, 0.55, 0.2]),
    (1.0, [1.0, 0.95, 0.85]),
];

const EIT_195: &[Stop] = &[
    (0.0, [0.0, 0.0, 0.0]),
    (0.5, [0.1, 0.55, 0.1]),
    (1.0, [0.8, 1.0, 0.8]),
];

impl Palette {
    /// Every registered palette, in display order.
    pub fn all() -> &'static [Palette] {
        &[
            Palette::Gray,
            Palette::LascoC2,
            Palette::LascoC3,
            Palette::StereoCor1,
            Palette::StereoCor2,
            Palette::Eit195,
        ]
    }

    /// Canonical command-line name.
    pub fn name(self) -> &'static str {
        match self {
            Palette::Gray => "gray",
            Palette::LascoC2 => "lasco-c2",
            Palette::LascoC3 => "lasco-c3",
            Palette::StereoCor1 => "stereo-cor1",
            Palette::StereoCor2 => "stereo-cor2",
            Palette::Eit195 => "eit-195",
        }
    }

    /// Instrument label for display.
    pub fn label(self) -> &'static str {
        match self {
            Palette::Gray => "Gray",
            Palette::LascoC2 => "LASCO/C2",
            Palette::LascoC3 => "LASCO/C3",
            Palette::StereoCor1 => "STEREO/COR1",
            Palette::StereoCor2 => "STEREO/COR2",
            Palette::Eit195 => "EIT/195",
        }
    }

    /// Get the next palette in cycle.
    pub fn next(self) -> Self {
        let all = Self::all();
        let i = all.iter().position(|&p| p == self).unwrap_or(0);
        all[(i + 1) % all.len()]
    }

    fn stops(self) -> &'static [Stop] {
        match self {
            Palette::Gray => GRAY,
            Palette::LascoC2 => LASCO_C2,
            Palette::LascoC3 => LASCO_C3,
            Palette::StereoCor1 => STEREO_COR1,
            Palette::StereoCor2 => STEREO_COR2,
            Palette::Eit195 => EIT_195,
        }
    }

    /// The continuous gradient behind this palette.
    pub fn gradient(self) -> LinearGradient {
        LinearGradient::from_static(self.stops())
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Palette {
    type Err = CoronaError;

    /// Accepts `lasco-c2`, `LASCO/C2`, `lasco_c2`, and the sunpy-style
    /// `soholasco2` / `stereocor2` spellings, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let palette = match key.as_str() {
            "gray" | "grey" | "greys" => Palette::Gray,
            "lascoc2" | "soholasco2" => Palette::LascoC2,
            "lascoc3" | "soholasco3" => Palette::LascoC3,
            "stereocor1" | "cor1" => Palette::StereoCor1,
            "stereocor2" | "cor2" => Palette::StereoCor2,
            "eit195" | "sohoeit195" => Palette::Eit195,
            _ => return Err(CoronaError::unknown_palette(s)),
        };
        Ok(palette)
    }
}
