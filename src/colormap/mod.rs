//! Colormap table builder.
//!
//! Converts a continuous [`ColorGradient`] into a [`ColorLookupTable`] for
//! per-pixel lookup, or into a parallel [`GradientDescriptor`] for
//! declarative plotting front-ends.

mod gradient;
mod palettes;
mod table;

pub use gradient::{ColorGradient, LinearGradient, Stop};
pub use palettes::Palette;
pub use table::{ColorLookupTable, GradientDescriptor};

pub(crate) use table::floor_index;
