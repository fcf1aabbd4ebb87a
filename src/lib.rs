//! Coronaview - false-color rendering of coronagraph image stacks.
//!
//! Coronaview turns raw coronagraph frames into color images: it builds
//! color lookup tables from instrument palettes, normalizes a frame stack
//! to 8-bit indices with an adjustable gamma, and gathers RGB frames from
//! the table, optionally through a saturation window.
//!
//! # Features
//!
//! - Lookup tables sampled from piecewise-linear gradients, with a
//!   plotly-style colorscale descriptor
//! - Instrument palettes (LASCO C2/C3, STEREO COR1/COR2, EIT 195)
//! - Min-max normalization with gamma on the values or on the table
//! - Parallel rendering of whole stacks
//! - Immutable snapshots shared across threads
//! - NetCDF input, PNG frame and indexed JSON output
//!
//! # Example
//!
//! ```ignore
//! use coronaview::config::ViewParams;
//! use coronaview::data::read_stack;
//! use coronaview::session::ViewerSession;
//! use std::path::Path;
//!
//! let stack = read_stack(Path::new("c2.nc"), "img")?;
//! let mut session = ViewerSession::new(stack, ViewParams::default())?;
//!
//! let snapshot = session.set_gamma(0.6)?;
//! println!("{} frames, first pixel {:?}", snapshot.frames(), snapshot.rgb()[[0, 0, 0, 0]]);
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]
#![deny(unsafe_code)]

pub mod colormap;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod normalize;
pub mod render;
pub mod session;

pub use error::{CoronaError, Result};
