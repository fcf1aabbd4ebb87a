//! False-color renderer.
//!
//! Turns normalized index stacks into RGB frames by gathering from a
//! [`ColorLookupTable`]. The gather runs over the whole stack at once,
//! split across threads; no pixel depends on another.

mod playback;
mod window;

use ndarray::{Array3, Array4, ArrayView2, ArrayViewMut3, Axis, Zip};
use rayon::prelude::*;
use rgb::RGB8;
use tracing::debug;

use crate::colormap::ColorLookupTable;
use crate::error::{CoronaError, Result};

pub use playback::PlaybackDirection;
pub use window::{SaturationWindow, WindowMode};

/// Table entry for each possible index, checked against the table size.
fn build_index_map(
    max_index: u8,
    table: &ColorLookupTable,
    window: Option<&SaturationWindow>,
) -> Result<[usize; 256]> {
    let last = table.len() - 1;
    let map = match window {
        Some(w) => w.index_map(last),
        None => {
            let mut identity = [0usize; 256];
            for (i, slot) in identity.iter_mut().enumerate() {
                *slot = i;
            }
            identity
        }
    };

    // Both remaps are monotonic, so the largest index bounds every lookup.
    let needed = map[max_index as usize];
    if needed > last {
        return Err(CoronaError::invalid(format!(
            "index {} needs table entry {}, but the table has {} entries",
            max_index,
            needed,
            table.len()
        )));
    }
    Ok(map)
}

/// Colorize one 2-D index view into a `(height, width, 3)` buffer.
fn gather_into(
    mut rgb: ArrayViewMut3<'_, u8>,
    indices: ArrayView2<'_, u8>,
    entries: &[RGB8],
    map: &[usize; 256],
) {
    Zip::from(rgb.lanes_mut(Axis(2)))
        .and(indices)
        .par_for_each(|mut px, &i| {
            let c = entries[map[i as usize]];
            px[0] = c.r;
            px[1] = c.g;
            px[2] = c.b;
        });
}

/// Colorize a whole index stack.
///
/// Returns a `(frames, height, width, 3)` array where every pixel is
/// `table[window(index)]`. With no window, `table[index]`.
pub fn render_stack(
    indices: &Array3<u8>,
    table: &ColorLookupTable,
    window: Option<&SaturationWindow>,
) -> Result<Array4<u8>> {
    let max_index = indices.iter().copied().max().unwrap_or(0);
    let map = build_index_map(max_index, table, window)?;
    let entries = table.entries();

    let (frames, h, w) = indices.dim();
    let mut rgb = Array4::<u8>::zeros((frames, h, w, 3));
    rgb.axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(indices.axis_iter(Axis(0)))
        .for_each(|(out, frame)| gather_into(out, frame, entries, &map));

    debug!(frames, height = h, width = w, "rendered false-color stack");
    Ok(rgb)
}

/// Colorize one frame of an index stack.
pub fn render_frame(
    indices: &Array3<u8>,
    frame: usize,
    table: &ColorLookupTable,
    window: Option<&SaturationWindow>,
) -> Result<Array3<u8>> {
    let frames = indices.len_of(Axis(0));
    if frame >= frames {
        return Err(CoronaError::invalid(format!(
            "frame {} out of bounds for {} frames",
            frame, frames
        )));
    }
    let view = indices.index_axis(Axis(0), frame);
    let max_index = view.iter().copied().max().unwrap_or(0);
    let map = build_index_map(max_index, table, window)?;

    let (h, w) = view.dim();
    let mut rgb = Array3::<u8>::zeros((h, w, 3));
    gather_into(rgb.view_mut(), view, table.entries(), &map);
    Ok(rgb)
}
