//! Delivery of rendered stacks.
//!
//! Two forms: an indexed payload (colorscale plus raw indices, for clients
//! that color on their side) and one PNG per frame in playback order.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use ndarray::{Array3, Array4, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::colormap::GradientDescriptor;
use crate::error::{CoronaError, Result};
use crate::render::PlaybackDirection;
use crate::session::Snapshot;

/// Colorscale plus index stack, for clients that apply `table[index]`
/// themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedPayload {
    /// One `[position, "rgb(R, G, B)"]` pair per table entry.
    pub colorscale: GradientDescriptor,
    /// Index drawn with the first colorscale entry.
    pub cmin: usize,
    /// Index drawn with the last colorscale entry.
    pub cmax: usize,
    /// `[frames, height, width]`.
    pub shape: [usize; 3],
    /// Indices in row-major order.
    pub data: Vec<u8>,
}

impl IndexedPayload {
    /// Pair a colorscale with an index stack.
    pub fn new(colorscale: GradientDescriptor, indices: &Array3<u8>) -> Self {
        let (f, h, w) = indices.dim();
        let cmax = colorscale.len().saturating_sub(1);
        Self {
            colorscale,
            cmin: 0,
            cmax,
            shape: [f, h, w],
            data: indices.iter().copied().collect(),
        }
    }

    /// Payload for a snapshot, with its saturation window baked into the
    /// indices.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        let colorscale = snapshot.descriptor().clone();
        let Some(window) = snapshot.params().window else {
            return Ok(Self::new(colorscale, snapshot.indices()));
        };

        let map = window.index_map(snapshot.table().len() - 1);
        let mut baked = [0u8; 256];
        for (slot, &entry) in baked.iter_mut().zip(map.iter()) {
            *slot = u8::try_from(entry).map_err(|_| {
                CoronaError::invalid(format!(
                    "window {} maps to table entry {}, which an indexed payload cannot carry",
                    window, entry
                ))
            })?;
        }
        let indices = snapshot.indices().mapv(|i| baked[i as usize]);
        Ok(Self::new(colorscale, &indices))
    }
}

/// Write a payload as JSON.
pub fn write_indexed_json(payload: &IndexedPayload, path: &Path) -> Result<()> {
    let file = fs::File::create(path).map_err(|e| CoronaError::file_open(path.to_path_buf(), e))?;
    serde_json::to_writer(std::io::BufWriter::new(file), payload)?;
    info!(path = %path.display(), shape = ?payload.shape, "wrote indexed payload");
    Ok(())
}

/// Write every frame of a `(frames, height, width, 3)` stack as
/// `frame_NNNN.png` under `dir`.
///
/// Files are numbered by position in the playback order, so a reversed
/// export plays back reversed as a plain file sequence. Returns the written
/// paths in that order.
pub fn write_png_frames(
    rgb: &Array4<u8>,
    dir: &Path,
    direction: PlaybackDirection,
) -> Result<Vec<PathBuf>> {
    let (frames, h, w, channels) = rgb.dim();
    if channels != 3 {
        return Err(CoronaError::invalid(format!(
            "expected 3 color channels, got {}",
            channels
        )));
    }
    let (width, height) = (
        u32::try_from(w).map_err(|_| CoronaError::invalid("frame too wide for PNG"))?,
        u32::try_from(h).map_err(|_| CoronaError::invalid("frame too tall for PNG"))?,
    );
    fs::create_dir_all(dir)?;

    let paths = direction
        .frame_order(frames)
        .into_par_iter()
        .enumerate()
        .map(|(position, frame)| -> Result<PathBuf> {
            let pixels: Vec<u8> = rgb.index_axis(Axis(0), frame).iter().copied().collect();
            let img = RgbImage::from_raw(width, height, pixels)
                .ok_or_else(|| CoronaError::invalid("frame buffer does not match its size"))?;
            let path = dir.join(format!("frame_{:04}.png", position));
            img.save(&path)?;
            debug!(frame, path = %path.display(), "wrote frame");
            Ok(path)
        })
        .collect::<Result<Vec<_>>>()?;

    info!(dir = %dir.display(), frames, %direction, "wrote PNG frames");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::ColorLookupTable;
    use crate::config::ViewParams;
    use crate::normalize::ImageStack;
    use crate::render::SaturationWindow;
    use crate::session::ViewerSession;
    use tempfile::TempDir;

    fn session() -> ViewerSession {
        let data = Array3::from_shape_fn((3, 4, 5), |(f, r, c)| (f * 20 + r * 5 + c) as f64);
        ViewerSession::new(ImageStack::new(data).unwrap(), ViewParams::default()).unwrap()
    }

    #[test]
    fn payload_json_shape() {
        let snap = session().snapshot();
        let payload = IndexedPayload::from_snapshot(&snap).unwrap();
        assert_eq!(payload.shape, [3, 4, 5]);
        assert_eq!(payload.data.len(), 60);
        assert_eq!(payload.data[0], 0);
        assert_eq!(payload.data[59], 255);

        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["shape"], serde_json::json!([3, 4, 5]));
        assert_eq!(json["colorscale"].as_array().unwrap().len(), 256);
        assert_eq!(json["colorscale"][255][0], 1.0);
    }

    #[test]
    fn color_range_spans_the_table() {
        // Indices are table positions, so the client must not rescale them
        let payload = IndexedPayload::from_snapshot(&session().snapshot()).unwrap();
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["cmin"], 0);
        assert_eq!(json["cmax"], 255);

        let small = ColorLookupTable::build(&|t: f64| [t, t, t], 16).unwrap();
        let payload = IndexedPayload::new(small.descriptor(), &Array3::zeros((1, 1, 1)));
        assert_eq!((payload.cmin, payload.cmax), (0, 15));
    }

    #[test]
    fn payload_colors_match_rendered_pixels() {
        let mut session = session();
        let snap = session
            .set_window(Some(SaturationWindow::clamp(40, 180).unwrap()))
            .unwrap();
        let payload = IndexedPayload::from_snapshot(&snap).unwrap();
        let table = ColorLookupTable::from_descriptor(&payload.colorscale).unwrap();
        for (i, px) in snap.rgb().lanes(Axis(3)).into_iter().enumerate() {
            let c = table.get(payload.data[i] as usize).unwrap();
            assert_eq!([px[0], px[1], px[2]], [c.r, c.g, c.b]);
        }
    }

    #[test]
    fn json_file_parses_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stack.json");
        let payload = IndexedPayload::from_snapshot(&session().snapshot()).unwrap();
        write_indexed_json(&payload, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let back: IndexedPayload = serde_json::from_str(&text).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn png_frames_follow_playback_order() {
        let dir = TempDir::new().unwrap();
        let snap = session().snapshot();
        let paths = write_png_frames(snap.rgb(), dir.path(), PlaybackDirection::Reverse).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("frame_0000.png"));

        // First file of a reversed export is the last frame
        let first = image::open(&paths[0]).unwrap().to_rgb8();
        assert_eq!(first.dimensions(), (5, 4));
        let last_frame = snap.frame_rgb(2).unwrap();
        let p = first.get_pixel(4, 3);
        assert_eq!(p.0, [last_frame[[3, 4, 0]], last_frame[[3, 4, 1]], last_frame[[3, 4, 2]]]);
    }

    #[test]
    fn rejects_non_rgb_stacks() {
        let dir = TempDir::new().unwrap();
        let rgba = Array4::<u8>::zeros((1, 2, 2, 4));
        let err = write_png_frames(&rgba, dir.path(), PlaybackDirection::Forward).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
