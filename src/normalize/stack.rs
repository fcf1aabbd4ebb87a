//! Raw image stacks.

use ndarray::{Array2, Array3, ArrayView2, Axis};

use crate::error::{CoronaError, Result};

/// An ordered sequence of equally sized 2-D frames of raw intensities.
///
/// Layout is `(frame, row, col)`. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStack {
    data: Array3<f64>,
}

impl ImageStack {
    /// Wrap a `(frames, height, width)` array.
    pub fn new(data: Array3<f64>) -> Result<Self> {
        if data.is_empty() {
            return Err(CoronaError::invalid(format!(
                "image stack must be non-empty, got shape {:?}",
                data.shape()
            )));
        }
        Ok(Self { data })
    }

    /// Stack individual frames. Every frame must have the same shape.
    pub fn from_frames(frames: Vec<Array2<f64>>) -> Result<Self> {
        let first = frames
            .first()
            .ok_or_else(|| CoronaError::invalid("image stack needs at least one frame"))?
            .dim();

        if let Some((i, f)) = frames.iter().enumerate().find(|(_, f)| f.dim() != first) {
            return Err(CoronaError::invalid(format!(
                "frame {} has shape {:?}, expected {:?}",
                i,
                f.dim(),
                first
            )));
        }

        let views: Vec<ArrayView2<'_, f64>> = frames.iter().map(|f| f.view()).collect();
        let data = ndarray::stack(Axis(0), &views)
            .map_err(|e| CoronaError::invalid(format!("cannot stack frames: {}", e)))?;
        Self::new(data)
    }

    /// A one-frame stack.
    pub fn from_frame(frame: Array2<f64>) -> Result<Self> {
        Self::new(frame.insert_axis(Axis(0)))
    }

    /// Number of frames.
    pub fn frames(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Frame height in pixels.
    pub fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// Frame width in pixels.
    pub fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// `(frames, height, width)`.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// One frame, if in range.
    pub fn frame(&self, index: usize) -> Option<ArrayView2<'_, f64>> {
        (index < self.frames()).then(|| self.data.index_axis(Axis(0), index))
    }

    /// The underlying array.
    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    /// Take the underlying array.
    pub fn into_inner(self) -> Array3<f64> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn from_frames_stacks_in_order() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let b = array![[5.0, 6.0], [7.0, 8.0]];
        let stack = ImageStack::from_frames(vec![a, b]).unwrap();
        assert_eq!(stack.dim(), (2, 2, 2));
        assert_eq!(stack.frame(1).unwrap()[[0, 1]], 6.0);
        assert!(stack.frame(2).is_none());
    }

    #[test]
    fn mismatched_frames_are_rejected() {
        let a = Array2::<f64>::zeros((2, 2));
        let b = Array2::<f64>::zeros((2, 3));
        let err = ImageStack::from_frames(vec![a, b]).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn empty_stacks_are_rejected() {
        assert!(ImageStack::from_frames(vec![]).is_err());
        assert!(ImageStack::new(Array3::zeros((0, 4, 4))).is_err());
        assert!(ImageStack::new(Array3::zeros((2, 0, 4))).is_err());
    }

    #[test]
    fn single_frame() {
        let stack = ImageStack::from_frame(Array2::from_elem((3, 5), 1.5)).unwrap();
        assert_eq!((stack.frames(), stack.height(), stack.width()), (1, 3, 5));
    }
}
