//! Block-median downsampling of image stacks.

use ndarray::{Array3, Zip};
use tracing::debug;

use super::ImageStack;
use crate::error::{CoronaError, Result};

/// Median of the non-NaN `values` together with `pads` copies of `pad`.
///
/// Pads are counted, never stored, so a block far larger than the frame
/// costs only the pixels it covers. NaN when nothing is left.
fn padded_nan_median(values: &mut Vec<f64>, pad: f64, pads: u128) -> f64 {
    values.retain(|v| !v.is_nan());
    let pads = if pad.is_nan() { 0 } else { pads };
    let n = values.len() as u128 + pads;
    if n == 0 {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    // Sorted order is values[..lo], then the pads, then values[lo..]
    let lo = values.partition_point(|&v| v < pad) as u128;
    let at = |k: u128| -> f64 {
        if k < lo {
            values[k as usize]
        } else if k < lo + pads {
            pad
        } else {
            values[(k - pads) as usize]
        }
    };
    if n % 2 == 1 {
        at(n / 2)
    } else {
        0.5 * (at(n / 2 - 1) + at(n / 2))
    }
}

/// Reduce every frame by `block × block` medians.
///
/// Output frames are `ceil(height / block) × ceil(width / block)`. Blocks
/// that run past the frame edge are padded with the smallest finite value
/// of the stack; NaN pixels are ignored inside a block.
pub fn downsample_stack(stack: &ImageStack, block: usize) -> Result<ImageStack> {
    if block == 0 {
        return Err(CoronaError::invalid("downsample block size must be at least 1"));
    }
    if block == 1 {
        return Ok(stack.clone());
    }

    let data = stack.data();
    let (frames, height, width) = stack.dim();
    let pad = data
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::INFINITY, f64::min);
    let pad = if pad.is_finite() { pad } else { f64::NAN };

    let out_h = height.div_ceil(block);
    let out_w = width.div_ceil(block);
    let mut out = Array3::<f64>::zeros((frames, out_h, out_w));

    let block_area = (block as u128) * (block as u128);
    Zip::indexed(&mut out).par_for_each(|(f, r, c), o| {
        let ys = r * block..(r * block).saturating_add(block).min(height);
        let xs = c * block..(c * block).saturating_add(block).min(width);
        let mut values = Vec::with_capacity(ys.len() * xs.len());
        for y in ys {
            for x in xs.clone() {
                values.push(data[[f, y, x]]);
            }
        }
        let pads = block_area - values.len() as u128;
        *o = padded_nan_median(&mut values, pad, pads);
    });

    debug!(block, out_h, out_w, "downsampled image stack");
    ImageStack::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn medians_of_even_blocks() {
        let frame = array![
            [1.0, 2.0, 10.0, 10.0],
            [3.0, 4.0, 10.0, 30.0],
            [0.0, 0.0, 5.0, 6.0],
            [0.0, 9.0, 7.0, 8.0],
        ];
        let stack = ImageStack::from_frame(frame).unwrap();
        let small = downsample_stack(&stack, 2).unwrap();
        assert_eq!(small.dim(), (1, 2, 2));
        let f = small.frame(0).unwrap();
        assert_eq!(f[[0, 0]], 2.5);
        assert_eq!(f[[0, 1]], 10.0);
        assert_eq!(f[[1, 0]], 0.0);
        assert_eq!(f[[1, 1]], 6.5);
    }

    #[test]
    fn ragged_edges_pad_with_stack_minimum() {
        let frame = Array2::from_shape_fn((3, 3), |(r, c)| (10 + r * 3 + c) as f64);
        let stack = ImageStack::from_frame(frame).unwrap();
        let small = downsample_stack(&stack, 2).unwrap();
        assert_eq!(small.dim(), (1, 2, 2));
        // Bottom-right block holds 18 plus three pads of 10
        assert_eq!(small.frame(0).unwrap()[[1, 1]], 10.0);
    }

    #[test]
    fn nan_pixels_are_skipped() {
        let frame = array![[f64::NAN, 4.0], [f64::NAN, 8.0]];
        let stack = ImageStack::from_frame(frame).unwrap();
        let small = downsample_stack(&stack, 2).unwrap();
        assert_eq!(small.frame(0).unwrap()[[0, 0]], 6.0);
    }

    #[test]
    fn huge_block_counts_pads_without_storing_them() {
        let frame = Array2::from_shape_fn((4, 4), |(r, c)| (3 + r * 4 + c) as f64);
        let stack = ImageStack::from_frame(frame).unwrap();
        let small = downsample_stack(&stack, 200_000).unwrap();
        assert_eq!(small.dim(), (1, 1, 1));
        // Pads outnumber the 16 real pixels, so the median is the pad value
        assert_eq!(small.frame(0).unwrap()[[0, 0]], 3.0);
    }

    #[test]
    fn padded_median_merges_counted_pads() {
        // 18 with three pads of 10: [10, 10, 10, 18]
        assert_eq!(padded_nan_median(&mut vec![18.0], 10.0, 3), 10.0);
        // [1, 2, 2, 3, 4] with the pad landing between real values
        assert_eq!(padded_nan_median(&mut vec![4.0, 1.0, 3.0, 2.0], 2.0, 1), 2.0);
        // -inf sorts below the pad
        assert_eq!(
            padded_nan_median(&mut vec![f64::NEG_INFINITY, 5.0], 0.0, 1),
            0.0
        );
        assert_eq!(padded_nan_median(&mut vec![f64::NAN, 8.0, 4.0], f64::NAN, 2), 6.0);
        assert!(padded_nan_median(&mut vec![f64::NAN], f64::NAN, 4).is_nan());
    }

    #[test]
    fn block_sizes() {
        let stack = ImageStack::from_frame(Array2::from_elem((4, 4), 1.0)).unwrap();
        assert!(downsample_stack(&stack, 0).unwrap_err().is_invalid_argument());
        assert_eq!(downsample_stack(&stack, 1).unwrap(), stack);
        assert_eq!(downsample_stack(&stack, 8).unwrap().dim(), (1, 1, 1));
    }
}
