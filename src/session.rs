//! Viewer session: one raw stack, many derived views.
//!
//! A session holds the raw stack read-only and publishes immutable
//! [`Snapshot`]s of everything derived from it. A parameter change builds a
//! complete new snapshot and swaps it in whole; a rejected change leaves the
//! previous snapshot published. Readers on other threads go through a
//! [`SnapshotReader`] and only ever see a finished snapshot.

use std::sync::{Arc, PoisonError, RwLock};

use ndarray::{Array3, Array4, ArrayView3, Axis};
use tracing::{debug, info, warn};

use crate::colormap::{ColorLookupTable, GradientDescriptor, Palette};
use crate::config::ViewParams;
use crate::error::Result;
use crate::normalize::{normalize_stack, GammaStrategy, ImageStack, IntensityRange};
use crate::render::{render_stack, PlaybackDirection, SaturationWindow};

/// Gamma baked into the pixel indices for a parameter set.
fn index_gamma(params: &ViewParams) -> f64 {
    match params.gamma_strategy {
        GammaStrategy::OnValue => params.gamma,
        GammaStrategy::OnTable => 1.0,
    }
}

/// Table actually used for lookup: the palette table, gamma-remapped when
/// gamma lives in the table.
///
/// The remap takes `1 / gamma` so that one user-facing gamma means the same
/// curve under either strategy.
fn display_table(base: &ColorLookupTable, params: &ViewParams) -> Result<ColorLookupTable> {
    match params.gamma_strategy {
        GammaStrategy::OnValue => Ok(base.clone()),
        GammaStrategy::OnTable => base.with_index_gamma(1.0 / params.gamma, params.ceiling),
    }
}

/// Immutable derived artifacts for one parameter set.
#[derive(Debug)]
pub struct Snapshot {
    params: ViewParams,
    range: IntensityRange,
    base_table: ColorLookupTable,
    table: ColorLookupTable,
    descriptor: GradientDescriptor,
    indices: Arc<Array3<u8>>,
    rgb: Arc<Array4<u8>>,
}

impl Snapshot {
    /// Derive everything from scratch.
    fn compute(stack: &ImageStack, range: IntensityRange, params: ViewParams) -> Result<Self> {
        params.validate(stack.frames())?;
        let base_table = ColorLookupTable::build(&params.palette.gradient(), params.table_size)?;
        let table = display_table(&base_table, &params)?;
        let indices = normalize_stack(stack, &range, params.ceiling, index_gamma(&params))?;
        let rgb = render_stack(&indices, &table, params.window.as_ref())?;
        Ok(Self {
            descriptor: table.descriptor(),
            params,
            range,
            base_table,
            table,
            indices: Arc::new(indices),
            rgb: Arc::new(rgb),
        })
    }

    /// Derive from `self`, recomputing only what `params` invalidates.
    fn update(&self, stack: &ImageStack, params: ViewParams) -> Result<Self> {
        params.validate(stack.frames())?;
        let old = &self.params;

        let base_table = if params.palette != old.palette || params.table_size != old.table_size {
            ColorLookupTable::build(&params.palette.gradient(), params.table_size)?
        } else {
            self.base_table.clone()
        };
        let table = display_table(&base_table, &params)?;

        let reindex = params.ceiling != old.ceiling || index_gamma(&params) != index_gamma(old);
        let indices = if reindex {
            Arc::new(normalize_stack(
                stack,
                &self.range,
                params.ceiling,
                index_gamma(&params),
            )?)
        } else {
            Arc::clone(&self.indices)
        };

        let recolor = reindex || table != self.table || params.window != old.window;
        let rgb = if recolor {
            Arc::new(render_stack(&indices, &table, params.window.as_ref())?)
        } else {
            Arc::clone(&self.rgb)
        };

        debug!(reindex, recolor, "derived snapshot");
        Ok(Self {
            descriptor: table.descriptor(),
            params,
            range: self.range,
            base_table,
            table,
            indices,
            rgb,
        })
    }

    /// Parameters this snapshot was derived from.
    pub fn params(&self) -> &ViewParams {
        &self.params
    }

    /// Intensity bounds used for normalization.
    pub fn range(&self) -> IntensityRange {
        self.range
    }

    /// Lookup table in effect (after any gamma remap).
    pub fn table(&self) -> &ColorLookupTable {
        &self.table
    }

    /// Colorscale parallel to [`Snapshot::table`].
    pub fn descriptor(&self) -> &GradientDescriptor {
        &self.descriptor
    }

    /// Normalized index stack.
    pub fn indices(&self) -> &Arc<Array3<u8>> {
        &self.indices
    }

    /// Rendered `(frames, height, width, 3)` stack.
    pub fn rgb(&self) -> &Arc<Array4<u8>> {
        &self.rgb
    }

    /// Number of frames.
    pub fn frames(&self) -> usize {
        self.rgb.len_of(Axis(0))
    }

    /// One rendered frame, if in range.
    pub fn frame_rgb(&self, frame: usize) -> Option<ArrayView3<'_, u8>> {
        (frame < self.frames()).then(|| self.rgb.index_axis(Axis(0), frame))
    }

    /// The frame selected by [`ViewParams::frame`].
    pub fn current_frame_rgb(&self) -> ArrayView3<'_, u8> {
        // `params.frame` was validated against the frame count
        self.rgb.index_axis(Axis(0), self.params.frame)
    }

    /// Frame indices in playback order.
    pub fn frame_order(&self) -> Vec<usize> {
        self.params.direction.frame_order(self.frames())
    }
}

/// Shared read handle to the latest published snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    slot: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotReader {
    /// The snapshot published most recently.
    pub fn latest(&self) -> Arc<Snapshot> {
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }
}

/// Single-writer session over one raw image stack.
#[derive(Debug)]
pub struct ViewerSession {
    stack: Arc<ImageStack>,
    slot: Arc<RwLock<Arc<Snapshot>>>,
}

impl ViewerSession {
    /// Start a session, normalizing against the stack's own min and max.
    pub fn new(stack: ImageStack, params: ViewParams) -> Result<Self> {
        let range = IntensityRange::of_stack(&stack)?;
        Self::with_range(stack, range, params)
    }

    /// Start a session with explicit intensity bounds.
    pub fn with_range(stack: ImageStack, range: IntensityRange, params: ViewParams) -> Result<Self> {
        let snapshot = Snapshot::compute(&stack, range, params)?;
        info!(
            frames = stack.frames(),
            height = stack.height(),
            width = stack.width(),
            palette = %snapshot.params.palette,
            "viewer session started"
        );
        Ok(Self {
            stack: Arc::new(stack),
            slot: Arc::new(RwLock::new(Arc::new(snapshot))),
        })
    }

    /// The raw stack.
    pub fn stack(&self) -> &ImageStack {
        &self.stack
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// A handle other threads can read snapshots through.
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Current parameters.
    pub fn params(&self) -> ViewParams {
        self.snapshot().params.clone()
    }

    /// Replace all parameters at once.
    ///
    /// On error the previous snapshot stays published.
    pub fn apply(&mut self, params: ViewParams) -> Result<Arc<Snapshot>> {
        let current = self.snapshot();
        let next = match current.update(&self.stack, params) {
            Ok(next) => Arc::new(next),
            Err(e) => {
                warn!(error = %e, "rejected parameter change");
                return Err(e);
            }
        };
        {
            let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
            *slot = Arc::clone(&next);
        }
        debug!(frame = next.params.frame, gamma = next.params.gamma, "published snapshot");
        Ok(next)
    }

    /// Change gamma.
    pub fn set_gamma(&mut self, gamma: f64) -> Result<Arc<Snapshot>> {
        let params = ViewParams {
            gamma,
            ..self.params()
        };
        self.apply(params)
    }

    /// Change where gamma is applied.
    pub fn set_gamma_strategy(&mut self, gamma_strategy: GammaStrategy) -> Result<Arc<Snapshot>> {
        let params = ViewParams {
            gamma_strategy,
            ..self.params()
        };
        self.apply(params)
    }

    /// Change palette.
    pub fn set_palette(&mut self, palette: Palette) -> Result<Arc<Snapshot>> {
        let params = ViewParams {
            palette,
            ..self.params()
        };
        self.apply(params)
    }

    /// Set or clear the saturation window.
    pub fn set_window(&mut self, window: Option<SaturationWindow>) -> Result<Arc<Snapshot>> {
        let params = ViewParams {
            window,
            ..self.params()
        };
        self.apply(params)
    }

    /// Select the displayed frame.
    pub fn set_frame(&mut self, frame: usize) -> Result<Arc<Snapshot>> {
        let params = ViewParams {
            frame,
            ..self.params()
        };
        self.apply(params)
    }

    /// Change playback direction.
    pub fn set_direction(&mut self, direction: PlaybackDirection) -> Result<Arc<Snapshot>> {
        let params = ViewParams {
            direction,
            ..self.params()
        };
        self.apply(params)
    }

    /// Step to the next frame in the playback direction, wrapping around.
    pub fn advance(&mut self) -> Result<Arc<Snapshot>> {
        let params = self.params();
        let frame = params.direction.step(params.frame, self.stack.frames());
        self.set_frame(frame)
    }
}
