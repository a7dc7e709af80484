//! Processing stages: the computational boundary of the engine.
//!
//! A [`Stage`] is the unit the filter engine orchestrates: it takes one
//! dataset, runs, and exposes one output dataset, plus whatever
//! type-specific setters its filter forwards parameters into. The
//! implementations here are reference versions of the geometric kernels
//! (the exact kernels are a collaborator concern); every setting is
//! readable so parameter forwarding can be verified independently of the
//! math.
//!
//! A [`StageChain`] is an ordered stage sequence with a distinguished
//! entry (first) and exit (last) stage. Filters register one chain per
//! [`ChainKind`] they support and mark exactly one active.

pub mod clip;
pub mod contour;
pub mod cut;
pub mod glyph;
pub mod probe;
pub mod stream;
pub mod warp;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::dataset::{DataHandle, DataSet};
use crate::post_error::PostError;

pub use clip::{ClipStage, ExtractGeometryStage, ScalarClipStage};
pub use contour::ContourStage;
pub use cut::CutStage;
pub use glyph::{GlyphStage, MaskPointsStage};
pub use probe::ProbeStage;
pub use stream::StreamTracerStage;
pub use warp::WarpStage;

/// One processing stage.
pub trait Stage: Send + Sync {
    /// Feed the input dataset. `None` clears it.
    fn set_input(&mut self, input: Option<DataHandle>);
    /// Run the stage against the current input and settings.
    fn update(&mut self) -> Result<(), PostError>;
    /// Output of the last successful update.
    fn output(&self) -> Option<DataHandle>;
}

/// Shared stage handle: the owning filter keeps a typed clone for
/// parameter forwarding while the chain holds the erased one.
pub type SharedStage = Arc<RwLock<dyn Stage>>;

/// The fixed set of stage-chain variants across all concrete filters.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ChainKind {
    /// Vector warp.
    Warp,
    /// Interpolating clip.
    Clip,
    /// Whole-cell extract.
    Extract,
    /// Implicit-function cut.
    Cut,
    /// Iso-contour.
    Contour,
    /// Masked glyphs.
    Glyph3d,
    /// Streamline tracing.
    StreamLine,
    /// Probe along a line.
    DataAlongLine,
    /// Probe at a point.
    DataAtPoint,
}

/// Ordered stage sequence; entry stage first, exit stage last.
#[derive(Clone)]
pub struct StageChain {
    stages: Vec<SharedStage>,
}

impl StageChain {
    /// Chain of one stage.
    pub fn single(stage: SharedStage) -> Self {
        Self {
            stages: vec![stage],
        }
    }

    /// Chain of several stages, run in order.
    pub fn new(stages: Vec<SharedStage>) -> Self {
        debug_assert!(!stages.is_empty(), "a chain needs at least one stage");
        Self { stages }
    }

    /// Feed `input` into the entry stage, update every stage in order
    /// wiring outputs to inputs, and return the exit stage's output.
    pub fn run(&self, input: Option<DataHandle>) -> Result<Option<DataHandle>, PostError> {
        let mut current = input;
        for stage in &self.stages {
            let mut stage = stage.write();
            stage.set_input(current.take());
            stage.update()?;
            current = stage.output();
        }
        Ok(current)
    }
}

/// The plain dataset behind `input`, `None` for absent or composite
/// input. Stages treat both as "nothing to process".
pub(crate) fn input_set(input: &Option<DataHandle>) -> Option<&DataSet> {
    input.as_ref().and_then(|h| h.as_set())
}
