//! # cfd-post
//!
//! cfd-post is a post-processing engine for CFD simulation results. It loads
//! time-indexed result files into pipelines, drives chains of visualization
//! filters (warp, clip, cut, contour, glyphs, streamlines, line and point
//! probes) over the selected timestep, and keeps filter outputs consistent
//! through a dirty/clean recompute protocol.
//!
//! ## Architecture
//! - [`dataset`]: points, cells and named data arrays; the immutable
//!   snapshots filters pass around.
//! - [`instant`]: time-stamped multi-region snapshots, read from result
//!   files into an ordered collection.
//! - [`io`]: result-file readers with format dispatch (`.vtk`, `.vtu`,
//!   `.nc`, OpenFOAM `controlDict`) and a registry for collaborator
//!   readers.
//! - [`filter`]: touch-tracked parameters, stage chains and shared output
//!   slots; nine concrete filters.
//! - [`pipeline`]: the container wiring filters serially or in parallel
//!   over the instant selected by a clamped time index.
//!
//! ## Determinism
//! Randomized decisions (glyph point masking) use `SmallRng` with fixed
//! seeds, so repeated executes of an unchanged pipeline produce identical
//! output.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! cfd-post = "0.1"
//! ```

pub mod dataset;
pub mod fields;
pub mod filter;
pub mod function;
pub mod instant;
pub mod io;
pub mod param;
pub mod pipeline;
pub mod post_error;
pub mod result;
pub mod stage;

/// Convenient re-exports of the types most embeddings need.
pub mod prelude {
    pub use crate::dataset::{
        Association, BoundingBox, Cell, CellType, DataArray, DataHandle, DataObject, DataSet,
        MultiBlock,
    };
    pub use crate::fields::{Arity, FieldSelector};
    pub use crate::filter::{
        ClipFilter, ContourFilter, CutFilter, DataAlongLineFilter, DataAtPointFilter, Filter,
        Glyph3dFilter, Outcome, PostObject, ScalarClipFilter, SharedFilter, StreamlineFilter,
        WarpVectorFilter,
    };
    pub use crate::function::{FunctionProvider, ImplicitFunction, SharedFunction};
    pub use crate::instant::{Instant, InstantCollection};
    pub use crate::io::{FormatKind, InstantReader, ReaderRegistry, register_reader};
    pub use crate::param::Vec3;
    pub use crate::pipeline::{Mode, PostPipeline, SharedPipeline};
    pub use crate::post_error::PostError;
    pub use crate::result::PostResult;
}
