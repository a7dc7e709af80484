//! Result-file readers: format dispatch and the reader contract.
//!
//! A reader turns one result file into a list of [`Instant`]s. Dispatch
//! keys on the file name: the exact name `controlDict` selects the
//! OpenFOAM case reader, extensions `vtk`/`vtu`/`nc` select the generic
//! dataset, unstructured-grid, and NetCDF time-series readers. Unknown
//! names fail immediately with no instants.
//!
//! Legacy VTK and VTU readers are built in. NetCDF and OpenFOAM parsing
//! belongs to an external collaborator; both kinds are recognized here
//! and resolved through the [`ReaderRegistry`], where the embedding
//! application registers its readers. A recognized kind without a
//! registered reader is a reported failure, not a panic or an `Err`
//! escalation.

pub mod vtk;
pub mod vtu;

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::instant::Instant;
use crate::post_error::PostError;

/// Recognized result-file kinds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FormatKind {
    /// Legacy `.vtk` generic dataset, single timestep at t = 0.
    GenericDataSet,
    /// `.vtu` XML unstructured grid, with a legacy-format fallback.
    UnstructuredGrid,
    /// `.nc` NetCDF file split into a time series.
    NetCdf,
    /// OpenFOAM case, identified by its `controlDict`.
    OpenFoam,
}

impl FormatKind {
    /// Detect the kind from a file name, `None` for unrecognized names.
    pub fn detect(path: &Path) -> Option<FormatKind> {
        if path.file_name().is_some_and(|n| n == "controlDict") {
            return Some(FormatKind::OpenFoam);
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("vtk") => Some(FormatKind::GenericDataSet),
            Some("vtu") => Some(FormatKind::UnstructuredGrid),
            Some("nc") => Some(FormatKind::NetCdf),
            _ => None,
        }
    }
}

/// Reader contract: one result file in, time-ordered instants out.
///
/// Implementations append one instant per discovered time value; formats
/// without time metadata emit a single instant at t = 0. NetCDF readers
/// are expected to apply spherical-coordinate and fill-value-to-NaN
/// conversion before handing data over; OpenFOAM readers split the case
/// into one instant per time directory.
pub trait InstantReader: Send + Sync {
    /// Read `path` into instants.
    fn read(&self, path: &Path) -> Result<Vec<Instant>, PostError>;
}

/// Maps format kinds to reader implementations.
pub struct ReaderRegistry {
    readers: HashMap<FormatKind, Box<dyn InstantReader>>,
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        let mut registry = Self {
            readers: HashMap::new(),
        };
        registry.register(FormatKind::GenericDataSet, Box::new(vtk::LegacyVtkReader));
        registry.register(FormatKind::UnstructuredGrid, Box::new(vtu::XmlVtuReader));
        registry
    }
}

impl ReaderRegistry {
    /// Registry without any readers.
    pub fn empty() -> Self {
        Self {
            readers: HashMap::new(),
        }
    }

    /// Install (or replace) the reader for `kind`.
    pub fn register(&mut self, kind: FormatKind, reader: Box<dyn InstantReader>) {
        self.readers.insert(kind, reader);
    }

    /// Dispatch `path` to the matching reader.
    ///
    /// # Errors
    /// `MalformedFile` when the name matches no recognized kind or the
    /// kind has no registered reader, plus whatever the reader reports.
    pub fn read(&self, path: &Path) -> Result<Vec<Instant>, PostError> {
        let Some(kind) = FormatKind::detect(path) else {
            return Err(PostError::MalformedFile {
                file: path.display().to_string(),
                reason: "unrecognized result file format".into(),
            });
        };
        let Some(reader) = self.readers.get(&kind) else {
            return Err(PostError::MalformedFile {
                file: path.display().to_string(),
                reason: format!("no reader registered for {kind:?}"),
            });
        };
        reader.read(path)
    }
}

static DEFAULT_REGISTRY: Lazy<RwLock<ReaderRegistry>> =
    Lazy::new(|| RwLock::new(ReaderRegistry::default()));

/// Register a reader (e.g. a NetCDF or OpenFOAM collaborator) in the
/// process-wide registry used by [`read_result_file`].
pub fn register_reader(kind: FormatKind, reader: Box<dyn InstantReader>) {
    DEFAULT_REGISTRY.write().register(kind, reader);
}

/// Read `path` through the process-wide registry.
pub fn read_result_file(path: &Path) -> Result<Vec<Instant>, PostError> {
    DEFAULT_REGISTRY.read().read(path)
}
