//! Pipelines: load result files and drive a set of filters.
//!
//! A [`PostPipeline`] is both a filter (it has an input link and an
//! output slot, and can be nested) and a container: it owns child
//! filters, the instants read from disk, and the time index selecting
//! which instant the children see. Child wiring is re-established
//! eagerly whenever the children, the combination mode, or the
//! pipeline's own input change, so the data-flow invariant holds between
//! executes, not just during them.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dataset::{DataHandle, DataObject, append_all};
use crate::filter::{DataSlot, Filter, FilterBase, Outcome, PostObject, SharedFilter, new_slot};
use crate::function::FunctionProvider;
use crate::instant::{Instant, InstantCollection};
use crate::param::{ConstrainedInt, Param};
use crate::post_error::PostError;
use crate::result::PostResult;

/// Shared pipeline handle, as stored in a [`PostResult`].
pub type SharedPipeline = Arc<RwLock<PostPipeline>>;

/// How child filter outputs combine.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Mode {
    /// Children form a chain; each consumes its predecessor's output.
    #[default]
    Serial,
    /// Children all consume the pipeline source; outputs are appended.
    Parallel,
}

/// Filter container with time-indexed source data.
pub struct PostPipeline {
    base: FilterBase,
    source: DataSlot,
    children: Vec<SharedFilter>,
    mode: Param<Mode>,
    functions: FunctionProvider,
    time_index: ConstrainedInt,
    instants: InstantCollection,
}

impl Default for PostPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl PostPipeline {
    /// Empty serial pipeline with no instants loaded.
    pub fn new() -> Self {
        Self {
            base: FilterBase::new(),
            source: new_slot(),
            children: Vec::new(),
            mode: Param::new(Mode::Serial),
            functions: FunctionProvider::new(),
            time_index: ConstrainedInt::default(),
            instants: InstantCollection::new(),
        }
    }

    /// Wrap into a shared handle.
    pub fn into_shared(self) -> SharedPipeline {
        Arc::new(RwLock::new(self))
    }

    /// Attach a filter at the end of the pipeline and rewire.
    pub fn add_filter(&mut self, filter: SharedFilter) {
        self.children.push(filter);
        self.rewire();
    }

    /// Detach a filter; true when it was a child. Rewires on removal.
    pub fn remove_filter(&mut self, filter: &SharedFilter) -> bool {
        let before = self.children.len();
        self.children.retain(|c| !Arc::ptr_eq(c, filter));
        let removed = self.children.len() != before;
        if removed {
            self.rewire();
        }
        removed
    }

    /// Whether `filter` is a child of this pipeline.
    pub fn holds_post_object(&self, filter: &SharedFilter) -> bool {
        self.children.iter().any(|c| Arc::ptr_eq(c, filter))
    }

    /// Attached filters, in pipeline order.
    pub fn children(&self) -> &[SharedFilter] {
        &self.children
    }

    /// Switch the combination mode and rewire.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode.set(mode);
        self.rewire();
    }

    /// Current combination mode.
    pub fn mode(&self) -> Mode {
        self.mode.value()
    }

    /// Link an explicit input slot (nested-pipeline case) and rewire.
    pub fn set_input_slot(&mut self, input: Option<DataSlot>) {
        self.base.set_input_slot(input);
        self.rewire();
    }

    /// Implicit functions available to this pipeline's filters.
    pub fn functions(&self) -> &FunctionProvider {
        &self.functions
    }

    /// Implicit functions, mutable.
    pub fn functions_mut(&mut self) -> &mut FunctionProvider {
        &mut self.functions
    }

    /// Instants read so far.
    pub fn instants(&self) -> &InstantCollection {
        &self.instants
    }

    /// The dataset the children see when they have no explicit input.
    pub fn source_data(&self) -> Option<DataHandle> {
        self.source.read().clone()
    }

    /// Re-establish the data-flow invariant.
    ///
    /// The first child links to the pipeline's external input (falling
    /// back to the source slot when none is set). In serial mode every
    /// further child links to its predecessor's output slot; in parallel
    /// mode every child links like the first.
    fn rewire(&self) {
        let external = self.base.input_slot().cloned();
        let mut previous: Option<DataSlot> = None;
        for (i, child) in self.children.iter().enumerate() {
            let link = match self.mode.value() {
                Mode::Parallel => external.clone(),
                Mode::Serial if i == 0 => external.clone(),
                Mode::Serial => previous.clone(),
            };
            let mut child = child.write();
            child
                .base_mut()
                .set_source_slot(Some(Arc::clone(&self.source)));
            child.base_mut().set_input_slot(link);
            previous = Some(child.data_slot());
        }
    }

    /// Populate the instant collection from a result file.
    ///
    /// On success the time-index constraint becomes `[0, N-1]`, the
    /// index jumps to the latest instant, and the source slot is
    /// refreshed.
    ///
    /// # Errors
    /// `FileUnreadable` when `path` is not a file or cannot be opened.
    /// A readable file the readers cannot handle is `Ok(false)`, logged
    /// upstream.
    pub fn read(&mut self, path: &Path) -> Result<bool, PostError> {
        if !path.is_file() {
            return Err(PostError::FileUnreadable(path.display().to_string()));
        }
        File::open(path).map_err(|_| PostError::FileUnreadable(path.display().to_string()))?;
        if !self.instants.read(path)? {
            return Ok(false);
        }
        let last = self.instants.len() as i64 - 1;
        self.time_index.set_range(0, last);
        self.time_index.set(last);
        self.refresh_source();
        Ok(true)
    }

    /// Merged all-regions dataset of the instant at the current time
    /// index; `None` when the index addresses no instant.
    pub fn fetch(&self) -> Option<DataHandle> {
        let index = self.time_index.value();
        if index < 0 {
            return None;
        }
        self.instants
            .find_instant(index as usize)
            .and_then(Instant::all_regions)
    }

    /// A time-index change drives the pipeline's own output directly:
    /// both the source slot and the data slot receive the fetched
    /// instant, bypassing the serial/parallel combine.
    fn refresh_source(&self) {
        let fetched = self.fetch();
        *self.base.data_slot().write() = fetched.clone();
        *self.source.write() = fetched;
    }

    /// Jump to a time index (clamped into the loaded range) and refresh
    /// the source and data slots.
    pub fn set_time_index(&mut self, index: i64) {
        self.time_index.set(index);
        self.refresh_source();
    }

    /// Step the time index by `delta`; the constrained storage clamps at
    /// the ends of the loaded range.
    pub fn advance(&mut self, delta: i64) {
        self.time_index.set(self.time_index.value() + delta);
        self.refresh_source();
    }

    /// Current time index.
    pub fn time_index(&self) -> i64 {
        self.time_index.value()
    }

    /// Valid time-index range, `[0, N-1]` once instants are loaded.
    pub fn time_index_range(&self) -> (i64, i64) {
        self.time_index.range()
    }

    /// Time values of every loaded instant, in order.
    pub fn list_time_values(&self) -> Vec<f64> {
        self.instants.time_values()
    }

    /// Region names of the instant at the current time index.
    pub fn list_regions(&self) -> Vec<String> {
        let index = self.time_index.value();
        if index < 0 {
            return Vec::new();
        }
        self.instants
            .find_instant(index as usize)
            .map(Instant::region_names)
            .unwrap_or_default()
    }

    /// Append this pipeline to a result object.
    pub fn load(this: &SharedPipeline, result: &mut PostResult) {
        result.push(Arc::clone(this));
    }

    /// Like [`PostPipeline::load`], but tolerates a missing result
    /// object with a warning. Returns whether the pipeline was loaded.
    pub fn try_load(this: &SharedPipeline, result: Option<&mut PostResult>) -> bool {
        match result {
            Some(result) => {
                Self::load(this, result);
                true
            }
            None => {
                log::warn!("no result object; pipeline not loaded");
                false
            }
        }
    }
}

impl PostObject for PostPipeline {
    fn data(&self) -> Option<DataHandle> {
        self.base.data()
    }

    fn data_slot(&self) -> DataSlot {
        self.base.data_slot()
    }
}

impl Filter for PostPipeline {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn must_execute(&self) -> bool {
        self.mode.is_touched()
            || self.time_index.is_touched()
            || self.children.iter().any(|c| c.read().must_execute())
    }

    /// Execute every child in order, then combine. A pipeline without an
    /// external input is a root time source: its output stays at the
    /// fetched instant and the children are left to their own slots.
    /// With an external input, serial mode presents the last child's
    /// output, parallel mode the append of all child outputs, and a
    /// childless pipeline presents the input itself.
    fn execute(&mut self) -> Result<Outcome, PostError> {
        self.rewire();
        for child in &self.children {
            child.write().execute()?;
        }

        if self.base.input_slot().is_none() {
            self.mode.purge();
            self.time_index.purge();
            return Ok(if self.base.data().is_some() {
                Outcome::Done
            } else {
                Outcome::NothingToDo
            });
        }

        let combined = if self.children.is_empty() {
            self.base.resolve_input()
        } else {
            match self.mode.value() {
                Mode::Serial => self
                    .children
                    .last()
                    .and_then(|c| c.read().data()),
                Mode::Parallel => {
                    let outputs: Vec<DataHandle> = self
                        .children
                        .iter()
                        .filter_map(|c| c.read().data())
                        .collect();
                    if outputs.is_empty() {
                        None
                    } else {
                        Some(DataObject::handle(append_all(
                            outputs.iter().map(|h| h.as_ref()),
                        )))
                    }
                }
            }
        };
        match combined {
            Some(data) => {
                *self.base.data_slot().write() = Some(data);
                self.mode.purge();
                self.time_index.purge();
                Ok(Outcome::Done)
            }
            None => Ok(Outcome::NothingToDo),
        }
    }
}
