//! Streamline filter.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::dataset::DataHandle;
use crate::fields::{Arity, FieldSelector};
use crate::filter::{DataSlot, Filter, FilterBase, Outcome, PostObject, input_catalog};
use crate::param::{Param, Vec3};
use crate::post_error::PostError;
use crate::stage::{ChainKind, StageChain, StreamTracerStage};

/// Trace streamlines of a vector field from a line of seed points.
///
/// The seed line endpoints follow the input geometry: every execute
/// resets them to the corners of the input bounding box, silently, so
/// the seeds always span the current mesh. The integration step is
/// likewise derived from the box diagonal.
pub struct StreamlineFilter {
    base: FilterBase,
    stage: Arc<RwLock<StreamTracerStage>>,
    vectors: FieldSelector,
    point1: Param<Vec3>,
    point2: Param<Vec3>,
    resolution: Param<usize>,
}

impl Default for StreamlineFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamlineFilter {
    /// Filter with 20 seeds and no field selected.
    pub fn new() -> Self {
        let stage = Arc::new(RwLock::new(StreamTracerStage::new()));
        let mut base = FilterBase::new();
        base.register_chain(ChainKind::StreamLine, StageChain::single(stage.clone()));
        base.set_active(ChainKind::StreamLine);
        Self {
            base,
            stage,
            vectors: FieldSelector::new(),
            point1: Param::new(Vec3::default()),
            point2: Param::new(Vec3::default()),
            resolution: Param::new(20),
        }
    }

    /// Select the advecting vector field by name.
    pub fn select_vector_field(&mut self, name: &str) {
        self.vectors.select(name);
    }

    /// Vector fields offered by the last catalog refresh.
    pub fn vector_options(&self) -> &[String] {
        self.vectors.options()
    }

    /// Currently selected vector field.
    pub fn selected_vector_field(&self) -> Option<&str> {
        self.vectors.selected()
    }

    /// Seed line start, as of the last execute.
    pub fn point1(&self) -> Vec3 {
        self.point1.value()
    }

    /// Seed line end, as of the last execute.
    pub fn point2(&self) -> Vec3 {
        self.point2.value()
    }

    /// Set the number of seed intervals along the line.
    pub fn set_resolution(&mut self, resolution: usize) {
        self.resolution.set(resolution);
    }

    /// Configured seed interval count.
    pub fn resolution(&self) -> usize {
        self.resolution.value()
    }
}

impl PostObject for StreamlineFilter {
    fn data(&self) -> Option<DataHandle> {
        self.base.data()
    }

    fn data_slot(&self) -> DataSlot {
        self.base.data_slot()
    }
}

impl Filter for StreamlineFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn must_execute(&self) -> bool {
        self.vectors.is_touched() || self.resolution.is_touched()
    }

    fn execute(&mut self) -> Result<Outcome, PostError> {
        self.vectors.refresh(input_catalog(&self.base, Arity::Vector));

        if let Some(input) = self.base.resolve_input()
            && let Some(ds) = input.as_set()
        {
            let bounds = ds.bounds();
            if bounds.is_valid() {
                self.point1.set_silent(Vec3::from_array(bounds.min_point()));
                self.point2.set_silent(Vec3::from_array(bounds.max_point()));
                let mut stage = self.stage.write();
                stage.set_step_size(bounds.diagonal() / 100.0);
            }
        }
        {
            let mut stage = self.stage.write();
            stage.set_vector_field(self.vectors.selected().map(str::to_owned));
            stage.set_seed_line(
                self.point1.value(),
                self.point2.value(),
                self.resolution.value(),
            );
        }
        let outcome = self.base.run_active()?;
        if outcome == Outcome::Done {
            self.vectors.purge();
            self.resolution.purge();
        }
        Ok(outcome)
    }
}
