//! Warp-by-vector filter.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::dataset::DataHandle;
use crate::fields::{Arity, FieldSelector};
use crate::filter::{DataSlot, Filter, FilterBase, Outcome, PostObject, input_catalog};
use crate::param::Param;
use crate::post_error::PostError;
use crate::stage::{ChainKind, StageChain, WarpStage};

/// Displace the mesh along a selected vector field.
pub struct WarpVectorFilter {
    base: FilterBase,
    stage: Arc<RwLock<WarpStage>>,
    factor: Param<f64>,
    vectors: FieldSelector,
}

impl Default for WarpVectorFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl WarpVectorFilter {
    /// Filter with factor 1.0 and no field selected.
    pub fn new() -> Self {
        let stage = Arc::new(RwLock::new(WarpStage::new()));
        let mut base = FilterBase::new();
        base.register_chain(ChainKind::Warp, StageChain::single(stage.clone()));
        base.set_active(ChainKind::Warp);
        Self {
            base,
            stage,
            factor: Param::new(1.0),
            vectors: FieldSelector::new(),
        }
    }

    /// Set the displacement factor.
    pub fn set_factor(&mut self, factor: f64) {
        self.factor.set(factor);
    }

    /// Current displacement factor.
    pub fn factor(&self) -> f64 {
        self.factor.value()
    }

    /// Select the displacing vector field by name.
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
}

impl PostObject for WarpVectorFilter {
    fn data(&self) -> Option<DataHandle> {
        self.base.data()
    }

    fn data_slot(&self) -> DataSlot {
        self.base.data_slot()
    }
}

impl Filter for WarpVectorFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn must_execute(&self) -> bool {
        self.factor.is_touched() || self.vectors.is_touched()
    }

    fn execute(&mut self) -> Result<Outcome, PostError> {
        self.vectors.refresh(input_catalog(&self.base, Arity::Vector));
        {
            let mut stage = self.stage.write();
            stage.set_scale_factor(self.factor.value());
            stage.set_vector_field(self.vectors.selected().map(str::to_owned));
        }
        let outcome = self.base.run_active()?;
        if outcome == Outcome::Done {
            self.factor.purge();
            self.vectors.purge();
        }
        Ok(outcome)
    }
}
