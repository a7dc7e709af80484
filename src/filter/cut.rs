//! Cut filter: surface where an implicit function crosses the mesh.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::dataset::DataHandle;
use crate::filter::{DataSlot, Filter, FilterBase, Outcome, PostObject};
use crate::function::SharedFunction;
use crate::param::Param;
use crate::post_error::PostError;
use crate::stage::{ChainKind, CutStage, StageChain};

/// Cut the mesh with an implicit function. Refuses to run until a
/// function is assigned.
pub struct CutFilter {
    base: FilterBase,
    stage: Arc<RwLock<CutStage>>,
    function: Param<Option<SharedFunction>>,
}

impl Default for CutFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl CutFilter {
    /// Filter without a function.
    pub fn new() -> Self {
        let stage = Arc::new(RwLock::new(CutStage::new()));
        let mut base = FilterBase::new();
        base.register_chain(ChainKind::Cut, StageChain::single(stage.clone()));
        base.set_active(ChainKind::Cut);
        Self {
            base,
            stage,
            function: Param::new(None),
        }
    }

    /// Assign the cutting function.
    pub fn set_function(&mut self, function: SharedFunction) {
        self.function.set(Some(function));
    }

    /// Currently assigned function.
    pub fn function(&self) -> Option<&SharedFunction> {
        self.function.get().as_ref()
    }
}

impl PostObject for CutFilter {
    fn data(&self) -> Option<DataHandle> {
        self.base.data()
    }

    fn data_slot(&self) -> DataSlot {
        self.base.data_slot()
    }
}

impl Filter for CutFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn must_execute(&self) -> bool {
        self.function.is_touched()
    }

    fn execute(&mut self) -> Result<Outcome, PostError> {
        let Some(function) = self.function.get() else {
            return Ok(Outcome::NothingToDo);
        };
        self.stage.write().set_cut_function(Arc::clone(function));
        let outcome = self.base.run_active()?;
        if outcome == Outcome::Done {
            self.function.purge();
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Cell, CellType, DataObject, DataSet};
    use crate::filter::new_slot;
    use crate::function::ImplicitFunction;
    use crate::param::Vec3;

    #[test]
    fn refuses_until_a_function_is_assigned() {
        let slot = new_slot();
        *slot.write() = Some(DataObject::handle(
            DataSet::from_geometry(
                vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
                vec![Cell::new(CellType::Segment, vec![0, 1])],
            )
            .unwrap(),
        ));

        let mut filter = CutFilter::new();
        filter.base_mut().set_input_slot(Some(slot));
        assert_eq!(filter.execute().unwrap(), Outcome::NothingToDo);

        let mut plane = ImplicitFunction::plane();
        plane.set_origin(Vec3::new(0.5, 0.0, 0.0));
        plane.set_normal(Vec3::new(1.0, 0.0, 0.0));
        filter.set_function(plane.into_shared());
        assert!(filter.must_execute());

        assert_eq!(filter.execute().unwrap(), Outcome::Done);
        assert_eq!(filter.data().unwrap().as_set().unwrap().num_cells(), 1);
        assert!(!filter.must_execute());
    }
}
