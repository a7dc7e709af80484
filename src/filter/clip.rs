//! Region clipping: by implicit function and by scalar threshold.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::dataset::{Association, DataHandle};
use crate::fields::{Arity, FieldSelector};
use crate::filter::{DataSlot, Filter, FilterBase, Outcome, PostObject, input_catalog};
use crate::function::SharedFunction;
use crate::param::{ConstrainedFloat, FloatConstraint, Param};
use crate::post_error::PostError;
use crate::stage::{ChainKind, ClipStage, ExtractGeometryStage, ScalarClipStage, StageChain};

/// Clip the mesh against an implicit function.
///
/// Registers two chains and switches between them: whole-cell extraction
/// (the default) and the interpolating clip selected by `cut_cells`.
pub struct ClipFilter {
    base: FilterBase,
    extract: Arc<RwLock<ExtractGeometryStage>>,
    clip: Arc<RwLock<ClipStage>>,
    function: Param<Option<SharedFunction>>,
    inside_out: Param<bool>,
    cut_cells: Param<bool>,
}

impl Default for ClipFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipFilter {
    /// Filter without a function; executes do nothing until one is set.
    pub fn new() -> Self {
        let extract = Arc::new(RwLock::new(ExtractGeometryStage::new()));
        let clip = Arc::new(RwLock::new(ClipStage::new()));
        let mut base = FilterBase::new();
        base.register_chain(ChainKind::Extract, StageChain::single(extract.clone()));
        base.register_chain(ChainKind::Clip, StageChain::single(clip.clone()));
        base.set_active(ChainKind::Extract);
        Self {
            base,
            extract,
            clip,
            function: Param::new(None),
            inside_out: Param::new(false),
            cut_cells: Param::new(false),
        }
    }

    /// Assign the clipping function.
    pub fn set_function(&mut self, function: SharedFunction) {
        self.function.set(Some(function));
    }

    /// Currently assigned function.
    pub fn function(&self) -> Option<&SharedFunction> {
        self.function.get().as_ref()
    }

    /// Flip the retained side.
    pub fn set_inside_out(&mut self, inside_out: bool) {
        self.inside_out.set(inside_out);
    }

    /// Whether the retained side is flipped.
    pub fn inside_out(&self) -> bool {
        self.inside_out.value()
    }

    /// Switch to the interpolating variant that keeps straddling cells.
    pub fn set_cut_cells(&mut self, cut_cells: bool) {
        self.cut_cells.set(cut_cells);
    }

    /// Whether the interpolating variant is selected.
    pub fn cut_cells(&self) -> bool {
        self.cut_cells.value()
    }
}

impl PostObject for ClipFilter {
    fn data(&self) -> Option<DataHandle> {
        self.base.data()
    }

    fn data_slot(&self) -> DataSlot {
        self.base.data_slot()
    }
}

impl Filter for ClipFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn must_execute(&self) -> bool {
        self.function.is_touched() || self.inside_out.is_touched() || self.cut_cells.is_touched()
    }

    fn execute(&mut self) -> Result<Outcome, PostError> {
        self.base.set_active(if self.cut_cells.value() {
            ChainKind::Clip
        } else {
            ChainKind::Extract
        });
        if let Some(function) = self.function.get() {
            self.extract
                .write()
                .set_implicit_function(Arc::clone(function));
            self.clip.write().set_clip_function(Arc::clone(function));
        }
        self.extract
            .write()
            .set_extract_inside(self.inside_out.value());
        self.clip.write().set_inside_out(self.inside_out.value());

        let outcome = self.base.run_active()?;
        if outcome == Outcome::Done {
            self.function.purge();
            self.inside_out.purge();
            self.cut_cells.purge();
        }
        Ok(outcome)
    }
}

/// Clip the mesh where a selected scalar falls below a threshold.
pub struct ScalarClipFilter {
    base: FilterBase,
    stage: Arc<RwLock<ScalarClipStage>>,
    scalars: FieldSelector,
    value: ConstrainedFloat,
    inside_out: Param<bool>,
}

impl Default for ScalarClipFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalarClipFilter {
    /// Filter with value 0.0 and no field selected.
    pub fn new() -> Self {
        let stage = Arc::new(RwLock::new(ScalarClipStage::new()));
        let mut base = FilterBase::new();
        base.register_chain(ChainKind::Clip, StageChain::single(stage.clone()));
        base.set_active(ChainKind::Clip);
        Self {
            base,
            stage,
            scalars: FieldSelector::new(),
            value: ConstrainedFloat::new(0.0),
            inside_out: Param::new(false),
        }
    }

    /// Select the scalar field by name.
    pub fn select_scalar_field(&mut self, name: &str) {
        self.scalars.select(name);
    }

    /// Scalar fields offered by the last catalog refresh.
    pub fn scalar_options(&self) -> &[String] {
        self.scalars.options()
    }

    /// Currently selected scalar field.
    pub fn selected_scalar_field(&self) -> Option<&str> {
        self.scalars.selected()
    }

    /// Set the clip threshold; clamped into the selected field's range.
    pub fn set_value(&mut self, value: f64) {
        self.value.set(value);
    }

    /// Current clip threshold.
    pub fn value(&self) -> f64 {
        self.value.value()
    }

    /// Active threshold constraint.
    pub fn value_constraint(&self) -> FloatConstraint {
        self.value.constraint()
    }

    /// Flip the retained side.
    pub fn set_inside_out(&mut self, inside_out: bool) {
        self.inside_out.set(inside_out);
    }

    /// Whether the retained side is flipped.
    pub fn inside_out(&self) -> bool {
        self.inside_out.value()
    }

    /// Re-derive the threshold constraint from the selected field's
    /// value range: bounds are the field min/max, the suggested editing
    /// step is a hundredth of the span.
    fn refresh_constraint(&mut self) {
        let Some(name) = self.scalars.selected() else {
            return;
        };
        let Some(input) = self.base.resolve_input() else {
            return;
        };
        let Some((min, max)) = input
            .as_set()
            .and_then(|ds| ds.array(Association::Point, name))
            .and_then(|a| a.range())
        else {
            return;
        };
        self.value.set_constraint(FloatConstraint {
            lower: min,
            upper: max,
            step: (max - min) / 100.0,
        });
    }
}

impl PostObject for ScalarClipFilter {
    fn data(&self) -> Option<DataHandle> {
        self.base.data()
    }

    fn data_slot(&self) -> DataSlot {
        self.base.data_slot()
    }
}

impl Filter for ScalarClipFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn must_execute(&self) -> bool {
        self.scalars.is_touched() || self.value.is_touched() || self.inside_out.is_touched()
    }

    fn execute(&mut self) -> Result<Outcome, PostError> {
        self.scalars.refresh(input_catalog(&self.base, Arity::Scalar));
        self.refresh_constraint();
        {
            let mut stage = self.stage.write();
            stage.set_scalar_field(self.scalars.selected().map(str::to_owned));
            stage.set_value(self.value.value());
            stage.set_inside_out(self.inside_out.value());
        }
        let outcome = self.base.run_active()?;
        if outcome == Outcome::Done {
            self.scalars.purge();
            self.value.purge();
            self.inside_out.purge();
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Cell, CellType, DataArray, DataObject, DataSet};
    use crate::filter::new_slot;
    use crate::function::ImplicitFunction;
    use crate::param::Vec3;

    fn line_slot() -> DataSlot {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
        ];
        let cells = (0..3)
            .map(|i| Cell::new(CellType::Segment, vec![i, i + 1]))
            .collect();
        let mut ds = DataSet::from_geometry(points, cells).unwrap();
        ds.add_array(
            Association::Point,
            DataArray::scalars("p", vec![0.0, 2.0, 6.0, 10.0]),
        )
        .unwrap();
        let slot = new_slot();
        *slot.write() = Some(DataObject::handle(ds));
        slot
    }

    #[test]
    fn clip_does_nothing_without_a_function() {
        let mut filter = ClipFilter::new();
        filter.base_mut().set_input_slot(Some(line_slot()));
        assert_eq!(filter.execute().unwrap(), Outcome::NothingToDo);
        assert!(filter.data().is_none());
    }

    #[test]
    fn cut_cells_switches_the_active_chain() {
        let mut plane = ImplicitFunction::plane();
        plane.set_origin(Vec3::new(0.5, 0.0, 0.0));
        plane.set_normal(Vec3::new(1.0, 0.0, 0.0));

        let mut filter = ClipFilter::new();
        filter.base_mut().set_input_slot(Some(line_slot()));
        filter.set_function(plane.into_shared());

        filter.execute().unwrap();
        assert_eq!(filter.base().active_kind(), Some(ChainKind::Extract));
        let whole = filter.data().unwrap().as_set().unwrap().num_cells();

        filter.set_cut_cells(true);
        filter.execute().unwrap();
        assert_eq!(filter.base().active_kind(), Some(ChainKind::Clip));
        let straddling = filter.data().unwrap().as_set().unwrap().num_cells();
        assert!(straddling > whole);
    }

    #[test]
    fn scalar_clip_constrains_the_value_to_the_field_range() {
        let mut filter = ScalarClipFilter::new();
        filter.base_mut().set_input_slot(Some(line_slot()));
        filter.execute().unwrap();
        filter.select_scalar_field("p");
        filter.execute().unwrap();

        let constraint = filter.value_constraint();
        assert_eq!(constraint.lower, 0.0);
        assert_eq!(constraint.upper, 10.0);
        assert!((constraint.step - 0.1).abs() < 1e-12);

        filter.set_value(25.0);
        assert_eq!(filter.value(), 10.0);
    }

    #[test]
    fn scalar_clip_forwards_configuration_to_its_stage() {
        let mut filter = ScalarClipFilter::new();
        filter.base_mut().set_input_slot(Some(line_slot()));
        filter.execute().unwrap();
        filter.select_scalar_field("p");
        filter.set_value(5.0);
        filter.execute().unwrap();

        let stage = filter.stage.read();
        assert_eq!(stage.scalar_field(), Some("p"));
        assert_eq!(stage.value(), 5.0);
        assert!(!stage.inside_out());
    }
}
