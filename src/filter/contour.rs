//! Iso-contour filter.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::dataset::DataHandle;
use crate::fields::{Arity, FieldSelector};
use crate::filter::{DataSlot, Filter, FilterBase, Outcome, PostObject, input_catalog};
use crate::param::Param;
use crate::post_error::PostError;
use crate::stage::{ChainKind, ContourStage, StageChain};

/// Catalog entry meaning "no field contoured".
pub const NONE_FIELD: &str = "None";

/// Extract iso-contours of a scalar field over an evenly spaced value
/// range.
pub struct ContourFilter {
    base: FilterBase,
    stage: Arc<RwLock<ContourStage>>,
    fields: FieldSelector,
    number_of_contours: Param<usize>,
    range_start: Param<f64>,
    range_end: Param<f64>,
}

impl Default for ContourFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContourFilter {
    /// Filter with 10 contours over [0, 0] and the "None" field.
    pub fn new() -> Self {
        let stage = Arc::new(RwLock::new(ContourStage::new()));
        let mut base = FilterBase::new();
        base.register_chain(ChainKind::Contour, StageChain::single(stage.clone()));
        base.set_active(ChainKind::Contour);
        let mut fields = FieldSelector::new();
        fields.refresh(vec![NONE_FIELD.to_owned()]);
        Self {
            base,
            stage,
            fields,
            number_of_contours: Param::new(10),
            range_start: Param::new(0.0),
            range_end: Param::new(0.0),
        }
    }

    /// Select the contoured field; [`NONE_FIELD`] disables contouring.
    pub fn select_field(&mut self, name: &str) {
        self.fields.select(name);
    }

    /// Fields offered by the last catalog refresh, "None" first.
    pub fn field_options(&self) -> &[String] {
        self.fields.options()
    }

    /// Currently selected field.
    pub fn selected_field(&self) -> Option<&str> {
        self.fields.selected()
    }

    /// Set the number of evenly spaced iso-values.
    pub fn set_number_of_contours(&mut self, count: usize) {
        self.number_of_contours.set(count);
    }

    /// Configured contour count.
    pub fn number_of_contours(&self) -> usize {
        self.number_of_contours.value()
    }

    /// Set the first iso-value.
    pub fn set_range_start(&mut self, start: f64) {
        self.range_start.set(start);
    }

    /// First iso-value.
    pub fn range_start(&self) -> f64 {
        self.range_start.value()
    }

    /// Set the last iso-value.
    pub fn set_range_end(&mut self, end: f64) {
        self.range_end.set(end);
    }

    /// Last iso-value.
    pub fn range_end(&self) -> f64 {
        self.range_end.value()
    }

    /// Iso-values the stage will extract next.
    pub fn values(&self) -> Vec<f64> {
        self.stage.read().values().to_vec()
    }
}

impl PostObject for ContourFilter {
    fn data(&self) -> Option<DataHandle> {
        self.base.data()
    }

    fn data_slot(&self) -> DataSlot {
        self.base.data_slot()
    }
}

impl Filter for ContourFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn must_execute(&self) -> bool {
        self.fields.is_touched()
            || self.number_of_contours.is_touched()
            || self.range_start.is_touched()
            || self.range_end.is_touched()
    }

    fn execute(&mut self) -> Result<Outcome, PostError> {
        let mut options = vec![NONE_FIELD.to_owned()];
        options.extend(input_catalog(&self.base, Arity::Scalar));
        self.fields.refresh(options);

        {
            let mut stage = self.stage.write();
            stage.set_field(
                self.fields
                    .selected()
                    .filter(|&name| name != NONE_FIELD)
                    .map(str::to_owned),
            );
            stage.generate_values(
                self.number_of_contours.value(),
                self.range_start.value(),
                self.range_end.value(),
            );
        }
        let outcome = self.base.run_active()?;
        if outcome == Outcome::Done {
            self.fields.purge();
            self.number_of_contours.purge();
            self.range_start.purge();
            self.range_end.purge();
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Association, Cell, CellType, DataArray, DataObject, DataSet};
    use crate::filter::new_slot;

    fn slot() -> DataSlot {
        let mut ds = DataSet::from_geometry(
            vec![[0.0, 0.0, 0.0], [4.0, 0.0, 0.0]],
            vec![Cell::new(CellType::Segment, vec![0, 1])],
        )
        .unwrap();
        ds.add_array(Association::Point, DataArray::scalars("p", vec![0.0, 4.0]))
            .unwrap();
        let slot = new_slot();
        *slot.write() = Some(DataObject::handle(ds));
        slot
    }

    #[test]
    fn none_option_leads_the_catalog_and_disables_contouring() {
        let mut filter = ContourFilter::new();
        filter.base_mut().set_input_slot(Some(slot()));
        filter.execute().unwrap();
        assert_eq!(filter.field_options(), &["None".to_owned(), "p".to_owned()][..]);

        filter.select_field(NONE_FIELD);
        // a "None" selection leaves the stage without a field, so the
        // chain yields nothing
        assert_eq!(filter.execute().unwrap(), Outcome::NothingToDo);
    }

    #[test]
    fn values_regenerate_from_the_numeric_parameters() {
        let mut filter = ContourFilter::new();
        filter.base_mut().set_input_slot(Some(slot()));
        filter.execute().unwrap();
        filter.select_field("p");
        filter.set_number_of_contours(3);
        filter.set_range_start(1.0);
        filter.set_range_end(3.0);
        assert_eq!(filter.execute().unwrap(), Outcome::Done);
        assert_eq!(filter.values(), vec![1.0, 2.0, 3.0]);

        let out = filter.data().unwrap();
        let out = out.as_set().unwrap();
        // one crossing per iso-value on the single segment
        assert_eq!(out.num_points(), 3);
        assert_eq!(out.points()[0], [1.0, 0.0, 0.0]);
    }
}
