//! Vector glyph filter.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::dataset::DataHandle;
use crate::fields::{Arity, FieldSelector};
use crate::filter::{DataSlot, Filter, FilterBase, Outcome, PostObject, input_catalog};
use crate::param::Param;
use crate::post_error::PostError;
use crate::stage::{ChainKind, GlyphStage, MaskPointsStage, StageChain};

/// Render a masked subset of points as vector glyphs.
///
/// The chain is mask then glyph: a seeded random subsample caps the
/// glyph count, then each surviving point gets a segment along the
/// selected vector.
pub struct Glyph3dFilter {
    base: FilterBase,
    mask: Arc<RwLock<MaskPointsStage>>,
    glyph: Arc<RwLock<GlyphStage>>,
    vectors: FieldSelector,
    maximum_number_of_points: Param<usize>,
    scale_factor: Param<f64>,
}

impl Default for Glyph3dFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Glyph3dFilter {
    /// Filter with at most 100 glyphs and scale factor 0.01.
    pub fn new() -> Self {
        let mask = Arc::new(RwLock::new(MaskPointsStage::new()));
        let glyph = Arc::new(RwLock::new(GlyphStage::new()));
        let mut base = FilterBase::new();
        base.register_chain(
            ChainKind::Glyph3d,
            StageChain::new(vec![mask.clone(), glyph.clone()]),
        );
        base.set_active(ChainKind::Glyph3d);
        Self {
            base,
            mask,
            glyph,
            vectors: FieldSelector::new(),
            maximum_number_of_points: Param::new(100),
            scale_factor: Param::new(0.01),
        }
    }

    /// Select the orienting vector field by name.
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

    /// Cap the number of glyphed points.
    pub fn set_maximum_number_of_points(&mut self, maximum: usize) {
        self.maximum_number_of_points.set(maximum);
    }

    /// Configured glyph cap.
    pub fn maximum_number_of_points(&self) -> usize {
        self.maximum_number_of_points.value()
    }

    /// Set the glyph length scale.
    pub fn set_scale_factor(&mut self, factor: f64) {
        self.scale_factor.set(factor);
    }

    /// Configured glyph scale.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor.value()
    }
}

impl PostObject for Glyph3dFilter {
    fn data(&self) -> Option<DataHandle> {
        self.base.data()
    }

    fn data_slot(&self) -> DataSlot {
        self.base.data_slot()
    }
}

impl Filter for Glyph3dFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn must_execute(&self) -> bool {
        self.vectors.is_touched()
            || self.maximum_number_of_points.is_touched()
            || self.scale_factor.is_touched()
    }

    fn execute(&mut self) -> Result<Outcome, PostError> {
        self.vectors.refresh(input_catalog(&self.base, Arity::Vector));
        self.mask
            .write()
            .set_maximum_number_of_points(self.maximum_number_of_points.value());
        {
            let mut glyph = self.glyph.write();
            glyph.set_vector_field(self.vectors.selected().map(str::to_owned));
            glyph.set_scale_factor(self.scale_factor.value());
        }
        let outcome = self.base.run_active()?;
        if outcome == Outcome::Done {
            self.vectors.purge();
            self.maximum_number_of_points.purge();
            self.scale_factor.purge();
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Association, DataArray, DataObject, DataSet};
    use crate::filter::new_slot;

    fn cloud_slot(n: usize) -> DataSlot {
        let points = (0..n).map(|i| [i as f64, 0.0, 0.0]).collect();
        let mut ds = DataSet::from_geometry(points, vec![]).unwrap();
        let vectors: Vec<f64> = (0..n).flat_map(|_| [0.0, 0.0, 1.0]).collect();
        ds.add_array(
            Association::Point,
            DataArray::vectors("U", vectors).unwrap(),
        )
        .unwrap();
        let slot = new_slot();
        *slot.write() = Some(DataObject::handle(ds));
        slot
    }

    #[test]
    fn masks_then_glyphs() {
        let mut filter = Glyph3dFilter::new();
        filter.base_mut().set_input_slot(Some(cloud_slot(500)));
        filter.execute().unwrap();
        filter.select_vector_field("U");
        filter.set_maximum_number_of_points(20);
        filter.set_scale_factor(2.0);
        assert_eq!(filter.execute().unwrap(), Outcome::Done);

        let out = filter.data().unwrap();
        let out = out.as_set().unwrap();
        assert_eq!(out.num_cells(), 20);
        assert_eq!(out.num_points(), 40);
    }

    #[test]
    fn no_vector_selection_is_nothing_to_do() {
        let mut filter = Glyph3dFilter::new();
        filter.base_mut().set_input_slot(Some(cloud_slot(5)));
        assert_eq!(filter.execute().unwrap(), Outcome::NothingToDo);
    }
}
