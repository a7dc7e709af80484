//! Probe filters: sample field values along a line or at a point.
//!
//! Both filters reduce vector samples to their Euclidean magnitude, so
//! a plot over a velocity field shows speed.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::dataset::{Association, DataHandle, DataSet};
use crate::fields::{FieldSelector, classify_plottable};
use crate::filter::{DataSlot, Filter, FilterBase, Outcome, PostObject};
use crate::param::{Param, Vec3};
use crate::post_error::PostError;
use crate::stage::probe::TCOORDS_ARRAY;
use crate::stage::{ChainKind, ProbeStage, StageChain};

fn plottable_catalog(base: &FilterBase) -> Vec<String> {
    base.resolve_input()
        .as_deref()
        .and_then(|o| o.as_set())
        .map(classify_plottable)
        .unwrap_or_default()
}

fn sampled_magnitudes(out: &DataSet, field: &str) -> Option<Vec<f64>> {
    let array = out.array(Association::Point, field)?;
    (0..array.len()).map(|i| array.magnitude(i)).collect()
}

/// Sample a field along a straight line.
///
/// Unlike the streamline seed line, the endpoints here are sticky: the
/// user places the line once and it stays put across executes.
pub struct DataAlongLineFilter {
    base: FilterBase,
    stage: Arc<RwLock<ProbeStage>>,
    fields: FieldSelector,
    point1: Param<Vec3>,
    point2: Param<Vec3>,
    resolution: Param<usize>,
}

impl Default for DataAlongLineFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl DataAlongLineFilter {
    /// Filter probing the unit X segment at 100 intervals.
    pub fn new() -> Self {
        let stage = Arc::new(RwLock::new(ProbeStage::new()));
        let mut base = FilterBase::new();
        base.register_chain(ChainKind::DataAlongLine, StageChain::single(stage.clone()));
        base.set_active(ChainKind::DataAlongLine);
        Self {
            base,
            stage,
            fields: FieldSelector::new(),
            point1: Param::new(Vec3::new(0.0, 0.0, 0.0)),
            point2: Param::new(Vec3::new(1.0, 0.0, 0.0)),
            resolution: Param::new(100),
        }
    }

    /// Select the plotted field by name.
    pub fn select_field(&mut self, name: &str) {
        self.fields.select(name);
    }

    /// Fields offered by the last catalog refresh.
    pub fn field_options(&self) -> &[String] {
        self.fields.options()
    }

    /// Currently selected field.
    pub fn selected_field(&self) -> Option<&str> {
        self.fields.selected()
    }

    /// Place the line start.
    pub fn set_point1(&mut self, point: Vec3) {
        self.point1.set(point);
    }

    /// Line start.
    pub fn point1(&self) -> Vec3 {
        self.point1.value()
    }

    /// Place the line end.
    pub fn set_point2(&mut self, point: Vec3) {
        self.point2.set(point);
    }

    /// Line end.
    pub fn point2(&self) -> Vec3 {
        self.point2.value()
    }

    /// Set the number of sample intervals.
    pub fn set_resolution(&mut self, resolution: usize) {
        self.resolution.set(resolution);
    }

    /// Configured sample interval count.
    pub fn resolution(&self) -> usize {
        self.resolution.value()
    }

    /// Plot series from the last execute: X is the distance along the
    /// line, Y the sampled value (vectors reduced to magnitude).
    pub fn plot_data(&self) -> Option<(Vec<f64>, Vec<f64>)> {
        let field = self.fields.selected()?;
        let data = self.base.data()?;
        let out = data.as_set()?;
        let length = self.point2.value().sub(self.point1.value()).length();
        let x: Vec<f64> = out
            .array(Association::Point, TCOORDS_ARRAY)?
            .values()
            .iter()
            .map(|t| t * length)
            .collect();
        let y = sampled_magnitudes(out, field)?;
        Some((x, y))
    }
}

impl PostObject for DataAlongLineFilter {
    fn data(&self) -> Option<DataHandle> {
        self.base.data()
    }

    fn data_slot(&self) -> DataSlot {
        self.base.data_slot()
    }
}

impl Filter for DataAlongLineFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn must_execute(&self) -> bool {
        self.fields.is_touched()
            || self.point1.is_touched()
            || self.point2.is_touched()
            || self.resolution.is_touched()
    }

    fn execute(&mut self) -> Result<Outcome, PostError> {
        self.fields.refresh(plottable_catalog(&self.base));
        self.stage.write().set_sample_line(
            self.point1.value(),
            self.point2.value(),
            self.resolution.value(),
        );
        let outcome = self.base.run_active()?;
        if outcome == Outcome::Done {
            self.fields.purge();
            self.point1.purge();
            self.point2.purge();
            self.resolution.purge();
        }
        Ok(outcome)
    }
}

/// Sample a field at a single point.
pub struct DataAtPointFilter {
    base: FilterBase,
    stage: Arc<RwLock<ProbeStage>>,
    fields: FieldSelector,
    center: Param<Vec3>,
    radius: Param<f64>,
    unit: Param<String>,
}

impl Default for DataAtPointFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl DataAtPointFilter {
    /// Filter probing the origin.
    pub fn new() -> Self {
        let stage = Arc::new(RwLock::new(ProbeStage::new()));
        let mut base = FilterBase::new();
        base.register_chain(ChainKind::DataAtPoint, StageChain::single(stage.clone()));
        base.set_active(ChainKind::DataAtPoint);
        Self {
            base,
            stage,
            fields: FieldSelector::new(),
            center: Param::new(Vec3::default()),
            radius: Param::new(0.0),
            unit: Param::new(String::new()),
        }
    }

    /// Select the sampled field by name.
    pub fn select_field(&mut self, name: &str) {
        self.fields.select(name);
    }

    /// Fields offered by the last catalog refresh.
    pub fn field_options(&self) -> &[String] {
        self.fields.options()
    }

    /// Currently selected field.
    pub fn selected_field(&self) -> Option<&str> {
        self.fields.selected()
    }

    /// Move the probed point.
    pub fn set_center(&mut self, center: Vec3) {
        self.center.set(center);
    }

    /// Probed point.
    pub fn center(&self) -> Vec3 {
        self.center.value()
    }

    /// Set the marker radius shown by the surface.
    pub fn set_radius(&mut self, radius: f64) {
        self.radius.set(radius);
    }

    /// Marker radius.
    pub fn radius(&self) -> f64 {
        self.radius.value()
    }

    /// Set the display unit of the sampled quantity.
    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.unit.set(unit.into());
    }

    /// Display unit.
    pub fn unit(&self) -> &str {
        self.unit.get()
    }

    /// Sampled value at the probed point, from the last execute.
    /// Vectors reduce to their magnitude.
    pub fn point_value(&self) -> Option<f64> {
        let field = self.fields.selected()?;
        let data = self.base.data()?;
        let out = data.as_set()?;
        sampled_magnitudes(out, field)?.first().copied()
    }
}

impl PostObject for DataAtPointFilter {
    fn data(&self) -> Option<DataHandle> {
        self.base.data()
    }

    fn data_slot(&self) -> DataSlot {
        self.base.data_slot()
    }
}

impl Filter for DataAtPointFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn must_execute(&self) -> bool {
        self.fields.is_touched()
            || self.center.is_touched()
            || self.radius.is_touched()
            || self.unit.is_touched()
    }

    fn execute(&mut self) -> Result<Outcome, PostError> {
        self.fields.refresh(plottable_catalog(&self.base));
        self.stage.write().set_sample_point(self.center.value());
        let outcome = self.base.run_active()?;
        if outcome == Outcome::Done {
            self.fields.purge();
            self.center.purge();
            self.radius.purge();
            self.unit.purge();
        }
        Ok(outcome)
    }
}
