//! Probe stage: sample a source dataset at prescribed locations.
//!
//! Sampling is nearest-point: each probe location picks up the point
//! data of the closest source point. A `ValidPointArray` scalar marks
//! which samples actually found a source point, matching what probe
//! consumers expect to find on the output. True cell-interpolated
//! probing is kernel territory.

use crate::dataset::{
    Association, Cell, CellType, DataArray, DataHandle, DataObject, DataSet,
};
use crate::param::Vec3;
use crate::post_error::PostError;
use crate::stage::{Stage, input_set};

/// Name of the scalar mask marking valid samples.
pub const VALID_POINT_ARRAY: &str = "ValidPointArray";

/// Name of the parametric coordinate array emitted for line probes.
pub const TCOORDS_ARRAY: &str = "tcoords";

/// Sample the input at a point or along a line.
#[derive(Default)]
pub struct ProbeStage {
    input: Option<DataHandle>,
    output: Option<DataHandle>,
    samples: Vec<[f64; 3]>,
    tcoords: Option<Vec<f64>>,
}

impl ProbeStage {
    /// Stage with no sample locations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe a single location.
    pub fn set_sample_point(&mut self, point: Vec3) {
        self.samples = vec![point.to_array()];
        self.tcoords = None;
    }

    /// Probe `resolution + 1` evenly spaced locations from `point1` to
    /// `point2`, recording the parametric coordinate of each sample.
    pub fn set_sample_line(&mut self, point1: Vec3, point2: Vec3, resolution: usize) {
        let a = point1.to_array();
        let b = point2.to_array();
        let steps = resolution.max(1);
        self.samples = (0..=steps)
            .map(|i| {
                let t = i as f64 / steps as f64;
                [
                    a[0] + t * (b[0] - a[0]),
                    a[1] + t * (b[1] - a[1]),
                    a[2] + t * (b[2] - a[2]),
                ]
            })
            .collect();
        self.tcoords = Some((0..=steps).map(|i| i as f64 / steps as f64).collect());
    }

    /// Current sample locations.
    pub fn samples(&self) -> &[[f64; 3]] {
        &self.samples
    }
}

impl Stage for ProbeStage {
    fn set_input(&mut self, input: Option<DataHandle>) {
        self.input = input;
    }

    fn update(&mut self) -> Result<(), PostError> {
        let Some(source) = input_set(&self.input) else {
            self.output = None;
            return Ok(());
        };
        if self.samples.is_empty() {
            self.output = None;
            return Ok(());
        }

        let picks: Vec<Option<usize>> = self
            .samples
            .iter()
            .map(|&s| source.nearest_point(s).map(|(i, _)| i))
            .collect();

        let cells = (0..self.samples.len())
            .map(|i| Cell::new(CellType::Vertex, vec![i]))
            .collect();
        let mut probed = DataSet::from_geometry(self.samples.clone(), cells)?;
        for array in source.arrays(Association::Point) {
            let mut sampled = DataArray::new(array.name(), array.components(), Vec::new())?;
            let zeros = vec![0.0; array.components()];
            for pick in &picks {
                match pick.and_then(|i| array.tuple(i)) {
                    Some(tuple) => sampled.push_tuple(tuple),
                    None => sampled.push_tuple(&zeros),
                }
            }
            probed.add_array(Association::Point, sampled)?;
        }
        let valid: Vec<f64> = picks
            .iter()
            .map(|p| if p.is_some() { 1.0 } else { 0.0 })
            .collect();
        probed.add_array(Association::Point, DataArray::scalars(VALID_POINT_ARRAY, valid))?;
        if let Some(tcoords) = &self.tcoords {
            probed.add_array(
                Association::Point,
                DataArray::scalars(TCOORDS_ARRAY, tcoords.clone()),
            )?;
        }
        self.output = Some(DataObject::handle(probed));
        Ok(())
    }

    fn output(&self) -> Option<DataHandle> {
        self.output.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> DataSet {
        let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        let mut ds = DataSet::from_geometry(points, vec![]).unwrap();
        ds.add_array(
            Association::Point,
            DataArray::scalars("p", vec![10.0, 20.0, 30.0]),
        )
        .unwrap();
        ds
    }

    #[test]
    fn line_probe_samples_nearest_values() {
        let mut stage = ProbeStage::new();
        stage.set_sample_line(
            Vec3::new(0.0, 0.1, 0.0),
            Vec3::new(2.0, 0.1, 0.0),
            2,
        );
        stage.set_input(Some(DataObject::handle(source())));
        stage.update().unwrap();

        let out = stage.output().unwrap();
        let out = out.as_set().unwrap();
        assert_eq!(out.num_points(), 3);
        assert_eq!(
            out.array(Association::Point, "p").unwrap().values(),
            &[10.0, 20.0, 30.0]
        );
        assert_eq!(
            out.array(Association::Point, TCOORDS_ARRAY).unwrap().values(),
            &[0.0, 0.5, 1.0]
        );
        assert_eq!(
            out.array(Association::Point, VALID_POINT_ARRAY).unwrap().values(),
            &[1.0, 1.0, 1.0]
        );
    }

    #[test]
    fn point_probe_marks_invalid_on_empty_source() {
        let mut stage = ProbeStage::new();
        stage.set_sample_point(Vec3::new(0.5, 0.0, 0.0));
        stage.set_input(Some(DataObject::handle(DataSet::new())));
        stage.update().unwrap();

        let out = stage.output().unwrap();
        let out = out.as_set().unwrap();
        assert_eq!(
            out.array(Association::Point, VALID_POINT_ARRAY).unwrap().values(),
            &[0.0]
        );
    }
}
