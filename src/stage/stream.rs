//! Streamline stage: trace paths through a vector field.
//!
//! Seeds are distributed along a line and advected by forward Euler
//! steps, sampling the field at the nearest source point. Each trace
//! becomes one polyline cell. Higher-order integrators and in-cell
//! interpolation are kernel territory.

use crate::dataset::{
    Association, Cell, CellType, DataHandle, DataObject, DataSet,
};
use crate::param::Vec3;
use crate::post_error::PostError;
use crate::stage::{Stage, input_set};

/// Trace streamlines from a line of seed points.
pub struct StreamTracerStage {
    input: Option<DataHandle>,
    output: Option<DataHandle>,
    vector_field: Option<String>,
    seeds: Vec<[f64; 3]>,
    step_size: f64,
    maximum_steps: usize,
}

impl Default for StreamTracerStage {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            vector_field: None,
            seeds: Vec::new(),
            step_size: 0.1,
            maximum_steps: 100,
        }
    }
}

impl StreamTracerStage {
    /// Stage with no seeds and no field selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the advecting vector array.
    pub fn set_vector_field(&mut self, name: Option<String>) {
        self.vector_field = name;
    }

    /// Selected vector array.
    pub fn vector_field(&self) -> Option<&str> {
        self.vector_field.as_deref()
    }

    /// Seed `resolution + 1` evenly spaced points from `point1` to
    /// `point2`.
    pub fn set_seed_line(&mut self, point1: Vec3, point2: Vec3, resolution: usize) {
        let a = point1.to_array();
        let b = point2.to_array();
        let steps = resolution.max(1);
        self.seeds = (0..=steps)
            .map(|i| {
                let t = i as f64 / steps as f64;
                [
                    a[0] + t * (b[0] - a[0]),
                    a[1] + t * (b[1] - a[1]),
                    a[2] + t * (b[2] - a[2]),
                ]
            })
            .collect();
    }

    /// Current seed points.
    pub fn seeds(&self) -> &[[f64; 3]] {
        &self.seeds
    }

    /// Set the Euler step length.
    pub fn set_step_size(&mut self, step: f64) {
        self.step_size = step;
    }

    /// Configured step length.
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Cap the number of steps per trace.
    pub fn set_maximum_steps(&mut self, steps: usize) {
        self.maximum_steps = steps;
    }

    /// Configured step cap.
    pub fn maximum_steps(&self) -> usize {
        self.maximum_steps
    }
}

impl Stage for StreamTracerStage {
    fn set_input(&mut self, input: Option<DataHandle>) {
        self.input = input;
    }

    fn update(&mut self) -> Result<(), PostError> {
        let Some(source) = input_set(&self.input) else {
            self.output = None;
            return Ok(());
        };
        let Some(name) = &self.vector_field else {
            self.output = None;
            return Ok(());
        };
        let Some(vectors) = source.array(Association::Point, name) else {
            return Err(PostError::MissingArray(name.clone()));
        };
        if self.seeds.is_empty() {
            self.output = None;
            return Ok(());
        }

        let mut points = Vec::new();
        let mut cells = Vec::new();
        for &seed in &self.seeds {
            let start = points.len();
            let mut p = seed;
            points.push(p);
            for _ in 0..self.maximum_steps {
                let Some((nearest, _)) = source.nearest_point(p) else {
                    break;
                };
                let v = vectors.tuple(nearest).unwrap_or(&[0.0, 0.0, 0.0]);
                let speed2 = v.iter().map(|c| c * c).sum::<f64>();
                if speed2 <= f64::EPSILON {
                    break;
                }
                p = [
                    p[0] + self.step_size * v[0],
                    p[1] + self.step_size * v[1],
                    p[2] + self.step_size * v[2],
                ];
                points.push(p);
            }
            let trace: Vec<usize> = (start..points.len()).collect();
            if trace.len() >= 2 {
                cells.push(Cell::new(CellType::PolyLine, trace));
            }
        }
        let traced = DataSet::from_geometry(points, cells)?;
        self.output = Some(DataObject::handle(traced));
        Ok(())
    }

    fn output(&self) -> Option<DataHandle> {
        self.output.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataArray;

    fn uniform_flow() -> DataSet {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
        ];
        let mut ds = DataSet::from_geometry(points, vec![]).unwrap();
        let vectors: Vec<f64> = (0..4).flat_map(|_| [1.0, 0.0, 0.0]).collect();
        ds.add_array(
            Association::Point,
            DataArray::vectors("U", vectors).unwrap(),
        )
        .unwrap();
        ds
    }

    #[test]
    fn traces_follow_the_field() {
        let mut stage = StreamTracerStage::new();
        stage.set_vector_field(Some("U".into()));
        stage.set_seed_line(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0), 1);
        stage.set_step_size(0.5);
        stage.set_maximum_steps(4);
        stage.set_input(Some(DataObject::handle(uniform_flow())));
        stage.update().unwrap();

        let out = stage.output().unwrap();
        let out = out.as_set().unwrap();
        assert_eq!(out.num_cells(), 2);
        let trace = &out.cells()[0];
        assert_eq!(trace.cell_type, CellType::PolyLine);
        assert_eq!(trace.points.len(), 5);
        assert_eq!(out.points()[trace.points[4]], [2.0, 0.0, 0.0]);
    }

    #[test]
    fn no_field_selection_yields_no_output() {
        let mut stage = StreamTracerStage::new();
        stage.set_seed_line(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 2);
        stage.set_input(Some(DataObject::handle(uniform_flow())));
        stage.update().unwrap();
        assert!(stage.output().is_none());
    }
}
