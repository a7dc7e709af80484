//! Cut stage: the cells crossed by an implicit-function surface.
//!
//! The reference implementation extracts the cells straddling the zero
//! level set of the cut function (vertex values of both signs). Slicing
//! those cells into a true surface with interpolated vertices is kernel
//! territory.

use crate::dataset::{DataHandle, DataObject};
use crate::function::SharedFunction;
use crate::post_error::PostError;
use crate::stage::{Stage, input_set};

/// Cut a dataset with an implicit function.
#[derive(Default)]
pub struct CutStage {
    input: Option<DataHandle>,
    output: Option<DataHandle>,
    function: Option<SharedFunction>,
}

impl CutStage {
    /// Stage without a function; `update` clears the output until one is
    /// assigned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the cut function.
    pub fn set_cut_function(&mut self, function: SharedFunction) {
        self.function = Some(function);
    }

    /// Currently assigned function.
    pub fn cut_function(&self) -> Option<&SharedFunction> {
        self.function.as_ref()
    }
}

impl Stage for CutStage {
    fn set_input(&mut self, input: Option<DataHandle>) {
        self.input = input;
    }

    fn update(&mut self) -> Result<(), PostError> {
        let Some(input) = input_set(&self.input) else {
            self.output = None;
            return Ok(());
        };
        let Some(function) = &self.function else {
            self.output = None;
            return Ok(());
        };
        let values: Vec<f64> = {
            let function = function.read();
            input.points().iter().map(|&p| function.evaluate(p)).collect()
        };

        let mut points = Vec::new();
        let mut point_map = vec![usize::MAX; input.num_points()];
        let mut cells = Vec::new();
        for cell in input.cells() {
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for &pi in &cell.points {
                min = min.min(values[pi]);
                max = max.max(values[pi]);
            }
            if min > 0.0 || max < 0.0 {
                continue;
            }
            let remapped = cell
                .points
                .iter()
                .map(|&pi| {
                    if point_map[pi] == usize::MAX {
                        point_map[pi] = points.len();
                        points.push(input.points()[pi]);
                    }
                    point_map[pi]
                })
                .collect();
            cells.push(crate::dataset::Cell {
                cell_type: cell.cell_type,
                points: remapped,
            });
        }
        let cut = crate::dataset::DataSet::from_geometry(points, cells)?;
        self.output = Some(DataObject::handle(cut));
        Ok(())
    }

    fn output(&self) -> Option<DataHandle> {
        self.output.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Cell, CellType, DataSet};
    use crate::function::ImplicitFunction;
    use crate::param::Vec3;

    #[test]
    fn keeps_only_straddling_cells() {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
        ];
        let cells = (0..3)
            .map(|i| Cell::new(CellType::Segment, vec![i, i + 1]))
            .collect();
        let ds = DataSet::from_geometry(points, cells).unwrap();

        let mut plane = ImplicitFunction::plane();
        plane.set_origin(Vec3::new(1.5, 0.0, 0.0));
        plane.set_normal(Vec3::new(1.0, 0.0, 0.0));

        let mut stage = CutStage::new();
        stage.set_cut_function(plane.into_shared());
        stage.set_input(Some(DataObject::handle(ds)));
        stage.update().unwrap();

        let out = stage.output().unwrap();
        let out = out.as_set().unwrap();
        // only the [1,2] segment crosses x = 1.5
        assert_eq!(out.num_cells(), 1);
        assert_eq!(out.num_points(), 2);
    }

    #[test]
    fn no_function_means_no_output() {
        let mut stage = CutStage::new();
        stage.set_input(Some(DataObject::handle(DataSet::new())));
        stage.update().unwrap();
        assert!(stage.output().is_none());
    }
}
