//! Contour stage: iso-value crossings of a scalar point field.
//!
//! For every cell edge whose endpoint values straddle an iso-value, one
//! vertex is emitted at the linearly interpolated crossing position,
//! carrying the iso-value in a scalar array named after the contoured
//! field. Surface reconstruction from the crossing set is kernel
//! territory.

use crate::dataset::{
    Association, Cell, CellType, DataArray, DataHandle, DataObject, DataSet,
};
use crate::post_error::PostError;
use crate::stage::{Stage, input_set};

/// Extract iso-contour crossings for a list of values.
#[derive(Default)]
pub struct ContourStage {
    input: Option<DataHandle>,
    output: Option<DataHandle>,
    field: Option<String>,
    values: Vec<f64>,
}

impl ContourStage {
    /// Stage with no field and no iso-values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the scalar point array to contour.
    pub fn set_field(&mut self, name: Option<String>) {
        self.field = name;
    }

    /// Selected array.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Replace the iso-value list with `count` evenly spaced values from
    /// `start` to `end` inclusive; `count == 1` yields `[start]`.
    pub fn generate_values(&mut self, count: usize, start: f64, end: f64) {
        self.values.clear();
        if count == 0 {
            return;
        }
        let increment = if count > 1 {
            (end - start) / (count as f64 - 1.0)
        } else {
            0.0
        };
        for i in 0..count {
            self.values.push(start + i as f64 * increment);
        }
    }

    /// Current iso-values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl Stage for ContourStage {
    fn set_input(&mut self, input: Option<DataHandle>) {
        self.input = input;
    }

    fn update(&mut self) -> Result<(), PostError> {
        let Some(input) = input_set(&self.input) else {
            self.output = None;
            return Ok(());
        };
        let Some(name) = &self.field else {
            self.output = None;
            return Ok(());
        };
        let Some(scalars) = input.array(Association::Point, name) else {
            return Err(PostError::MissingArray(name.clone()));
        };

        let mut points = Vec::new();
        let mut values = Vec::new();
        for &iso in &self.values {
            for cell in input.cells() {
                for (slot, &a) in cell.points.iter().enumerate() {
                    for &b in &cell.points[slot + 1..] {
                        let fa = scalars.component(a, 0).unwrap_or(f64::NAN);
                        let fb = scalars.component(b, 0).unwrap_or(f64::NAN);
                        if (fa < iso) == (fb < iso) || fa == fb {
                            continue;
                        }
                        let t = (iso - fa) / (fb - fa);
                        let pa = input.points()[a];
                        let pb = input.points()[b];
                        points.push([
                            pa[0] + t * (pb[0] - pa[0]),
                            pa[1] + t * (pb[1] - pa[1]),
                            pa[2] + t * (pb[2] - pa[2]),
                        ]);
                        values.push(iso);
                    }
                }
            }
        }
        let cells = (0..points.len())
            .map(|i| Cell::new(CellType::Vertex, vec![i]))
            .collect();
        let mut contour = DataSet::from_geometry(points, cells)?;
        contour.add_array(Association::Point, DataArray::scalars(name.clone(), values))?;
        self.output = Some(DataObject::handle(contour));
        Ok(())
    }

    fn output(&self) -> Option<DataHandle> {
        self.output.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_values_is_inclusive_and_even() {
        let mut stage = ContourStage::new();
        stage.generate_values(5, 0.0, 1.0);
        assert_eq!(stage.values(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
        stage.generate_values(1, 3.0, 9.0);
        assert_eq!(stage.values(), &[3.0]);
        stage.generate_values(0, 0.0, 1.0);
        assert!(stage.values().is_empty());
    }

    #[test]
    fn emits_interpolated_crossings() {
        let mut ds = DataSet::from_geometry(
            vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            vec![Cell::new(CellType::Segment, vec![0, 1])],
        )
        .unwrap();
        ds.add_array(Association::Point, DataArray::scalars("p", vec![0.0, 2.0]))
            .unwrap();

        let mut stage = ContourStage::new();
        stage.set_field(Some("p".into()));
        stage.generate_values(1, 0.5, 0.5);
        stage.set_input(Some(DataObject::handle(ds)));
        stage.update().unwrap();

        let out = stage.output().unwrap();
        let out = out.as_set().unwrap();
        assert_eq!(out.num_points(), 1);
        assert_eq!(out.points()[0], [0.5, 0.0, 0.0]);
        assert_eq!(
            out.array(Association::Point, "p").unwrap().values(),
            &[0.5]
        );
    }
}
