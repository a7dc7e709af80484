//! Warp stage: displace points along a vector field.

use crate::dataset::{Association, DataHandle, DataObject, DataSet};
use crate::post_error::PostError;
use crate::stage::{Stage, input_set};

/// Adds `scale_factor` times the selected vector field to every point
/// position. Arrays and cells pass through unchanged.
#[derive(Default)]
pub struct WarpStage {
    input: Option<DataHandle>,
    output: Option<DataHandle>,
    scale_factor: f64,
    vector_field: Option<String>,
}

impl WarpStage {
    /// Stage with factor 0.0 and no field selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the displacement factor.
    pub fn set_scale_factor(&mut self, factor: f64) {
        self.scale_factor = factor;
    }

    /// Displacement factor currently configured.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Select the point vector array to warp by.
    pub fn set_vector_field(&mut self, name: Option<String>) {
        self.vector_field = name;
    }

    /// Selected vector array.
    pub fn vector_field(&self) -> Option<&str> {
        self.vector_field.as_deref()
    }
}

impl Stage for WarpStage {
    fn set_input(&mut self, input: Option<DataHandle>) {
        self.input = input;
    }

    fn update(&mut self) -> Result<(), PostError> {
        let Some(input) = input_set(&self.input) else {
            self.output = None;
            return Ok(());
        };
        let Some(name) = &self.vector_field else {
            // Nothing selected yet: pass the input through.
            self.output = self.input.clone();
            return Ok(());
        };
        let Some(vectors) = input.array(Association::Point, name) else {
            return Err(PostError::MissingArray(name.clone()));
        };

        let points: Vec<[f64; 3]> = input
            .points()
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let v = vectors.tuple(i).unwrap_or(&[0.0, 0.0, 0.0]);
                [
                    p[0] + self.scale_factor * v[0],
                    p[1] + self.scale_factor * v[1],
                    p[2] + self.scale_factor * v[2],
                ]
            })
            .collect();
        let mut warped = DataSet::from_geometry(points, input.cells().to_vec())?;
        for assoc in [Association::Point, Association::Cell] {
            for array in input.arrays(assoc) {
                warped.add_array(assoc, array.clone())?;
            }
        }
        self.output = Some(DataObject::handle(warped));
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

    #[test]
    fn displaces_points_by_factor_times_vector() {
        let mut ds = DataSet::from_geometry(vec![[0.0; 3], [1.0, 0.0, 0.0]], vec![]).unwrap();
        ds.add_array(
            Association::Point,
            DataArray::vectors("U", vec![1.0, 0.0, 0.0, 0.0, 2.0, 0.0]).unwrap(),
        )
        .unwrap();

        let mut warp = WarpStage::new();
        warp.set_scale_factor(0.5);
        warp.set_vector_field(Some("U".into()));
        warp.set_input(Some(DataObject::handle(ds)));
        warp.update().unwrap();

        let out = warp.output().unwrap();
        let out = out.as_set().unwrap();
        assert_eq!(out.points()[0], [0.5, 0.0, 0.0]);
        assert_eq!(out.points()[1], [1.0, 1.0, 0.0]);
        // arrays pass through
        assert!(out.array(Association::Point, "U").is_some());
    }

    #[test]
    fn no_selection_passes_input_through() {
        let ds = DataSet::from_geometry(vec![[1.0, 2.0, 3.0]], vec![]).unwrap();
        let handle = DataObject::handle(ds);
        let mut warp = WarpStage::new();
        warp.set_input(Some(handle.clone()));
        warp.update().unwrap();
        assert!(std::sync::Arc::ptr_eq(&warp.output().unwrap(), &handle));
    }
}
