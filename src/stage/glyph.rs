//! Glyph stages: point masking and vector glyph generation.
//!
//! Glyphing every point of a large result is too expensive to render, so
//! a [`MaskPointsStage`] first subsamples the point set to an upper
//! bound. Masking is random but seeded (`SmallRng`), so repeated runs of
//! an unchanged pipeline stay reproducible. The [`GlyphStage`] then
//! emits one segment glyph per surviving point, oriented by the selected
//! vector and scaled; tessellated arrow geometry is kernel territory.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use crate::dataset::{
    Association, Cell, CellType, DataArray, DataHandle, DataObject, DataSet,
};
use crate::post_error::PostError;
use crate::stage::{Stage, input_set};

/// Default RNG seed for point masking.
pub const DEFAULT_MASK_SEED: u64 = 0x5eed;

/// Random subsample of the input point set.
pub struct MaskPointsStage {
    input: Option<DataHandle>,
    output: Option<DataHandle>,
    maximum_number_of_points: usize,
    seed: u64,
}

impl Default for MaskPointsStage {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            maximum_number_of_points: usize::MAX,
            seed: DEFAULT_MASK_SEED,
        }
    }
}

impl MaskPointsStage {
    /// Unbounded stage with the default seed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of points passed through.
    pub fn set_maximum_number_of_points(&mut self, maximum: usize) {
        self.maximum_number_of_points = maximum;
    }

    /// Configured cap.
    pub fn maximum_number_of_points(&self) -> usize {
        self.maximum_number_of_points
    }

    /// Reseed the subsampling RNG.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }
}

impl Stage for MaskPointsStage {
    fn set_input(&mut self, input: Option<DataHandle>) {
        self.input = input;
    }

    fn update(&mut self) -> Result<(), PostError> {
        let Some(input) = input_set(&self.input) else {
            self.output = None;
            return Ok(());
        };
        let mut selected: Vec<usize> = (0..input.num_points()).collect();
        if selected.len() > self.maximum_number_of_points {
            let mut rng = SmallRng::seed_from_u64(self.seed);
            selected.shuffle(&mut rng);
            selected.truncate(self.maximum_number_of_points);
            selected.sort_unstable();
        }

        let points: Vec<[f64; 3]> = selected.iter().map(|&i| input.points()[i]).collect();
        let cells = (0..points.len())
            .map(|i| Cell::new(CellType::Vertex, vec![i]))
            .collect();
        let mut masked = DataSet::from_geometry(points, cells)?;
        for array in input.arrays(Association::Point) {
            let mut subset = DataArray::new(array.name(), array.components(), Vec::new())?;
            for &i in &selected {
                subset.push_tuple(array.tuple(i).expect("masked index in range"));
            }
            masked.add_array(Association::Point, subset)?;
        }
        self.output = Some(DataObject::handle(masked));
        Ok(())
    }

    fn output(&self) -> Option<DataHandle> {
        self.output.clone()
    }
}

/// One segment glyph per point, along the selected vector.
#[derive(Default)]
pub struct GlyphStage {
    input: Option<DataHandle>,
    output: Option<DataHandle>,
    vector_field: Option<String>,
    scale_factor: f64,
}

impl GlyphStage {
    /// Stage with scale factor 0.0 and no field selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the orienting vector array.
    pub fn set_vector_field(&mut self, name: Option<String>) {
        self.vector_field = name;
    }

    /// Selected vector array.
    pub fn vector_field(&self) -> Option<&str> {
        self.vector_field.as_deref()
    }

    /// Set the glyph length scale.
    pub fn set_scale_factor(&mut self, factor: f64) {
        self.scale_factor = factor;
    }

    /// Configured scale.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }
}

impl Stage for GlyphStage {
    fn set_input(&mut self, input: Option<DataHandle>) {
        self.input = input;
    }

    fn update(&mut self) -> Result<(), PostError> {
        let Some(input) = input_set(&self.input) else {
            self.output = None;
            return Ok(());
        };
        let Some(name) = &self.vector_field else {
            self.output = None;
            return Ok(());
        };
        let Some(vectors) = input.array(Association::Point, name) else {
            return Err(PostError::MissingArray(name.clone()));
        };

        let mut points = Vec::with_capacity(input.num_points() * 2);
        let mut cells = Vec::with_capacity(input.num_points());
        let mut magnitudes = Vec::with_capacity(input.num_points() * 2);
        for (i, &p) in input.points().iter().enumerate() {
            let v = vectors.tuple(i).unwrap_or(&[0.0, 0.0, 0.0]);
            let tip = [
                p[0] + self.scale_factor * v[0],
                p[1] + self.scale_factor * v[1],
                p[2] + self.scale_factor * v[2],
            ];
            let base = points.len();
            points.push(p);
            points.push(tip);
            cells.push(Cell::new(CellType::Segment, vec![base, base + 1]));
            let magnitude = vectors.magnitude(i).unwrap_or(0.0);
            magnitudes.push(magnitude);
            magnitudes.push(magnitude);
        }
        let mut glyphs = DataSet::from_geometry(points, cells)?;
        glyphs.add_array(
            Association::Point,
            DataArray::scalars("GlyphScale", magnitudes),
        )?;
        self.output = Some(DataObject::handle(glyphs));
        Ok(())
    }

    fn output(&self) -> Option<DataHandle> {
        self.output.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud(n: usize) -> DataSet {
        let points = (0..n).map(|i| [i as f64, 0.0, 0.0]).collect();
        let mut ds = DataSet::from_geometry(points, vec![]).unwrap();
        let vectors: Vec<f64> = (0..n).flat_map(|_| [0.0, 1.0, 0.0]).collect();
        ds.add_array(
            Association::Point,
            DataArray::vectors("U", vectors).unwrap(),
        )
        .unwrap();
        ds
    }

    #[test]
    fn masking_caps_the_point_count_deterministically() {
        let mut mask = MaskPointsStage::new();
        mask.set_maximum_number_of_points(10);
        mask.set_input(Some(DataObject::handle(cloud(100))));
        mask.update().unwrap();
        let first = mask.output().unwrap();
        assert_eq!(first.as_set().unwrap().num_points(), 10);

        mask.update().unwrap();
        let second = mask.output().unwrap();
        assert_eq!(first.as_set().unwrap().points(), second.as_set().unwrap().points());
    }

    #[test]
    fn masking_below_cap_passes_everything() {
        let mut mask = MaskPointsStage::new();
        mask.set_maximum_number_of_points(10);
        mask.set_input(Some(DataObject::handle(cloud(5))));
        mask.update().unwrap();
        assert_eq!(mask.output().unwrap().as_set().unwrap().num_points(), 5);
    }

    #[test]
    fn glyphs_are_scaled_segments() {
        let mut glyph = GlyphStage::new();
        glyph.set_vector_field(Some("U".into()));
        glyph.set_scale_factor(0.5);
        glyph.set_input(Some(DataObject::handle(cloud(3))));
        glyph.update().unwrap();
        let out = glyph.output().unwrap();
        let out = out.as_set().unwrap();
        assert_eq!(out.num_cells(), 3);
        assert_eq!(out.points()[1], [0.0, 0.5, 0.0]);
    }
}
