//! Dataset model: points, cells, and named data arrays.
//!
//! This module carries the data the filter engine shuffles around: a
//! [`DataSet`] is one unstructured block (points, cells, point/cell
//! arrays), a [`MultiBlock`] is a named collection of blocks (one per
//! mesh region), and [`DataObject`] is the type-tagged union the engine
//! passes between filters. Datasets are immutable once handed to a
//! filter; every successful execute produces a fresh [`DataHandle`].

pub mod append;
pub mod array;
pub mod bounds;
pub mod cell_type;

use std::sync::Arc;

use crate::post_error::PostError;
pub use append::append_all;
pub use array::{Association, DataArray};
pub use bounds::BoundingBox;
pub use cell_type::CellType;

/// Shared, read-only handle to a dataset snapshot.
///
/// Multiple readers (instants, filter outputs, downstream filters) hold
/// the same snapshot; replacing a filter's output swaps the handle, it
/// never mutates the pointee.
pub type DataHandle = Arc<DataObject>;

/// One cell: its type plus point indices into the owning dataset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cell {
    /// Cell type.
    pub cell_type: CellType,
    /// Indices into the dataset point list.
    pub points: Vec<usize>,
}

impl Cell {
    /// Build a cell, checking the vertex count for fixed-arity types.
    pub fn new(cell_type: CellType, points: Vec<usize>) -> Self {
        if let Some(n) = cell_type.vertex_count() {
            debug_assert_eq!(points.len(), n, "{cell_type:?} expects {n} vertices");
        }
        Self { cell_type, points }
    }
}

/// One unstructured block of simulation output.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DataSet {
    points: Vec<[f64; 3]>,
    cells: Vec<Cell>,
    point_data: Vec<DataArray>,
    cell_data: Vec<DataArray>,
}

impl DataSet {
    /// Empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dataset from points and cells, no arrays yet.
    ///
    /// # Errors
    /// Returns `Err(PointIndexOutOfRange)` if a cell references a point
    /// outside `points`.
    pub fn from_geometry(points: Vec<[f64; 3]>, cells: Vec<Cell>) -> Result<Self, PostError> {
        for cell in &cells {
            for &index in &cell.points {
                if index >= points.len() {
                    return Err(PostError::PointIndexOutOfRange {
                        index,
                        points: points.len(),
                    });
                }
            }
        }
        Ok(Self {
            points,
            cells,
            point_data: Vec::new(),
            cell_data: Vec::new(),
        })
    }

    /// Point coordinates.
    #[inline]
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Cells.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of points.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Number of cells.
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Arrays with the given association, in insertion order.
    pub fn arrays(&self, assoc: Association) -> &[DataArray] {
        match assoc {
            Association::Point => &self.point_data,
            Association::Cell => &self.cell_data,
        }
    }

    /// Look up an array by association and name.
    pub fn array(&self, assoc: Association, name: &str) -> Option<&DataArray> {
        self.arrays(assoc).iter().find(|a| a.name() == name)
    }

    /// Attach an array; replaces any existing array of the same name and
    /// association.
    ///
    /// # Errors
    /// Returns `Err(RaggedArray)` when the tuple count does not match the
    /// point/cell count.
    pub fn add_array(&mut self, assoc: Association, array: DataArray) -> Result<(), PostError> {
        let expected = match assoc {
            Association::Point => self.points.len(),
            Association::Cell => self.cells.len(),
        };
        if array.len() != expected {
            return Err(PostError::RaggedArray(
                array.name().to_owned(),
                array.len(),
                expected,
            ));
        }
        let arrays = match assoc {
            Association::Point => &mut self.point_data,
            Association::Cell => &mut self.cell_data,
        };
        if let Some(existing) = arrays.iter_mut().find(|a| a.name() == array.name()) {
            *existing = array;
        } else {
            arrays.push(array);
        }
        Ok(())
    }

    /// Bounding box over all points.
    pub fn bounds(&self) -> BoundingBox {
        let mut bb = BoundingBox::new();
        for &p in &self.points {
            bb.add_point(p);
        }
        bb
    }

    /// Index of the point nearest to `target` (linear scan), with its
    /// squared distance. `None` for an empty dataset.
    pub fn nearest_point(&self, target: [f64; 3]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, p) in self.points.iter().enumerate() {
            let d2 = (0..3).map(|a| (p[a] - target[a]).powi(2)).sum::<f64>();
            match best {
                Some((_, bd2)) if bd2 <= d2 => {}
                _ => best = Some((i, d2)),
            }
        }
        best
    }
}

/// Named collection of region blocks.
#[derive(Clone, Debug, Default)]
pub struct MultiBlock {
    blocks: Vec<(String, DataHandle)>,
}

impl MultiBlock {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named block.
    pub fn push(&mut self, name: impl Into<String>, block: DataHandle) {
        self.blocks.push((name.into(), block));
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True when no blocks are stored.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate `(name, handle)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataHandle)> {
        self.blocks.iter().map(|(n, h)| (n.as_str(), h))
    }

    /// Region names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.blocks.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Block by index.
    pub fn block(&self, i: usize) -> Option<&DataHandle> {
        self.blocks.get(i).map(|(_, h)| h)
    }
}

/// Type-tagged dataset union passed between filters.
#[derive(Clone, Debug)]
pub enum DataObject {
    /// A single unstructured block.
    Set(DataSet),
    /// A composite of named region blocks.
    MultiBlock(MultiBlock),
}

impl DataObject {
    /// The dataset, when this is the single-block variant.
    ///
    /// Filters that need a plain dataset treat a composite input as
    /// configuration-incomplete, so this returns `None` rather than
    /// flattening.
    pub fn as_set(&self) -> Option<&DataSet> {
        match self {
            DataObject::Set(ds) => Some(ds),
            DataObject::MultiBlock(_) => None,
        }
    }

    /// The composite, when this is the multi-block variant.
    pub fn as_multi_block(&self) -> Option<&MultiBlock> {
        match self {
            DataObject::Set(_) => None,
            DataObject::MultiBlock(mb) => Some(mb),
        }
    }

    /// Wrap a dataset into a shared handle.
    pub fn handle(ds: DataSet) -> DataHandle {
        Arc::new(DataObject::Set(ds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_index_validation() {
        let cells = vec![Cell::new(CellType::Segment, vec![0, 2])];
        let err = DataSet::from_geometry(vec![[0.0; 3], [1.0; 3]], cells);
        assert!(matches!(
            err,
            Err(PostError::PointIndexOutOfRange { index: 2, .. })
        ));
    }

    #[test]
    fn array_length_must_match_point_count() {
        let mut ds = DataSet::from_geometry(vec![[0.0; 3], [1.0; 3]], vec![]).unwrap();
        assert!(
            ds.add_array(Association::Point, DataArray::scalars("p", vec![1.0]))
                .is_err()
        );
        assert!(
            ds.add_array(Association::Point, DataArray::scalars("p", vec![1.0, 2.0]))
                .is_ok()
        );
        assert_eq!(ds.array(Association::Point, "p").unwrap().len(), 2);
    }

    #[test]
    fn nearest_point_linear_scan() {
        let ds = DataSet::from_geometry(vec![[0.0; 3], [1.0, 0.0, 0.0]], vec![]).unwrap();
        let (i, d2) = ds.nearest_point([0.9, 0.0, 0.0]).unwrap();
        assert_eq!(i, 1);
        assert!((d2 - 0.01).abs() < 1e-12);
    }
}
