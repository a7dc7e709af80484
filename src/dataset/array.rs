//! Named data arrays attached to dataset points or cells.
//!
//! A `DataArray` packs per-entity tuples into a single flat `Vec<f64>`
//! (tuple-major), the same layout simulation writers emit. Filters never
//! mutate arrays on an input dataset; they build new arrays for their
//! output.

use crate::post_error::PostError;

/// Whether an array is attached to points or cells.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Association {
    /// One tuple per dataset point.
    Point,
    /// One tuple per dataset cell.
    Cell,
}

/// A named, fixed-arity array of `f64` tuples.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DataArray {
    name: String,
    components: usize,
    values: Vec<f64>,
}

impl DataArray {
    /// Create an array from flat tuple-major values.
    ///
    /// # Errors
    /// Returns `Err(RaggedArray)` if `values.len()` is not a multiple of
    /// `components`, or if `components == 0`.
    pub fn new(
        name: impl Into<String>,
        components: usize,
        values: Vec<f64>,
    ) -> Result<Self, PostError> {
        let name = name.into();
        if components == 0 || values.len() % components != 0 {
            return Err(PostError::RaggedArray(name, values.len(), components));
        }
        Ok(Self {
            name,
            components,
            values,
        })
    }

    /// Convenience constructor for a one-component array.
    pub fn scalars(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            components: 1,
            values,
        }
    }

    /// Convenience constructor for a three-component array.
    ///
    /// # Errors
    /// Same conditions as [`DataArray::new`].
    pub fn vectors(name: impl Into<String>, values: Vec<f64>) -> Result<Self, PostError> {
        Self::new(name, 3, values)
    }

    /// Array name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Components per tuple.
    #[inline]
    pub fn components(&self) -> usize {
        self.components
    }

    /// Number of tuples.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len() / self.components
    }

    /// True when the array holds no tuples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat tuple-major values.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Tuple `i` as a slice, or `None` when out of range.
    #[inline]
    pub fn tuple(&self, i: usize) -> Option<&[f64]> {
        let start = i.checked_mul(self.components)?;
        self.values.get(start..start + self.components)
    }

    /// Component `c` of tuple `i`.
    #[inline]
    pub fn component(&self, i: usize, c: usize) -> Option<f64> {
        if c >= self.components {
            return None;
        }
        self.values.get(i * self.components + c).copied()
    }

    /// Euclidean norm of tuple `i` across all components.
    ///
    /// Scalars pass through unchanged; a (3,4,0) tuple reduces to 5.0.
    pub fn magnitude(&self, i: usize) -> Option<f64> {
        let tuple = self.tuple(i)?;
        if self.components == 1 {
            return Some(tuple[0]);
        }
        Some(tuple.iter().map(|v| v * v).sum::<f64>().sqrt())
    }

    /// (min, max) over all stored components, or `None` for an empty array.
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut iter = self.values.iter().copied().filter(|v| !v.is_nan());
        let first = iter.next()?;
        let mut min = first;
        let mut max = first;
        for v in iter {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        Some((min, max))
    }

    /// Append the tuples of `other` to this array.
    ///
    /// # Errors
    /// Returns `Err(RaggedArray)` when the component counts differ.
    pub fn extend_from(&mut self, other: &DataArray) -> Result<(), PostError> {
        if other.components != self.components {
            return Err(PostError::RaggedArray(
                other.name.clone(),
                other.values.len(),
                self.components,
            ));
        }
        self.values.extend_from_slice(&other.values);
        Ok(())
    }

    /// Push a single tuple.
    ///
    /// # Panics
    /// Panics if `tuple.len() != self.components()`; callers construct
    /// tuples of the arity they declared.
    pub fn push_tuple(&mut self, tuple: &[f64]) {
        assert_eq!(tuple.len(), self.components, "tuple arity mismatch");
        self.values.extend_from_slice(tuple);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_reduces_vectors_and_passes_scalars() {
        let v = DataArray::vectors("U", vec![3.0, 4.0, 0.0, 1.0, 0.0, 0.0]).unwrap();
        assert_eq!(v.magnitude(0), Some(5.0));
        assert_eq!(v.magnitude(1), Some(1.0));
        let s = DataArray::scalars("p", vec![-2.5]);
        assert_eq!(s.magnitude(0), Some(-2.5));
    }

    #[test]
    fn range_ignores_nan() {
        let a = DataArray::scalars("p", vec![1.0, f64::NAN, -3.0, 8.0]);
        assert_eq!(a.range(), Some((-3.0, 8.0)));
    }

    #[test]
    fn ragged_values_rejected() {
        assert!(DataArray::new("U", 3, vec![1.0, 2.0]).is_err());
    }
}
