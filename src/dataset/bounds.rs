//! Axis-aligned bounding boxes over dataset points.

/// Axis-aligned bounding box accumulated from points.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    min: [f64; 3],
    max: [f64; 3],
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }
}

impl BoundingBox {
    /// Empty box; `is_valid` is false until a point is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow the box to contain `p`.
    pub fn add_point(&mut self, p: [f64; 3]) {
        for axis in 0..3 {
            if p[axis] < self.min[axis] {
                self.min[axis] = p[axis];
            }
            if p[axis] > self.max[axis] {
                self.max[axis] = p[axis];
            }
        }
    }

    /// True once at least one point has been added.
    pub fn is_valid(&self) -> bool {
        (0..3).all(|axis| self.min[axis] <= self.max[axis])
    }

    /// Minimum corner.
    pub fn min_point(&self) -> [f64; 3] {
        self.min
    }

    /// Maximum corner.
    pub fn max_point(&self) -> [f64; 3] {
        self.max
    }

    /// Length of the box diagonal, 0.0 for an invalid box.
    pub fn diagonal(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        (0..3)
            .map(|axis| {
                let d = self.max[axis] - self.min[axis];
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_to_contain_points() {
        let mut bb = BoundingBox::new();
        assert!(!bb.is_valid());
        bb.add_point([1.0, -2.0, 0.0]);
        bb.add_point([-1.0, 3.0, 5.0]);
        assert!(bb.is_valid());
        assert_eq!(bb.min_point(), [-1.0, -2.0, 0.0]);
        assert_eq!(bb.max_point(), [1.0, 3.0, 5.0]);
    }
}
