//! Touch-tracked filter parameters and constrained storage.
//!
//! Every user-editable filter setting is a [`Param`]: a value plus a
//! "touched" bit set on write. A filter's `must_execute` predicate ORs
//! the touched bits of the parameters it tracks; a successful execute
//! purges them. [`ConstrainedFloat`] and [`ConstrainedInt`] additionally
//! clamp writes into a range supplied at runtime (field data range for
//! scalar clips, `[0, N-1]` for the pipeline time index).

/// A parameter value with a dirty bit.
#[derive(Clone, Debug, Default)]
pub struct Param<T> {
    value: T,
    touched: bool,
}

impl<T> Param<T> {
    /// Untouched parameter with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value,
            touched: false,
        }
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Write a value and mark the parameter touched.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.touched = true;
    }

    /// Overwrite without touching. Used when the engine itself refreshes
    /// a parameter (catalog re-population, streamline seed reset) so the
    /// refresh does not schedule another recompute.
    pub fn set_silent(&mut self, value: T) {
        self.value = value;
    }

    /// Whether the parameter was written since the last purge.
    #[inline]
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Clear the dirty bit.
    pub fn purge(&mut self) {
        self.touched = false;
    }
}

impl<T: Copy> Param<T> {
    /// Current value, by copy.
    #[inline]
    pub fn value(&self) -> T {
        self.value
    }
}

/// Range constraint for a float parameter.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FloatConstraint {
    /// Smallest accepted value.
    pub lower: f64,
    /// Largest accepted value.
    pub upper: f64,
    /// Editing step suggested to the surface.
    pub step: f64,
}

impl Default for FloatConstraint {
    fn default() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
            step: 1.0,
        }
    }
}

/// Float parameter whose writes are clamped into its constraint.
#[derive(Clone, Debug, Default)]
pub struct ConstrainedFloat {
    param: Param<f64>,
    constraint: FloatConstraint,
}

impl ConstrainedFloat {
    /// Unconstrained parameter with an initial value.
    pub fn new(value: f64) -> Self {
        Self {
            param: Param::new(value),
            constraint: FloatConstraint::default(),
        }
    }

    /// Current value.
    #[inline]
    pub fn value(&self) -> f64 {
        self.param.value()
    }

    /// Clamp `value` into the constraint, store, mark touched.
    pub fn set(&mut self, value: f64) {
        self.param
            .set(value.clamp(self.constraint.lower, self.constraint.upper));
    }

    /// Replace the constraint. The stored value is left as-is; the next
    /// write clamps against the new range.
    pub fn set_constraint(&mut self, constraint: FloatConstraint) {
        self.constraint = constraint;
    }

    /// Active constraint.
    pub fn constraint(&self) -> FloatConstraint {
        self.constraint
    }

    /// Whether the value was written since the last purge.
    #[inline]
    pub fn is_touched(&self) -> bool {
        self.param.is_touched()
    }

    /// Clear the dirty bit.
    pub fn purge(&mut self) {
        self.param.purge();
    }
}

/// Integer parameter whose writes are clamped into `[lower, upper]`.
#[derive(Clone, Debug)]
pub struct ConstrainedInt {
    param: Param<i64>,
    lower: i64,
    upper: i64,
}

impl Default for ConstrainedInt {
    fn default() -> Self {
        Self {
            param: Param::new(0),
            lower: i64::MIN,
            upper: i64::MAX,
        }
    }
}

impl ConstrainedInt {
    /// Current value.
    #[inline]
    pub fn value(&self) -> i64 {
        self.param.value()
    }

    /// Clamp `value` into range, store, mark touched.
    pub fn set(&mut self, value: i64) {
        self.param.set(value.clamp(self.lower, self.upper));
    }

    /// Replace the valid range, clamping the current value into it
    /// without touching.
    pub fn set_range(&mut self, lower: i64, upper: i64) {
        debug_assert!(lower <= upper);
        self.lower = lower;
        self.upper = upper;
        self.param
            .set_silent(self.param.value().clamp(lower, upper));
    }

    /// Active range.
    pub fn range(&self) -> (i64, i64) {
        (self.lower, self.upper)
    }

    /// Whether the value was written since the last purge.
    #[inline]
    pub fn is_touched(&self) -> bool {
        self.param.is_touched()
    }

    /// Clear the dirty bit.
    pub fn purge(&mut self) {
        self.param.purge();
    }
}

/// Plain 3-component point/vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Construct from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// As a coordinate triple.
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Construct from a coordinate triple.
    pub fn from_array(a: [f64; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Component-wise difference `self - other`.
    pub fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_touches_and_purge_clears() {
        let mut p = Param::new(1.0);
        assert!(!p.is_touched());
        p.set(2.0);
        assert!(p.is_touched());
        p.purge();
        assert!(!p.is_touched());
        p.set_silent(3.0);
        assert!(!p.is_touched());
        assert_eq!(*p.get(), 3.0);
    }

    #[test]
    fn constrained_int_clamps_writes() {
        let mut idx = ConstrainedInt::default();
        idx.set_range(0, 4);
        idx.set(7);
        assert_eq!(idx.value(), 4);
        idx.set(-3);
        assert_eq!(idx.value(), 0);
    }

    #[test]
    fn range_shrink_clamps_current_value_silently() {
        let mut idx = ConstrainedInt::default();
        idx.set_range(0, 10);
        idx.set(8);
        idx.purge();
        idx.set_range(0, 4);
        assert_eq!(idx.value(), 4);
        assert!(!idx.is_touched());
    }

    #[test]
    fn constrained_float_clamps_into_field_range() {
        let mut v = ConstrainedFloat::new(0.0);
        v.set_constraint(FloatConstraint {
            lower: 0.0,
            upper: 10.0,
            step: 0.1,
        });
        v.set(12.0);
        assert_eq!(v.value(), 10.0);
    }
}
