//! Implicit functions driving clip and cut operations.
//!
//! An [`ImplicitFunction`] is a scalar field defined everywhere in
//! space: negative inside, positive outside, zero on the surface. A
//! function object is created as one variant and mutated in place for
//! the rest of its life; a plane never becomes a sphere. Filters hold a
//! [`SharedFunction`] handle, so setter calls on the owning configuration
//! object are visible on the next filter execute without re-assignment.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::param::Vec3;

/// Shared handle to a mutable implicit function.
pub type SharedFunction = Arc<RwLock<ImplicitFunction>>;

/// Signed-distance function variants.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ImplicitFunction {
    /// Half-space boundary through `origin` with direction `normal`.
    Plane {
        /// A point on the plane.
        origin: Vec3,
        /// Plane direction; need not be pre-normalized.
        normal: Vec3,
    },
    /// Sphere around `center`.
    Sphere {
        /// Sphere center.
        center: Vec3,
        /// Sphere radius.
        radius: f64,
    },
}

impl ImplicitFunction {
    /// Plane with the original defaults: origin at zero, normal +Z.
    pub fn plane() -> Self {
        ImplicitFunction::Plane {
            origin: Vec3::new(0.0, 0.0, 0.0),
            normal: Vec3::new(0.0, 0.0, 1.0),
        }
    }

    /// Sphere with the original defaults: centered at zero, radius 5.
    pub fn sphere() -> Self {
        ImplicitFunction::Sphere {
            center: Vec3::new(0.0, 0.0, 0.0),
            radius: 5.0,
        }
    }

    /// Signed distance from `point` to the surface.
    ///
    /// The plane normal is normalized here, so callers may hand in any
    /// non-zero direction. A zero-length normal degenerates to distance
    /// 0.0 everywhere; no input validation is specified upstream.
    pub fn evaluate(&self, point: [f64; 3]) -> f64 {
        match self {
            ImplicitFunction::Plane { origin, normal } => {
                let len = normal.length();
                if len == 0.0 {
                    return 0.0;
                }
                let d = Vec3::from_array(point).sub(*origin);
                (d.x * normal.x + d.y * normal.y + d.z * normal.z) / len
            }
            ImplicitFunction::Sphere { center, radius } => {
                Vec3::from_array(point).sub(*center).length() - radius
            }
        }
    }

    /// Move the plane origin; no-op for a sphere.
    pub fn set_origin(&mut self, value: Vec3) {
        if let ImplicitFunction::Plane { origin, .. } = self {
            *origin = value;
        }
    }

    /// Re-direct the plane normal; no-op for a sphere.
    pub fn set_normal(&mut self, value: Vec3) {
        if let ImplicitFunction::Plane { normal, .. } = self {
            *normal = value;
        }
    }

    /// Move the sphere center; no-op for a plane.
    pub fn set_center(&mut self, value: Vec3) {
        if let ImplicitFunction::Sphere { center, .. } = self {
            *center = value;
        }
    }

    /// Resize the sphere; no-op for a plane.
    pub fn set_radius(&mut self, value: f64) {
        if let ImplicitFunction::Sphere { radius, .. } = self {
            *radius = value;
        }
    }

    /// Wrap into a shared handle.
    pub fn into_shared(self) -> SharedFunction {
        Arc::new(RwLock::new(self))
    }
}

/// Groups the implicit functions available to a pipeline's filters.
#[derive(Clone, Debug, Default)]
pub struct FunctionProvider {
    functions: Vec<SharedFunction>,
}

impl FunctionProvider {
    /// Empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a function.
    pub fn push(&mut self, function: SharedFunction) {
        self.functions.push(function);
    }

    /// Grouped functions, in insertion order.
    pub fn functions(&self) -> &[SharedFunction] {
        &self.functions
    }
}
