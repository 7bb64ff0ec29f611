//! Half-space bounded by a plane

use epmc_math::Vec3;

use crate::error::GeometryError;
use crate::shape::{Shape, NO_INTERSECTION};

/// The closed half-space behind a plane
///
/// The plane passes through `point`; the unit `normal` points out of the
/// half-space. Points with `(p - point) · normal <= 0` are contained.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HalfSpace {
    normal: Vec3,
    point: Vec3,
}

impl HalfSpace {
    /// Create a half-space from an outward normal and a point on its plane
    ///
    /// The normal is normalized automatically.
    pub fn new(normal: Vec3, point: Vec3) -> Result<Self, GeometryError> {
        if !normal.is_finite() || !point.is_finite() {
            return Err(GeometryError::invalid("half-space", "normal or point is not finite"));
        }
        let len = normal.length();
        if !(len > 0.0) {
            return Err(GeometryError::invalid("half-space", "normal has zero length"));
        }
        Ok(Self {
            normal: normal / len,
            point,
        })
    }

    /// Build from a normal already known to be unit length
    pub(crate) const fn from_unit_normal(normal: Vec3, point: Vec3) -> Self {
        Self { normal, point }
    }

    /// Unit outward normal
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// A point on the bounding plane
    pub fn point(&self) -> Vec3 {
        self.point
    }

    /// Signed distance from the plane
    ///
    /// Positive = outside (on the normal side)
    /// Negative = inside
    /// Zero = on the plane
    pub fn signed_distance(&self, point: Vec3) -> f64 {
        (point - self.point).dot(self.normal)
    }

    /// Project a point onto the plane
    pub fn project_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.signed_distance(point)
    }
}

impl Shape for HalfSpace {
    fn contains(&self, point: Vec3) -> bool {
        self.signed_distance(point) <= 0.0
    }

    fn first_intersection(&self, p0: Vec3, p1: Vec3) -> f64 {
        let d = p1 - p0;
        let den = self.normal.dot(d);
        // Parallel (or nearly so) to the plane: no crossing
        if !(den.abs() > f64::EPSILON * d.length()) {
            return NO_INTERSECTION;
        }
        let t = self.normal.dot(self.point - p0) / den;
        if t >= 0.0 {
            t
        } else {
            NO_INTERSECTION
        }
    }
}
