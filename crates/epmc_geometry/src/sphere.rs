//! Spherical shape

use epmc_math::Vec3;

use crate::error::GeometryError;
use crate::shape::{smallest_forward, Shape, MIN_FEATURE_SIZE, NO_INTERSECTION};

/// A solid sphere defined by center and radius
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    center: Vec3,
    radius: f64,
}

impl Sphere {
    /// Create a new sphere at the given center with the given radius
    pub fn new(center: Vec3, radius: f64) -> Result<Self, GeometryError> {
        if !center.is_finite() {
            return Err(GeometryError::invalid("sphere", "center is not finite"));
        }
        if !(radius >= MIN_FEATURE_SIZE) || !radius.is_finite() {
            return Err(GeometryError::invalid(
                "sphere",
                format!("radius {:e} is below the minimum feature size", radius),
            ));
        }
        Ok(Self { center, radius })
    }

    /// Create a unit sphere at the origin
    pub fn unit() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 1.0,
        }
    }

    /// Center of the sphere
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Radius of the sphere
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Shape for Sphere {
    fn contains(&self, point: Vec3) -> bool {
        (point - self.center).length_squared() <= self.radius * self.radius
    }

    /// Solves `|p0 + t d - c|^2 = r^2` for the smallest non-negative root
    fn first_intersection(&self, p0: Vec3, p1: Vec3) -> f64 {
        let d = p1 - p0;
        let m = p0 - self.center;
        let ma2 = -2.0 * d.dot(d);
        if ma2 == 0.0 {
            return NO_INTERSECTION;
        }
        let b = 2.0 * m.dot(d);
        let c2 = 2.0 * (m.dot(m) - self.radius * self.radius);
        let f = b * b + ma2 * c2;
        if f < 0.0 {
            return NO_INTERSECTION;
        }
        let root = f.sqrt();
        smallest_forward((b + root) / ma2, (b - root) / ma2)
    }
}
