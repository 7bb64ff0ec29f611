//! Bounding-box acceleration wrapper

use epmc_math::Vec3;

use crate::error::GeometryError;
use crate::shape::{Shape, NO_INTERSECTION};

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create a box from its corners
    pub fn new(min: Vec3, max: Vec3) -> Result<Self, GeometryError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(GeometryError::invalid("bounding box", "corners are not finite"));
        }
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(GeometryError::invalid("bounding box", "min corner exceeds max corner"));
        }
        Ok(Self { min, max })
    }

    /// Smallest box around a sphere
    pub fn around_sphere(center: Vec3, radius: f64) -> Result<Self, GeometryError> {
        let r = Vec3::new(radius, radius, radius);
        Self::new(center - r, center + r)
    }

    /// Grow the box by `margin` on every side
    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vec3::new(margin, margin, margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Whether the segment from `p0` to `p1` touches the box (slab test)
    pub fn segment_overlaps(&self, p0: Vec3, p1: Vec3) -> bool {
        let d = p1 - p0;
        let mut t_enter = 0.0f64;
        let mut t_exit = 1.0f64;
        for axis in 0..3 {
            let origin = p0.axis(axis);
            let dir = d.axis(axis);
            let lo = self.min.axis(axis);
            let hi = self.max.axis(axis);
            if dir == 0.0 {
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let (mut a, mut b) = ((lo - origin) * inv, (hi - origin) * inv);
            if a > b {
                std::mem::swap(&mut a, &mut b);
            }
            t_enter = t_enter.max(a);
            t_exit = t_exit.min(b);
            if t_enter > t_exit {
                return false;
            }
        }
        true
    }
}

/// A shape that answers cheaply for segments far from it
///
/// The inner shape must lie entirely inside `bounds`.
#[derive(Debug)]
pub struct Bounded {
    bounds: Aabb,
    inner: Box<dyn Shape>,
}

impl Bounded {
    pub fn new(bounds: Aabb, inner: Box<dyn Shape>) -> Self {
        Self { bounds, inner }
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn inner(&self) -> &dyn Shape {
        self.inner.as_ref()
    }
}

impl Shape for Bounded {
    fn contains(&self, point: Vec3) -> bool {
        self.bounds.contains(point) && self.inner.contains(point)
    }

    /// Crossings beyond `p1` may be reported as [`NO_INTERSECTION`]
    fn first_intersection(&self, p0: Vec3, p1: Vec3) -> f64 {
        if !self.bounds.contains(p0) && !self.bounds.segment_overlaps(p0, p1) {
            return NO_INTERSECTION;
        }
        self.inner.first_intersection(p0, p1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere::Sphere;

    #[test]
    fn test_aabb_segment_overlap() {
        let b = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0)).unwrap();
        assert!(b.segment_overlaps(Vec3::new(-1.0, 0.5, 0.5), Vec3::new(2.0, 0.5, 0.5)));
        assert!(b.segment_overlaps(Vec3::new(0.5, 0.5, 0.5), Vec3::new(0.6, 0.5, 0.5)));
        // Stops short of the box
        assert!(!b.segment_overlaps(Vec3::new(-2.0, 0.5, 0.5), Vec3::new(-1.0, 0.5, 0.5)));
        // Parallel to a face, outside it
        assert!(!b.segment_overlaps(Vec3::new(-1.0, 2.0, 0.5), Vec3::new(2.0, 2.0, 0.5)));
    }

    #[test]
    fn test_aabb_rejects_inverted() {
        assert!(Aabb::new(Vec3::X, Vec3::ZERO).is_err());
    }

    #[test]
    fn test_bounded_matches_inner() {
        let sphere = Sphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0).unwrap();
        let bounded = Bounded::new(
            Aabb::around_sphere(sphere.center(), 1.0).unwrap().expanded(1e-9),
            Box::new(sphere),
        );
        let p0 = Vec3::new(0.0, 0.0, 0.0);
        let p1 = Vec3::new(8.0, 0.0, 0.0);
        assert_eq!(bounded.first_intersection(p0, p1), sphere.first_intersection(p0, p1));
        assert!(bounded.contains(Vec3::new(5.5, 0.0, 0.0)));

        // Short segment far from the box: skipped
        let t = bounded.first_intersection(p0, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(t, NO_INTERSECTION);
    }
}
