//! Finite cylinder with flat end caps

use epmc_math::Vec3;

use crate::error::GeometryError;
use crate::shape::{Shape, MIN_FEATURE_SIZE, NO_INTERSECTION};

/// Relative slack allowed when checking that a root lies on the finite
/// part of the side or inside a cap disk
const RIM_TOLERANCE: f64 = 1.0e-12;

/// A solid cylinder between two end points with the given radius
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cylinder {
    end0: Vec3,
    end1: Vec3,
    /// Unit vector from `end0` to `end1`
    axis: Vec3,
    length: f64,
    radius: f64,
}

impl Cylinder {
    /// Create a cylinder whose axis runs from `end0` to `end1`
    pub fn new(end0: Vec3, end1: Vec3, radius: f64) -> Result<Self, GeometryError> {
        if !end0.is_finite() || !end1.is_finite() {
            return Err(GeometryError::invalid("cylinder", "end points are not finite"));
        }
        if !(radius >= MIN_FEATURE_SIZE) || !radius.is_finite() {
            return Err(GeometryError::invalid(
                "cylinder",
                format!("radius {:e} is below the minimum feature size", radius),
            ));
        }
        let length = (end1 - end0).length();
        if !(length >= MIN_FEATURE_SIZE) {
            return Err(GeometryError::invalid(
                "cylinder",
                format!("length {:e} is below the minimum feature size", length),
            ));
        }
        Ok(Self {
            end0,
            end1,
            axis: (end1 - end0) / length,
            length,
            radius,
        })
    }

    /// First end point (center of the first cap)
    pub fn end0(&self) -> Vec3 {
        self.end0
    }

    /// Second end point (center of the second cap)
    pub fn end1(&self) -> Vec3 {
        self.end1
    }

    /// Radius of the cylinder
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Distance between the two caps
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Split an offset from `end0` into axial and perpendicular parts
    #[inline]
    fn decompose(&self, v: Vec3) -> (f64, Vec3) {
        let along = v.dot(self.axis);
        (along, v - self.axis * along)
    }

    /// Root is admissible on the side surface if it falls between the caps
    fn side_root_ok(&self, m_along: f64, d_along: f64, t: f64) -> bool {
        if !(t >= 0.0) || !t.is_finite() {
            return false;
        }
        let s = m_along + t * d_along;
        let slack = RIM_TOLERANCE * self.length;
        s >= -slack && s <= self.length + slack
    }
}

impl Shape for Cylinder {
    fn contains(&self, point: Vec3) -> bool {
        let (along, perp) = self.decompose(point - self.end0);
        along >= 0.0 && along <= self.length && perp.length_squared() <= self.radius * self.radius
    }

    /// Minimum non-negative root over the side surface and both caps
    fn first_intersection(&self, p0: Vec3, p1: Vec3) -> f64 {
        let d = p1 - p0;
        let d2 = d.length_squared();
        if d2 == 0.0 || !d2.is_finite() {
            return NO_INTERSECTION;
        }
        let (m_along, m_perp) = self.decompose(p0 - self.end0);
        let (d_along, d_perp) = self.decompose(d);
        let r2 = self.radius * self.radius;

        let mut best = NO_INTERSECTION;

        // Side: |m_perp + t d_perp|^2 = r^2. Parallel to the axis the side
        // cannot be crossed, only the caps.
        let a = d_perp.length_squared();
        if a > f64::EPSILON * f64::EPSILON * d2 {
            let b = 2.0 * m_perp.dot(d_perp);
            let c = m_perp.length_squared() - r2;
            let disc = b * b - 4.0 * a * c;
            if disc >= 0.0 {
                // Numerically stable pair of roots
                let q = -0.5 * (b + b.signum() * disc.sqrt());
                let mut roots = [NO_INTERSECTION; 2];
                if q != 0.0 {
                    roots[0] = q / a;
                    roots[1] = c / q;
                } else {
                    roots[0] = 0.0;
                }
                for t in roots {
                    if self.side_root_ok(m_along, d_along, t) && t < best {
                        best = t;
                    }
                }
            }
        }

        // Caps: planes at axial distance 0 and length
        if d_along.abs() > f64::EPSILON * d2.sqrt() {
            for cap in [0.0, self.length] {
                let t = (cap - m_along) / d_along;
                if t >= 0.0 && t < best {
                    let radial = m_perp + d_perp * t;
                    if radial.length_squared() <= r2 * (1.0 + RIM_TOLERANCE) {
                        best = t;
                    }
                }
            }
        }

        best
    }
}
