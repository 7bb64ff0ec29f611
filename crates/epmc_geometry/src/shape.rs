//! The shape contract shared by primitives and combinators
//!
//! Shapes are pure geometry: no materials, no scattering behavior. That
//! information lives with the region that owns the shape.

use std::fmt;

use epmc_math::Vec3;

/// Returned by [`Shape::first_intersection`] when there is no forward crossing
pub const NO_INTERSECTION: f64 = f64::MAX;

/// Forward nudge (metres) applied whenever a boundary crossing becomes a new
/// search origin, so coincident surfaces are not found twice
pub const SMALL_DISP: f64 = 1.0e-15;

/// Smallest radius, length or period a shape may be built with (metres)
pub const MIN_FEATURE_SIZE: f64 = 100.0 * SMALL_DISP;

/// A closed region of space with a computable boundary
///
/// Boundary points are contained. The two methods must agree: if
/// `t = first_intersection(a, b)` is at most 1, points just before and just
/// after `a + t (b - a)` differ in containment.
pub trait Shape: Send + Sync + fmt::Debug {
    /// Check if a point is inside or on the shape
    fn contains(&self, point: Vec3) -> bool;

    /// Parameter of the first boundary crossing on the ray from `p0` through `p1`
    ///
    /// The crossing point is `p0 + t (p1 - p0)` with `t >= 0`. Values above 1
    /// mean the boundary lies beyond `p1`; [`NO_INTERSECTION`] means there is
    /// no forward crossing at all.
    fn first_intersection(&self, p0: Vec3, p1: Vec3) -> f64;
}

/// A non-degenerate segment with its parameter-space nudge
#[derive(Clone, Copy, Debug)]
pub struct Segment {
    pub p0: Vec3,
    pub p1: Vec3,
    pub delta: Vec3,
    pub length: f64,
    /// [`SMALL_DISP`] expressed as a fraction of the segment
    pub nudge: f64,
}

impl Segment {
    /// Build a segment, or `None` if it has zero or non-finite length
    pub fn new(p0: Vec3, p1: Vec3) -> Option<Self> {
        let delta = p1 - p0;
        let length = delta.length();
        if !(length > 0.0) || !length.is_finite() {
            return None;
        }
        Some(Self {
            p0,
            p1,
            delta,
            length,
            nudge: SMALL_DISP / length,
        })
    }

    /// Point at parameter `t`
    #[inline]
    pub fn point_at(&self, t: f64) -> Vec3 {
        self.p0 + self.delta * t
    }

    /// Unit direction from `p0` to `p1`
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.delta / self.length
    }

    /// Map a parameter measured on the sub-segment starting at `t_from` back
    /// onto this segment
    ///
    /// Sub-segments always end at `p1`, so their parameter space is the
    /// interval `[t_from, 1]` of this one.
    #[inline]
    pub fn from_sub(&self, t_from: f64, local: f64) -> f64 {
        if local == NO_INTERSECTION {
            NO_INTERSECTION
        } else {
            t_from + local * (1.0 - t_from)
        }
    }
}

/// Pick the smallest non-negative root, or [`NO_INTERSECTION`]
#[inline]
pub(crate) fn smallest_forward(a: f64, b: f64) -> f64 {
    let a = if a >= 0.0 && a.is_finite() { a } else { NO_INTERSECTION };
    let b = if b >= 0.0 && b.is_finite() { b } else { NO_INTERSECTION };
    a.min(b)
}
