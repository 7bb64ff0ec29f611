//! Constructive solid geometry combinators
//!
//! Every boundary point of a combined shape lies on the boundary of one of
//! its children, so all three combinators share one search: walk from child
//! crossing to child crossing and stop at the first one where the combined
//! containment actually changes.

use epmc_math::Vec3;

use crate::error::GeometryError;
use crate::shape::{Segment, Shape, NO_INTERSECTION};

/// Child crossings visited on one segment before giving up
pub const MAX_MARCH_STEPS: usize = 10_000;

/// Nearest child crossing on the ray from `from` through `to`
fn nearest_child_crossing(children: &[Box<dyn Shape>], from: Vec3, to: Vec3) -> f64 {
    children
        .iter()
        .map(|child| child.first_intersection(from, to))
        .fold(NO_INTERSECTION, f64::min)
}

/// Find the first crossing of the combined boundary within `[0, 1]`
///
/// `inside` is the combined containment at `p0`. Each coincident child
/// surface is stepped over by the segment's nudge.
fn march<F>(seg: &Segment, inside: bool, children: &[Box<dyn Shape>], contains: F) -> f64
where
    F: Fn(Vec3) -> bool,
{
    let mut t = 0.0;
    for _ in 0..MAX_MARCH_STEPS {
        if t >= 1.0 {
            return NO_INTERSECTION;
        }
        let local = nearest_child_crossing(children, seg.point_at(t), seg.p1);
        if local > 1.0 {
            return NO_INTERSECTION;
        }
        let crossing = seg.from_sub(t, local);
        let past = crossing + seg.nudge;
        if contains(seg.point_at(past)) != inside {
            return crossing;
        }
        t = past;
    }
    log::warn!(
        "Boundary search gave up after {} child crossings between [{:e}, {:e}, {:e}] and [{:e}, {:e}, {:e}]",
        MAX_MARCH_STEPS,
        seg.p0.x,
        seg.p0.y,
        seg.p0.z,
        seg.p1.x,
        seg.p1.y,
        seg.p1.z
    );
    NO_INTERSECTION
}

fn require_children(kind: &'static str, children: &[Box<dyn Shape>]) -> Result<(), GeometryError> {
    if children.is_empty() {
        Err(GeometryError::invalid(kind, "needs at least one child shape"))
    } else {
        Ok(())
    }
}

/// Points contained by every child
#[derive(Debug)]
pub struct Intersection {
    children: Vec<Box<dyn Shape>>,
}

impl Intersection {
    pub fn new(children: Vec<Box<dyn Shape>>) -> Result<Self, GeometryError> {
        require_children("intersection", &children)?;
        Ok(Self { children })
    }

    /// Add another child shape
    pub fn with(mut self, child: impl Shape + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Shape for Intersection {
    fn contains(&self, point: Vec3) -> bool {
        self.children.iter().all(|c| c.contains(point))
    }

    /// Crossings beyond `p1` are reported as [`NO_INTERSECTION`]
    fn first_intersection(&self, p0: Vec3, p1: Vec3) -> f64 {
        let Some(seg) = Segment::new(p0, p1) else {
            return NO_INTERSECTION;
        };
        march(&seg, self.contains(p0), &self.children, |p| self.contains(p))
    }
}

/// Points contained by any child (the union)
#[derive(Debug)]
pub struct Sum {
    children: Vec<Box<dyn Shape>>,
}

impl Sum {
    pub fn new(children: Vec<Box<dyn Shape>>) -> Result<Self, GeometryError> {
        require_children("sum", &children)?;
        Ok(Self { children })
    }

    /// Add another child shape
    pub fn with(mut self, child: impl Shape + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Shape for Sum {
    fn contains(&self, point: Vec3) -> bool {
        self.children.iter().any(|c| c.contains(point))
    }

    /// Crossings beyond `p1` are reported as [`NO_INTERSECTION`]
    fn first_intersection(&self, p0: Vec3, p1: Vec3) -> f64 {
        let Some(seg) = Segment::new(p0, p1) else {
            return NO_INTERSECTION;
        };
        // Overlapping children hide each other's surfaces; the walk skips those
        march(&seg, self.contains(p0), &self.children, |p| self.contains(p))
    }
}

/// Points in the first shape but not in the second
#[derive(Debug)]
pub struct Difference {
    /// `[minuend, subtrahend]`
    parts: [Box<dyn Shape>; 2],
}

impl Difference {
    pub fn new(minuend: Box<dyn Shape>, subtrahend: Box<dyn Shape>) -> Self {
        Self {
            parts: [minuend, subtrahend],
        }
    }

    pub fn minuend(&self) -> &dyn Shape {
        self.parts[0].as_ref()
    }

    pub fn subtrahend(&self) -> &dyn Shape {
        self.parts[1].as_ref()
    }
}

impl Shape for Difference {
    fn contains(&self, point: Vec3) -> bool {
        self.parts[0].contains(point) && !self.parts[1].contains(point)
    }

    /// Crossings beyond `p1` are reported as [`NO_INTERSECTION`]
    fn first_intersection(&self, p0: Vec3, p1: Vec3) -> f64 {
        let Some(seg) = Segment::new(p0, p1) else {
            return NO_INTERSECTION;
        };
        march(&seg, self.contains(p0), &self.parts, |p| self.contains(p))
    }
}
