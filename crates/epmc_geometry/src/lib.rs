//! Sample geometry for epmc
//!
//! This crate provides the shapes that regions of a sample are cut from:
//! - Primitives (spheres, finite cylinders, half-spaces, corrugated surfaces)
//! - Block builders (intersections of six half-spaces)
//! - CSG combinators (intersection, sum, difference) and a bounding-box wrapper
//!
//! Every shape answers two questions, through the [`Shape`] trait: does it
//! contain a point, and where along a segment does the segment first cross
//! its boundary.

pub mod block;
pub mod bounded;
pub mod corrugated;
pub mod csg;
pub mod cylinder;
pub mod error;
pub mod plane;
pub mod shape;
pub mod sphere;

// Re-export commonly used types
pub use block::{block, oriented_block, substrate};
pub use bounded::{Aabb, Bounded};
pub use corrugated::Corrugated;
pub use csg::{Difference, Intersection, Sum, MAX_MARCH_STEPS};
pub use cylinder::Cylinder;
pub use error::GeometryError;
pub use plane::HalfSpace;
pub use shape::{Segment, Shape, MIN_FEATURE_SIZE, NO_INTERSECTION, SMALL_DISP};
pub use sphere::Sphere;

pub use epmc_math::Vec3;
