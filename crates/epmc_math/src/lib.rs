//! 3D Mathematics Library
//!
//! This crate provides the vector and rotation types used by the epmc
//! geometry and transport crates.
//!
//! ## Core Types
//!
//! - [`Vec3`] - 3D vector with x, y, z components (f64, metres)
//! - [`Mat3`] - 3x3 rotation matrix (column-major)
//!
//! Directions of travel are stored by the transport engine as spherical
//! angles (theta from +z, phi from +x in the xy plane); [`Vec3::from_spherical`]
//! turns them into a unit vector.

mod vec3;
pub mod mat3;

pub use vec3::Vec3;
pub use mat3::Mat3;
