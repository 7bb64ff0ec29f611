//! Geometry error types
//!
//! Geometric invariant violations are fatal for the trajectory that hits
//! them. Numerical degeneracies (parallel rays, negative discriminants) are
//! not errors at all; shapes answer those with [`NO_INTERSECTION`](crate::NO_INTERSECTION).

use std::fmt;

use epmc_math::Vec3;

/// Error type for shape construction and region lookups
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Shape parameters that would make intersection arithmetic meaningless
    InvalidShape {
        /// Kind of shape being built
        shape: &'static str,
        /// What was wrong with the parameters
        reason: String,
    },
    /// A region handle that does not belong to the tree
    UnknownRegion(String),
    /// A position that no region (not even the chamber) contains
    Unresolved {
        /// The offending position
        position: Vec3,
        /// What the caller was doing when resolution failed
        context: String,
    },
}

impl GeometryError {
    /// Shorthand for [`GeometryError::InvalidShape`]
    pub fn invalid(shape: &'static str, reason: impl Into<String>) -> Self {
        GeometryError::InvalidShape {
            shape,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::InvalidShape { shape, reason } => {
                write!(f, "Invalid {}: {}", shape, reason)
            }
            GeometryError::UnknownRegion(what) => write!(f, "Unknown region: {}", what),
            GeometryError::Unresolved { position, context } => write!(
                f,
                "Position [{:e}, {:e}, {:e}] is outside every region ({})",
                position.x, position.y, position.z, context
            ),
        }
    }
}

impl std::error::Error for GeometryError {}
