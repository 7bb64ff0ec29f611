//! Serializable shape templates
//!
//! ShapeTemplate is the RON form of a region's shape. Each variant stores
//! the construction parameters of one geometry type, and the CSG variants
//! nest further templates. Coordinates are `[x, y, z]` in metres.

use serde::{Deserialize, Serialize};

use epmc_geometry::{
    block, oriented_block, substrate, Aabb, Bounded, Corrugated, Cylinder, Difference, GeometryError, HalfSpace,
    Intersection, Shape, Sphere, Sum,
};
use epmc_math::{mat3, Vec3};

/// Serializable shape template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShapeTemplate {
    Sphere {
        center: [f64; 3],
        radius: f64,
    },
    /// Finite cylinder between two end-cap centres
    Cylinder {
        end0: [f64; 3],
        end1: [f64; 3],
        radius: f64,
    },
    /// Material on the side opposite `normal`
    HalfSpace {
        normal: [f64; 3],
        point: [f64; 3],
    },
    /// Rectangular block, optionally rotated by z-x-z Euler angles
    Block {
        center: [f64; 3],
        half_extents: [f64; 3],
        #[serde(default)]
        rotation: Option<[f64; 3]>,
    },
    /// Everything at z >= 0
    Substrate,
    /// Material above `z = z0 + amplitude * sin(2 pi (x - x0) / period + phase)`
    Corrugated {
        origin: [f64; 3],
        amplitude: f64,
        period: f64,
        #[serde(default)]
        phase: f64,
    },
    Intersection {
        children: Vec<ShapeTemplate>,
    },
    Sum {
        children: Vec<ShapeTemplate>,
    },
    Difference {
        minuend: Box<ShapeTemplate>,
        subtrahend: Box<ShapeTemplate>,
    },
    /// `inner` clipped to an axis-aligned box
    Bounded {
        min: [f64; 3],
        max: [f64; 3],
        inner: Box<ShapeTemplate>,
    },
}

fn vec3(v: [f64; 3]) -> Vec3 {
    Vec3::from_array(v)
}

impl ShapeTemplate {
    /// Build the shape this template describes
    pub fn create_shape(&self) -> Result<Box<dyn Shape>, GeometryError> {
        let shape: Box<dyn Shape> = match self {
            ShapeTemplate::Sphere { center, radius } => Box::new(Sphere::new(vec3(*center), *radius)?),
            ShapeTemplate::Cylinder { end0, end1, radius } => {
                Box::new(Cylinder::new(vec3(*end0), vec3(*end1), *radius)?)
            }
            ShapeTemplate::HalfSpace { normal, point } => Box::new(HalfSpace::new(vec3(*normal), vec3(*point))?),
            ShapeTemplate::Block {
                center,
                half_extents,
                rotation,
            } => match rotation {
                Some([phi, theta, psi]) => Box::new(oriented_block(
                    vec3(*center),
                    vec3(*half_extents),
                    mat3::euler_zxz(*phi, *theta, *psi),
                )?),
                None => Box::new(block(vec3(*center), vec3(*half_extents))?),
            },
            ShapeTemplate::Substrate => Box::new(substrate()),
            ShapeTemplate::Corrugated {
                origin,
                amplitude,
                period,
                phase,
            } => Box::new(Corrugated::new(vec3(*origin), *amplitude, *period, *phase)?),
            ShapeTemplate::Intersection { children } => Box::new(Intersection::new(create_all(children)?)?),
            ShapeTemplate::Sum { children } => Box::new(Sum::new(create_all(children)?)?),
            ShapeTemplate::Difference { minuend, subtrahend } => {
                Box::new(Difference::new(minuend.create_shape()?, subtrahend.create_shape()?))
            }
            ShapeTemplate::Bounded { min, max, inner } => {
                Box::new(Bounded::new(Aabb::new(vec3(*min), vec3(*max))?, inner.create_shape()?))
            }
        };
        Ok(shape)
    }

    /// Create a sphere template
    pub fn sphere(center: [f64; 3], radius: f64) -> Self {
        ShapeTemplate::Sphere { center, radius }
    }

    /// Create an axis-aligned block template
    pub fn block(center: [f64; 3], half_extents: [f64; 3]) -> Self {
        ShapeTemplate::Block {
            center,
            half_extents,
            rotation: None,
        }
    }

    /// Create a substrate template (material at z >= 0)
    pub fn substrate() -> Self {
        ShapeTemplate::Substrate
    }

    /// Create a template for `minuend` with `subtrahend` cut out of it
    pub fn difference(minuend: ShapeTemplate, subtrahend: ShapeTemplate) -> Self {
        ShapeTemplate::Difference {
            minuend: Box::new(minuend),
            subtrahend: Box::new(subtrahend),
        }
    }
}

fn create_all(templates: &[ShapeTemplate]) -> Result<Vec<Box<dyn Shape>>, GeometryError> {
    templates.iter().map(ShapeTemplate::create_shape).collect()
}
