//! Rectangular blocks and the standard substrate

use epmc_math::{mat3, Mat3, Vec3};

use crate::csg::Intersection;
use crate::error::GeometryError;
use crate::plane::HalfSpace;
use crate::shape::{Shape, MIN_FEATURE_SIZE};

/// Axis-aligned block centred on `center`
pub fn block(center: Vec3, half_extents: Vec3) -> Result<Intersection, GeometryError> {
    oriented_block(center, half_extents, mat3::IDENTITY)
}

/// Block whose local axes are the columns of `rotation`
///
/// Built as the intersection of six half-spaces, one per face.
pub fn oriented_block(center: Vec3, half_extents: Vec3, rotation: Mat3) -> Result<Intersection, GeometryError> {
    if !center.is_finite() || !half_extents.is_finite() {
        return Err(GeometryError::invalid("block", "center or extents are not finite"));
    }
    for axis in 0..3 {
        let half = half_extents.axis(axis);
        if !(2.0 * half >= MIN_FEATURE_SIZE) {
            return Err(GeometryError::invalid(
                "block",
                format!("extent {:e} along axis {} is below the minimum feature size", 2.0 * half, axis),
            ));
        }
    }

    let mut faces: Vec<Box<dyn Shape>> = Vec::with_capacity(6);
    for axis in 0..3 {
        let normal = mat3::get_column(rotation, axis).normalized();
        let offset = normal * half_extents.axis(axis);
        faces.push(Box::new(HalfSpace::new(normal, center + offset)?));
        faces.push(Box::new(HalfSpace::new(-normal, center - offset)?));
    }
    Intersection::new(faces)
}

/// Semi-infinite substrate filling `z >= 0`
///
/// The beam travels towards +z, so the sample surface faces the gun.
pub fn substrate() -> HalfSpace {
    HalfSpace::from_unit_normal(Vec3::new(0.0, 0.0, -1.0), Vec3::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_block_contains_faces_and_corners() {
        let b = block(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(b.len(), 6);
        assert!(b.contains(Vec3::ZERO));
        assert!(b.contains(Vec3::new(1.0, 2.0, 3.0)));
        assert!(!b.contains(Vec3::new(1.1, 0.0, 0.0)));
        assert!(!b.contains(Vec3::new(0.0, 0.0, -3.1)));
    }

    #[test]
    fn test_block_entry_and_exit() {
        let b = block(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 1.0, 1.0)).unwrap();
        let t = b.first_intersection(Vec3::new(0.0, 0.0, -2.0), Vec3::new(0.0, 0.0, 2.0));
        assert!((t - 0.5).abs() < 1e-12);
        let t = b.first_intersection(Vec3::new(0.0, 0.0, 1.0), Vec3::new(4.0, 0.0, 1.0));
        assert!((t - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_oriented_block() {
        // Unit cube rotated 45 degrees about z: the corner now points along x
        let rot = mat3::plane_rotation(FRAC_PI_4, 0, 1);
        let b = oriented_block(Vec3::ZERO, Vec3::new(0.5, 0.5, 0.5), rot).unwrap();
        let corner = 0.5 * 2f64.sqrt();
        assert!(b.contains(Vec3::new(corner - 1e-9, 0.0, 0.0)));
        assert!(!b.contains(Vec3::new(0.5, 0.5, 0.0)));
        let t = b.first_intersection(Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO);
        assert!((t - (2.0 - corner) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_block_rejects_flat() {
        assert!(block(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0)).is_err());
    }

    #[test]
    fn test_substrate_faces_the_beam() {
        let s = substrate();
        assert!(s.contains(Vec3::new(0.0, 0.0, 1e-9)));
        assert!(s.contains(Vec3::ZERO));
        assert!(!s.contains(Vec3::new(0.0, 0.0, -1e-9)));
        let t = s.first_intersection(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(t, 0.5);
    }
}
