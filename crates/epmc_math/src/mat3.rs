//! 3x3 Matrix utilities for orienting shapes
//!
//! Blocks and cylinders in a sample description are often tilted. The
//! helpers here build the rotations used to place them, following the
//! z-x-z Euler convention common in microanalysis sample stages.

use crate::Vec3;

/// 3x3 matrix type (column-major)
pub type Mat3 = [[f64; 3]; 3];

/// Identity matrix
pub const IDENTITY: Mat3 = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

/// Create a rotation matrix in the plane spanned by two axes
///
/// # Arguments
/// * `angle` - Rotation angle in radians
/// * `p1`, `p2` - Indices of the axes forming the rotation plane (0=X, 1=Y, 2=Z)
///
/// # Example
/// ```
/// use epmc_math::mat3::{get_column, plane_rotation};
/// use epmc_math::Vec3;
/// // Quarter turn in the XY plane takes X to Y
/// let m = plane_rotation(std::f64::consts::FRAC_PI_2, 0, 1);
/// assert!((get_column(m, 0) - Vec3::Y).length() < 1e-12);
/// ```
pub fn plane_rotation(angle: f64, p1: usize, p2: usize) -> Mat3 {
    let cs = angle.cos();
    let sn = angle.sin();

    let mut m = IDENTITY;

    m[p1][p1] = cs;
    m[p2][p2] = cs;
    m[p1][p2] = sn;
    m[p2][p1] = -sn;

    m
}

/// Rotation from z-x-z Euler angles
///
/// Applies `phi` about Z, then `theta` about the rotated X, then `psi`
/// about the rotated Z.
pub fn euler_zxz(phi: f64, theta: f64, psi: f64) -> Mat3 {
    let rz1 = plane_rotation(phi, 0, 1);
    let rx = plane_rotation(theta, 1, 2);
    let rz2 = plane_rotation(psi, 0, 1);
    mul(rz1, mul(rx, rz2))
}

/// Multiply two 3x3 matrices: result = a * b
///
/// In column-major convention, this applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: Mat3, b: Mat3) -> Mat3 {
    let mut result = [[0.0f64; 3]; 3];

    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}

/// Get a column vector from a matrix
pub fn get_column(m: Mat3, col: usize) -> Vec3 {
    Vec3::new(m[col][0], m[col][1], m[col][2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPSILON: f64 = 1e-12;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPSILON
    }

    #[test]
    fn test_identity_columns() {
        assert_eq!(get_column(IDENTITY, 0), Vec3::X);
        assert_eq!(get_column(IDENTITY, 1), Vec3::Y);
        assert_eq!(get_column(IDENTITY, 2), Vec3::Z);
    }

    #[test]
    fn test_plane_rotation_yz() {
        let m = plane_rotation(FRAC_PI_2, 1, 2);

        let y = get_column(m, 1);
        assert!(vec_approx_eq(y, Vec3::Z), "Y should become Z, got {:?}", y);

        let z = get_column(m, 2);
        assert!(vec_approx_eq(z, -Vec3::Y), "Z should become -Y, got {:?}", z);

        assert!(vec_approx_eq(get_column(m, 0), Vec3::X), "X should be unchanged");
    }

    #[test]
    fn test_euler_columns_are_orthonormal() {
        let m = euler_zxz(0.4, 0.9, 2.1);
        for i in 0..3 {
            let a = get_column(m, i);
            assert!((a.length() - 1.0).abs() < EPSILON);
            for j in (i + 1)..3 {
                assert!(a.dot(get_column(m, j)).abs() < EPSILON);
            }
        }
    }

    #[test]
    fn test_euler_single_angles() {
        // Tilt only: the local z axis leans from +Z towards -Y
        let m = euler_zxz(0.0, FRAC_PI_2, 0.0);
        assert!(vec_approx_eq(get_column(m, 2), -Vec3::Y));
        assert!(vec_approx_eq(get_column(m, 0), Vec3::X));

        // Pure spin about Z
        let m = euler_zxz(FRAC_PI_2, 0.0, 0.0);
        assert!(vec_approx_eq(get_column(m, 0), Vec3::Y));
        assert!(vec_approx_eq(get_column(m, 2), Vec3::Z));
    }

    #[test]
    fn test_mul_applies_right_first() {
        let a = plane_rotation(FRAC_PI_2, 0, 1);
        let b = plane_rotation(FRAC_PI_2, 1, 2);
        // b takes Z to -Y, then a takes -Y to X
        assert!(vec_approx_eq(get_column(mul(a, b), 2), Vec3::X));
    }
}
