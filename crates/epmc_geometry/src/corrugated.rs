//! Corrugated (sinusoidally rippled) sample surface
//!
//! The surface has no closed-form ray intersection. The height gap between a
//! point and the surface changes no faster than `|dz| + slope |dx|` along a
//! segment, so marching by `gap / that bound` can never step over a crossing.
//! The first containment change is then refined by bisection.

use std::f64::consts::TAU;

use epmc_math::Vec3;

use crate::error::GeometryError;
use crate::shape::{Segment, Shape, MIN_FEATURE_SIZE, NO_INTERSECTION, SMALL_DISP};

/// Upper bound on march steps for one segment
const MAX_MARCH_STEPS: usize = 1 << 20;

/// Bisection iterations (more than enough to reach adjacent floats)
const BISECTION_STEPS: usize = 200;

/// Material on the +z side of `z = z0 + amplitude * sin(2π (x - x0) / period + phase)`
///
/// Ridges run along y. With zero amplitude this is the flat substrate
/// `z >= z0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corrugated {
    origin: Vec3,
    amplitude: f64,
    period: f64,
    phase: f64,
}

impl Corrugated {
    /// Create a corrugated surface through `origin`
    pub fn new(origin: Vec3, amplitude: f64, period: f64, phase: f64) -> Result<Self, GeometryError> {
        if !origin.is_finite() || !phase.is_finite() {
            return Err(GeometryError::invalid("corrugated surface", "origin or phase is not finite"));
        }
        if !(amplitude >= 0.0) || !amplitude.is_finite() {
            return Err(GeometryError::invalid(
                "corrugated surface",
                format!("amplitude {:e} must be non-negative", amplitude),
            ));
        }
        if !(period >= MIN_FEATURE_SIZE) || !period.is_finite() {
            return Err(GeometryError::invalid(
                "corrugated surface",
                format!("period {:e} is below the minimum feature size", period),
            ));
        }
        Ok(Self {
            origin,
            amplitude,
            period,
            phase,
        })
    }

    /// Surface height at lateral coordinate `x`
    pub fn surface_z(&self, x: f64) -> f64 {
        self.origin.z + self.amplitude * (TAU * (x - self.origin.x) / self.period + self.phase).sin()
    }

    /// Steepest surface slope, `2π A / P`
    pub fn max_slope(&self) -> f64 {
        TAU * self.amplitude / self.period
    }

    /// Signed height above the surface; non-negative means inside
    fn gap(&self, point: Vec3) -> f64 {
        point.z - self.surface_z(point.x)
    }

    /// Parameter interval of the segment inside the slab the surface occupies
    fn slab_interval(&self, seg: &Segment) -> Option<(f64, f64)> {
        let margin = SMALL_DISP + 1.0e-9 * self.amplitude.max(self.period);
        let lo_z = self.origin.z - self.amplitude - margin;
        let hi_z = self.origin.z + self.amplitude + margin;
        let dz = seg.delta.z;
        if dz == 0.0 {
            if seg.p0.z < lo_z || seg.p0.z > hi_z {
                return None;
            }
            return Some((0.0, 1.0));
        }
        let ta = (lo_z - seg.p0.z) / dz;
        let tb = (hi_z - seg.p0.z) / dz;
        let t_lo = ta.min(tb).max(0.0);
        let t_hi = ta.max(tb).min(1.0);
        if t_lo > t_hi {
            None
        } else {
            Some((t_lo, t_hi))
        }
    }

    /// Narrow `[lo, hi]` where containment at `lo` is `inside` and differs at `hi`
    fn bisect(&self, seg: &Segment, inside: bool, mut lo: f64, mut hi: f64) -> f64 {
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            if mid <= lo || mid >= hi {
                break;
            }
            if self.contains(seg.point_at(mid)) == inside {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        hi
    }
}

impl Shape for Corrugated {
    fn contains(&self, point: Vec3) -> bool {
        point.z >= self.surface_z(point.x)
    }

    /// Crossings beyond `p1` are not searched for; they report [`NO_INTERSECTION`].
    fn first_intersection(&self, p0: Vec3, p1: Vec3) -> f64 {
        let Some(seg) = Segment::new(p0, p1) else {
            return NO_INTERSECTION;
        };
        let Some((t_lo, t_hi)) = self.slab_interval(&seg) else {
            return NO_INTERSECTION;
        };
        let inside = self.contains(p0);

        // Bound on |d gap / dt| along this segment
        let rate = seg.delta.z.abs() + self.max_slope() * seg.delta.x.abs();
        if !(rate > 0.0) {
            // Running along the ridges: the gap never changes
            return NO_INTERSECTION;
        }

        let mut prev = t_lo;
        let mut t = t_lo;
        for _ in 0..MAX_MARCH_STEPS {
            let point = seg.point_at(t);
            if self.contains(point) != inside {
                return self.bisect(&seg, inside, prev, t);
            }
            if t >= t_hi {
                return NO_INTERSECTION;
            }
            let step = (self.gap(point).abs() / rate).max(seg.nudge);
            prev = t;
            t = (t + step).min(t_hi);
        }
        log::warn!(
            "Corrugated surface march gave up after {} steps from [{:e}, {:e}, {:e}]",
            MAX_MARCH_STEPS,
            p0.x,
            p0.y,
            p0.z
        );
        NO_INTERSECTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ripples() -> Corrugated {
        // 0.1 um amplitude, 1 um period, surface around z = 0
        Corrugated::new(Vec3::ZERO, 1.0e-7, 1.0e-6, 0.0).unwrap()
    }

    #[test]
    fn test_corrugated_contains() {
        let c = ripples();
        // Crest at x = period / 4 reaches z = amplitude
        assert!(!c.contains(Vec3::new(0.25e-6, 0.0, 0.5e-7)));
        assert!(c.contains(Vec3::new(0.25e-6, 0.0, 1.5e-7)));
        // Trough at x = 3 period / 4 dips to -amplitude
        assert!(c.contains(Vec3::new(0.75e-6, 0.0, -0.5e-7)));
        assert!(c.contains(Vec3::new(0.0, 5.0, 1.0)));
        assert!(!c.contains(Vec3::new(0.0, 5.0, -1.0)));
    }

    #[test]
    fn test_corrugated_vertical_crossing_hits_surface() {
        let c = ripples();
        let x = 0.1e-6;
        let p0 = Vec3::new(x, 0.0, -1.0e-6);
        let p1 = Vec3::new(x, 0.0, 1.0e-6);
        let t = c.first_intersection(p0, p1);
        assert!(t <= 1.0);
        let z = p0.z + (p1.z - p0.z) * t;
        assert!((z - c.surface_z(x)).abs() < 1.0e-18, "z={} surface={}", z, c.surface_z(x));
    }

    #[test]
    fn test_corrugated_grazing_ray_finds_first_ridge() {
        let c = ripples();
        // Horizontal ray at z = 0.5 amplitude from inside a trough region
        let z = 0.5e-7;
        let p0 = Vec3::new(-0.5e-6, 0.0, z);
        let p1 = Vec3::new(1.5e-6, 0.0, z);
        assert_eq!(c.contains(p0), z >= c.surface_z(p0.x));
        let t = c.first_intersection(p0, p1);
        assert!(t <= 1.0);
        let before = p0.lerp(p1, t - 1e-9);
        let after = p0.lerp(p1, t + 1e-9);
        assert_ne!(c.contains(before), c.contains(after));
    }

    #[test]
    fn test_corrugated_grazing_trough_is_found() {
        let c = ripples();
        // Horizontal segment just above the trough bottom, outside at both ends
        let z = -1.0e-7 + 1.0e-10;
        let p0 = Vec3::new(0.0, 0.0, z);
        let p1 = Vec3::new(1.6e-6, 0.0, z);
        assert!(!c.contains(p0));
        assert!(c.contains(Vec3::new(0.75e-6, 0.0, z)));

        let t = c.first_intersection(p0, p1);
        assert!(t <= 1.0, "segment through the trough reported no crossing");
        let hit = p0.lerp(p1, t);
        assert!(hit.x > 0.7e-6 && hit.x < 0.75e-6, "entered at x = {:e}", hit.x);
        assert!(c.contains(p0.lerp(p1, t + 1e-9)));
        assert!(!c.contains(p0.lerp(p1, t - 1e-9)));
    }

    #[test]
    fn test_corrugated_segment_along_ridges_misses() {
        let c = ripples();
        let t = c.first_intersection(Vec3::new(0.1e-6, 0.0, 1.0e-8), Vec3::new(0.1e-6, 1.0e-6, 1.0e-8));
        assert_eq!(t, NO_INTERSECTION);
    }

    #[test]
    fn test_corrugated_far_above_misses() {
        let c = ripples();
        let t = c.first_intersection(Vec3::new(0.0, 0.0, 1.0e-3), Vec3::new(1.0e-5, 0.0, 1.0e-3));
        assert_eq!(t, NO_INTERSECTION);
    }

    #[test]
    fn test_flat_corrugated_behaves_like_substrate() {
        let c = Corrugated::new(Vec3::ZERO, 0.0, 1.0e-6, 0.0).unwrap();
        let t = c.first_intersection(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!((t - 0.5).abs() < 1e-12);
        let t = c.first_intersection(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
        assert!((t - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_corrugated_rejects_bad_parameters() {
        assert!(Corrugated::new(Vec3::ZERO, -1.0, 1.0e-6, 0.0).is_err());
        assert!(Corrugated::new(Vec3::ZERO, 1.0e-7, 0.0, 0.0).is_err());
    }
}
