//! Electron guns: where primary electrons come from
//!
//! All guns fire along +z by default (towards a substrate whose surface is
//! the plane z = 0).

use std::fmt;

use epmc_math::Vec3;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::context::SimulationContext;
use crate::electron::Electron;
use crate::error::ModelError;

/// Produces the primary electron of each trajectory
pub trait ElectronGun: Send + fmt::Debug {
    fn create_electron(&self, ctx: &mut SimulationContext) -> Electron;

    /// Beam energy in eV
    fn beam_energy(&self) -> f64;

    fn set_beam_energy(&mut self, energy: f64);

    /// Point the beam is centred on
    fn center(&self) -> Vec3;

    fn set_center(&mut self, center: Vec3);
}

/// Direction shared by the bundled guns
#[derive(Clone, Copy, Debug, PartialEq)]
struct Aim {
    theta: f64,
    phi: f64,
}

impl Default for Aim {
    fn default() -> Self {
        Self { theta: 0.0, phi: 0.0 }
    }
}

/// Every electron starts at exactly the same point
#[derive(Clone, Debug, PartialEq)]
pub struct PointBeam {
    center: Vec3,
    energy: f64,
    aim: Aim,
}

impl PointBeam {
    pub fn new(center: Vec3, energy: f64) -> Self {
        Self {
            center,
            energy,
            aim: Aim::default(),
        }
    }

    /// Fire along the spherical angles `theta`, `phi` instead of +z
    pub fn with_direction(mut self, theta: f64, phi: f64) -> Self {
        self.aim = Aim { theta, phi };
        self
    }
}

impl ElectronGun for PointBeam {
    fn create_electron(&self, ctx: &mut SimulationContext) -> Electron {
        Electron::new(ctx, self.center, self.aim.theta, self.aim.phi, self.energy)
    }

    fn beam_energy(&self) -> f64 {
        self.energy
    }

    fn set_beam_energy(&mut self, energy: f64) {
        self.energy = energy;
    }

    fn center(&self) -> Vec3 {
        self.center
    }

    fn set_center(&mut self, center: Vec3) {
        self.center = center;
    }
}

/// Lateral start positions normally distributed around the centre
///
/// `width` is the standard deviation (metres) of the offset along each of x
/// and y.
#[derive(Clone, Debug)]
pub struct GaussianBeam {
    center: Vec3,
    energy: f64,
    width: f64,
    offset: Normal<f64>,
}

impl GaussianBeam {
    pub fn new(center: Vec3, energy: f64, width: f64) -> Result<Self, ModelError> {
        if !(width >= 0.0) || !width.is_finite() {
            return Err(ModelError::new(
                "gaussian beam",
                format!("beam width {:e} must be non-negative", width),
            ));
        }
        let offset = Normal::new(0.0, width).map_err(|e| ModelError::new("gaussian beam", e.to_string()))?;
        Ok(Self {
            center,
            energy,
            width,
            offset,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }
}

impl ElectronGun for GaussianBeam {
    fn create_electron(&self, ctx: &mut SimulationContext) -> Electron {
        let dx = self.offset.sample(ctx.rng());
        let dy = self.offset.sample(ctx.rng());
        let start = self.center + Vec3::new(dx, dy, 0.0);
        Electron::new(ctx, start, 0.0, 0.0, self.energy)
    }

    fn beam_energy(&self) -> f64 {
        self.energy
    }

    fn set_beam_energy(&mut self, energy: f64) {
        self.energy = energy;
    }

    fn center(&self) -> Vec3 {
        self.center
    }

    fn set_center(&mut self, center: Vec3) {
        self.center = center;
    }
}

/// Start positions uniform over a rectangle around the centre (raster overscan)
#[derive(Clone, Debug, PartialEq)]
pub struct OverscanBeam {
    center: Vec3,
    energy: f64,
    half_width: f64,
    half_height: f64,
}

impl OverscanBeam {
    /// Scan a `width` by `height` rectangle in the xy-plane
    pub fn new(center: Vec3, energy: f64, width: f64, height: f64) -> Result<Self, ModelError> {
        if !(width >= 0.0 && height >= 0.0) || !width.is_finite() || !height.is_finite() {
            return Err(ModelError::new(
                "overscan beam",
                format!("scan size {:e} x {:e} must be non-negative", width, height),
            ));
        }
        Ok(Self {
            center,
            energy,
            half_width: 0.5 * width,
            half_height: 0.5 * height,
        })
    }
}

impl ElectronGun for OverscanBeam {
    fn create_electron(&self, ctx: &mut SimulationContext) -> Electron {
        let rng = ctx.rng();
        let dx = self.half_width * (2.0 * rng.random::<f64>() - 1.0);
        let dy = self.half_height * (2.0 * rng.random::<f64>() - 1.0);
        let start = self.center + Vec3::new(dx, dy, 0.0);
        Electron::new(ctx, start, 0.0, 0.0, self.energy)
    }

    fn beam_energy(&self) -> f64 {
        self.energy
    }

    fn set_beam_energy(&mut self, energy: f64) {
        self.energy = energy;
    }

    fn center(&self) -> Vec3 {
        self.center
    }

    fn set_center(&mut self, center: Vec3) {
        self.center = center;
    }
}
