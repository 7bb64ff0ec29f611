//! Material scattering models
//!
//! The engine knows nothing about cross-sections or stopping powers. Each
//! region carries a [`MaterialScatterModel`] that it asks for free paths,
//! scattering outcomes, boundary behaviour and energy loss.

use std::f64::consts::TAU;
use std::fmt;

use rand::Rng;
use rand_distr::{Distribution, Exp, Normal};

use crate::context::SimulationContext;
use crate::electron::{Electron, ElementTag};
use crate::error::ModelError;
use crate::region::{RegionKey, RegionTree};

/// Scattering behaviour of one material
pub trait MaterialScatterModel: Send + Sync + fmt::Debug {
    /// Sample the distance (metres) to the next scattering event
    fn random_mean_path_length(&self, electron: &Electron, ctx: &mut SimulationContext) -> Result<f64, ModelError>;

    /// Scatter the electron in place, possibly spawning a secondary
    fn scatter(&self, electron: &mut Electron, ctx: &mut SimulationContext) -> Result<Option<Electron>, ModelError>;

    /// Handle the electron reaching the boundary into `next`
    ///
    /// Implementations must leave the electron's current region set to
    /// wherever it ends up. The default lets it pass straight through.
    fn barrier_scatter(
        &self,
        electron: &mut Electron,
        next: RegionKey,
        regions: &RegionTree,
        ctx: &mut SimulationContext,
    ) -> Result<Option<Electron>, ModelError> {
        let _ = (regions, ctx);
        electron.set_current_region(Some(next));
        electron.set_scattering_element(None);
        Ok(None)
    }

    /// Energy change (eV, never positive) over a path of `length` metres
    fn calculate_energy_loss(&self, length: f64, electron: &Electron) -> f64;

    /// Electrons below this energy (eV) stop being tracked
    fn min_energy_for_tracking(&self) -> f64;

    /// Name used in logs and errors
    fn name(&self) -> &str {
        "unnamed model"
    }
}

/// Free path in vacuum (metres); longer than any sensible chamber
pub const VACUUM_FREE_PATH: f64 = 1.0;

/// Empty space: no scattering, no energy loss
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VacuumModel {
    min_energy: f64,
}

impl VacuumModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop tracking electrons below `min_energy` (eV)
    pub fn with_min_energy(mut self, min_energy: f64) -> Self {
        self.min_energy = min_energy;
        self
    }
}

impl MaterialScatterModel for VacuumModel {
    fn random_mean_path_length(&self, _electron: &Electron, _ctx: &mut SimulationContext) -> Result<f64, ModelError> {
        Ok(VACUUM_FREE_PATH)
    }

    fn scatter(&self, _electron: &mut Electron, _ctx: &mut SimulationContext) -> Result<Option<Electron>, ModelError> {
        Ok(None)
    }

    fn calculate_energy_loss(&self, _length: f64, _electron: &Electron) -> f64 {
        0.0
    }

    fn min_energy_for_tracking(&self) -> f64 {
        self.min_energy
    }

    fn name(&self) -> &str {
        "vacuum"
    }
}

/// A simple bulk material
///
/// Free paths are exponential with a fixed mean, deflections are Gaussian in
/// polar angle with a uniform azimuth, and the stopping power is constant.
/// Optionally each scatter spawns a secondary carrying a fixed fraction of
/// the primary's energy.
#[derive(Clone, Debug)]
pub struct ConstantLossModel {
    name: String,
    mean_free_path: f64,
    /// eV per metre
    stopping_power: f64,
    free_path: Exp<f64>,
    deflection: Option<Normal<f64>>,
    min_energy: f64,
    secondary_probability: f64,
    secondary_fraction: f64,
    element: Option<ElementTag>,
}

impl ConstantLossModel {
    /// Create a model with mean free path (m) and stopping power (eV/m)
    pub fn new(name: impl Into<String>, mean_free_path: f64, stopping_power: f64) -> Result<Self, ModelError> {
        let name = name.into();
        if !(mean_free_path > 0.0) || !mean_free_path.is_finite() {
            return Err(ModelError::new(name, format!("mean free path {:e} must be positive", mean_free_path)));
        }
        if !(stopping_power >= 0.0) || !stopping_power.is_finite() {
            return Err(ModelError::new(
                name,
                format!("stopping power {:e} must be non-negative", stopping_power),
            ));
        }
        let free_path = Exp::new(1.0 / mean_free_path).map_err(|e| ModelError::new(name.clone(), e.to_string()))?;
        Ok(Self {
            name,
            mean_free_path,
            stopping_power,
            free_path,
            deflection: None,
            min_energy: 50.0,
            secondary_probability: 0.0,
            secondary_fraction: 0.0,
            element: None,
        })
    }

    /// Deflect by a polar angle drawn from a zero-mean Gaussian of width `sigma` (radians)
    pub fn with_deflection(mut self, sigma: f64) -> Result<Self, ModelError> {
        if !(sigma >= 0.0) || !sigma.is_finite() {
            return Err(ModelError::new(
                self.name.clone(),
                format!("deflection width {} must be non-negative", sigma),
            ));
        }
        self.deflection = if sigma == 0.0 {
            None
        } else {
            Some(Normal::new(0.0, sigma).map_err(|e| ModelError::new(self.name.clone(), e.to_string()))?)
        };
        Ok(self)
    }

    /// Stop tracking below `min_energy` eV (default 50 eV)
    pub fn with_min_energy(mut self, min_energy: f64) -> Self {
        self.min_energy = min_energy;
        self
    }

    /// Spawn a secondary with probability `probability` per scatter, taking
    /// `fraction` of the primary's energy
    pub fn with_secondaries(mut self, probability: f64, fraction: f64) -> Result<Self, ModelError> {
        if !(0.0..=1.0).contains(&probability) || !(0.0..=1.0).contains(&fraction) {
            return Err(ModelError::new(
                self.name.clone(),
                format!(
                    "secondary probability {} and fraction {} must lie in [0, 1]",
                    probability, fraction
                ),
            ));
        }
        self.secondary_probability = probability;
        self.secondary_fraction = fraction;
        Ok(self)
    }

    /// Report scatters as coming from element `z`
    pub fn with_element(mut self, z: u8) -> Self {
        self.element = Some(ElementTag(z));
        self
    }

    pub fn mean_free_path(&self) -> f64 {
        self.mean_free_path
    }

    pub fn stopping_power(&self) -> f64 {
        self.stopping_power
    }
}

impl MaterialScatterModel for ConstantLossModel {
    fn random_mean_path_length(&self, _electron: &Electron, ctx: &mut SimulationContext) -> Result<f64, ModelError> {
        Ok(self.free_path.sample(ctx.rng()))
    }

    fn scatter(&self, electron: &mut Electron, ctx: &mut SimulationContext) -> Result<Option<Electron>, ModelError> {
        if let Some(deflection) = &self.deflection {
            let d_theta = deflection.sample(ctx.rng()).abs();
            let d_phi = TAU * ctx.uniform();
            electron.update_direction(d_theta, d_phi);
        }
        electron.set_scattering_element(self.element);

        if self.secondary_probability > 0.0 && ctx.rng().random_bool(self.secondary_probability) {
            let energy = electron.energy() * self.secondary_fraction;
            electron.set_energy(electron.energy() - energy);
            // Isotropic emission
            let theta = (1.0 - 2.0 * ctx.uniform()).acos();
            let phi = TAU * ctx.uniform();
            return Ok(Some(Electron::secondary(ctx, electron, theta, phi, energy)));
        }
        Ok(None)
    }

    fn calculate_energy_loss(&self, length: f64, electron: &Electron) -> f64 {
        -(self.stopping_power * length).min(electron.energy().max(0.0))
    }

    fn min_energy_for_tracking(&self) -> f64 {
        self.min_energy
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epmc_math::Vec3;

    fn primary(ctx: &mut SimulationContext) -> Electron {
        Electron::new(ctx, Vec3::ZERO, 0.0, 0.0, 10_000.0)
    }

    #[test]
    fn test_constant_loss_rejects_bad_parameters() {
        assert!(ConstantLossModel::new("x", 0.0, 1.0).is_err());
        assert!(ConstantLossModel::new("x", 1e-7, -1.0).is_err());
        let m = ConstantLossModel::new("x", 1e-7, 1.0).unwrap();
        assert!(m.clone().with_deflection(-0.1).is_err());
        assert!(m.clone().with_deflection(f64::NAN).is_err());
        assert!(m.clone().with_deflection(0.0).is_ok());
        assert!(m.with_secondaries(1.5, 0.1).is_err());
    }

    #[test]
    fn test_free_path_mean() {
        let model = ConstantLossModel::new("x", 2e-8, 0.0).unwrap();
        let mut ctx = SimulationContext::seeded(11);
        let e = primary(&mut ctx);
        let n = 20_000;
        let total: f64 = (0..n)
            .map(|_| model.random_mean_path_length(&e, &mut ctx).unwrap())
            .sum();
        let mean = total / n as f64;
        assert!((mean - 2e-8).abs() < 0.05 * 2e-8, "mean free path {}", mean);
    }

    #[test]
    fn test_energy_loss_is_non_positive_and_bounded() {
        let model = ConstantLossModel::new("x", 1e-7, 1024.0).unwrap();
        let mut ctx = SimulationContext::seeded(1);
        let e = primary(&mut ctx);
        assert_eq!(model.calculate_energy_loss(0.5, &e), -512.0);
        // Never takes more than the electron has
        assert_eq!(model.calculate_energy_loss(100.0, &e), -10_000.0);
        assert_eq!(model.calculate_energy_loss(0.0, &e), 0.0);
    }

    #[test]
    fn test_scatter_deflects_and_tags() {
        let model = ConstantLossModel::new("x", 1e-7, 0.0)
            .unwrap()
            .with_deflection(0.5)
            .unwrap()
            .with_element(29);
        let mut ctx = SimulationContext::seeded(5);
        let mut e = primary(&mut ctx);
        assert!(model.scatter(&mut e, &mut ctx).unwrap().is_none());
        assert!(e.theta() > 0.0);
        assert_eq!(e.scattering_element(), Some(ElementTag(29)));
    }

    #[test]
    fn test_scatter_secondary_conserves_energy() {
        let model = ConstantLossModel::new("x", 1e-7, 0.0)
            .unwrap()
            .with_secondaries(1.0, 0.25)
            .unwrap();
        let mut ctx = SimulationContext::seeded(5);
        let mut e = primary(&mut ctx);
        let secondary = model.scatter(&mut e, &mut ctx).unwrap().expect("secondary spawned");
        assert_eq!(secondary.energy(), 2_500.0);
        assert_eq!(e.energy(), 7_500.0);
        assert_eq!(secondary.parent_id(), e.id());
    }

    #[test]
    fn test_vacuum_model() {
        let model = VacuumModel::new();
        let mut ctx = SimulationContext::seeded(0);
        let mut e = primary(&mut ctx);
        let before = e.clone();
        assert_eq!(model.random_mean_path_length(&e, &mut ctx).unwrap(), VACUUM_FREE_PATH);
        assert!(model.scatter(&mut e, &mut ctx).unwrap().is_none());
        assert_eq!(e, before);
        assert_eq!(model.calculate_energy_loss(1.0, &e), 0.0);
        assert_eq!(model.name(), "vacuum");
    }

    #[test]
    fn test_default_barrier_scatter_sets_region() {
        let tree = RegionTree::with_chamber_radius(1.0).unwrap();
        let model = VacuumModel::new();
        let mut ctx = SimulationContext::seeded(0);
        let mut e = primary(&mut ctx);
        let out = model
            .barrier_scatter(&mut e, tree.chamber(), &tree, &mut ctx)
            .unwrap();
        assert!(out.is_none());
        assert_eq!(e.current_region(), Some(tree.chamber()));
        assert_eq!(e.previous_region(), None);
    }
}
