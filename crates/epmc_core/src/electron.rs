//! Electron trajectory state
//!
//! An [`Electron`] is one point along one trajectory. The stepper moves it;
//! scattering models turn it and spend its energy; listeners read it.

use epmc_math::Vec3;

use crate::context::SimulationContext;
use crate::region::RegionKey;

/// Atomic number of the element an electron last scattered from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementTag(pub u8);

/// A tracked electron
///
/// Direction is stored as spherical angles: `theta` from +z and `phi` from
/// +x in the xy-plane. Energies are in eV, positions in metres.
#[derive(Clone, Debug, PartialEq)]
pub struct Electron {
    position: Vec3,
    prev_position: Vec3,
    initial_position: Vec3,
    theta: f64,
    phi: f64,
    energy: f64,
    previous_energy: f64,
    step_count: u64,
    current_region: Option<RegionKey>,
    prev_region: Option<RegionKey>,
    scattering_element: Option<ElementTag>,
    trajectory_complete: bool,
    id: u64,
    parent_id: u64,
}

impl Electron {
    /// Create a primary electron
    pub fn new(ctx: &mut SimulationContext, position: Vec3, theta: f64, phi: f64, energy: f64) -> Self {
        Self {
            position,
            prev_position: position,
            initial_position: position,
            theta,
            phi,
            energy,
            previous_energy: energy,
            step_count: 0,
            current_region: None,
            prev_region: None,
            scattering_element: None,
            trajectory_complete: false,
            id: ctx.next_electron_id(),
            parent_id: 0,
        }
    }

    /// Create a secondary electron at the parent's position, in the parent's region
    pub fn secondary(ctx: &mut SimulationContext, parent: &Electron, theta: f64, phi: f64, energy: f64) -> Self {
        let mut electron = Self::new(ctx, parent.position, theta, phi, energy);
        electron.current_region = parent.current_region;
        electron.prev_region = parent.current_region;
        electron.parent_id = parent.id;
        electron
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn previous_position(&self) -> Vec3 {
        self.prev_position
    }

    pub fn initial_position(&self) -> Vec3 {
        self.initial_position
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Unit vector along the direction of travel
    pub fn direction(&self) -> Vec3 {
        Vec3::from_spherical(self.theta, self.phi)
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Energy before the most recent step
    pub fn previous_energy(&self) -> f64 {
        self.previous_energy
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn current_region(&self) -> Option<RegionKey> {
        self.current_region
    }

    pub fn previous_region(&self) -> Option<RegionKey> {
        self.prev_region
    }

    pub fn scattering_element(&self) -> Option<ElementTag> {
        self.scattering_element
    }

    pub fn is_trajectory_complete(&self) -> bool {
        self.trajectory_complete
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Id of the electron that spawned this one, 0 for primaries
    pub fn parent_id(&self) -> u64 {
        self.parent_id
    }

    pub fn is_secondary(&self) -> bool {
        self.parent_id != 0
    }

    /// Point `distance` metres ahead along the current direction
    pub fn candidate_point(&self, distance: f64) -> Vec3 {
        self.position + self.direction() * distance
    }

    /// Advance to `point`, changing the energy by `d_energy`
    ///
    /// Records the previous position and energy and counts the step.
    pub fn move_to(&mut self, point: Vec3, d_energy: f64) {
        self.prev_position = self.position;
        self.position = point;
        self.previous_energy = self.energy;
        self.energy += d_energy;
        self.step_count += 1;
    }

    /// Reposition without counting a step (boundary nudges)
    pub fn set_position(&mut self, point: Vec3) {
        self.position = point;
    }

    pub fn set_energy(&mut self, energy: f64) {
        self.energy = energy;
    }

    pub fn set_direction(&mut self, theta: f64, phi: f64) {
        self.theta = theta;
        self.phi = phi;
    }

    /// Deflect by polar angle `d_theta` and azimuth `d_phi` relative to the
    /// current direction of travel
    pub fn update_direction(&mut self, d_theta: f64, d_phi: f64) {
        let (ct, st) = (self.theta.cos(), self.theta.sin());
        let (cp, sp) = (self.phi.cos(), self.phi.sin());
        let (ca, sa) = (d_theta.cos(), d_theta.sin());
        let (cb, sb) = (d_phi.cos(), d_phi.sin());

        let xx = cb * ct * sa + ca * st;
        let yy = sa * sb;
        let dx = cp * xx - sp * yy;
        let dy = sp * xx + cp * yy;
        let dz = ca * ct - cb * sa * st;

        self.theta = (dx * dx + dy * dy).sqrt().atan2(dz);
        self.phi = dy.atan2(dx);
    }

    /// Enter `region`; the region being left becomes the previous region
    pub fn set_current_region(&mut self, region: Option<RegionKey>) {
        self.prev_region = self.current_region;
        self.current_region = region;
    }

    pub fn set_scattering_element(&mut self, element: Option<ElementTag>) {
        self.scattering_element = element;
    }

    pub fn set_trajectory_complete(&mut self, complete: bool) {
        self.trajectory_complete = complete;
    }
}
