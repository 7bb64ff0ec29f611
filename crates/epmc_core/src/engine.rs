//! The Monte Carlo stepper
//!
//! [`MonteCarloSim`] drives electrons through a [`RegionTree`] one free path
//! at a time. Each step:
//! 1. Asks the current region's model for a free path
//! 2. Clips the step at the first region boundary
//! 3. Moves the electron and charges the model's energy loss
//! 4. Scatters (full step taken), crosses the boundary, or leaves the chamber
//!
//! Secondaries suspend their parent on an explicit stack and run to
//! completion before the parent resumes.

use std::sync::Arc;

use epmc_geometry::{GeometryError, SMALL_DISP};

use crate::context::SimulationContext;
use crate::electron::Electron;
use crate::error::{ModelError, SimulationError};
use crate::event::{EventListener, EventSource, SimEvent};
use crate::gun::ElectronGun;
use crate::model::MaterialScatterModel;
use crate::region::{RegionKey, RegionTree};

/// Limits guarding against runaway trajectories
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Suspended parents allowed on the secondary stack
    pub max_stack_depth: usize,
    /// Steps allowed for a single electron
    pub max_steps: u64,
    /// Longest single step (metres); longer or infinite free paths are clipped
    pub max_step_length: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: 10_000,
            max_steps: 1_000_000,
            max_step_length: 1.0,
        }
    }
}

/// Single-threaded trajectory engine
pub struct MonteCarloSim {
    regions: Arc<RegionTree>,
    gun: Box<dyn ElectronGun>,
    ctx: SimulationContext,
    electron: Option<Electron>,
    /// Suspended parents, most recent last
    stack: Vec<Electron>,
    listeners: Vec<Box<dyn EventListener>>,
    config: EngineConfig,
    trajectory_index: u64,
}

impl MonteCarloSim {
    pub fn new(regions: Arc<RegionTree>, gun: Box<dyn ElectronGun>, ctx: SimulationContext) -> Self {
        Self {
            regions,
            gun,
            ctx,
            electron: None,
            stack: Vec::new(),
            listeners: Vec::new(),
            config: EngineConfig::default(),
            trajectory_index: 0,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a listener (builder form)
    pub fn with_listener(mut self, listener: impl EventListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn add_listener(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn regions(&self) -> &Arc<RegionTree> {
        &self.regions
    }

    /// The electron currently being stepped
    pub fn electron(&self) -> Option<&Electron> {
        self.electron.as_ref()
    }

    /// Suspended parents waiting for secondaries to finish
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn context_mut(&mut self) -> &mut SimulationContext {
        &mut self.ctx
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn gun(&self) -> &dyn ElectronGun {
        self.gun.as_ref()
    }

    pub fn beam_energy(&self) -> f64 {
        self.gun.beam_energy()
    }

    /// Number of trajectories completed so far
    pub fn trajectories_run(&self) -> u64 {
        self.trajectory_index
    }

    /// Change the beam energy and tell the listeners
    pub fn set_beam_energy(&mut self, energy: f64) {
        self.gun.set_beam_energy(energy);
        self.fire(SimEvent::BeamEnergyChanged);
    }

    /// Swap `old` for `new` in every region using it
    ///
    /// Only allowed between trajectories. The tree is copied first if a
    /// parallel run still shares it.
    pub fn update_model(&mut self, old: &Arc<dyn MaterialScatterModel>, new: &Arc<dyn MaterialScatterModel>) -> usize {
        let tree = Arc::make_mut(&mut self.regions);
        let chamber = tree.chamber();
        tree.update_model(chamber, old, new)
    }

    /// True once the current electron and every suspended parent are done
    pub fn is_trajectory_complete(&self) -> bool {
        self.stack.is_empty() && self.electron.as_ref().map_or(true, |e| e.is_trajectory_complete())
    }

    fn fire(&mut self, event: SimEvent) {
        let Self {
            regions,
            gun,
            electron,
            stack,
            listeners,
            trajectory_index,
            ..
        } = self;
        let mut source = EventSource {
            electron: electron.as_mut(),
            regions: &**regions,
            beam_energy: gun.beam_energy(),
            stack_depth: stack.len(),
            trajectory_index: *trajectory_index,
        };
        for listener in listeners.iter_mut() {
            if listener.interests().contains(event.mask()) {
                listener.on_event(event, &mut source);
            }
        }
    }

    /// Fire a new primary from the gun
    pub fn initialize_trajectory(&mut self) {
        self.stack.clear();
        let mut electron = self.gun.create_electron(&mut self.ctx);
        let region = self
            .regions
            .containing_sub_region(self.regions.chamber(), electron.position());
        if region.is_none() {
            log::warn!(
                "Electron {} starts outside the chamber at [{:e}, {:e}, {:e}]",
                electron.id(),
                electron.position().x,
                electron.position().y,
                electron.position().z
            );
        }
        electron.set_current_region(region);
        self.electron = Some(electron);
        self.fire(SimEvent::TrajectoryStart);
    }

    /// Take one step of the current electron
    ///
    /// If the current electron is already complete, suspended parents are
    /// resumed first. Does nothing once the whole cascade is complete.
    pub fn take_step(&mut self) -> Result<(), SimulationError> {
        if self.electron.is_none() {
            return Err(SimulationError::NoElectron);
        }
        self.resume_parents();
        let regions = Arc::clone(&self.regions);

        let Some(electron) = self.electron.as_mut() else {
            return Err(SimulationError::NoElectron);
        };
        if electron.is_trajectory_complete() {
            return Ok(());
        }
        if electron.step_count() >= self.config.max_steps {
            return Err(SimulationError::StepLimit {
                electron_id: electron.id(),
                steps: self.config.max_steps,
            });
        }

        // The recorded region must still contain the electron
        let recorded = electron
            .current_region()
            .filter(|&key| regions.region(key).is_some_and(|r| r.shape().contains(electron.position())));
        let region = match recorded {
            Some(key) => key,
            None => match regions.containing_sub_region(regions.chamber(), electron.position()) {
                Some(key) => {
                    electron.set_current_region(Some(key));
                    key
                }
                None => {
                    electron.set_current_region(None);
                    electron.set_trajectory_complete(true);
                    return Ok(());
                }
            },
        };
        let model = Arc::clone(regions.get(region)?.model());

        let free_path = model.random_mean_path_length(electron, &mut self.ctx)?;
        if free_path.is_nan() || free_path < 0.0 {
            return Err(ModelError::new(model.name(), format!("invalid free path {}", free_path)).into());
        }
        let free_path = free_path.min(self.config.max_step_length);

        let p0 = electron.position();
        let step = regions.find_end_of_step(region, p0, electron.candidate_point(free_path))?;
        let d_energy = model.calculate_energy_loss(step.end.distance(p0), electron).min(0.0);
        electron.move_to(step.end, d_energy);
        log::trace!(
            "Electron {} stepped {:e} m to region {:?}, E = {} eV",
            electron.id(),
            step.end.distance(p0),
            step.next,
            electron.energy()
        );

        match step.next {
            Some(next) if next == region => self.scatter(&model, &regions),
            Some(next) => self.cross_boundary(region, next, &model, &regions),
            None => {
                electron.set_current_region(None);
                electron.set_trajectory_complete(true);
                self.fire(SimEvent::Backscatter);
                Ok(())
            }
        }
    }

    /// Full free path taken inside one region
    fn scatter(&mut self, model: &Arc<dyn MaterialScatterModel>, regions: &RegionTree) -> Result<(), SimulationError> {
        self.fire(SimEvent::Scatter);
        let electron = self.electron.as_mut().ok_or(SimulationError::NoElectron)?;
        let secondary = model.scatter(electron, &mut self.ctx)?;
        self.fire(SimEvent::PostScatter);
        self.apply_cutoff(regions);
        self.track_secondary(secondary, regions)
    }

    /// Step ended on the boundary into `next`
    fn cross_boundary(
        &mut self,
        from: RegionKey,
        next: RegionKey,
        model: &Arc<dyn MaterialScatterModel>,
        regions: &RegionTree,
    ) -> Result<(), SimulationError> {
        self.fire(SimEvent::NonScatter);
        let electron = self.electron.as_mut().ok_or(SimulationError::NoElectron)?;
        let secondary = model.barrier_scatter(electron, next, regions, &mut self.ctx)?;

        // Push past the boundary so the next step starts clearly on one side
        let nudged = electron.position() + electron.direction() * SMALL_DISP;
        electron.set_position(nudged);
        let still_inside = electron
            .current_region()
            .and_then(|key| regions.region(key))
            .is_some_and(|r| r.shape().contains(nudged));
        if !still_inside {
            let Some(resolved) = regions.containing_sub_region(regions.chamber(), nudged) else {
                return Err(GeometryError::Unresolved {
                    position: nudged,
                    context: format!("electron {} after crossing into {:?}", electron.id(), next),
                }
                .into());
            };
            log::warn!(
                "Electron {} re-resolved to '{}' after boundary nudge",
                electron.id(),
                regions.name(resolved).unwrap_or("?")
            );
            electron.set_current_region(Some(resolved));
        }

        if electron.current_region() != Some(from) {
            self.fire(SimEvent::ExitMaterial);
        }
        self.apply_cutoff(regions);
        self.track_secondary(secondary, regions)
    }

    /// Complete the current electron if it fell below its region's cutoff
    fn apply_cutoff(&mut self, regions: &RegionTree) {
        if let Some(electron) = self.electron.as_mut() {
            if below_cutoff(electron, regions) {
                electron.set_trajectory_complete(true);
            }
        }
    }

    /// Make a freshly spawned secondary current, suspending its parent
    ///
    /// The secondary starts where the parent now is, after any boundary
    /// nudge, and must beat that region's cutoff to be tracked.
    fn track_secondary(&mut self, secondary: Option<Electron>, regions: &RegionTree) -> Result<(), SimulationError> {
        let Some(mut secondary) = secondary else {
            return Ok(());
        };
        let parent = self.electron.as_ref().ok_or(SimulationError::NoElectron)?;
        let region = parent.current_region();
        secondary.set_position(parent.position());
        secondary.set_current_region(region);
        let cutoff = region
            .and_then(|key| regions.region(key))
            .map(|r| r.model().min_energy_for_tracking());
        match cutoff {
            Some(cutoff) if secondary.energy() > cutoff => {}
            _ => {
                log::trace!("Dropped secondary {} at {} eV", secondary.id(), secondary.energy());
                return Ok(());
            }
        }
        if self.stack.len() >= self.config.max_stack_depth {
            return Err(SimulationError::CascadeOverflow {
                depth: self.stack.len(),
            });
        }
        log::debug!(
            "Secondary {} ({} eV) from electron {}",
            secondary.id(),
            secondary.energy(),
            secondary.parent_id()
        );
        if let Some(parent) = self.electron.replace(secondary) {
            self.stack.push(parent);
        }
        self.fire(SimEvent::StartSecondary);
        Ok(())
    }

    /// Pop finished secondaries until a live electron (or nothing) is current
    fn resume_parents(&mut self) {
        while self.electron.as_ref().is_some_and(|e| e.is_trajectory_complete()) {
            let Some(mut parent) = self.stack.pop() else {
                return;
            };
            if below_cutoff(&parent, &self.regions) {
                parent.set_trajectory_complete(true);
            }
            self.electron = Some(parent);
            self.fire(SimEvent::EndSecondary);
        }
    }

    /// Run one primary and all of its secondaries to completion
    pub fn run_trajectory(&mut self) -> Result<(), SimulationError> {
        self.initialize_trajectory();
        loop {
            self.resume_parents();
            if self.is_trajectory_complete() {
                break;
            }
            self.take_step()?;
        }
        self.fire(SimEvent::TrajectoryEnd);
        self.trajectory_index += 1;
        Ok(())
    }

    /// Run `count` independent trajectories bracketed by
    /// `FirstTrajectory`/`LastTrajectory`
    pub fn run_multiple(&mut self, count: u64) -> Result<(), SimulationError> {
        log::info!(
            "Running {} trajectories at {} eV (stream {})",
            count,
            self.gun.beam_energy(),
            self.ctx.stream()
        );
        self.fire(SimEvent::FirstTrajectory);
        for _ in 0..count {
            self.run_trajectory()?;
        }
        self.fire(SimEvent::LastTrajectory);
        log::info!("Finished {} trajectories", count);
        Ok(())
    }
}

fn below_cutoff(electron: &Electron, regions: &RegionTree) -> bool {
    match electron.current_region().and_then(|key| regions.region(key)) {
        Some(region) => electron.energy() < region.model().min_energy_for_tracking(),
        None => true,
    }
}
