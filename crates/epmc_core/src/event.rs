//! Event notification from the stepper to its listeners
//!
//! Listeners are called synchronously, in registration order, at fixed
//! points of every trajectory. Within one trajectory the order is fixed:
//! `Scatter` precedes `PostScatter`, `NonScatter` precedes `ExitMaterial`,
//! and `TrajectoryStart`/`TrajectoryEnd` bracket the whole cascade of
//! secondaries.

use bitflags::bitflags;

use crate::electron::Electron;
use crate::region::{Region, RegionTree};

/// Points in a run at which listeners are notified
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimEvent {
    /// A full free path was taken inside one region; the model is about to scatter
    Scatter,
    /// The step ended on a boundary into another region
    NonScatter,
    /// The electron left the chamber; its region is already cleared
    Backscatter,
    /// The electron's region changed after a boundary crossing
    ExitMaterial,
    TrajectoryStart,
    TrajectoryEnd,
    /// Before the first trajectory of a batch
    FirstTrajectory,
    /// After the last trajectory of a batch
    LastTrajectory,
    /// A secondary became the current electron
    StartSecondary,
    /// A secondary finished and its parent resumed
    EndSecondary,
    /// The model has scattered the electron
    PostScatter,
    BeamEnergyChanged,
}

impl SimEvent {
    /// Every event kind, in declaration order
    pub const ALL: [SimEvent; 12] = [
        SimEvent::Scatter,
        SimEvent::NonScatter,
        SimEvent::Backscatter,
        SimEvent::ExitMaterial,
        SimEvent::TrajectoryStart,
        SimEvent::TrajectoryEnd,
        SimEvent::FirstTrajectory,
        SimEvent::LastTrajectory,
        SimEvent::StartSecondary,
        SimEvent::EndSecondary,
        SimEvent::PostScatter,
        SimEvent::BeamEnergyChanged,
    ];

    /// Position in [`SimEvent::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The mask bit for this event
    pub fn mask(self) -> EventMask {
        EventMask::from_bits_truncate(1 << self.index())
    }

    pub fn name(self) -> &'static str {
        match self {
            SimEvent::Scatter => "Scatter",
            SimEvent::NonScatter => "NonScatter",
            SimEvent::Backscatter => "Backscatter",
            SimEvent::ExitMaterial => "ExitMaterial",
            SimEvent::TrajectoryStart => "TrajectoryStart",
            SimEvent::TrajectoryEnd => "TrajectoryEnd",
            SimEvent::FirstTrajectory => "FirstTrajectory",
            SimEvent::LastTrajectory => "LastTrajectory",
            SimEvent::StartSecondary => "StartSecondary",
            SimEvent::EndSecondary => "EndSecondary",
            SimEvent::PostScatter => "PostScatter",
            SimEvent::BeamEnergyChanged => "BeamEnergyChanged",
        }
    }
}

bitflags! {
    /// Set of events a listener wants to hear about
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EventMask: u16 {
        const SCATTER = 1 << 0;
        const NON_SCATTER = 1 << 1;
        const BACKSCATTER = 1 << 2;
        const EXIT_MATERIAL = 1 << 3;
        const TRAJECTORY_START = 1 << 4;
        const TRAJECTORY_END = 1 << 5;
        const FIRST_TRAJECTORY = 1 << 6;
        const LAST_TRAJECTORY = 1 << 7;
        const START_SECONDARY = 1 << 8;
        const END_SECONDARY = 1 << 9;
        const POST_SCATTER = 1 << 10;
        const BEAM_ENERGY_CHANGED = 1 << 11;
        /// Start and end of each cascade
        const TRAJECTORY = Self::TRAJECTORY_START.bits() | Self::TRAJECTORY_END.bits();
        /// Secondary start and end
        const SECONDARY = Self::START_SECONDARY.bits() | Self::END_SECONDARY.bits();
        /// Per-step events
        const STEP = Self::SCATTER.bits()
            | Self::NON_SCATTER.bits()
            | Self::BACKSCATTER.bits()
            | Self::EXIT_MATERIAL.bits()
            | Self::POST_SCATTER.bits();
    }
}

/// What a listener can see (and touch) while handling an event
pub struct EventSource<'a> {
    pub(crate) electron: Option<&'a mut Electron>,
    pub(crate) regions: &'a RegionTree,
    pub(crate) beam_energy: f64,
    pub(crate) stack_depth: usize,
    pub(crate) trajectory_index: u64,
}

impl<'a> EventSource<'a> {
    /// The current electron, if a trajectory is in progress
    pub fn electron(&self) -> Option<&Electron> {
        self.electron.as_deref()
    }

    /// Region the current electron is in
    pub fn current_region(&self) -> Option<&Region> {
        let key = self.electron.as_ref()?.current_region()?;
        self.regions.region(key)
    }

    pub fn regions(&self) -> &RegionTree {
        self.regions
    }

    pub fn beam_energy(&self) -> f64 {
        self.beam_energy
    }

    /// Number of suspended parents below the current electron
    pub fn stack_depth(&self) -> usize {
        self.stack_depth
    }

    /// Zero-based index of the trajectory in progress
    pub fn trajectory_index(&self) -> u64 {
        self.trajectory_index
    }

    /// Stop tracking the current electron after this step
    pub fn terminate_trajectory(&mut self) {
        if let Some(electron) = self.electron.as_deref_mut() {
            electron.set_trajectory_complete(true);
        }
    }
}

/// Receives simulation events
pub trait EventListener: Send {
    fn on_event(&mut self, event: SimEvent, source: &mut EventSource<'_>);

    /// Events this listener is called for (all by default)
    fn interests(&self) -> EventMask {
        EventMask::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_masks_are_distinct() {
        let mut seen = EventMask::empty();
        for event in SimEvent::ALL {
            assert!(!seen.intersects(event.mask()), "{} reuses a bit", event.name());
            seen |= event.mask();
        }
        assert_eq!(seen, EventMask::all());
    }

    #[test]
    fn test_index_matches_all() {
        for (i, event) in SimEvent::ALL.iter().enumerate() {
            assert_eq!(event.index(), i);
        }
    }

    #[test]
    fn test_composite_masks() {
        assert!(EventMask::TRAJECTORY.contains(SimEvent::TrajectoryStart.mask()));
        assert!(EventMask::TRAJECTORY.contains(SimEvent::TrajectoryEnd.mask()));
        assert!(EventMask::STEP.contains(SimEvent::PostScatter.mask()));
        assert!(!EventMask::STEP.contains(SimEvent::StartSecondary.mask()));
    }

    #[test]
    fn test_terminate_trajectory_marks_electron() {
        let tree = RegionTree::with_chamber_radius(1.0).unwrap();
        let mut ctx = crate::SimulationContext::seeded(0);
        let mut e = Electron::new(&mut ctx, epmc_math::Vec3::ZERO, 0.0, 0.0, 1.0);
        let mut source = EventSource {
            electron: Some(&mut e),
            regions: &tree,
            beam_energy: 1.0,
            stack_depth: 0,
            trajectory_index: 0,
        };
        assert!(source.current_region().is_none());
        source.terminate_trajectory();
        assert!(e.is_trajectory_complete());
    }
}
