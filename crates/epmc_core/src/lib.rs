//! Core transport engine for epmc
//!
//! This crate provides the pieces a Monte Carlo run is assembled from:
//! - [`RegionTree`] - nested regions of the sample, each a shape plus a material
//! - [`MaterialScatterModel`] - what happens to an electron inside a material
//! - [`ElectronGun`] - where primary electrons start
//! - [`MonteCarloSim`] - the stepper, with its stack of suspended parents
//! - [`EventListener`] - observers notified at fixed points of each trajectory
//! - [`SceneTemplate`] - RON descriptions of samples
//!
//! Distances are in metres, energies in eV and angles in radians. Guns fire
//! along +z towards a sample whose surface is conventionally the plane z = 0.

pub mod context;
pub mod electron;
pub mod engine;
pub mod error;
pub mod event;
pub mod gun;
pub mod listeners;
pub mod model;
pub mod parallel;
pub mod region;
pub mod scene;
pub mod shapes;

// Re-export commonly used types
pub use context::SimulationContext;
pub use electron::{Electron, ElementTag};
pub use engine::{EngineConfig, MonteCarloSim};
pub use error::{ModelError, SimulationError};
pub use event::{EventListener, EventMask, EventSource, SimEvent};
pub use gun::{ElectronGun, GaussianBeam, OverscanBeam, PointBeam};
pub use listeners::{EventCounter, EventLog, EventTally, LogEntry, SharedTally};
pub use model::{ConstantLossModel, MaterialScatterModel, VacuumModel, VACUUM_FREE_PATH};
pub use parallel::{run_parallel, ParallelPlan};
pub use region::{Region, RegionKey, RegionTree, StepEnd, DEFAULT_CHAMBER_RADIUS};
pub use scene::{MaterialTemplate, ModelTemplate, RegionTemplate, Scene, SceneError, SceneTemplate};
pub use shapes::ShapeTemplate;

// Re-export geometry so most users need only this crate
pub use epmc_geometry::{GeometryError, Shape, Vec3};
