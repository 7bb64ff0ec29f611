//! Error types for the stepping engine and its collaborators

use std::fmt;

use epmc_geometry::GeometryError;

/// A failure reported by a scattering model or electron gun
///
/// The engine never retries or suppresses these; they reach the caller as
/// [`SimulationError::Model`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelError {
    model: String,
    message: String,
}

impl ModelError {
    pub fn new(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Name of the model that failed
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Model '{}' failed: {}", self.model, self.message)
    }
}

impl std::error::Error for ModelError {}

/// Error type for running trajectories
#[derive(Debug)]
pub enum SimulationError {
    /// Broken geometric invariant (electron in no region, bad region handle)
    Geometry(GeometryError),
    /// Scattering model or gun failure
    Model(ModelError),
    /// Too many suspended parents on the secondary-electron stack
    CascadeOverflow {
        /// Stack depth when the push was refused
        depth: usize,
    },
    /// A single electron took more steps than allowed
    StepLimit {
        electron_id: u64,
        steps: u64,
    },
    /// Stepping was requested before a trajectory was initialized
    NoElectron,
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Geometry(e) => write!(f, "Geometry error: {}", e),
            SimulationError::Model(e) => write!(f, "{}", e),
            SimulationError::CascadeOverflow { depth } => {
                write!(f, "Secondary cascade exceeded {} suspended electrons", depth)
            }
            SimulationError::StepLimit { electron_id, steps } => {
                write!(f, "Electron {} exceeded the step limit of {}", electron_id, steps)
            }
            SimulationError::NoElectron => write!(f, "No trajectory has been initialized"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Geometry(e) => Some(e),
            SimulationError::Model(e) => Some(e),
            SimulationError::CascadeOverflow { .. } => None,
            SimulationError::StepLimit { .. } => None,
            SimulationError::NoElectron => None,
        }
    }
}

impl From<GeometryError> for SimulationError {
    fn from(e: GeometryError) -> Self {
        SimulationError::Geometry(e)
    }
}

impl From<ModelError> for SimulationError {
    fn from(e: ModelError) -> Self {
        SimulationError::Model(e)
    }
}
