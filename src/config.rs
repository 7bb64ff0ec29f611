//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`EPMC_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::Path;

use epmc_core::{ElectronGun, EngineConfig, GaussianBeam, ModelError, OverscanBeam, PointBeam, Vec3};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Run size and seeding
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Electron gun
    #[serde(default)]
    pub beam: BeamConfig,
    /// Sample description
    #[serde(default)]
    pub scene: SceneConfig,
    /// Stepper limits
    #[serde(default)]
    pub engine: EngineSettings,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`EPMC_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Load user config (optional)
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // Environment variables override everything
        // EPMC_BEAM__ENERGY_EV=5000 -> beam.energy_ev = 5000
        figment = figment.merge(Env::prefixed("EPMC_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Run size and seeding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Primary electrons to run
    pub trajectories: u64,
    /// Master random seed
    pub seed: u64,
    /// Independent batches (0 = one per rayon thread)
    pub batches: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trajectories: 1_000,
            seed: 0,
            batches: 0,
        }
    }
}

/// Beam profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeamKind {
    Point,
    Gaussian,
    Overscan,
}

/// Electron gun configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeamConfig {
    pub kind: BeamKind,
    /// Beam energy in eV
    pub energy_ev: f64,
    /// Beam centre [x, y, z] in metres
    pub center: [f64; 3],
    /// Gaussian width or overscan size in metres
    pub width: f64,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            kind: BeamKind::Point,
            energy_ev: 20_000.0,
            center: [0.0, 0.0, -1.0e-3],
            width: 0.0,
        }
    }
}

impl BeamConfig {
    /// Build the configured gun
    pub fn to_gun(&self) -> Result<Box<dyn ElectronGun>, ModelError> {
        let center = Vec3::from(self.center);
        let gun: Box<dyn ElectronGun> = match self.kind {
            BeamKind::Point => Box::new(PointBeam::new(center, self.energy_ev)),
            BeamKind::Gaussian => Box::new(GaussianBeam::new(center, self.energy_ev, self.width)?),
            BeamKind::Overscan => Box::new(OverscanBeam::new(center, self.energy_ev, self.width, self.width)?),
        };
        Ok(gun)
    }
}

/// Scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Path to the scene RON file
    pub path: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            path: "scenes/bulk_copper.ron".to_string(),
        }
    }
}

/// Stepper limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    pub max_stack_depth: usize,
    pub max_steps: u64,
    /// Metres
    pub max_step_length: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let defaults = EngineConfig::default();
        Self {
            max_stack_depth: defaults.max_stack_depth,
            max_steps: defaults.max_steps,
            max_step_length: defaults.max_step_length,
        }
    }
}

impl EngineSettings {
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_stack_depth: self.max_stack_depth,
            max_steps: self.max_steps,
            max_step_length: self.max_step_length,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}
