//! Integration tests for configuration loading
//!
//! Tests that verify config loading from files and environment variables.

use epmc::config::{AppConfig, BeamKind};
use serial_test::serial;

#[test]
#[serial]
fn test_default_file_matches_defaults() {
    std::env::remove_var("EPMC_BEAM__ENERGY_EV");
    let config = AppConfig::load_from("config").unwrap();
    let defaults = AppConfig::default();
    assert_eq!(config.beam.energy_ev, defaults.beam.energy_ev);
    assert_eq!(config.beam.kind, BeamKind::Point);
    assert_eq!(config.scene.path, defaults.scene.path);
    assert_eq!(config.engine.to_engine_config(), defaults.engine.to_engine_config());
}

#[test]
#[serial]
fn test_env_override() {
    std::env::set_var("EPMC_BEAM__ENERGY_EV", "5000.0");
    std::env::set_var("EPMC_BEAM__KIND", "gaussian");
    let config = AppConfig::load_from("config");
    std::env::remove_var("EPMC_BEAM__ENERGY_EV");
    std::env::remove_var("EPMC_BEAM__KIND");

    let config = config.unwrap();
    assert_eq!(config.beam.energy_ev, 5000.0);
    assert_eq!(config.beam.kind, BeamKind::Gaussian);
}

#[test]
#[serial]
fn test_missing_directory_uses_defaults() {
    let config = AppConfig::load_from("no/such/config/dir").unwrap();
    assert_eq!(config.simulation.trajectories, AppConfig::default().simulation.trajectories);
}

#[test]
#[serial]
fn test_bad_value_is_reported() {
    std::env::set_var("EPMC_SIMULATION__TRAJECTORIES", "many");
    let result = AppConfig::load_from("config");
    std::env::remove_var("EPMC_SIMULATION__TRAJECTORIES");

    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}
