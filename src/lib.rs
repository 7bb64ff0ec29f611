//! epmc - Monte Carlo electron transport for electron-probe microanalysis
//!
//! The engine itself lives in `epmc_core`; this crate adds the layered
//! application configuration used by the `epmc` binary.

pub mod config;

pub use epmc_core;
