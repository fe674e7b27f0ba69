//! scalesim-core — shared types for the scalesim dashboard.
//!
//! Holds the simulator parameter catalogue and the [`ConfigStore`] that
//! mutates it, the tick records returned by the simulator, the chart
//! dataset shape consumed by the rendering surface, and the
//! `scalesim.toml` configuration file.

pub mod config;
pub mod error;
pub mod params;
pub mod types;

pub use config::{DashboardConfig, ScalesimConfig, Sequencing, SimulatorConfig};
pub use error::{ConfigError, ConfigResult, DecodeError};
pub use params::{ConfigStore, ParamValue, Parameter, SimulationRequest};
pub use types::*;
