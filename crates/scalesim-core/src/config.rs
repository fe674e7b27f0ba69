//! scalesim.toml configuration parser.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::params::{ParamValue, Parameter, SimulationRequest};

pub const DEFAULT_SIMULATOR_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScalesimConfig {
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Overrides applied on top of the parameter defaults.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub url: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SIMULATOR_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub sequencing: Sequencing,
    /// Upper bound on a single simulation run, e.g. "30s".
    pub request_timeout: Option<String>,
}

/// How overlapping simulation runs are published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sequencing {
    /// Whichever run resolves last overwrites the published datasets.
    #[default]
    LastResolved,
    /// Responses older than the currently published run are dropped.
    DiscardStale,
}

impl ScalesimConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The defaults with `[parameters]` overrides applied.
    pub fn initial_request(&self) -> ConfigResult<SimulationRequest> {
        let mut request = SimulationRequest::default();
        for (name, value) in &self.parameters {
            let parameter: Parameter = name.parse()?;
            request.set(parameter, *value);
        }
        Ok(request)
    }

    pub fn request_timeout(&self) -> ConfigResult<Option<Duration>> {
        self.dashboard
            .request_timeout
            .as_deref()
            .map(|s| parse_duration(s).ok_or_else(|| ConfigError::InvalidDuration(s.to_string())))
            .transpose()
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
