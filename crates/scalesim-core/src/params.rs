//! Simulator parameters and the configuration store.
//!
//! The parameter set is closed: [`Parameter`] enumerates every field the
//! simulator accepts, and [`SimulationRequest`] holds exactly one value per
//! parameter. Updates change values in place and can never add or drop a
//! key, so a request built from the defaults always serializes to the full
//! `/simulate` body.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ConfigError, ConfigResult};

// ── Parameter ──────────────────────────────────────────────────────

/// A recognized simulator parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    /// Simulated duration, in simulator time units.
    Runtime,
    PodCpuLimit,
    PodMemoryLimit,
    /// Pods alive at tick 0.
    TotalInitialPods,
    /// Cluster-wide network capacity.
    NetworkLimit,
    MemoryDemand,
    CpuDemand,
    NetworkDemand,
    RequestDuration,
    /// Time between incoming requests.
    RequestInterval,
    /// Mean network latency per request.
    NetworkLatency,
    /// Time to bring a new pod online after a scale-up.
    ScalingTime,
}

impl Parameter {
    /// Number of recognized parameters.
    pub const COUNT: usize = 12;

    /// All parameters, in request-body order.
    pub const ALL: [Parameter; Self::COUNT] = [
        Parameter::Runtime,
        Parameter::PodCpuLimit,
        Parameter::PodMemoryLimit,
        Parameter::TotalInitialPods,
        Parameter::NetworkLimit,
        Parameter::MemoryDemand,
        Parameter::CpuDemand,
        Parameter::NetworkDemand,
        Parameter::RequestDuration,
        Parameter::RequestInterval,
        Parameter::NetworkLatency,
        Parameter::ScalingTime,
    ];

    /// Wire name used in the simulator request body.
    pub fn name(self) -> &'static str {
        match self {
            Parameter::Runtime => "runtime",
            Parameter::PodCpuLimit => "pod_cpu_limit",
            Parameter::PodMemoryLimit => "pod_memory_limit",
            Parameter::TotalInitialPods => "total_initial_pods",
            Parameter::NetworkLimit => "network_limit",
            Parameter::MemoryDemand => "memory_demand",
            Parameter::CpuDemand => "cpu_demand",
            Parameter::NetworkDemand => "network_demand",
            Parameter::RequestDuration => "request_duration",
            Parameter::RequestInterval => "request_interval",
            Parameter::NetworkLatency => "network_latency",
            Parameter::ScalingTime => "scaling_time",
        }
    }

    /// Human-readable label for input controls.
    pub fn label(self) -> &'static str {
        match self {
            Parameter::Runtime => "Runtime",
            Parameter::PodCpuLimit => "Pod CPU limit",
            Parameter::PodMemoryLimit => "Pod memory limit",
            Parameter::TotalInitialPods => "Initial pods",
            Parameter::NetworkLimit => "Network limit",
            Parameter::MemoryDemand => "Memory per request",
            Parameter::CpuDemand => "CPU per request",
            Parameter::NetworkDemand => "Network per request",
            Parameter::RequestDuration => "Request duration",
            Parameter::RequestInterval => "Request interval",
            Parameter::NetworkLatency => "Network latency",
            Parameter::ScalingTime => "Scaling time",
        }
    }

    /// Dashboard default for this parameter.
    pub fn default_value(self) -> ParamValue {
        match self {
            Parameter::Runtime => ParamValue::Int(60),
            Parameter::PodCpuLimit => ParamValue::Int(600),
            Parameter::PodMemoryLimit => ParamValue::Int(1200),
            Parameter::TotalInitialPods => ParamValue::Int(3),
            Parameter::NetworkLimit => ParamValue::Int(1500),
            Parameter::MemoryDemand => ParamValue::Int(400),
            Parameter::CpuDemand => ParamValue::Int(250),
            Parameter::NetworkDemand => ParamValue::Int(75),
            Parameter::RequestDuration => ParamValue::Int(2),
            Parameter::RequestInterval => ParamValue::Int(2),
            Parameter::NetworkLatency => ParamValue::Float(1.5),
            Parameter::ScalingTime => ParamValue::Int(12),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Parameter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parameter::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| ConfigError::UnrecognizedParameter(s.to_string()))
    }
}

// ── ParamValue ─────────────────────────────────────────────────────

/// A numeric parameter value, serialized as a bare JSON/TOML number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

// ── SimulationRequest ──────────────────────────────────────────────

/// One value for every [`Parameter`]; the `/simulate` request body.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRequest {
    values: [ParamValue; Parameter::COUNT],
}

impl SimulationRequest {
    pub fn get(&self, parameter: Parameter) -> ParamValue {
        self.values[parameter.index()]
    }

    pub fn set(&mut self, parameter: Parameter, value: impl Into<ParamValue>) {
        self.values[parameter.index()] = value.into();
    }

    /// Parameters and their values, in request-body order.
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, ParamValue)> + '_ {
        Parameter::ALL.into_iter().map(|p| (p, self.get(p)))
    }
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            values: Parameter::ALL.map(Parameter::default_value),
        }
    }
}

impl Serialize for SimulationRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Parameter::COUNT))?;
        for (parameter, value) in self.iter() {
            map.serialize_entry(parameter.name(), &value)?;
        }
        map.end()
    }
}

// ── ConfigStore ────────────────────────────────────────────────────

/// The current simulation parameters, mutated one key at a time.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    current: SimulationRequest,
}

impl ConfigStore {
    /// A store holding the dashboard defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request(request: SimulationRequest) -> Self {
        Self { current: request }
    }

    /// Parse `raw` as an integer and store it under `name`.
    ///
    /// The store is left unchanged on error.
    pub fn set(&mut self, name: &str, raw: &str) -> ConfigResult<(Parameter, ParamValue)> {
        let parameter: Parameter = name.parse()?;
        let value = raw
            .trim()
            .parse::<i64>()
            .map(ParamValue::Int)
            .map_err(|_| ConfigError::InvalidValue {
                parameter: name.to_string(),
                raw: raw.to_string(),
            })?;
        self.current.set(parameter, value);
        Ok((parameter, value))
    }

    pub fn get(&self, parameter: Parameter) -> ParamValue {
        self.current.get(parameter)
    }

    /// Copy of the full current mapping, for use as a request body.
    pub fn snapshot(&self) -> SimulationRequest {
        self.current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_parameter() {
        let request = SimulationRequest::default();
        let json = serde_json::to_value(&request).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), Parameter::COUNT);
        assert_eq!(obj["runtime"], 60);
        assert_eq!(obj["pod_memory_limit"], 1200);
        assert_eq!(obj["network_latency"], 1.5);
        assert_eq!(obj["scaling_time"], 12);
    }

    #[test]
    fn serialized_keys_follow_catalogue_order() {
        let json = serde_json::to_string(&SimulationRequest::default()).unwrap();
        let runtime = json.find("\"runtime\"").unwrap();
        let scaling = json.find("\"scaling_time\"").unwrap();
        assert!(runtime < scaling);
    }

    #[test]
    fn parameter_names_round_trip() {
        for p in Parameter::ALL {
            assert_eq!(p.name().parse::<Parameter>().unwrap(), p);
        }
    }

    #[test]
    fn set_updates_only_the_named_key() {
        let mut store = ConfigStore::new();
        let before = store.snapshot();

        let applied = store.set("runtime", "75").unwrap();
        assert_eq!(applied, (Parameter::Runtime, ParamValue::Int(75)));

        let after = store.snapshot();
        assert_eq!(after.get(Parameter::Runtime), ParamValue::Int(75));
        for p in Parameter::ALL.into_iter().filter(|p| *p != Parameter::Runtime) {
            assert_eq!(after.get(p), before.get(p), "{p} changed");
        }
    }

    #[test]
    fn set_unknown_key_leaves_store_unchanged() {
        let mut store = ConfigStore::new();
        let before = store.snapshot();

        let err = store.set("bogus_key", "1").unwrap_err();
        assert!(matches!(err, ConfigError::UnrecognizedParameter(ref k) if k == "bogus_key"));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn set_rejects_non_integer_input() {
        let mut store = ConfigStore::new();
        let before = store.snapshot();

        assert!(matches!(
            store.set("network_latency", "1.5"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            store.set("runtime", "abc"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn set_trims_whitespace() {
        let mut store = ConfigStore::new();
        store.set("cpu_demand", " 300 ").unwrap();
        assert_eq!(store.get(Parameter::CpuDemand), ParamValue::Int(300));
    }

    #[test]
    fn set_replaces_float_default_with_integer() {
        let mut store = ConfigStore::new();
        store.set("network_latency", "2").unwrap();

        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json["network_latency"], 2);
    }

    #[test]
    fn snapshot_is_detached_from_store() {
        let mut store = ConfigStore::new();
        let snap = store.snapshot();
        store.set("runtime", "10").unwrap();
        assert_eq!(snap.get(Parameter::Runtime), ParamValue::Int(60));
    }

    #[test]
    fn param_value_display() {
        assert_eq!(ParamValue::Int(42).to_string(), "42");
        assert_eq!(ParamValue::Float(1.5).to_string(), "1.5");
    }
}
