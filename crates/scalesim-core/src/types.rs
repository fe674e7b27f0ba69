//! Simulator output records and chart dataset shapes.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DecodeError;

// ── Simulator output ───────────────────────────────────────────────

/// Stable identity of a pod across ticks.
///
/// The simulator emits numeric ids; string ids are accepted as well and
/// both are kept in their textual form, which is also the series name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PodId(String);

impl PodId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PodId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for PodId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for PodId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        match RawId::deserialize(deserializer) {
            Ok(RawId::Text(s)) => Ok(PodId(s)),
            Ok(RawId::Unsigned(n)) => Ok(PodId(n.to_string())),
            Ok(RawId::Signed(n)) => Ok(PodId(n.to_string())),
            Err(_) => Err(serde::de::Error::custom(
                "pod id must be a string or an integer",
            )),
        }
    }
}

/// Resource usage of one live pod at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodSample {
    pub id: PodId,
    pub memory: f64,
    pub cpu: f64,
}

/// Cluster state at one discrete time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationTick {
    pub failures: u64,
    pub successes: u64,
    pub pods: Vec<PodSample>,
}

/// Decode a simulator response body into ticks.
///
/// Every tick must carry all of its fields; the first malformed tick
/// rejects the whole sequence.
pub fn decode_ticks(body: &[u8]) -> Result<Vec<SimulationTick>, DecodeError> {
    let raw: Vec<serde_json::Value> =
        serde_json::from_slice(body).map_err(|e| DecodeError::NotASequence(e.to_string()))?;

    raw.into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).map_err(|e| DecodeError::Tick {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

// ── Chart datasets ─────────────────────────────────────────────────

/// One numeric sequence within a chart, aligned to the dataset labels by
/// position. Single-series charts leave `name` unset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Series {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub values: Vec<f64>,
}

impl Series {
    pub fn unnamed(values: Vec<f64>) -> Self {
        Self { name: None, values }
    }

    pub fn named(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: Some(name.into()),
            values,
        }
    }
}

/// A chart-ready dataset: tick-index labels plus zero or more series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartDataset {
    pub labels: Vec<usize>,
    pub series: Vec<Series>,
}

impl ChartDataset {
    /// Tick-index labels `0..len`.
    pub fn tick_labels(len: usize) -> Vec<usize> {
        (0..len).collect()
    }
}
