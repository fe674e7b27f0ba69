//! The projection engine.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use scalesim_core::{ChartDataset, PodId, PodSample, Series, SimulationTick};

use crate::error::{ProjectionError, ProjectionResult};

/// The six chart datasets derived from one simulation run.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub failures: ChartDataset,
    pub successes: ChartDataset,
    pub error_rate: ChartDataset,
    pub pod_count: ChartDataset,
    pub pod_memory: ChartDataset,
    pub pod_cpu: ChartDataset,
}

/// Identifies one of the projected charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Failures,
    Successes,
    ErrorRate,
    PodCount,
    PodMemory,
    PodCpu,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Failures,
        ChartKind::Successes,
        ChartKind::ErrorRate,
        ChartKind::PodCount,
        ChartKind::PodMemory,
        ChartKind::PodCpu,
    ];

    /// Field name in the serialized [`Projection`].
    pub fn key(self) -> &'static str {
        match self {
            ChartKind::Failures => "failures",
            ChartKind::Successes => "successes",
            ChartKind::ErrorRate => "errorRate",
            ChartKind::PodCount => "podCount",
            ChartKind::PodMemory => "podMemory",
            ChartKind::PodCpu => "podCpu",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Failures => "failures sum",
            ChartKind::Successes => "successes sum",
            ChartKind::ErrorRate => "error rate",
            ChartKind::PodCount => "cluster size",
            ChartKind::PodMemory => "pods mem",
            ChartKind::PodCpu => "pods cpu",
        }
    }

    /// Whether the chart carries one series per pod.
    pub fn is_per_pod(self) -> bool {
        matches!(self, ChartKind::PodMemory | ChartKind::PodCpu)
    }
}

impl Projection {
    pub fn chart(&self, kind: ChartKind) -> &ChartDataset {
        match kind {
            ChartKind::Failures => &self.failures,
            ChartKind::Successes => &self.successes,
            ChartKind::ErrorRate => &self.error_rate,
            ChartKind::PodCount => &self.pod_count,
            ChartKind::PodMemory => &self.pod_memory,
            ChartKind::PodCpu => &self.pod_cpu,
        }
    }

    /// Number of ticks the projection covers.
    pub fn tick_count(&self) -> usize {
        self.failures.labels.len()
    }
}

/// Failure percentage for one tick.
///
/// Zero successes divide by one, so the rate is `failures * 100` rather
/// than undefined.
pub fn error_rate(failures: u64, successes: u64) -> f64 {
    failures as f64 / successes.max(1) as f64 * 100.0
}

/// Project a tick sequence into chart datasets.
///
/// An empty sequence yields empty datasets. A sequence with a duplicate pod
/// id inside one tick, or a non-finite pod sample, is rejected whole.
pub fn project(ticks: &[SimulationTick]) -> ProjectionResult<Projection> {
    validate(ticks)?;

    let labels = ChartDataset::tick_labels(ticks.len());
    let single = |values: Vec<f64>| ChartDataset {
        labels: labels.clone(),
        series: if values.is_empty() {
            Vec::new()
        } else {
            vec![Series::unnamed(values)]
        },
    };
    let per_pod = |series: Vec<Series>| ChartDataset {
        labels: labels.clone(),
        series,
    };

    Ok(Projection {
        failures: single(ticks.iter().map(|t| t.failures as f64).collect()),
        successes: single(ticks.iter().map(|t| t.successes as f64).collect()),
        error_rate: single(
            ticks
                .iter()
                .map(|t| error_rate(t.failures, t.successes))
                .collect(),
        ),
        pod_count: single(ticks.iter().map(|t| t.pods.len() as f64).collect()),
        pod_memory: per_pod(pod_series(ticks, |p| p.memory)),
        pod_cpu: per_pod(pod_series(ticks, |p| p.cpu)),
    })
}

/// One series per pod id, zero-padded up to the pod's first tick.
fn pod_series(ticks: &[SimulationTick], sample: impl Fn(&PodSample) -> f64) -> Vec<Series> {
    let mut by_pod: IndexMap<&PodId, Vec<f64>> = IndexMap::new();

    for (t, tick) in ticks.iter().enumerate() {
        for pod in &tick.pods {
            by_pod
                .entry(&pod.id)
                .or_insert_with(|| vec![0.0; t])
                .push(sample(pod));
        }
    }

    by_pod
        .into_iter()
        .map(|(id, values)| Series::named(id.as_str(), values))
        .collect()
}

fn validate(ticks: &[SimulationTick]) -> ProjectionResult<()> {
    for (t, tick) in ticks.iter().enumerate() {
        let mut seen = HashSet::with_capacity(tick.pods.len());
        for pod in &tick.pods {
            if !seen.insert(&pod.id) {
                return Err(ProjectionError::MalformedTickSequence {
                    tick: t,
                    reason: format!("pod {} appears more than once", pod.id),
                });
            }
            if !pod.memory.is_finite() || !pod.cpu.is_finite() {
                return Err(ProjectionError::MalformedTickSequence {
                    tick: t,
                    reason: format!("pod {} has a non-finite sample", pod.id),
                });
            }
        }
    }
    Ok(())
}
