//! Dashboard controller: parameter changes in, published datasets out.
//!
//! Every trigger (initial load, parameter change, manual refresh) reads a
//! fresh snapshot of the [`ConfigStore`], runs the simulator once, projects
//! the ticks, and replaces the published datasets. A failed run leaves the
//! previous datasets in place and records the error instead.
//!
//! Runs are numbered in trigger order. With [`Sequencing::LastResolved`]
//! the last run to finish wins; with [`Sequencing::DiscardStale`] a run
//! that finishes after a newer one has been published is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use scalesim_client::{SimulationError, Simulator};
use scalesim_core::{
    ConfigError, ConfigStore, ParamValue, Parameter, Sequencing, SimulationRequest,
};
use scalesim_projection::{Projection, ProjectionError, project};

/// Why a simulation run produced no datasets.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("simulation run exceeded {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Run(#[from] RunError),
}

/// What happened to a successful run's datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Published { sequence: u64, ticks: usize },
    /// A newer run was already published.
    Discarded { sequence: u64, current: u64 },
}

/// The datasets currently shown, plus run metadata.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Published {
    /// Run that produced `projection`; `None` until the first success.
    pub sequence: Option<u64>,
    pub published_at: Option<String>,
    pub projection: Projection,
    /// Most recent failure since the last successful publish.
    pub last_error: Option<String>,
}

pub struct DashboardController {
    store: RwLock<ConfigStore>,
    simulator: Arc<dyn Simulator>,
    sequencing: Sequencing,
    request_timeout: Option<Duration>,
    next_sequence: AtomicU64,
    published: RwLock<Published>,
}

impl DashboardController {
    pub fn new(simulator: Arc<dyn Simulator>, store: ConfigStore) -> Self {
        Self {
            store: RwLock::new(store),
            simulator,
            sequencing: Sequencing::default(),
            request_timeout: None,
            next_sequence: AtomicU64::new(0),
            published: RwLock::new(Published::default()),
        }
    }

    pub fn with_sequencing(mut self, sequencing: Sequencing) -> Self {
        self.sequencing = sequencing;
        self
    }

    /// Bound each simulator call; the client itself never times out.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Initial load: run with whatever the store holds at startup.
    pub async fn initialize(&self) -> Result<RunOutcome, RunError> {
        info!(sequencing = ?self.sequencing, "running initial simulation");
        self.refresh().await
    }

    /// Apply one parameter change, then re-run.
    ///
    /// An unknown name or non-integer value is rejected before any run.
    pub async fn set_parameter(&self, name: &str, raw: &str) -> Result<RunOutcome, ControllerError> {
        let (parameter, value) = self.store.write().await.set(name, raw)?;
        info!(%parameter, %value, "parameter updated");
        Ok(self.refresh().await?)
    }

    /// Run the simulator with the current parameters and publish the result.
    pub async fn refresh(&self) -> Result<RunOutcome, RunError> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let request = self.store.read().await.snapshot();
        debug!(sequence, "simulation run started");

        match self.execute(&request).await {
            Ok(projection) => Ok(self.publish(sequence, projection).await),
            Err(e) => {
                self.record_failure(sequence, &e).await;
                Err(e)
            }
        }
    }

    pub async fn snapshot(&self) -> SimulationRequest {
        self.store.read().await.snapshot()
    }

    pub async fn parameters(&self) -> Vec<(Parameter, ParamValue)> {
        self.snapshot().await.iter().collect()
    }

    pub async fn published(&self) -> Published {
        self.published.read().await.clone()
    }

    async fn execute(&self, request: &SimulationRequest) -> Result<Projection, RunError> {
        let run = self.simulator.run(request);
        let ticks = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| RunError::Timeout(limit))??,
            None => run.await?,
        };
        debug!(ticks = ticks.len(), "projecting simulation result");
        Ok(project(&ticks)?)
    }

    async fn publish(&self, sequence: u64, projection: Projection) -> RunOutcome {
        let mut published = self.published.write().await;

        if let Some(current) = self.newer_than(sequence, &published) {
            warn!(sequence, current, "discarding stale simulation result");
            return RunOutcome::Discarded { sequence, current };
        }

        let ticks = projection.tick_count();
        *published = Published {
            sequence: Some(sequence),
            published_at: Some(chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            projection,
            last_error: None,
        };
        info!(sequence, ticks, "datasets published");
        RunOutcome::Published { sequence, ticks }
    }

    async fn record_failure(&self, sequence: u64, error: &RunError) {
        let mut published = self.published.write().await;

        if let Some(current) = self.newer_than(sequence, &published) {
            debug!(sequence, current, error = %error, "stale simulation run failed");
            return;
        }

        warn!(
            sequence,
            error = %error,
            "simulation run failed; keeping last published datasets"
        );
        published.last_error = Some(error.to_string());
    }

    /// Sequence of a newer published run, if stale results are being dropped.
    fn newer_than(&self, sequence: u64, published: &Published) -> Option<u64> {
        match (self.sequencing, published.sequence) {
            (Sequencing::DiscardStale, Some(current)) if current > sequence => Some(current),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use scalesim_client::{BoxFuture, SimulationResult};
    use scalesim_core::{PodId, PodSample, SimulationTick};
    use tokio::sync::oneshot;

    /// Replays canned responses and records every request it sees.
    #[derive(Default)]
    struct ScriptedSimulator {
        responses: Mutex<VecDeque<SimulationResult<Vec<SimulationTick>>>>,
        requests: Mutex<Vec<SimulationRequest>>,
    }

    impl ScriptedSimulator {
        fn with(responses: Vec<SimulationResult<Vec<SimulationTick>>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    impl Simulator for ScriptedSimulator {
        fn run<'a>(
            &'a self,
            request: &'a SimulationRequest,
        ) -> BoxFuture<'a, SimulationResult<Vec<SimulationTick>>> {
            self.requests.lock().unwrap().push(request.clone());
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()));
            Box::pin(async move { next })
        }
    }

    /// Each call waits for its own gate, opened by the test in any order.
    #[derive(Default)]
    struct GatedSimulator {
        gates: Mutex<VecDeque<oneshot::Receiver<Vec<SimulationTick>>>>,
    }

    impl GatedSimulator {
        fn add_gate(&self) -> oneshot::Sender<Vec<SimulationTick>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().push_back(rx);
            tx
        }
    }

    impl Simulator for GatedSimulator {
        fn run<'a>(
            &'a self,
            _request: &'a SimulationRequest,
        ) -> BoxFuture<'a, SimulationResult<Vec<SimulationTick>>> {
            let gate = self.gates.lock().unwrap().pop_front();
            Box::pin(async move {
                match gate {
                    Some(rx) => rx.await.map_err(|_| SimulationError::Status {
                        status: 503,
                        body: "gate closed".to_string(),
                    }),
                    None => Ok(Vec::new()),
                }
            })
        }
    }

    struct StalledSimulator;

    impl Simulator for StalledSimulator {
        fn run<'a>(
            &'a self,
            _request: &'a SimulationRequest,
        ) -> BoxFuture<'a, SimulationResult<Vec<SimulationTick>>> {
            Box::pin(std::future::pending())
        }
    }

    fn ticks(n: usize) -> Vec<SimulationTick> {
        (0..n)
            .map(|i| SimulationTick {
                failures: i as u64,
                successes: 1,
                pods: vec![PodSample {
                    id: PodId::from(1),
                    memory: 100.0,
                    cpu: 50.0,
                }],
            })
            .collect()
    }

    fn server_error() -> SimulationError {
        SimulationError::Status {
            status: 500,
            body: "boom".to_string(),
        }
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn initialize_publishes_projection() {
        let sim = ScriptedSimulator::with(vec![Ok(ticks(3))]);
        let controller = DashboardController::new(sim.clone(), ConfigStore::new());

        let outcome = controller.initialize().await.unwrap();
        assert_eq!(outcome, RunOutcome::Published { sequence: 1, ticks: 3 });

        let published = controller.published().await;
        assert_eq!(published.sequence, Some(1));
        assert!(published.published_at.is_some());
        assert_eq!(published.projection.tick_count(), 3);
        assert_eq!(published.projection.pod_memory.series.len(), 1);

        let requests = sim.requests.lock().unwrap();
        assert_eq!(requests[0], SimulationRequest::default());
    }

    #[tokio::test]
    async fn parameter_change_reruns_with_fresh_snapshot() {
        let sim = ScriptedSimulator::with(vec![Ok(ticks(1)), Ok(ticks(2))]);
        let controller = DashboardController::new(sim.clone(), ConfigStore::new());
        controller.initialize().await.unwrap();

        let outcome = controller.set_parameter("runtime", "75").await.unwrap();
        assert_eq!(outcome, RunOutcome::Published { sequence: 2, ticks: 2 });

        let requests = sim.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].get(Parameter::Runtime), ParamValue::Int(75));
        assert_eq!(
            requests[1].get(Parameter::CpuDemand),
            requests[0].get(Parameter::CpuDemand)
        );
    }

    #[tokio::test]
    async fn unknown_parameter_does_not_run() {
        let sim = ScriptedSimulator::with(vec![]);
        let controller = DashboardController::new(sim.clone(), ConfigStore::new());

        let err = controller.set_parameter("bogus_key", "1").await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Config(ConfigError::UnrecognizedParameter(_))
        ));
        assert!(sim.requests.lock().unwrap().is_empty());
        assert_eq!(controller.snapshot().await, SimulationRequest::default());
    }

    #[tokio::test]
    async fn failed_run_keeps_last_good_datasets() {
        let sim = ScriptedSimulator::with(vec![Ok(ticks(4)), Err(server_error())]);
        let controller = DashboardController::new(sim, ConfigStore::new());
        controller.initialize().await.unwrap();
        let before = controller.published().await;

        let err = controller.set_parameter("cpu_demand", "900").await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Run(RunError::Simulation(SimulationError::Status { status: 500, .. }))
        ));

        let after = controller.published().await;
        assert_eq!(after.sequence, before.sequence);
        assert_eq!(after.projection, before.projection);
        assert!(after.last_error.as_deref().unwrap().contains("500"));

        // The parameter change itself stuck.
        assert_eq!(
            controller.snapshot().await.get(Parameter::CpuDemand),
            ParamValue::Int(900)
        );
    }

    #[tokio::test]
    async fn success_clears_last_error() {
        let sim = ScriptedSimulator::with(vec![Err(server_error()), Ok(ticks(1))]);
        let controller = DashboardController::new(sim, ConfigStore::new());

        assert!(controller.initialize().await.is_err());
        assert!(controller.published().await.last_error.is_some());
        assert_eq!(controller.published().await.sequence, None);

        controller.refresh().await.unwrap();
        let published = controller.published().await;
        assert_eq!(published.last_error, None);
        assert_eq!(published.sequence, Some(2));
    }

    #[tokio::test]
    async fn malformed_ticks_fail_closed() {
        let dup = vec![SimulationTick {
            failures: 0,
            successes: 0,
            pods: vec![
                PodSample { id: PodId::from(1), memory: 1.0, cpu: 1.0 },
                PodSample { id: PodId::from(1), memory: 2.0, cpu: 2.0 },
            ],
        }];
        let sim = ScriptedSimulator::with(vec![Ok(ticks(2)), Ok(dup)]);
        let controller = DashboardController::new(sim, ConfigStore::new());
        controller.initialize().await.unwrap();

        let err = controller.refresh().await.unwrap_err();
        assert!(matches!(err, RunError::Projection(_)));
        assert_eq!(controller.published().await.projection.tick_count(), 2);
    }

    #[tokio::test]
    async fn timeout_bounds_a_stalled_run() {
        let controller = DashboardController::new(Arc::new(StalledSimulator), ConfigStore::new())
            .with_request_timeout(Some(Duration::from_millis(20)));

        let err = controller.refresh().await.unwrap_err();
        assert!(matches!(err, RunError::Timeout(_)));
        assert!(controller.published().await.last_error.is_some());
    }

    #[tokio::test]
    async fn last_resolved_run_wins_by_default() {
        let sim = Arc::new(GatedSimulator::default());
        let first = sim.add_gate();
        let second = sim.add_gate();
        let controller = Arc::new(DashboardController::new(sim.clone(), ConfigStore::new()));

        let c = controller.clone();
        let older = tokio::spawn(async move { c.refresh().await });
        settle().await;
        let c = controller.clone();
        let newer = tokio::spawn(async move { c.refresh().await });
        settle().await;

        second.send(ticks(2)).unwrap();
        assert_eq!(
            newer.await.unwrap().unwrap(),
            RunOutcome::Published { sequence: 2, ticks: 2 }
        );

        first.send(ticks(5)).unwrap();
        assert_eq!(
            older.await.unwrap().unwrap(),
            RunOutcome::Published { sequence: 1, ticks: 5 }
        );
        assert_eq!(controller.published().await.sequence, Some(1));
    }

    #[tokio::test]
    async fn discard_stale_keeps_newest_run() {
        let sim = Arc::new(GatedSimulator::default());
        let first = sim.add_gate();
        let second = sim.add_gate();
        let controller = Arc::new(
            DashboardController::new(sim.clone(), ConfigStore::new())
                .with_sequencing(Sequencing::DiscardStale),
        );

        let c = controller.clone();
        let older = tokio::spawn(async move { c.refresh().await });
        settle().await;
        let c = controller.clone();
        let newer = tokio::spawn(async move { c.refresh().await });
        settle().await;

        second.send(ticks(2)).unwrap();
        newer.await.unwrap().unwrap();

        first.send(ticks(5)).unwrap();
        assert_eq!(
            older.await.unwrap().unwrap(),
            RunOutcome::Discarded { sequence: 1, current: 2 }
        );

        let published = controller.published().await;
        assert_eq!(published.sequence, Some(2));
        assert_eq!(published.projection.tick_count(), 2);
    }
}
