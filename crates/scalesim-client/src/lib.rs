//! scalesim-client — remote simulator access.
//!
//! One call per run: the current [`SimulationRequest`] is POSTed as JSON
//! to `{base}/simulate` and the response is decoded into ticks. There is no
//! retry and no timeout at this layer; callers that need bounded latency
//! wrap the call themselves.
//!
//! [`SimulationRequest`]: scalesim_core::SimulationRequest

pub mod error;
pub mod remote;

pub use error::{SimulationError, SimulationResult};
pub use remote::HttpSimulator;

use std::future::Future;
use std::pin::Pin;

use scalesim_core::{SimulationRequest, SimulationTick};

/// Boxed future returned by [`Simulator::run`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Anything that turns a parameter snapshot into an ordered tick sequence.
pub trait Simulator: Send + Sync {
    fn run<'a>(
        &'a self,
        request: &'a SimulationRequest,
    ) -> BoxFuture<'a, SimulationResult<Vec<SimulationTick>>>;
}
