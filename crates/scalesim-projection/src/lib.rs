//! scalesim-projection — simulation result projection.
//!
//! Converts the ordered tick sequence returned by the simulator into the
//! six datasets the dashboard charts. The projection is a pure function
//! of its input: no state survives between calls.
//!
//! # Derived series
//!
//! ```text
//! labels        = 0..len(ticks)
//! failures[i]   = ticks[i].failures
//! successes[i]  = ticks[i].successes
//! error_rate[i] = failures[i] / max(1, successes[i]) * 100
//! pod_count[i]  = len(ticks[i].pods)
//! ```
//!
//! Pod memory and CPU charts carry one series per pod id, in first-seen
//! order. A pod first seen at tick `t` starts with `t` zero samples; a pod
//! that disappears stops receiving samples, so its series may be shorter
//! than `labels`.

pub mod error;
pub mod engine;

pub use engine::{ChartKind, Projection, error_rate, project};
pub use error::{ProjectionError, ProjectionResult};
