//! scalesim-dashboard — parameter-driven simulation dashboard.
//!
//! The [`DashboardController`] owns the parameter store, runs the
//! simulator on every trigger, and publishes the projected datasets. The
//! axum routes below expose it to the browser.
//!
//! # Routes
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | `/` | Dashboard page |
//! | GET | `/datasets` | Published datasets (JSON) |
//! | GET | `/parameters` | Current parameters (JSON) |
//! | POST | `/parameters` | Update one parameter and re-run |
//! | POST | `/refresh` | Re-run with the current parameters |

pub mod actions;
pub mod controller;
pub mod pages;
pub mod views;

pub use controller::{ControllerError, DashboardController, Published, RunError, RunOutcome};

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

/// Shared state for dashboard handlers.
#[derive(Clone)]
pub struct DashboardState {
    pub controller: Arc<DashboardController>,
    /// Mount point of the router, used to build URLs in the page.
    pub base_path: String,
}

impl DashboardState {
    pub fn new(controller: Arc<DashboardController>, base_path: impl Into<String>) -> Self {
        Self {
            controller,
            base_path: base_path.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Build the dashboard router.
pub fn dashboard_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/datasets", get(actions::datasets))
        .route(
            "/parameters",
            get(actions::parameters).post(actions::update_parameter),
        )
        .route("/refresh", post(actions::refresh))
        .with_state(state)
}
