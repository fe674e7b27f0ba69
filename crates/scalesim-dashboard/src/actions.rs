//! Dashboard JSON endpoints.
//!
//! The page polls `/datasets` and posts parameter edits here. Every
//! response uses the same `{success, data, error}` envelope.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::controller::{ControllerError, Published, RunError, RunOutcome};
use crate::DashboardState;
use crate::views::ParameterView;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

fn run_error_status(error: &RunError) -> StatusCode {
    match error {
        RunError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        RunError::Simulation(_) | RunError::Projection(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Result of a triggered run, with whatever is published afterwards.
#[derive(Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub outcome: RunOutcome,
    pub datasets: Published,
}

// ── Datasets ────────────────────────────────────────────────────

/// GET /datasets
pub async fn datasets(State(state): State<DashboardState>) -> impl IntoResponse {
    ApiResponse::ok(state.controller.published().await)
}

// ── Parameters ──────────────────────────────────────────────────

/// GET /parameters
pub async fn parameters(State(state): State<DashboardState>) -> impl IntoResponse {
    let views: Vec<ParameterView> = state
        .controller
        .parameters()
        .await
        .into_iter()
        .map(ParameterView::from)
        .collect();
    ApiResponse::ok(views)
}

/// Form inputs arrive as text, scripted clients may send numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Number(serde_json::Number),
}

impl RawValue {
    fn into_text(self) -> String {
        match self {
            RawValue::Text(s) => s,
            RawValue::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ParameterUpdate {
    pub name: String,
    pub value: RawValue,
}

/// POST /parameters
pub async fn update_parameter(
    State(state): State<DashboardState>,
    update: Result<Json<ParameterUpdate>, JsonRejection>,
) -> Response {
    let Json(update) = match update {
        Ok(update) => update,
        Err(rejection) => return error_response(&rejection.body_text(), StatusCode::BAD_REQUEST),
    };
    let raw = update.value.into_text();
    match state.controller.set_parameter(&update.name, &raw).await {
        Ok(outcome) => report(&state, outcome).await,
        Err(ControllerError::Config(e)) => error_response(&e.to_string(), StatusCode::BAD_REQUEST),
        Err(ControllerError::Run(e)) => error_response(&e.to_string(), run_error_status(&e)),
    }
}

// ── Refresh ─────────────────────────────────────────────────────

/// POST /refresh
pub async fn refresh(State(state): State<DashboardState>) -> Response {
    match state.controller.refresh().await {
        Ok(outcome) => report(&state, outcome).await,
        Err(e) => error_response(&e.to_string(), run_error_status(&e)),
    }
}

async fn report(state: &DashboardState, outcome: RunOutcome) -> Response {
    let datasets = state.controller.published().await;
    ApiResponse::ok(RunReport { outcome, datasets }).into_response()
}
