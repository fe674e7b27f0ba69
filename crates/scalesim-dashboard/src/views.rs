//! View types for dashboard template rendering.
//!
//! Pre-formatted strings so the template stays free of logic.

use serde::Serialize;

use scalesim_core::{ParamValue, Parameter};
use scalesim_projection::ChartKind;

use crate::controller::Published;

// ── Parameters ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ParameterView {
    pub name: &'static str,
    pub label: &'static str,
    pub value: ParamValue,
}

impl ParameterView {
    /// Value as shown in the input field.
    pub fn display_value(&self) -> String {
        self.value.to_string()
    }
}

impl From<(Parameter, ParamValue)> for ParameterView {
    fn from((parameter, value): (Parameter, ParamValue)) -> Self {
        Self {
            name: parameter.name(),
            label: parameter.label(),
            value,
        }
    }
}

// ── Charts ──────────────────────────────────────────────────────

pub struct ChartView {
    pub key: &'static str,
    pub title: &'static str,
    pub per_pod: bool,
}

impl ChartView {
    pub fn all() -> Vec<Self> {
        ChartKind::ALL
            .into_iter()
            .map(|kind| Self {
                key: kind.key(),
                title: kind.title(),
                per_pod: kind.is_per_pod(),
            })
            .collect()
    }
}

// ── Run Status ──────────────────────────────────────────────────

pub struct StatusView {
    pub published_display: String,
    pub tick_count: usize,
    pub has_error: bool,
    pub error: String,
}

impl StatusView {
    pub fn from_published(published: &Published) -> Self {
        let published_display = match (&published.published_at, published.sequence) {
            (Some(at), Some(seq)) => format!("run #{seq} at {at}"),
            _ => "no results yet".to_string(),
        };
        Self {
            published_display,
            tick_count: published.projection.tick_count(),
            has_error: published.last_error.is_some(),
            error: published.last_error.clone().unwrap_or_default(),
        }
    }
}
