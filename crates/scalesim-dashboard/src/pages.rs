//! Dashboard page handler.
//!
//! Renders the parameter form and empty chart canvases; the page script
//! fills the charts from `/datasets`.

use askama::Template;
use axum::extract::State;
use axum::response::Html;

use crate::DashboardState;
use crate::views::*;

fn render<T: Template>(tmpl: T) -> Html<String> {
    Html(tmpl.render().unwrap_or_else(|e| {
        format!("<pre>Template error: {e}</pre>")
    }))
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    base_path: String,
    parameters: Vec<ParameterView>,
    charts: Vec<ChartView>,
    status: StatusView,
}

pub async fn index(State(state): State<DashboardState>) -> Html<String> {
    let parameters = state
        .controller
        .parameters()
        .await
        .into_iter()
        .map(ParameterView::from)
        .collect();
    let published = state.controller.published().await;

    render(IndexTemplate {
        base_path: state.base_path.clone(),
        parameters,
        charts: ChartView::all(),
        status: StatusView::from_published(&published),
    })
}
