use axum::{extract::State, response::Html};
use chrono::{Datelike, Utc};
use tera::Context;

use crate::handlers::ErrorResponse;
use crate::state::AppState;
use crate::templates::TEMPLATES;

/// Home page
#[tracing::instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ErrorResponse> {
    let today = Utc::now().date_naive();
    let cycle: Vec<&str> = state
        .rotation
        .cycle()
        .symbols()
        .iter()
        .map(|s| s.code())
        .collect();

    let mut context = Context::new();
    context.insert("active_page", "home");
    context.insert("version", env!("CARGO_PKG_VERSION"));
    context.insert("environment", &state.config.environment);
    context.insert("anchor", &state.anchor());
    context.insert("cycle", &cycle);
    context.insert("groups", &state.rotation.groups());
    context.insert("month", &today.month());
    context.insert("year", &today.year());

    let html = TEMPLATES.render("index.html", &context).map_err(|e| {
        tracing::error!(error = %e, "Template rendering failed");
        ErrorResponse::new("template_error", format!("Template error: {}", e))
    })?;

    Ok(Html(html))
}
