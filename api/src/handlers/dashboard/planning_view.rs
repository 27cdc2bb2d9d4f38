// Monthly planning grid page

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Html,
};
use tera::Context;

use super::shared_utils::{adjacent_months, month_name, setup_htmx_context, template_error};
use crate::handlers::ErrorResponse;
use crate::state::AppState;
use crate::templates::TEMPLATES;

/// Planning grid for a month, one row per agent
#[tracing::instrument(skip(state, headers))]
pub async fn planning_page(
    State(state): State<AppState>,
    Path((month, year)): Path<(u32, i32)>,
    headers: HeaderMap,
) -> Result<Html<String>, ErrorResponse> {
    let planning = state.planning_service().month(month, year).await?;
    let ((prev_month, prev_year), (next_month, next_year)) = adjacent_months(month, year);

    let mut context = Context::new();
    context.insert("active_page", "planning");
    context.insert("month_name", month_name(month));
    context.insert("planning", &planning);
    context.insert("anchor", &state.anchor());
    context.insert("groups", &state.rotation.groups());
    context.insert("prev_month", &prev_month);
    context.insert("prev_year", &prev_year);
    context.insert("next_month", &next_month);
    context.insert("next_year", &next_year);

    let template = setup_htmx_context(
        &mut context,
        &headers,
        "_planning_content.html",
        "planning.html",
    );

    let html = TEMPLATES
        .render(template, &context)
        .map_err(|e| template_error(template, e))?;

    Ok(Html(html))
}
