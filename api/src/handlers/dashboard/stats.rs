// Dashboard statistics: JSON summary and HTML page

use axum::{extract::State, http::HeaderMap, response::Html, Json};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tera::Context;

use super::shared_utils::{month_name, setup_htmx_context, template_error};
use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use crate::templates::TEMPLATES;
use common::db::repositories::{AgentRepository, OverrideRepository};
use common::rotation::{days_in_month, weekday_label};

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub date: NaiveDate,
    pub weekday: &'static str,
    pub total_agents: i64,
    pub agents_by_group: BTreeMap<String, i64>,
    /// Agents per shift code on `date`
    pub shift_distribution: BTreeMap<String, usize>,
    pub overrides_this_month: i64,
}

/// Gather the dashboard figures for one day
async fn load_summary(state: &AppState, date: NaiveDate) -> Result<DashboardSummary, ErrorResponse> {
    let agents_by_group = AgentRepository::new(state.db_pool.clone())
        .count_active_by_group()
        .await?;
    let total_agents = agents_by_group.values().sum();

    let planning = state.planning_service().month(date.month(), date.year()).await?;
    let mut shift_distribution = BTreeMap::new();
    for entry in planning.entries.iter().filter(|e| e.date == date) {
        *shift_distribution
            .entry(entry.shift.code().to_string())
            .or_insert(0) += 1;
    }

    let first = date.with_day(1).unwrap_or(date);
    let last = days_in_month(date.month(), date.year())
        .ok()
        .and_then(|days| date.with_day(days))
        .unwrap_or(date);
    let overrides_this_month = OverrideRepository::new(state.db_pool.clone())
        .count_in_range(first, last)
        .await?;

    Ok(DashboardSummary {
        date,
        weekday: weekday_label(date),
        total_agents,
        agents_by_group,
        shift_distribution,
        overrides_this_month,
    })
}

/// Today's roster figures
#[tracing::instrument(skip(state))]
pub async fn dashboard_summary(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<DashboardSummary>>, ErrorResponse> {
    let summary = load_summary(&state, Utc::now().date_naive()).await?;
    Ok(Json(SuccessResponse::new(summary)))
}

/// Dashboard index page with statistics
#[tracing::instrument(skip(state, headers))]
pub async fn dashboard_index(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Html<String>, ErrorResponse> {
    let mut context = Context::new();
    context.insert("active_page", "dashboard");

    let summary = load_summary(&state, Utc::now().date_naive()).await?;
    context.insert("month_name", month_name(summary.date.month()));
    context.insert("month", &summary.date.month());
    context.insert("year", &summary.date.year());
    context.insert("summary", &summary);
    let group_rows: Vec<serde_json::Value> = state
        .rotation
        .groups()
        .into_iter()
        .map(|group| {
            let agents = summary
                .agents_by_group
                .get(&group.code)
                .copied()
                .unwrap_or(0);
            serde_json::json!({
                "code": group.code,
                "offset": group.offset,
                "agents": agents,
            })
        })
        .collect();
    context.insert("group_rows", &group_rows);

    let template = setup_htmx_context(
        &mut context,
        &headers,
        "_dashboard_content.html",
        "dashboard.html",
    );

    let html = TEMPLATES
        .render(template, &context)
        .map_err(|e| template_error(template, e))?;

    Ok(Html(html))
}
