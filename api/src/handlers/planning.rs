use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::db::repositories::{AgentRepository, OverrideRepository};
use common::models::{normalize_agent_code, AbsenceKind, ShiftOverride, ShiftSymbol};
use common::planning::MonthPlanning;
use common::telemetry;

#[derive(Debug, Deserialize)]
pub struct SetShiftRequest {
    pub agent_code: String,
    pub date: NaiveDate,
    pub shift: ShiftSymbol,
}

#[derive(Debug, Deserialize)]
pub struct AbsenceRequest {
    pub agent_code: String,
    pub date: NaiveDate,
    pub absence_type: AbsenceKind,
}

#[derive(Debug, Deserialize)]
pub struct LeaveRequest {
    pub agent_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    pub agent_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: usize,
}

/// Projected planning of every agent for a month
#[tracing::instrument(skip(state))]
pub async fn global_planning(
    State(state): State<AppState>,
    Path((month, year)): Path<(u32, i32)>,
) -> Result<Json<SuccessResponse<MonthPlanning>>, ErrorResponse> {
    let planning = state.planning_service().month(month, year).await?;
    Ok(Json(SuccessResponse::new(planning)))
}

/// Record a manual override for one agent and day
async fn save_override(state: &AppState, value: ShiftOverride) -> Result<ShiftOverride, ErrorResponse> {
    let code = normalize_agent_code(&value.agent_code)?;
    let agent = AgentRepository::new(state.db_pool.clone())
        .find_by_code(&code)
        .await?
        .ok_or_else(|| ErrorResponse::new("not_found", format!("Agent not found: {}", code)))?;

    let value = ShiftOverride {
        agent_code: agent.code,
        ..value
    };
    OverrideRepository::new(state.db_pool.clone())
        .upsert(&value)
        .await?;
    telemetry::record_override(value.origin, 1);

    Ok(value)
}

/// Force a shift for one agent and day
#[tracing::instrument(skip(state, req), fields(agent_code = %req.agent_code, date = %req.date))]
pub async fn set_shift(
    State(state): State<AppState>,
    Json(req): Json<SetShiftRequest>,
) -> Result<Json<SuccessResponse<ShiftOverride>>, ErrorResponse> {
    let value = save_override(
        &state,
        ShiftOverride::manual(req.agent_code, req.date, req.shift),
    )
    .await?;
    Ok(Json(SuccessResponse::new(value)))
}

/// Record an absence (leave, sickness, unjustified) for one day
#[tracing::instrument(skip(state, req), fields(agent_code = %req.agent_code, date = %req.date))]
pub async fn record_absence(
    State(state): State<AppState>,
    Json(req): Json<AbsenceRequest>,
) -> Result<Json<SuccessResponse<ShiftOverride>>, ErrorResponse> {
    let value = save_override(
        &state,
        ShiftOverride::manual(req.agent_code, req.date, req.absence_type.into()),
    )
    .await?;
    Ok(Json(SuccessResponse::new(value)))
}

/// Record leave for every day of an inclusive range
#[tracing::instrument(skip(state, req), fields(agent_code = %req.agent_code))]
pub async fn record_leave(
    State(state): State<AppState>,
    Json(req): Json<LeaveRequest>,
) -> Result<Json<SuccessResponse<LeaveResponse>>, ErrorResponse> {
    let code = normalize_agent_code(&req.agent_code)?;
    let days = state
        .planning_service()
        .record_leave(&code, req.start_date, req.end_date)
        .await?;

    Ok(Json(SuccessResponse::new(LeaveResponse {
        agent_code: code,
        start_date: req.start_date,
        end_date: req.end_date,
        days,
    })))
}

/// Remove an override so the cycle value applies again
#[tracing::instrument(skip(state))]
pub async fn delete_override(
    State(state): State<AppState>,
    Path((agent_code, date)): Path<(String, NaiveDate)>,
) -> Result<Json<SuccessResponse<serde_json::Value>>, ErrorResponse> {
    let code = normalize_agent_code(&agent_code)?;
    OverrideRepository::new(state.db_pool.clone())
        .delete(&code, date)
        .await?;

    Ok(Json(SuccessResponse::new(serde_json::json!({
        "agent_code": code,
        "date": date,
        "deleted": true,
    }))))
}
