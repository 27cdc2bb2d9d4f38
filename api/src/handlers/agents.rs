use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::db::repositories::{AgentFilter, AgentRepository};
use common::errors::RotationError;
use common::models::{normalize_agent_code, normalize_group_code, Agent, EntrySource, ShiftSymbol};
use common::rotation::weekday_label;
use common::telemetry;

#[derive(Debug, Deserialize)]
pub struct ListAgentsParams {
    pub group: Option<String>,
    /// Defaults to true
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub code: String,
    pub last_name: String,
    pub first_name: String,
    pub group_code: String,
    pub entry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAgentRequest {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub group_code: Option<String>,
    pub entry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DeactivateParams {
    pub exit_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ShiftParams {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct AgentResponse {
    #[serde(flatten)]
    pub agent: Agent,
    pub full_name: String,
    pub active: bool,
}

impl From<Agent> for AgentResponse {
    fn from(agent: Agent) -> Self {
        Self {
            full_name: agent.full_name(),
            active: agent.is_active(),
            agent,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShiftResponse {
    pub agent_code: String,
    pub date: NaiveDate,
    pub weekday: &'static str,
    /// `None` outside the agent's membership window
    pub shift: Option<ShiftSymbol>,
    pub source: Option<EntrySource>,
}

fn required(field: &str, value: &str) -> Result<String, ErrorResponse> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ErrorResponse::new(
            "validation_error",
            format!("{} cannot be empty", field),
        ));
    }
    Ok(value.to_string())
}

fn known_group(state: &AppState, raw: &str) -> Result<String, ErrorResponse> {
    let group = normalize_group_code(raw);
    if !state.rotation.is_known_group(&group) {
        return Err(RotationError::InvalidGroup(group).into());
    }
    Ok(group)
}

async fn load_agent(repo: &AgentRepository, code: &str) -> Result<Agent, ErrorResponse> {
    let code = normalize_agent_code(code)?;
    repo.find_by_code(&code)
        .await?
        .ok_or_else(|| ErrorResponse::new("not_found", format!("Agent not found: {}", code)))
}

/// List agents ordered by group then code
#[tracing::instrument(skip(state))]
pub async fn list_agents(
    State(state): State<AppState>,
    Query(params): Query<ListAgentsParams>,
) -> Result<Json<SuccessResponse<Vec<AgentResponse>>>, ErrorResponse> {
    let filter = AgentFilter {
        group: params.group,
        active_only: params.active.unwrap_or(true),
    };
    let agents = AgentRepository::new(state.db_pool.clone())
        .list(&filter)
        .await?;

    Ok(Json(SuccessResponse::new(
        agents.into_iter().map(AgentResponse::from).collect(),
    )))
}

/// Register a new agent
#[tracing::instrument(skip(state, req), fields(agent_code = %req.code))]
pub async fn create_agent(
    State(state): State<AppState>,
    Json(req): Json<CreateAgentRequest>,
) -> Result<Json<SuccessResponse<AgentResponse>>, ErrorResponse> {
    let code = normalize_agent_code(&req.code)?;
    let last_name = required("last_name", &req.last_name)?;
    let first_name = required("first_name", &req.first_name)?;
    let group = known_group(&state, &req.group_code)?;
    let entry_date = req.entry_date.unwrap_or_else(|| state.anchor());

    let agent = Agent::new(code, last_name, first_name, group, entry_date);
    AgentRepository::new(state.db_pool.clone())
        .create(&agent)
        .await?;
    telemetry::record_agent_created(&agent.group_code);

    Ok(Json(SuccessResponse::new(agent.into())))
}

#[tracing::instrument(skip(state))]
pub async fn get_agent(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SuccessResponse<AgentResponse>>, ErrorResponse> {
    let repo = AgentRepository::new(state.db_pool.clone());
    let agent = load_agent(&repo, &code).await?;
    Ok(Json(SuccessResponse::new(agent.into())))
}

/// Update names, group or entry date of an agent
#[tracing::instrument(skip(state, req))]
pub async fn update_agent(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<UpdateAgentRequest>,
) -> Result<Json<SuccessResponse<AgentResponse>>, ErrorResponse> {
    let repo = AgentRepository::new(state.db_pool.clone());
    let mut agent = load_agent(&repo, &code).await?;

    if let Some(last_name) = &req.last_name {
        agent.last_name = required("last_name", last_name)?;
    }
    if let Some(first_name) = &req.first_name {
        agent.first_name = required("first_name", first_name)?;
    }
    if let Some(group) = &req.group_code {
        agent.group_code = known_group(&state, group)?;
    }
    if let Some(entry_date) = req.entry_date {
        if let Some(exit_date) = agent.exit_date.filter(|exit| entry_date > *exit) {
            return Err(ErrorResponse::new(
                "validation_error",
                format!(
                    "entry date {} is after exit date {}",
                    entry_date, exit_date
                ),
            ));
        }
        agent.entry_date = entry_date;
    }

    repo.update(&agent).await?;
    Ok(Json(SuccessResponse::new(agent.into())))
}

/// Soft-delete an agent; the exit date defaults to today
#[tracing::instrument(skip(state))]
pub async fn deactivate_agent(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(params): Query<DeactivateParams>,
) -> Result<Json<SuccessResponse<AgentResponse>>, ErrorResponse> {
    let repo = AgentRepository::new(state.db_pool.clone());
    let agent = load_agent(&repo, &code).await?;

    let exit_date = params.exit_date.unwrap_or_else(|| Utc::now().date_naive());
    if exit_date < agent.entry_date {
        return Err(ErrorResponse::new(
            "validation_error",
            format!(
                "exit date {} is before entry date {}",
                exit_date, agent.entry_date
            ),
        ));
    }

    repo.deactivate(&agent.code, exit_date).await?;
    let agent = load_agent(&repo, &agent.code).await?;
    Ok(Json(SuccessResponse::new(agent.into())))
}

/// Resolved shift of one agent on one day
#[tracing::instrument(skip(state))]
pub async fn agent_shift(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(params): Query<ShiftParams>,
) -> Result<Json<SuccessResponse<ShiftResponse>>, ErrorResponse> {
    let code = normalize_agent_code(&code)?;
    let resolved = state.planning_service().shift_for(&code, params.date).await?;

    let (shift, source) = match resolved {
        Some((shift, Some(recorded))) => (Some(shift), Some(EntrySource::from(recorded.origin))),
        Some((shift, None)) => (Some(shift), Some(EntrySource::Cycle)),
        None => (None, None),
    };

    Ok(Json(SuccessResponse::new(ShiftResponse {
        agent_code: code,
        date: params.date,
        weekday: weekday_label(params.date),
        shift,
        source,
    })))
}
