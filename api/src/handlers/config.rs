use axum::{extract::State, Json};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::handlers::SuccessResponse;
use crate::state::AppState;
use common::models::RotationGroup;

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub anchor: NaiveDate,
    pub cycle: Vec<String>,
    pub groups: Vec<RotationGroup>,
    pub fallback_offset: Option<u32>,
    pub timestamp: String,
}

/// Rotation settings currently in effect
#[tracing::instrument(skip(state))]
pub async fn config_info(State(state): State<AppState>) -> Json<SuccessResponse<ConfigResponse>> {
    let response = ConfigResponse {
        name: "SGA Planning",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        anchor: state.anchor(),
        cycle: state
            .rotation
            .cycle()
            .symbols()
            .iter()
            .map(|s| s.code().to_string())
            .collect(),
        groups: state.rotation.groups(),
        fallback_offset: state.rotation.fallback_offset(),
        timestamp: Utc::now().to_rfc3339(),
    };

    Json(SuccessResponse::new(response))
}
