use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::db::repositories::HolidayRepository;
use common::models::Holiday;

#[derive(Debug, Deserialize)]
pub struct HolidayParams {
    /// Defaults to the current year
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateHolidayRequest {
    pub date: NaiveDate,
    pub description: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn list_holidays(
    State(state): State<AppState>,
    Query(params): Query<HolidayParams>,
) -> Result<Json<SuccessResponse<Vec<Holiday>>>, ErrorResponse> {
    let year = params.year.unwrap_or_else(|| Utc::now().year());
    let (from, to) = match (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            return Err(ErrorResponse::new(
                "validation_error",
                format!("Invalid year: {}", year),
            ))
        }
    };

    let holidays = HolidayRepository::new(state.db_pool.clone())
        .list_in_range(from, to)
        .await?;
    Ok(Json(SuccessResponse::new(holidays)))
}

#[tracing::instrument(skip(state, req), fields(date = %req.date))]
pub async fn create_holiday(
    State(state): State<AppState>,
    Json(req): Json<CreateHolidayRequest>,
) -> Result<Json<SuccessResponse<Holiday>>, ErrorResponse> {
    let holiday = Holiday {
        date: req.date,
        description: req
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
    };

    HolidayRepository::new(state.db_pool.clone())
        .upsert(&holiday)
        .await?;
    Ok(Json(SuccessResponse::new(holiday)))
}

#[tracing::instrument(skip(state))]
pub async fn delete_holiday(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<SuccessResponse<NaiveDate>>, ErrorResponse> {
    HolidayRepository::new(state.db_pool.clone())
        .delete(date)
        .await?;
    Ok(Json(SuccessResponse::new(date)))
}
