use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::db::repositories::{AgentFilter, AgentRepository};
use common::import_export::{
    export_agents_csv, export_planning_csv, planning_export_filename, AgentImporter,
    CsvAgentImporter, ImportReport,
};

fn csv_attachment(filename: &str, body: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
}

/// Import agents from the `file` field of a multipart upload
#[tracing::instrument(skip(state, multipart))]
pub async fn import_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SuccessResponse<ImportReport>>, ErrorResponse> {
    let invalid_body = |e: MultipartError| {
        ErrorResponse::new("validation_error", format!("Invalid multipart body: {}", e))
    };

    let mut data = None;
    while let Some(field) = multipart.next_field().await.map_err(invalid_body)? {
        if field.name() == Some("file") {
            data = Some(field.bytes().await.map_err(invalid_body)?);
            break;
        }
    }

    let data = data.ok_or_else(|| {
        ErrorResponse::new("validation_error", "Multipart field 'file' is required")
    })?;
    if data.is_empty() {
        return Err(ErrorResponse::new("validation_error", "Uploaded file is empty"));
    }

    let importer =
        CsvAgentImporter::new(state.db_pool.clone(), state.rotation.clone(), state.anchor());
    let report = importer.import_csv(&data).await?;

    Ok(Json(SuccessResponse::new(report)))
}

/// Download every agent as CSV
#[tracing::instrument(skip(state))]
pub async fn export_agents(State(state): State<AppState>) -> Result<impl IntoResponse, ErrorResponse> {
    let agents = AgentRepository::new(state.db_pool.clone())
        .list(&AgentFilter::default())
        .await?;
    let body = export_agents_csv(&agents)?;

    tracing::info!(count = agents.len(), "Agents exported");
    Ok(csv_attachment("agents.csv", body))
}

/// Download the planning grid of a month as CSV
#[tracing::instrument(skip(state))]
pub async fn export_planning(
    State(state): State<AppState>,
    Path((month, year)): Path<(u32, i32)>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let planning = state.planning_service().month(month, year).await?;
    let body = export_planning_csv(&planning)?;

    Ok(csv_attachment(&planning_export_filename(month, year), body))
}
