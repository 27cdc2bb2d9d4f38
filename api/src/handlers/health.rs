use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;
use common::errors::DatabaseError;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: String,
    pub tables: i64,
    pub connections: u32,
    pub timestamp: String,
    pub environment: String,
}

/// Database status, table count and HTTP status for the health report
async fn database_status(state: &AppState) -> (StatusCode, String, i64) {
    let probe = match state.db_pool.health_check().await {
        Ok(()) => state.db_pool.table_count().await,
        Err(e) => Err(e),
    };
    database_report(probe)
}

fn database_report(probe: Result<i64, DatabaseError>) -> (StatusCode, String, i64) {
    match probe {
        Ok(tables) => (StatusCode::OK, "connected".to_string(), tables),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, format!("error: {}", e), 0)
        }
    }
}

/// Health check endpoint
///
/// Answers 503 when the database does not respond or cannot list its tables.
#[tracing::instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (status, database, tables) = database_status(&state).await;

    let body = HealthResponse {
        status: if status == StatusCode::OK {
            "healthy"
        } else {
            "unhealthy"
        },
        database,
        tables,
        connections: state.db_pool.size(),
        timestamp: Utc::now().to_rfc3339(),
        environment: state.config.environment.clone(),
    };

    (status, Json(body))
}
