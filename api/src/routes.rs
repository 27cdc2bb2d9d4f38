use axum::{
    routing::{delete, get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the main application router with all routes and middleware
#[tracing::instrument(skip(state))]
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    let api_routes = Router::new()
        .route("/api/health", get(handlers::health::health_check))
        .route("/api/config", get(handlers::config::config_info))
        // Agent roster
        .route(
            "/api/agents",
            get(handlers::agents::list_agents).post(handlers::agents::create_agent),
        )
        .route(
            "/api/agents/:code",
            get(handlers::agents::get_agent)
                .put(handlers::agents::update_agent)
                .delete(handlers::agents::deactivate_agent),
        )
        .route("/api/agents/:code/shift", get(handlers::agents::agent_shift))
        // Planning and overrides
        .route(
            "/api/planning/global/:month/:year",
            get(handlers::planning::global_planning),
        )
        .route("/api/planning/shift", post(handlers::planning::set_shift))
        .route("/api/planning/absence", post(handlers::planning::record_absence))
        .route("/api/planning/leave", post(handlers::planning::record_leave))
        .route(
            "/api/planning/:agent_code/:date",
            delete(handlers::planning::delete_override),
        )
        // Holidays
        .route(
            "/api/holidays",
            get(handlers::holidays::list_holidays).post(handlers::holidays::create_holiday),
        )
        .route("/api/holidays/:date", delete(handlers::holidays::delete_holiday))
        .route("/api/dashboard", get(handlers::dashboard::dashboard_summary))
        // CSV import/export
        .route("/api/import/csv", post(handlers::import_export::import_csv))
        .route(
            "/api/export/agents.csv",
            get(handlers::import_export::export_agents),
        )
        .route(
            "/api/export/planning/:month/:year",
            get(handlers::import_export::export_planning),
        )
        .route("/metrics", get(handlers::metrics::metrics_handler));

    // HTML pages (tera)
    let page_routes = Router::new()
        .route("/", get(handlers::index::index))
        .route("/dashboard", get(handlers::dashboard::dashboard_index))
        .route(
            "/planning/:month/:year",
            get(handlers::dashboard::planning_page),
        );

    Router::new()
        .merge(api_routes)
        .merge(page_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(cors),
        )
        .with_state(state)
}
