use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use common::config::Settings;
use common::db::DbPool;
use common::errors::RotationError;
use common::planning::PlanningService;
use common::rotation::Rotation;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub rotation: Arc<Rotation>,
    pub config: Arc<Settings>,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Create a new AppState, building the rotation from the settings
    pub fn new(
        db_pool: DbPool,
        config: Settings,
        metrics_handle: PrometheusHandle,
    ) -> Result<Self, RotationError> {
        let rotation = config.rotation()?;

        Ok(Self {
            db_pool,
            rotation: Arc::new(rotation),
            config: Arc::new(config),
            metrics_handle,
        })
    }

    /// Day index 0 of the rotation cycle
    pub fn anchor(&self) -> NaiveDate {
        self.config.rotation.anchor
    }

    pub fn planning_service(&self) -> PlanningService {
        PlanningService::new(self.db_pool.clone(), self.rotation.clone(), self.anchor())
    }
}
