// Monthly planning service
//
// Loads the roster, overrides and holidays of a month from the database and
// hands them to the rotation for projection.

use crate::db::repositories::{AgentFilter, AgentRepository, HolidayRepository, OverrideRepository};
use crate::db::DbPool;
use crate::errors::{DatabaseError, RotationError};
use crate::models::{Agent, AgentSnapshot, PlanningEntry, ShiftOverride, ShiftSymbol};
use crate::rotation::{month_days, weekday_label, Rotation};
use crate::telemetry;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// Longest leave range accepted in one request
pub const MAX_LEAVE_DAYS: i64 = 366;

#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error(transparent)]
    Rotation(#[from] RotationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),
}

/// One column of the planning grid
#[derive(Debug, Clone, Serialize)]
pub struct PlanningDay {
    pub date: NaiveDate,
    pub day: u32,
    pub weekday: &'static str,
    pub is_holiday: bool,
    pub holiday: Option<String>,
}

/// One row of the planning grid
#[derive(Debug, Clone, Serialize)]
pub struct PlanningRow {
    pub code: String,
    pub last_name: String,
    pub first_name: String,
    pub group: String,
    pub full_name: String,
    /// Shift code per day of month; empty outside the membership window
    pub shifts: Vec<String>,
}

/// A projected month with its grid presentation
#[derive(Debug, Clone, Serialize)]
pub struct MonthPlanning {
    pub month: u32,
    pub year: i32,
    pub total_days: usize,
    pub total_agents: usize,
    pub days: Vec<PlanningDay>,
    pub rows: Vec<PlanningRow>,
    pub entries: Vec<PlanningEntry>,
}

/// Planning service
pub struct PlanningService {
    pool: DbPool,
    rotation: Arc<Rotation>,
    anchor: NaiveDate,
}

impl PlanningService {
    pub fn new(pool: DbPool, rotation: Arc<Rotation>, anchor: NaiveDate) -> Self {
        Self {
            pool,
            rotation,
            anchor,
        }
    }

    /// Project a month for every agent whose membership window touches it
    #[instrument(skip(self))]
    pub async fn month(&self, month: u32, year: i32) -> Result<MonthPlanning, PlanningError> {
        let dates = month_days(month, year)?;
        let (first, last) = match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(RotationError::InvalidMonth(month).into()),
        };

        let agents: Vec<Agent> = AgentRepository::new(self.pool.clone())
            .list(&AgentFilter::default())
            .await?
            .into_iter()
            .filter(|a| a.entry_date <= last && a.exit_date.map_or(true, |exit| exit > first))
            .collect();

        let overrides = OverrideRepository::new(self.pool.clone())
            .find_in_range(first, last)
            .await?;
        let holidays: HashMap<NaiveDate, Option<String>> =
            HolidayRepository::new(self.pool.clone())
                .list_in_range(first, last)
                .await?
                .into_iter()
                .map(|h| (h.date, h.description))
                .collect();

        let snapshots: Vec<AgentSnapshot> = agents.iter().map(AgentSnapshot::from).collect();
        let entries = self
            .rotation
            .project_month(&snapshots, month, year, self.anchor, &overrides)?;
        telemetry::record_projection(entries.len());

        let days = dates
            .iter()
            .map(|date| PlanningDay {
                date: *date,
                day: chrono::Datelike::day(date),
                weekday: weekday_label(*date),
                is_holiday: holidays.contains_key(date),
                holiday: holidays.get(date).cloned().flatten(),
            })
            .collect::<Vec<_>>();

        let rows = build_rows(&agents, &entries, first, dates.len());

        tracing::info!(
            month = month,
            year = year,
            agents = rows.len(),
            entries = entries.len(),
            "Monthly planning projected"
        );

        Ok(MonthPlanning {
            month,
            year,
            total_days: days.len(),
            total_agents: rows.len(),
            days,
            rows,
            entries,
        })
    }

    /// Resolved shift of one agent on one day, override first
    ///
    /// Returns `None` when the date is outside the agent's membership window.
    #[instrument(skip(self))]
    pub async fn shift_for(
        &self,
        agent_code: &str,
        date: NaiveDate,
    ) -> Result<Option<(ShiftSymbol, Option<ShiftOverride>)>, PlanningError> {
        let agent = AgentRepository::new(self.pool.clone())
            .find_by_code(agent_code)
            .await?
            .ok_or_else(|| PlanningError::AgentNotFound(agent_code.to_string()))?;

        if !agent.snapshot().is_member_on(date) {
            return Ok(None);
        }

        let recorded = OverrideRepository::new(self.pool.clone())
            .find(&agent.code, date)
            .await?;
        let shift = match &recorded {
            Some(value) => value.shift,
            None => self
                .rotation
                .resolve_shift(&agent.group_code, date, self.anchor)?,
        };

        Ok(Some((shift, recorded)))
    }

    /// Record leave (`C`) for every day of an inclusive range
    #[instrument(skip(self))]
    pub async fn record_leave(
        &self,
        agent_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, PlanningError> {
        if end < start {
            return Err(PlanningError::InvalidRange(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }
        let span = (end - start).num_days() + 1;
        if span > MAX_LEAVE_DAYS {
            return Err(PlanningError::InvalidRange(format!(
                "leave spans {} days, at most {} allowed",
                span, MAX_LEAVE_DAYS
            )));
        }

        let agent = AgentRepository::new(self.pool.clone())
            .find_by_code(agent_code)
            .await?
            .ok_or_else(|| PlanningError::AgentNotFound(agent_code.to_string()))?;

        let values: Vec<ShiftOverride> = start
            .iter_days()
            .take(span as usize)
            .map(|date| ShiftOverride::manual(agent.code.clone(), date, ShiftSymbol::Leave))
            .collect();

        OverrideRepository::new(self.pool.clone())
            .upsert_many(&values)
            .await?;
        telemetry::record_override(crate::models::OverrideOrigin::Manual, values.len());

        Ok(values.len())
    }
}

/// Lay entries out as one row per agent with one cell per day
fn build_rows(
    agents: &[Agent],
    entries: &[PlanningEntry],
    first: NaiveDate,
    day_count: usize,
) -> Vec<PlanningRow> {
    let by_code: HashMap<&str, &Agent> = agents.iter().map(|a| (a.code.as_str(), a)).collect();
    let mut rows: Vec<PlanningRow> = Vec::new();
    let mut row_index: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        let index = match row_index.get(entry.agent_code.as_str()) {
            Some(index) => *index,
            None => {
                let Some(agent) = by_code.get(entry.agent_code.as_str()) else {
                    continue;
                };
                rows.push(PlanningRow {
                    code: agent.code.clone(),
                    last_name: agent.last_name.clone(),
                    first_name: agent.first_name.clone(),
                    group: entry.group_code.clone(),
                    full_name: agent.full_name(),
                    shifts: vec![String::new(); day_count],
                });
                row_index.insert(entry.agent_code.as_str(), rows.len() - 1);
                rows.len() - 1
            }
        };

        let offset = (entry.date - first).num_days();
        if let Some(cell) = usize::try_from(offset)
            .ok()
            .and_then(|i| rows[index].shifts.get_mut(i))
        {
            *cell = entry.shift.code().to_string();
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntrySource, Holiday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn service() -> (PlanningService, DbPool) {
        let pool = DbPool::in_memory().await.unwrap();
        let service = PlanningService::new(
            pool.clone(),
            Arc::new(Rotation::reference()),
            date(2025, 11, 1),
        );
        (service, pool)
    }

    #[tokio::test]
    async fn test_month_builds_grid() {
        let (service, pool) = service().await;
        let agents = AgentRepository::new(pool.clone());
        agents
            .create(&Agent::new("AG001", "Dupont", "Jean", "A", date(2025, 11, 1)))
            .await
            .unwrap();
        agents
            .create(&Agent::new("AG002", "Martin", "Pierre", "B", date(2025, 11, 10)))
            .await
            .unwrap();
        HolidayRepository::new(pool.clone())
            .upsert(&Holiday {
                date: date(2025, 11, 11),
                description: Some("Armistice".to_string()),
            })
            .await
            .unwrap();

        let planning = service.month(11, 2025).await.unwrap();
        assert_eq!(planning.total_days, 30);
        assert_eq!(planning.total_agents, 2);
        assert_eq!(planning.entries.len(), 30 + 21);
        assert!(planning.days[10].is_holiday);
        assert_eq!(planning.days[0].weekday, "Sam");

        let late = &planning.rows[1];
        assert_eq!(late.code, "AG002");
        assert_eq!(late.shifts[4], "");
        assert_eq!(late.shifts[9], planning.entries[30].shift.code());
    }

    #[tokio::test]
    async fn test_month_skips_agents_outside_month() {
        let (service, pool) = service().await;
        AgentRepository::new(pool.clone())
            .create(&Agent::new("AG009", "Petit", "Luc", "D", date(2026, 1, 1)))
            .await
            .unwrap();

        let planning = service.month(11, 2025).await.unwrap();
        assert_eq!(planning.total_agents, 0);
        assert!(planning.entries.is_empty());
    }

    #[tokio::test]
    async fn test_leave_range_overrides_cycle() {
        let (service, pool) = service().await;
        AgentRepository::new(pool.clone())
            .create(&Agent::new("AG001", "Dupont", "Jean", "A", date(2025, 11, 1)))
            .await
            .unwrap();

        let written = service
            .record_leave("AG001", date(2025, 11, 3), date(2025, 11, 5))
            .await
            .unwrap();
        assert_eq!(written, 3);

        let planning = service.month(11, 2025).await.unwrap();
        let leave: Vec<_> = planning
            .entries
            .iter()
            .filter(|e| e.shift == ShiftSymbol::Leave)
            .collect();
        assert_eq!(leave.len(), 3);
        assert!(leave.iter().all(|e| e.source == EntrySource::Manual));

        let (shift, recorded) = service
            .shift_for("AG001", date(2025, 11, 4))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shift, ShiftSymbol::Leave);
        assert!(recorded.is_some());
    }

    #[tokio::test]
    async fn test_leave_range_validation() {
        let (service, _pool) = service().await;
        assert!(matches!(
            service
                .record_leave("AG001", date(2025, 11, 5), date(2025, 11, 3))
                .await,
            Err(PlanningError::InvalidRange(_))
        ));
        assert!(matches!(
            service
                .record_leave("AG001", date(2025, 1, 1), date(2026, 6, 1))
                .await,
            Err(PlanningError::InvalidRange(_))
        ));
        assert!(matches!(
            service
                .record_leave("AG404", date(2025, 11, 3), date(2025, 11, 3))
                .await,
            Err(PlanningError::AgentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_shift_for_outside_window() {
        let (service, pool) = service().await;
        AgentRepository::new(pool.clone())
            .create(&Agent::new("AG001", "Dupont", "Jean", "B", date(2025, 11, 10)))
            .await
            .unwrap();

        assert_eq!(service.shift_for("AG001", date(2025, 11, 5)).await.unwrap(), None);
        let (shift, recorded) = service
            .shift_for("AG001", date(2025, 11, 10))
            .await
            .unwrap()
            .unwrap();
        // B: floor_mod(9 + 2, 8) = 3
        assert_eq!(shift, ShiftSymbol::Shift2);
        assert!(recorded.is_none());
    }
}
