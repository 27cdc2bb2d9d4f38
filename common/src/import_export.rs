// Agent CSV import/export

use crate::db::repositories::AgentRepository;
use crate::db::DbPool;
use crate::errors::{DatabaseError, ValidationError};
use crate::models::{normalize_agent_code, normalize_group_code, Agent};
use crate::planning::MonthPlanning;
use crate::rotation::Rotation;
use crate::telemetry;
use async_trait::async_trait;
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// General error type for import/export operations
#[derive(Debug, thiserror::Error)]
pub enum ImportExportError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output error: {0}")]
    Output(String),
}

/// Outcome of a CSV import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Classification of one CSV data row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted { line: u64, agent: Agent },
    Skipped { line: u64 },
    Failed { line: u64, message: String },
}

/// Agent import service trait
#[async_trait]
pub trait AgentImporter: Send + Sync {
    /// Import agents from CSV bytes
    async fn import_csv(&self, data: &[u8]) -> Result<ImportReport, ImportExportError>;
}

/// CSV importer writing to the agents table
pub struct CsvAgentImporter {
    db_pool: DbPool,
    rotation: Arc<Rotation>,
    anchor: NaiveDate,
}

impl CsvAgentImporter {
    /// New agents get the cycle anchor as their entry date
    pub fn new(db_pool: DbPool, rotation: Arc<Rotation>, anchor: NaiveDate) -> Self {
        Self {
            db_pool,
            rotation,
            anchor,
        }
    }
}

/// Parse CSV bytes into row outcomes without touching the database
///
/// The first record is a header. A row needs at least code, last name,
/// first name and group; rows missing any of them, or naming a group that
/// is not configured, are skipped.
pub fn parse_agent_rows(
    data: &[u8],
    rotation: &Rotation,
    entry_date: NaiveDate,
) -> Result<Vec<RowOutcome>, ImportExportError> {
    let text = std::str::from_utf8(data).map_err(|e| ValidationError::InvalidFieldValue {
        field: "file".to_string(),
        reason: format!("CSV must be UTF-8 encoded: {}", e),
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut outcomes = Vec::new();
    for (index, result) in reader.records().enumerate() {
        // Header is line 1
        let fallback_line = index as u64 + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map_or(fallback_line, |p| p.line());
                outcomes.push(RowOutcome::Failed {
                    line,
                    message: e.to_string(),
                });
                continue;
            }
        };
        let line = record.position().map_or(fallback_line, |p| p.line());

        if record.len() < 4 {
            outcomes.push(RowOutcome::Skipped { line });
            continue;
        }

        let raw_code = record.get(0).unwrap_or_default();
        let last_name = record.get(1).unwrap_or_default();
        let first_name = record.get(2).unwrap_or_default();
        let group = normalize_group_code(record.get(3).unwrap_or_default());

        if raw_code.is_empty()
            || last_name.is_empty()
            || first_name.is_empty()
            || !rotation.is_known_group(&group)
        {
            outcomes.push(RowOutcome::Skipped { line });
            continue;
        }

        match normalize_agent_code(raw_code) {
            Ok(code) => outcomes.push(RowOutcome::Accepted {
                line,
                agent: Agent::new(code, last_name, first_name, group, entry_date),
            }),
            Err(e) => outcomes.push(RowOutcome::Failed {
                line,
                message: e.to_string(),
            }),
        }
    }

    Ok(outcomes)
}

#[async_trait]
impl AgentImporter for CsvAgentImporter {
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn import_csv(&self, data: &[u8]) -> Result<ImportReport, ImportExportError> {
        let outcomes = parse_agent_rows(data, &self.rotation, self.anchor)?;
        let mut report = ImportReport::default();

        let mut tx = self
            .db_pool
            .pool()
            .begin()
            .await
            .map_err(DatabaseError::from)?;

        for outcome in outcomes {
            match outcome {
                RowOutcome::Accepted { line, agent } => {
                    match AgentRepository::upsert_with(&mut *tx, &agent).await {
                        Ok(()) => report.imported += 1,
                        Err(e) => {
                            warn!(line = line, agent_code = %agent.code, error = %e, "Row import failed");
                            report.errors.push(format!("Line {}: {}", line, e));
                            report.skipped += 1;
                        }
                    }
                }
                RowOutcome::Skipped { .. } => report.skipped += 1,
                RowOutcome::Failed { line, message } => {
                    report.errors.push(format!("Line {}: {}", line, message));
                    report.skipped += 1;
                }
            }
        }

        tx.commit().await.map_err(DatabaseError::from)?;
        telemetry::record_import(report.imported, report.skipped);

        info!(
            imported = report.imported,
            skipped = report.skipped,
            errors = report.errors.len(),
            "CSV import completed"
        );
        Ok(report)
    }
}

fn finish_writer(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ImportExportError> {
    writer
        .into_inner()
        .map_err(|e| ImportExportError::Output(e.to_string()))
}

/// Agents as CSV, one row per agent
pub fn export_agents_csv(agents: &[Agent]) -> Result<Vec<u8>, ImportExportError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record([
        "code",
        "last_name",
        "first_name",
        "group_code",
        "entry_date",
        "exit_date",
        "status",
    ])?;

    for agent in agents {
        let entry_date = agent.entry_date.to_string();
        let exit_date = agent.exit_date.map(|d| d.to_string()).unwrap_or_default();
        writer.write_record([
            agent.code.as_str(),
            agent.last_name.as_str(),
            agent.first_name.as_str(),
            agent.group_code.as_str(),
            entry_date.as_str(),
            exit_date.as_str(),
            agent.status.as_str(),
        ])?;
    }

    finish_writer(writer)
}

/// Planning grid as CSV: code, name, group, then one column per day
pub fn export_planning_csv(planning: &MonthPlanning) -> Result<Vec<u8>, ImportExportError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    let mut header = vec!["code".to_string(), "name".to_string(), "group".to_string()];
    header.extend(
        planning
            .days
            .iter()
            .map(|d| format!("{} {:02}", d.weekday, d.day)),
    );
    writer.write_record(&header)?;

    for row in &planning.rows {
        let mut record = vec![row.code.clone(), row.full_name.clone(), row.group.clone()];
        record.extend(row.shifts.iter().cloned());
        writer.write_record(&record)?;
    }

    finish_writer(writer)
}

/// Export filename for a month, e.g. `planning_2025_11.csv`
pub fn planning_export_filename(month: u32, year: i32) -> String {
    format!("planning_{}_{:02}.csv", year, month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
    }

    #[test]
    fn test_parse_rows_classification() {
        let csv = "code,nom,prenom,groupe\n\
                   ag001,Dupont,Jean,a\n\
                   AG002,Martin\n\
                   AG003,Durand,Marie,Z\n\
                   ,Vide,Code,A\n\
                   AG 004,Petit,Luc,B\n";
        let outcomes = parse_agent_rows(csv.as_bytes(), &Rotation::reference(), anchor()).unwrap();

        assert_eq!(outcomes.len(), 5);
        match &outcomes[0] {
            RowOutcome::Accepted { line, agent } => {
                assert_eq!(*line, 2);
                assert_eq!(agent.code, "AG001");
                assert_eq!(agent.group_code, "A");
                assert_eq!(agent.entry_date, anchor());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(outcomes[1], RowOutcome::Skipped { line: 3 });
        assert_eq!(outcomes[2], RowOutcome::Skipped { line: 4 });
        assert_eq!(outcomes[3], RowOutcome::Skipped { line: 5 });
        assert!(matches!(outcomes[4], RowOutcome::Failed { line: 6, .. }));
    }

    #[test]
    fn test_parse_rejects_non_utf8() {
        let data = [b'c', b'o', 0xff, 0xfe];
        let err = parse_agent_rows(&data, &Rotation::reference(), anchor()).unwrap_err();
        assert!(matches!(err, ImportExportError::Validation(_)));
    }

    #[test]
    fn test_header_only_file() {
        let outcomes =
            parse_agent_rows(b"code,nom,prenom,groupe\n", &Rotation::reference(), anchor())
                .unwrap();
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_export_agents_csv() {
        let mut agent = Agent::new("AG001", "Dupont", "Jean", "A", anchor());
        agent.exit_date = NaiveDate::from_ymd_opt(2025, 12, 1);
        let bytes = export_agents_csv(&[agent]).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("code,last_name,first_name,group_code,entry_date,exit_date,status")
        );
        assert_eq!(
            lines.next(),
            Some("AG001,Dupont,Jean,A,2025-11-01,2025-12-01,active")
        );
    }

    #[tokio::test]
    async fn test_import_upserts_in_database() {
        let pool = DbPool::in_memory().await.unwrap();
        let importer = CsvAgentImporter::new(pool.clone(), Arc::new(Rotation::reference()), anchor());

        let first = importer
            .import_csv(b"code,nom,prenom,groupe\nAG001,Dupont,Jean,A\nAG002,Martin,Pierre,E\n")
            .await
            .unwrap();
        assert_eq!(first.imported, 2);
        assert_eq!(first.skipped, 0);

        let second = importer
            .import_csv(b"code,nom,prenom,groupe\nAG001,Dupont,Jeanne,B\nbad\n")
            .await
            .unwrap();
        assert_eq!(second.imported, 1);
        assert_eq!(second.skipped, 1);
        assert!(second.errors.is_empty());

        let agent = AgentRepository::new(pool)
            .find_by_code("AG001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(agent.first_name, "Jeanne");
        assert_eq!(agent.group_code, "B");
    }

    #[test]
    fn test_planning_export_filename() {
        assert_eq!(planning_export_filename(3, 2026), "planning_2026_03.csv");
    }
}
