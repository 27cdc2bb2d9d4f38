// Integration tests for the roster service
// These tests drive the repositories, the CSV importer and the planning
// service against a real SQLite file

use chrono::NaiveDate;
use common::{
    config::{DatabaseConfig, Settings},
    db::{
        repositories::{AgentFilter, AgentRepository, HolidayRepository, OverrideRepository},
        DbPool,
    },
    import_export::{export_planning_csv, AgentImporter, CsvAgentImporter},
    models::{EntrySource, Holiday, OverrideOrigin, ShiftOverride, ShiftSymbol},
    planning::PlanningService,
};
use std::sync::Arc;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Helper function to open a database file inside a temporary directory
async fn setup_test_db(dir: &TempDir) -> DbPool {
    let path = dir.path().join("nested").join("planning.db");
    let config = DatabaseConfig {
        url: format!("sqlite://{}", path.display()),
        max_connections: 4,
        connect_timeout_seconds: 5,
        seed_sample_agents: false,
    };

    DbPool::new(&config)
        .await
        .expect("Failed to open test database")
}

fn planning_service(pool: &DbPool, settings: &Settings) -> PlanningService {
    PlanningService::new(
        pool.clone(),
        Arc::new(settings.rotation().unwrap()),
        settings.rotation.anchor,
    )
}

#[tokio::test]
async fn test_schema_bootstrap_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let pool = setup_test_db(&dir).await;
    assert_eq!(pool.table_count().await.unwrap(), 3);
    pool.health_check().await.unwrap();
    pool.close().await;

    // Reopening the same file keeps existing data and tables
    let pool = setup_test_db(&dir).await;
    AgentRepository::new(pool.clone())
        .seed_samples_if_empty(date(2025, 11, 1))
        .await
        .unwrap();
    pool.bootstrap().await.unwrap();
    assert_eq!(pool.table_count().await.unwrap(), 3);

    let agents = AgentRepository::new(pool)
        .list(&AgentFilter::default())
        .await
        .unwrap();
    assert_eq!(agents.len(), 3);
}

#[tokio::test]
async fn test_import_then_project_month() {
    let dir = TempDir::new().unwrap();
    let pool = setup_test_db(&dir).await;
    let settings = Settings::default();
    let rotation = Arc::new(settings.rotation().unwrap());

    let importer = CsvAgentImporter::new(pool.clone(), rotation, settings.rotation.anchor);
    let report = importer
        .import_csv(
            "code,nom,prenom,groupe\n\
             AG001,Dupont,Jean,A\n\
             AG002,Martin,Pierre,B\n\
             AG003,Durand,Marie,C\n\
             AG004,Petit,Luc,D\n\
             AG005,Roux,Anne,E\n\
             AG006,Blanc,Paul,X\n"
                .as_bytes(),
        )
        .await
        .unwrap();
    assert_eq!(report.imported, 5);
    assert_eq!(report.skipped, 1);

    let planning = planning_service(&pool, &settings)
        .month(11, 2025)
        .await
        .unwrap();
    assert_eq!(planning.total_agents, 5);
    assert_eq!(planning.entries.len(), 5 * 30);

    // First day of the cycle: each group starts at its own offset
    let first_day: Vec<&str> = planning.rows.iter().map(|r| r.shifts[0].as_str()).collect();
    assert_eq!(first_day, vec!["1", "2", "3", "R", "1"]);

    let csv = String::from_utf8(export_planning_csv(&planning).unwrap()).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("code,name,group,Sam 01,Dim 02"));
    assert!(lines.next().unwrap().starts_with("AG001,Dupont Jean,A,1,1,2,2,3,3,R,R,1"));
}

#[tokio::test]
async fn test_overrides_holidays_and_departures() {
    let dir = TempDir::new().unwrap();
    let pool = setup_test_db(&dir).await;
    let settings = Settings::default();
    let service = planning_service(&pool, &settings);

    let agents = AgentRepository::new(pool.clone());
    agents.seed_samples_if_empty(date(2025, 11, 1)).await.unwrap();
    agents.deactivate("AG003", date(2025, 11, 16)).await.unwrap();

    OverrideRepository::new(pool.clone())
        .upsert(&ShiftOverride {
            agent_code: "AG002".to_string(),
            date: date(2025, 11, 20),
            shift: ShiftSymbol::Absence,
            origin: OverrideOrigin::System,
        })
        .await
        .unwrap();
    service
        .record_leave("AG001", date(2025, 11, 24), date(2025, 12, 2))
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

    // AG003 left on the 16th: days 1..=15 only
    let departed = planning
        .entries
        .iter()
        .filter(|e| e.agent_code == "AG003")
        .count();
    assert_eq!(departed, 15);
    assert_eq!(planning.rows[2].shifts[15], "");

    let absence = planning
        .entries
        .iter()
        .find(|e| e.agent_code == "AG002" && e.date == date(2025, 11, 20))
        .unwrap();
    assert_eq!(absence.shift, ShiftSymbol::Absence);
    assert_eq!(absence.source, EntrySource::System);

    let leave_days = planning
        .entries
        .iter()
        .filter(|e| e.agent_code == "AG001" && e.shift == ShiftSymbol::Leave)
        .count();
    assert_eq!(leave_days, 7);
    assert!(planning.days[10].is_holiday);
    assert_eq!(planning.days[10].holiday.as_deref(), Some("Armistice"));

    // Leave spilling into December shows up there too
    let december = service.month(12, 2025).await.unwrap();
    let december_leave = december
        .entries
        .iter()
        .filter(|e| e.agent_code == "AG001" && e.shift == ShiftSymbol::Leave)
        .count();
    assert_eq!(december_leave, 2);
    assert!(december.entries.iter().all(|e| e.agent_code != "AG003"));
}
