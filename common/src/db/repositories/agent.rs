// Agent repository implementation

use super::queries::agent_queries::SELECT_ALL_COLUMNS;
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{Agent, AgentStatus};
use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::BTreeMap;
use tracing::instrument;

/// Filter for listing agents
#[derive(Debug, Clone, Default)]
pub struct AgentFilter {
    /// Only agents of this group (upper-cased before querying)
    pub group: Option<String>,
    /// Only agents without an exit date
    pub active_only: bool,
}

impl AgentFilter {
    pub fn active() -> Self {
        Self {
            group: None,
            active_only: true,
        }
    }
}

/// Repository for agent-related database operations
pub struct AgentRepository {
    pool: DbPool,
}

impl AgentRepository {
    /// Create a new AgentRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Register a new agent
    ///
    /// Fails with `DatabaseError::DuplicateKey` when the code is taken.
    #[instrument(skip(self, agent), fields(agent_code = %agent.code))]
    pub async fn create(&self, agent: &Agent) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO agents (code, last_name, first_name, group_code, entry_date, exit_date, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&agent.code)
        .bind(&agent.last_name)
        .bind(&agent.first_name)
        .bind(&agent.group_code)
        .bind(agent.entry_date)
        .bind(agent.exit_date)
        .bind(agent.status.as_str())
        .execute(self.pool.pool())
        .await?;

        tracing::info!(
            agent_code = %agent.code,
            group_code = %agent.group_code,
            "Agent created"
        );
        Ok(())
    }

    /// Find an agent by code
    #[instrument(skip(self))]
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Agent>, DatabaseError> {
        let query = format!("SELECT {} FROM agents WHERE code = ?1", SELECT_ALL_COLUMNS);
        let agent = sqlx::query_as::<_, Agent>(&query)
            .bind(code)
            .fetch_optional(self.pool.pool())
            .await?;

        Ok(agent)
    }

    /// List agents ordered by group then code
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &AgentFilter) -> Result<Vec<Agent>, DatabaseError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM agents WHERE 1=1", SELECT_ALL_COLUMNS));

        if filter.active_only {
            builder.push(" AND exit_date IS NULL");
        }
        if let Some(group) = &filter.group {
            builder.push(" AND group_code = ");
            builder.push_bind(group.trim().to_uppercase());
        }
        builder.push(" ORDER BY group_code, code");

        let agents = builder
            .build_query_as::<Agent>()
            .fetch_all(self.pool.pool())
            .await?;

        tracing::debug!(count = agents.len(), "Listed agents");
        Ok(agents)
    }

    /// Update names and group of an agent
    #[instrument(skip(self, agent), fields(agent_code = %agent.code))]
    pub async fn update(&self, agent: &Agent) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE agents
            SET last_name = ?2,
                first_name = ?3,
                group_code = ?4,
                entry_date = ?5
            WHERE code = ?1
            "#,
        )
        .bind(&agent.code)
        .bind(&agent.last_name)
        .bind(&agent.first_name)
        .bind(&agent.group_code)
        .bind(agent.entry_date)
        .execute(self.pool.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!(
                "Agent not found: {}",
                agent.code
            )));
        }

        tracing::info!(agent_code = %agent.code, "Agent updated");
        Ok(())
    }

    /// Soft-delete an agent by setting its exit date
    ///
    /// An agent that already left keeps its original exit date.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, code: &str, exit_date: NaiveDate) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE agents
            SET exit_date = COALESCE(exit_date, ?2),
                status = ?3
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .bind(exit_date)
        .bind(AgentStatus::Inactive.as_str())
        .execute(self.pool.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Agent not found: {}", code)));
        }

        tracing::info!(agent_code = %code, exit_date = %exit_date, "Agent deactivated");
        Ok(())
    }

    /// Insert an agent, or refresh and reactivate the existing one
    ///
    /// Generic over the executor so CSV imports can run inside a transaction.
    pub async fn upsert_with<'e, E>(executor: E, agent: &Agent) -> Result<(), DatabaseError>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO agents (code, last_name, first_name, group_code, entry_date, exit_date, status)
            VALUES (?1, ?2, ?3, ?4, ?5, NULL, 'active')
            ON CONFLICT (code) DO UPDATE SET
                last_name = excluded.last_name,
                first_name = excluded.first_name,
                group_code = excluded.group_code,
                exit_date = NULL,
                status = 'active'
            "#,
        )
        .bind(&agent.code)
        .bind(&agent.last_name)
        .bind(&agent.first_name)
        .bind(&agent.group_code)
        .bind(agent.entry_date)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Number of active agents per group
    #[instrument(skip(self))]
    pub async fn count_active_by_group(&self) -> Result<BTreeMap<String, i64>, DatabaseError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT group_code, COUNT(*)
            FROM agents
            WHERE exit_date IS NULL
            GROUP BY group_code
            "#,
        )
        .fetch_all(self.pool.pool())
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Insert the sample roster when the table is empty
    ///
    /// Returns the number of agents inserted.
    #[instrument(skip(self))]
    pub async fn seed_samples_if_empty(&self, entry_date: NaiveDate) -> Result<usize, DatabaseError> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agents")
            .fetch_one(self.pool.pool())
            .await?;
        if existing > 0 {
            return Ok(0);
        }

        let samples = [
            Agent::new("AG001", "Dupont", "Jean", "A", entry_date),
            Agent::new("AG002", "Martin", "Pierre", "B", entry_date),
            Agent::new("AG003", "Durand", "Marie", "C", entry_date),
        ];
        for agent in &samples {
            self.create(agent).await?;
        }

        tracing::info!(count = samples.len(), "Database seeded with sample agents");
        Ok(samples.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn repo() -> AgentRepository {
        AgentRepository::new(DbPool::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = repo().await;
        let agent = Agent::new("AG001", "Dupont", "Jean", "A", date(2025, 11, 1));
        repo.create(&agent).await.unwrap();

        let found = repo.find_by_code("AG001").await.unwrap();
        assert_eq!(found, Some(agent));
        assert_eq!(repo.find_by_code("AG999").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let repo = repo().await;
        let agent = Agent::new("AG001", "Dupont", "Jean", "A", date(2025, 11, 1));
        repo.create(&agent).await.unwrap();

        let err = repo.create(&agent).await.unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let repo = repo().await;
        repo.create(&Agent::new("AG003", "Durand", "Marie", "B", date(2025, 11, 1)))
            .await
            .unwrap();
        repo.create(&Agent::new("AG002", "Martin", "Pierre", "A", date(2025, 11, 1)))
            .await
            .unwrap();
        repo.create(&Agent::new("AG001", "Dupont", "Jean", "B", date(2025, 11, 1)))
            .await
            .unwrap();
        repo.deactivate("AG003", date(2025, 12, 1)).await.unwrap();

        let all = repo.list(&AgentFilter::default()).await.unwrap();
        let codes: Vec<&str> = all.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes, vec!["AG002", "AG001", "AG003"]);

        let active_b = repo
            .list(&AgentFilter {
                group: Some("b".to_string()),
                active_only: true,
            })
            .await
            .unwrap();
        assert_eq!(active_b.len(), 1);
        assert_eq!(active_b[0].code, "AG001");
    }

    #[tokio::test]
    async fn test_deactivate_keeps_first_exit_date() {
        let repo = repo().await;
        repo.create(&Agent::new("AG001", "Dupont", "Jean", "A", date(2025, 11, 1)))
            .await
            .unwrap();

        repo.deactivate("AG001", date(2025, 12, 1)).await.unwrap();
        repo.deactivate("AG001", date(2026, 1, 1)).await.unwrap();

        let agent = repo.find_by_code("AG001").await.unwrap().unwrap();
        assert_eq!(agent.exit_date, Some(date(2025, 12, 1)));
        assert_eq!(agent.status, AgentStatus::Inactive);

        let err = repo.deactivate("AG404", date(2025, 12, 1)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upsert_reactivates_and_keeps_entry_date() {
        let repo = repo().await;
        repo.create(&Agent::new("AG001", "Dupont", "Jean", "A", date(2025, 11, 1)))
            .await
            .unwrap();
        repo.deactivate("AG001", date(2025, 12, 1)).await.unwrap();

        let refreshed = Agent::new("AG001", "Dupont", "Jeanne", "C", date(2026, 3, 1));
        AgentRepository::upsert_with(repo.pool.pool(), &refreshed)
            .await
            .unwrap();

        let agent = repo.find_by_code("AG001").await.unwrap().unwrap();
        assert_eq!(agent.first_name, "Jeanne");
        assert_eq!(agent.group_code, "C");
        assert_eq!(agent.entry_date, date(2025, 11, 1));
        assert!(agent.is_active());
    }

    #[tokio::test]
    async fn test_count_active_by_group_and_seed() {
        let repo = repo().await;
        assert_eq!(repo.seed_samples_if_empty(date(2025, 11, 1)).await.unwrap(), 3);
        assert_eq!(repo.seed_samples_if_empty(date(2025, 11, 1)).await.unwrap(), 0);

        let counts = repo.count_active_by_group().await.unwrap();
        assert_eq!(counts.get("A"), Some(&1));
        assert_eq!(counts.get("B"), Some(&1));
        assert_eq!(counts.get("C"), Some(&1));
    }
}
