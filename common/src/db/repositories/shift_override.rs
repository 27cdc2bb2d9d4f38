// Shift override repository implementation

use super::queries::planning_queries::SELECT_ALL_COLUMNS;
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{OverrideMap, ShiftOverride};
use chrono::NaiveDate;
use sqlx::Sqlite;
use tracing::instrument;

/// Repository for per-(agent, date) shift overrides
pub struct OverrideRepository {
    pool: DbPool,
}

impl OverrideRepository {
    /// Create a new OverrideRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn upsert_with<'e, E>(executor: E, value: &ShiftOverride) -> Result<(), DatabaseError>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO planning (agent_code, date, shift, origin)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (agent_code, date) DO UPDATE SET
                shift = excluded.shift,
                origin = excluded.origin
            "#,
        )
        .bind(&value.agent_code)
        .bind(value.date)
        .bind(value.shift.code())
        .bind(value.origin.as_str())
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Record an override, replacing any previous one for the same day
    #[instrument(skip(self, value), fields(agent_code = %value.agent_code, date = %value.date))]
    pub async fn upsert(&self, value: &ShiftOverride) -> Result<(), DatabaseError> {
        Self::upsert_with(self.pool.pool(), value).await?;

        tracing::info!(
            agent_code = %value.agent_code,
            date = %value.date,
            shift = %value.shift,
            origin = value.origin.as_str(),
            "Shift override recorded"
        );
        Ok(())
    }

    /// Record several overrides atomically
    #[instrument(skip(self, values), fields(count = values.len()))]
    pub async fn upsert_many(&self, values: &[ShiftOverride]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.pool().begin().await?;
        for value in values {
            Self::upsert_with(&mut *tx, value).await?;
        }
        tx.commit().await?;

        tracing::info!(count = values.len(), "Shift overrides recorded");
        Ok(())
    }

    /// Remove the override of an agent on a day
    #[instrument(skip(self))]
    pub async fn delete(&self, agent_code: &str, date: NaiveDate) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM planning WHERE agent_code = ?1 AND date = ?2")
            .bind(agent_code)
            .bind(date)
            .execute(self.pool.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!(
                "No override for {} on {}",
                agent_code, date
            )));
        }

        tracing::info!(agent_code = %agent_code, date = %date, "Shift override deleted");
        Ok(())
    }

    /// Find the override of an agent on a day
    #[instrument(skip(self))]
    pub async fn find(
        &self,
        agent_code: &str,
        date: NaiveDate,
    ) -> Result<Option<ShiftOverride>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM planning WHERE agent_code = ?1 AND date = ?2",
            SELECT_ALL_COLUMNS
        );
        let value = sqlx::query_as::<_, ShiftOverride>(&query)
            .bind(agent_code)
            .bind(date)
            .fetch_optional(self.pool.pool())
            .await?;

        Ok(value)
    }

    /// All overrides with `from <= date <= to`
    #[instrument(skip(self))]
    pub async fn find_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<OverrideMap, DatabaseError> {
        let query = format!(
            "SELECT {} FROM planning WHERE date >= ?1 AND date <= ?2 ORDER BY agent_code, date",
            SELECT_ALL_COLUMNS
        );
        let values = sqlx::query_as::<_, ShiftOverride>(&query)
            .bind(from)
            .bind(to)
            .fetch_all(self.pool.pool())
            .await?;

        tracing::debug!(count = values.len(), "Loaded shift overrides");
        Ok(values.into_iter().collect())
    }

    /// Number of overrides with `from <= date <= to`
    #[instrument(skip(self))]
    pub async fn count_in_range(&self, from: NaiveDate, to: NaiveDate) -> Result<i64, DatabaseError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM planning WHERE date >= ?1 AND date <= ?2")
                .bind(from)
                .bind(to)
                .fetch_one(self.pool.pool())
                .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OverrideOrigin, ShiftSymbol};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_replaces_previous_value() {
        let repo = OverrideRepository::new(DbPool::in_memory().await.unwrap());
        let day = date(2025, 11, 4);

        repo.upsert(&ShiftOverride::manual("AG001", day, ShiftSymbol::Shift3))
            .await
            .unwrap();
        repo.upsert(&ShiftOverride::manual("AG001", day, ShiftSymbol::Sickness))
            .await
            .unwrap();

        let found = repo.find("AG001", day).await.unwrap().unwrap();
        assert_eq!(found.shift, ShiftSymbol::Sickness);
        assert_eq!(found.origin, OverrideOrigin::Manual);
        assert_eq!(repo.count_in_range(day, day).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_in_range_is_inclusive() {
        let repo = OverrideRepository::new(DbPool::in_memory().await.unwrap());
        let values: Vec<ShiftOverride> = [31, 1, 30]
            .iter()
            .zip([(10, 2025), (11, 2025), (11, 2025)])
            .map(|(d, (m, y))| ShiftOverride::manual("AG001", date(y, m, *d), ShiftSymbol::Leave))
            .collect();
        repo.upsert_many(&values).await.unwrap();

        let map = repo
            .find_in_range(date(2025, 11, 1), date(2025, 11, 30))
            .await
            .unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.get("AG001", date(2025, 10, 31)).is_none());
        assert!(map.get("AG001", date(2025, 11, 30)).is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_override() {
        let repo = OverrideRepository::new(DbPool::in_memory().await.unwrap());
        let err = repo.delete("AG001", date(2025, 11, 1)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }
}
