// Holiday repository implementation

use super::queries::holiday_queries::SELECT_ALL_COLUMNS;
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::Holiday;
use chrono::NaiveDate;
use tracing::instrument;

/// Repository for public holidays
pub struct HolidayRepository {
    pool: DbPool,
}

impl HolidayRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create or rename a holiday
    #[instrument(skip(self, holiday), fields(date = %holiday.date))]
    pub async fn upsert(&self, holiday: &Holiday) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO holidays (date, description)
            VALUES (?1, ?2)
            ON CONFLICT (date) DO UPDATE SET description = excluded.description
            "#,
        )
        .bind(holiday.date)
        .bind(&holiday.description)
        .execute(self.pool.pool())
        .await?;

        tracing::info!(date = %holiday.date, "Holiday saved");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Holiday>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM holidays WHERE date >= ?1 AND date <= ?2 ORDER BY date",
            SELECT_ALL_COLUMNS
        );
        let holidays = sqlx::query_as::<_, Holiday>(&query)
            .bind(from)
            .bind(to)
            .fetch_all(self.pool.pool())
            .await?;

        Ok(holidays)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, date: NaiveDate) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM holidays WHERE date = ?1")
            .bind(date)
            .execute(self.pool.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Holiday not found: {}", date)));
        }

        tracing::info!(date = %date, "Holiday deleted");
        Ok(())
    }
}
