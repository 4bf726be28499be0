use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::repository::{
    AiUsageCompletion, AiUsageRepository, AiUsageStatus, NewAiUsageRecord, StorageError,
};

use super::SqliteRepository;
use super::mapping::{db_err, ser};

#[async_trait]
impl AiUsageRepository for SqliteRepository {
    async fn insert_started(&self, record: NewAiUsageRecord) -> Result<i64, StorageError> {
        let result = sqlx::query(
            r"
            INSERT INTO ai_usage (kind, model, created_at, status)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(record.kind)
        .bind(record.model)
        .bind(record.created_at)
        .bind(AiUsageStatus::Started.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.last_insert_rowid())
    }

    async fn update_completion(
        &self,
        id: i64,
        completion: AiUsageCompletion,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            r"
            UPDATE ai_usage
            SET status = ?1,
                prompt_tokens = ?2,
                completion_tokens = ?3,
                total_tokens = ?4
            WHERE id = ?5
            ",
        )
        .bind(completion.status.as_str())
        .bind(completion.prompt_tokens.map(i64::from))
        .bind(completion.completion_tokens.map(i64::from))
        .bind(completion.total_tokens.map(i64::from))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u32, StorageError> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) as count
            FROM ai_usage
            WHERE created_at >= ?1
            ",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let count: i64 = row.try_get("count").map_err(ser)?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn last_request_at(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT created_at
            FROM ai_usage
            ORDER BY created_at DESC
            LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(|row| row.try_get("created_at").map_err(ser))
            .transpose()
    }
}
