use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::PgStore;
use crate::{
    db::WatchStore,
    error::AppResult,
    models::{WatchKey, WatchRecord},
};

const WATCH_COLUMNS: &str = "id, profile_id, content_id, episode_number, season, progress, \
     playhead_secs, last_watched, completed";

#[derive(Debug, FromRow)]
struct WatchRow {
    id: Uuid,
    profile_id: Uuid,
    content_id: Uuid,
    episode_number: Option<i32>,
    season: Option<i32>,
    progress: f64,
    playhead_secs: f64,
    last_watched: DateTime<Utc>,
    completed: bool,
}

impl From<WatchRow> for WatchRecord {
    fn from(row: WatchRow) -> Self {
        WatchRecord {
            id: row.id,
            profile_id: row.profile_id,
            content_id: row.content_id,
            episode_number: row.episode_number,
            season: row.season,
            progress: row.progress,
            timestamp: row.playhead_secs,
            last_watched: row.last_watched,
            completed: row.completed,
        }
    }
}

#[async_trait]
impl WatchStore for PgStore {
    async fn find(&self, key: WatchKey) -> AppResult<Option<WatchRecord>> {
        let row = sqlx::query_as::<_, WatchRow>(&format!(
            r#"
            SELECT {} FROM watch_records
            WHERE profile_id = $1 AND content_id = $2
              AND episode_number IS NOT DISTINCT FROM $3
              AND season IS NOT DISTINCT FROM $4
            "#,
            WATCH_COLUMNS
        ))
        .bind(key.profile_id)
        .bind(key.content_id)
        .bind(key.episode.episode_number())
        .bind(key.episode.season())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(WatchRecord::from))
    }

    async fn upsert(&self, record: &WatchRecord) -> AppResult<WatchRecord> {
        // Single statement: concurrent writers to one key end as last-write-wins
        let row = sqlx::query_as::<_, WatchRow>(&format!(
            r#"
            INSERT INTO watch_records
                (id, profile_id, content_id, episode_number, season, progress,
                 playhead_secs, last_watched, completed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT ON CONSTRAINT watch_records_key DO UPDATE SET
                progress = EXCLUDED.progress,
                playhead_secs = EXCLUDED.playhead_secs,
                last_watched = EXCLUDED.last_watched,
                completed = watch_records.completed OR EXCLUDED.completed
            RETURNING {}
            "#,
            WATCH_COLUMNS
        ))
        .bind(record.id)
        .bind(record.profile_id)
        .bind(record.content_id)
        .bind(record.episode_number)
        .bind(record.season)
        .bind(record.progress)
        .bind(record.timestamp)
        .bind(record.last_watched)
        .bind(record.completed)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_episodes(
        &self,
        profile_id: Uuid,
        content_id: Uuid,
    ) -> AppResult<Vec<WatchRecord>> {
        let rows = sqlx::query_as::<_, WatchRow>(&format!(
            r#"
            SELECT {} FROM watch_records
            WHERE profile_id = $1 AND content_id = $2 AND episode_number IS NOT NULL
            "#,
            WATCH_COLUMNS
        ))
        .bind(profile_id)
        .bind(content_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WatchRecord::from).collect())
    }

    async fn list_for_profile(&self, profile_id: Uuid) -> AppResult<Vec<WatchRecord>> {
        let rows = sqlx::query_as::<_, WatchRow>(&format!(
            "SELECT {} FROM watch_records WHERE profile_id = $1 ORDER BY last_watched DESC",
            WATCH_COLUMNS
        ))
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WatchRecord::from).collect())
    }

    async fn count_reaching(
        &self,
        profile_id: Uuid,
        content_id: Uuid,
        threshold: f64,
    ) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM watch_records
            WHERE profile_id = $1 AND content_id = $2 AND progress >= $3
            "#,
        )
        .bind(profile_id)
        .bind(content_id)
        .bind(threshold)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn delete(&self, key: WatchKey) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM watch_records
            WHERE profile_id = $1 AND content_id = $2
              AND episode_number IS NOT DISTINCT FROM $3
              AND season IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(key.profile_id)
        .bind(key.content_id)
        .bind(key.episode.episode_number())
        .bind(key.episode.season())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
