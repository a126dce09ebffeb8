use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use super::{like_pattern, PgStore};
use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{Content, ContentKind, Episode, GenreSort},
};

const CONTENT_COLUMNS: &str = "id, kind, title, year, genres, director, actors, description, \
     video_url, image_url, created_at, views, imdb_rating, rotten_tomatoes_rating, total_episodes";

#[derive(Debug, FromRow)]
struct ContentRow {
    id: Uuid,
    kind: String,
    title: String,
    year: Option<i32>,
    genres: Vec<String>,
    director: Option<String>,
    actors: Vec<String>,
    description: Option<String>,
    video_url: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    views: i64,
    imdb_rating: Option<String>,
    rotten_tomatoes_rating: Option<String>,
    total_episodes: i32,
}

#[derive(Debug, FromRow)]
struct EpisodeRow {
    id: Uuid,
    content_id: Uuid,
    season: i32,
    episode_number: Option<i32>,
    title: String,
    description: Option<String>,
    duration: Option<String>,
    video_url: Option<String>,
    image_url: Option<String>,
    air_date: Option<NaiveDate>,
}

impl From<EpisodeRow> for Episode {
    fn from(row: EpisodeRow) -> Self {
        Episode {
            id: row.id,
            season: row.season,
            episode_number: row.episode_number,
            title: row.title,
            description: row.description,
            duration: row.duration,
            video_url: row.video_url,
            image_url: row.image_url,
            air_date: row.air_date,
        }
    }
}

impl ContentRow {
    fn into_content(self, episodes: Vec<Episode>) -> AppResult<Content> {
        let kind: ContentKind = self.kind.parse().map_err(AppError::Internal)?;
        Ok(Content {
            id: self.id,
            kind,
            title: self.title,
            year: self.year,
            genres: self.genres,
            director: self.director,
            actors: self.actors,
            description: self.description,
            video_url: self.video_url,
            image_url: self.image_url,
            created_at: self.created_at,
            views: self.views,
            imdb_rating: self.imdb_rating,
            rotten_tomatoes_rating: self.rotten_tomatoes_rating,
            episodes,
            total_episodes: self.total_episodes,
        })
    }
}

fn genre_order(sort: GenreSort) -> &'static str {
    match sort {
        GenreSort::Newest => "created_at DESC",
        GenreSort::Rating => {
            r"CASE WHEN imdb_rating ~ '^\s*[0-9]+(\.[0-9]+)?\s*$' THEN trim(imdb_rating)::float8 END DESC NULLS LAST, created_at DESC"
        }
        GenreSort::Popular => "views DESC, created_at DESC",
    }
}

impl PgStore {
    /// Attaches episodes to content rows, preserving row order
    async fn hydrate(&self, rows: Vec<ContentRow>) -> AppResult<Vec<Content>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let episode_rows = sqlx::query_as::<_, EpisodeRow>(
            r#"
            SELECT id, content_id, season, episode_number, title, description,
                   duration, video_url, image_url, air_date
            FROM episodes
            WHERE content_id = ANY($1)
            ORDER BY content_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_content: HashMap<Uuid, Vec<Episode>> = HashMap::new();
        for row in episode_rows {
            by_content
                .entry(row.content_id)
                .or_default()
                .push(Episode::from(row));
        }

        rows.into_iter()
            .map(|row| {
                let episodes = by_content.remove(&row.id).unwrap_or_default();
                row.into_content(episodes)
            })
            .collect()
    }

    async fn write_episodes(
        tx: &mut Transaction<'_, Postgres>,
        content_id: Uuid,
        episodes: &[Episode],
    ) -> AppResult<()> {
        for (position, episode) in episodes.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO episodes
                    (id, content_id, position, season, episode_number, title,
                     description, duration, video_url, image_url, air_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(episode.id)
            .bind(content_id)
            .bind(position as i32)
            .bind(episode.season)
            .bind(episode.episode_number)
            .bind(&episode.title)
            .bind(&episode.description)
            .bind(&episode.duration)
            .bind(&episode.video_url)
            .bind(&episode.image_url)
            .bind(episode.air_date)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn insert_content(&self, content: &Content) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO contents
                (id, kind, title, year, genres, director, actors, description, video_url,
                 image_url, created_at, views, imdb_rating, rotten_tomatoes_rating, total_episodes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(content.id)
        .bind(content.kind.to_string())
        .bind(&content.title)
        .bind(content.year)
        .bind(&content.genres)
        .bind(&content.director)
        .bind(&content.actors)
        .bind(&content.description)
        .bind(&content.video_url)
        .bind(&content.image_url)
        .bind(content.created_at)
        .bind(content.views)
        .bind(&content.imdb_rating)
        .bind(&content.rotten_tomatoes_rating)
        .bind(content.total_episodes)
        .execute(&mut *tx)
        .await?;

        Self::write_episodes(&mut tx, content.id, &content.episodes).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn get_content(&self, id: Uuid) -> AppResult<Option<Content>> {
        let row = sqlx::query_as::<_, ContentRow>(&format!(
            "SELECT {} FROM contents WHERE id = $1",
            CONTENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn get_contents(&self, ids: &[Uuid]) -> AppResult<Vec<Content>> {
        let rows = sqlx::query_as::<_, ContentRow>(&format!(
            "SELECT {} FROM contents WHERE id = ANY($1)",
            CONTENT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn update_content(&self, content: &Content) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE contents
            SET kind = $2, title = $3, year = $4, genres = $5, director = $6, actors = $7,
                description = $8, video_url = $9, image_url = $10, imdb_rating = $11,
                rotten_tomatoes_rating = $12
            WHERE id = $1
            "#,
        )
        .bind(content.id)
        .bind(content.kind.to_string())
        .bind(&content.title)
        .bind(content.year)
        .bind(&content.genres)
        .bind(&content.director)
        .bind(&content.actors)
        .bind(&content.description)
        .bind(&content.video_url)
        .bind(&content.image_url)
        .bind(&content.imdb_rating)
        .bind(&content.rotten_tomatoes_rating)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_episodes(&self, content: &Content) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM episodes WHERE content_id = $1")
            .bind(content.id)
            .execute(&mut *tx)
            .await?;

        Self::write_episodes(&mut tx, content.id, &content.episodes).await?;

        sqlx::query("UPDATE contents SET total_episodes = $2 WHERE id = $1")
            .bind(content.id)
            .bind(content.total_episodes)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_content(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM contents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_views(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("UPDATE contents SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn recent(&self, limit: i64) -> AppResult<Vec<Content>> {
        let rows = sqlx::query_as::<_, ContentRow>(&format!(
            "SELECT {} FROM contents ORDER BY created_at DESC LIMIT $1",
            CONTENT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn search(&self, query: &str, limit: i64) -> AppResult<Vec<Content>> {
        let rows = sqlx::query_as::<_, ContentRow>(&format!(
            r"SELECT {} FROM contents WHERE title ILIKE $1 ESCAPE '\' ORDER BY created_at DESC LIMIT $2",
            CONTENT_COLUMNS
        ))
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn by_genre(
        &self,
        genre: &str,
        sort: GenreSort,
        skip: i64,
        limit: i64,
    ) -> AppResult<Vec<Content>> {
        let rows = sqlx::query_as::<_, ContentRow>(&format!(
            "SELECT {} FROM contents WHERE $1 = ANY(genres) ORDER BY {} OFFSET $2 LIMIT $3",
            CONTENT_COLUMNS,
            genre_order(sort)
        ))
        .bind(genre)
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn genres(&self) -> AppResult<Vec<String>> {
        let genres = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT genre FROM contents, unnest(genres) AS genre ORDER BY genre",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(genres)
    }

    async fn similar(&self, content: &Content, limit: i64) -> AppResult<Vec<Content>> {
        let rows = sqlx::query_as::<_, ContentRow>(&format!(
            "SELECT {} FROM contents WHERE id <> $1 AND genres && $2 ORDER BY created_at DESC LIMIT $3",
            CONTENT_COLUMNS
        ))
        .bind(content.id)
        .bind(&content.genres)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }
}
