use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{lenient::parse_int_prefix, Content, Episode, EpisodeInput},
};

/// Builds an episode from the admin form
///
/// Season falls back to 1 when missing, zero or unparsable. An unparsable
/// episode number is kept as empty rather than rejected.
pub fn episode_from_input(input: EpisodeInput) -> Episode {
    let season = input
        .season
        .as_deref()
        .and_then(parse_int_prefix)
        .filter(|s| *s != 0)
        .unwrap_or(1);

    let episode_number = input.episode_number.as_deref().and_then(parse_int_prefix);
    if episode_number.is_none() {
        tracing::warn!(
            raw = ?input.episode_number,
            title = %input.title,
            "Episode number could not be parsed; storing episode without one"
        );
    }

    let air_date = input
        .air_date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

    Episode {
        id: Uuid::new_v4(),
        season,
        episode_number,
        title: input.title,
        description: input.description,
        duration: input.duration,
        video_url: input.video_url,
        image_url: input.image_url,
        air_date,
    }
}

async fn load(catalog: &dyn CatalogStore, content_id: Uuid) -> AppResult<Content> {
    catalog
        .get_content(content_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Series not found".to_string()))
}

pub async fn list_episodes(catalog: &dyn CatalogStore, content_id: Uuid) -> AppResult<Vec<Episode>> {
    Ok(load(catalog, content_id).await?.episodes)
}

/// Appends an episode; (season, number) duplicates are allowed
pub async fn add_episode(
    catalog: &dyn CatalogStore,
    content_id: Uuid,
    input: EpisodeInput,
) -> AppResult<Content> {
    let mut content = load(catalog, content_id).await?;
    let episode = episode_from_input(input);
    let episode_id = episode.id;

    content.push_episode(episode);
    catalog.save_episodes(&content).await?;

    tracing::info!(
        content_id = %content_id,
        episode_id = %episode_id,
        total_episodes = content.total_episodes,
        "Episode added"
    );

    Ok(content)
}

/// Drops the episode with `episode_id`; an unknown id leaves the list unchanged
pub async fn remove_episode(
    catalog: &dyn CatalogStore,
    content_id: Uuid,
    episode_id: Uuid,
) -> AppResult<Content> {
    let mut content = load(catalog, content_id).await?;
    let removed = content.remove_episode(episode_id);
    catalog.save_episodes(&content).await?;

    tracing::info!(
        content_id = %content_id,
        episode_id = %episode_id,
        removed,
        total_episodes = content.total_episodes,
        "Episode removed"
    );

    Ok(content)
}
