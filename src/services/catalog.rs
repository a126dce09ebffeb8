use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{CatalogStore, LikeStore, WatchStore},
    error::{AppError, AppResult},
    models::{BrowseQuery, Content, ContentInput, Liker, PlayerQuery},
    services::{likes, watch},
};

/// Entries on the home feed
pub const FEED_LIMIT: i64 = 20;
/// Maximum search results
pub const SEARCH_LIMIT: i64 = 50;
/// Related titles shown on a detail page
pub const SIMILAR_LIMIT: i64 = 6;

/// Everything the detail page shows for one title
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetail {
    pub content: Content,
    pub liked: bool,
    pub series_completed: bool,
    pub similar: Vec<Content>,
}

/// What the player needs to start playback
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub content: Content,
    pub episode_number: Option<i32>,
    pub season: Option<i32>,
}

async fn load(catalog: &dyn CatalogStore, id: Uuid) -> AppResult<Content> {
    catalog
        .get_content(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Content not found".to_string()))
}

fn validate(input: &ContentInput) -> AppResult<()> {
    if input.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title is required".to_string()));
    }
    Ok(())
}

pub async fn create_content(catalog: &dyn CatalogStore, input: ContentInput) -> AppResult<Content> {
    validate(&input)?;
    let content = Content::new(input);
    catalog.insert_content(&content).await?;

    tracing::info!(
        content_id = %content.id,
        kind = %content.kind,
        title = %content.title,
        "Content created"
    );

    Ok(content)
}

pub async fn update_content(
    catalog: &dyn CatalogStore,
    id: Uuid,
    input: ContentInput,
) -> AppResult<Content> {
    validate(&input)?;
    let mut content = load(catalog, id).await?;
    content.apply_update(input);
    catalog.update_content(&content).await?;

    tracing::info!(content_id = %id, "Content updated");
    Ok(content)
}

/// Removes a title and its episodes; watch history is left in place
pub async fn delete_content(catalog: &dyn CatalogStore, id: Uuid) -> AppResult<()> {
    if !catalog.delete_content(id).await? {
        return Err(AppError::NotFound("Content not found".to_string()));
    }
    tracing::info!(content_id = %id, "Content deleted");
    Ok(())
}

pub async fn feed(catalog: &dyn CatalogStore) -> AppResult<Vec<Content>> {
    catalog.recent(FEED_LIMIT).await
}

pub async fn search(catalog: &dyn CatalogStore, query: &str) -> AppResult<Vec<Content>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    catalog.search(query, SEARCH_LIMIT).await
}

pub async fn genres(catalog: &dyn CatalogStore) -> AppResult<Vec<String>> {
    catalog.genres().await
}

/// One batch of a genre listing
pub async fn browse_genre(
    catalog: &dyn CatalogStore,
    genre: &str,
    query: &BrowseQuery,
    page_size: i64,
) -> AppResult<Vec<Content>> {
    let skip = query.skip.map(i64::from).unwrap_or(0).max(0);
    let limit = query
        .limit
        .map(i64::from)
        .filter(|l| *l > 0)
        .unwrap_or(page_size);

    catalog.by_genre(genre, query.sort(), skip, limit).await
}

/// Detail page data for the current viewer
pub async fn content_detail(
    catalog: &dyn CatalogStore,
    watch_store: &dyn WatchStore,
    like_store: &dyn LikeStore,
    id: Uuid,
    liker: Liker,
    profile_id: Option<Uuid>,
) -> AppResult<ContentDetail> {
    let content = load(catalog, id).await?;

    let liked = likes::is_liked(like_store, liker, content.id).await?;
    let series_completed = watch::series_completed(watch_store, &content, profile_id).await?;
    let similar = if content.genres.is_empty() {
        Vec::new()
    } else {
        catalog.similar(&content, SIMILAR_LIMIT).await?
    };

    Ok(ContentDetail {
        content,
        liked,
        series_completed,
        similar,
    })
}

/// Counts a view and echoes the requested episode
pub async fn play(
    catalog: &dyn CatalogStore,
    id: Uuid,
    query: &PlayerQuery,
) -> AppResult<PlayerView> {
    if !catalog.increment_views(id).await? {
        return Err(AppError::NotFound("Content not found".to_string()));
    }
    let content = load(catalog, id).await?;

    Ok(PlayerView {
        content,
        episode_number: query.episode,
        season: query.season,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MockCatalogStore;
    use crate::db::MemoryStore;
    use crate::models::ContentKind;

    fn input(title: &str, genres: &[&str]) -> ContentInput {
        ContentInput {
            title: title.to_string(),
            kind: ContentKind::Movie,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let store = MemoryStore::new();
        let result = create_content(&store, input("   ", &[])).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_empty_search_skips_store() {
        let store = MockCatalogStore::new();
        assert!(search(&store, "  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let store = MemoryStore::new();
        create_content(&store, input("The Matrix", &["Sci-Fi"]))
            .await
            .unwrap();
        create_content(&store, input("Heat", &["Crime"])).await.unwrap();

        let results = search(&store, "matrix").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "The Matrix");
    }

    #[tokio::test]
    async fn test_browse_uses_page_size_by_default() {
        let mut store = MockCatalogStore::new();
        store
            .expect_by_genre()
            .withf(|genre, _, skip, limit| genre == "Drama" && *skip == 0 && *limit == 12)
            .times(1)
            .returning(|_, _, _, _| Ok(Vec::new()));

        browse_genre(&store, "Drama", &BrowseQuery::default(), 12)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_play_counts_views() {
        let store = MemoryStore::new();
        let content = create_content(&store, input("Heat", &["Crime"])).await.unwrap();

        let query = PlayerQuery {
            episode: Some(2),
            season: Some(1),
        };
        let view = play(&store, content.id, &query).await.unwrap();
        assert_eq!(view.content.views, 1);
        assert_eq!(view.episode_number, Some(2));

        let missing = play(&store, Uuid::new_v4(), &PlayerQuery::default()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_keeps_episodes() {
        let store = MemoryStore::new();
        let mut series = input("Dark", &["Drama"]);
        series.kind = ContentKind::Series;
        let content = create_content(&store, series).await.unwrap();
        crate::services::episodes::add_episode(
            &store,
            content.id,
            crate::models::EpisodeInput {
                season: Some("1".to_string()),
                episode_number: Some("1".to_string()),
                title: "Secrets".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let mut edit = input("Dark (2017)", &["Drama", "Mystery"]);
        edit.kind = ContentKind::Series;
        update_content(&store, content.id, edit).await.unwrap();

        let stored = store.get_content(content.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Dark (2017)");
        assert_eq!(stored.total_episodes, 1);
        assert_eq!(stored.genres, vec!["Drama", "Mystery"]);
    }

    #[tokio::test]
    async fn test_delete_missing_content_is_not_found() {
        let store = MemoryStore::new();
        let result = delete_content(&store, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
