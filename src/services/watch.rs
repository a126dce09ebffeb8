use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    db::{CatalogStore, WatchStore},
    error::{AppError, AppResult},
    models::{
        Content, EpisodeRef, ProgressQuery, ProgressReport, WatchKey, WatchRecord, WatchedEntry,
        COMPLETION_THRESHOLD,
    },
};

/// Merges a playback report into the profile's record for that title/episode
///
/// Looks the record up by its exact key and overwrites position and
/// last-watched time, or creates it. Progress is not monotonic: a lower value
/// replaces a higher one. `completed` only ever goes from false to true.
///
/// The lookup and the write are separate steps, so two simultaneous reports
/// for one key resolve as last-write-wins.
pub async fn record_progress(
    store: &dyn WatchStore,
    profile_id: Option<Uuid>,
    content_id: Uuid,
    report: &ProgressReport,
) -> AppResult<WatchRecord> {
    let profile_id = profile_id.ok_or(AppError::NoActiveProfile)?;

    let episode = EpisodeRef::from_parts(report.episode_number, report.season).ok_or_else(
        || {
            AppError::InvalidInput(
                "episodeNumber and season must be supplied together".to_string(),
            )
        },
    )?;

    let key = WatchKey::new(profile_id, content_id, episode);
    let progress = report.clamped_progress();
    let timestamp = report.clamped_timestamp();

    let record = match store.find(key).await? {
        Some(mut existing) => {
            existing.apply(progress, timestamp, Utc::now());
            existing
        }
        None => WatchRecord::new(key, progress, timestamp),
    };

    let saved = store.upsert(&record).await?;

    tracing::debug!(
        profile_id = %profile_id,
        content_id = %content_id,
        episode = ?saved.episode_number,
        season = ?saved.season,
        progress = saved.progress,
        completed = saved.completed,
        "Recorded watch progress"
    );

    Ok(saved)
}

/// Looks up one record; a missing profile or record is `None`, never an error
///
/// Both `episode` and `season` select that episode. Anything else, including
/// only one of the two, selects the title-level record.
pub async fn get_progress(
    store: &dyn WatchStore,
    profile_id: Option<Uuid>,
    content_id: Uuid,
    query: &ProgressQuery,
) -> AppResult<Option<WatchRecord>> {
    let Some(profile_id) = profile_id else {
        return Ok(None);
    };

    store
        .find(WatchKey::new(profile_id, content_id, query.target()))
        .await
}

/// All per-episode records of a title; order is unspecified
pub async fn list_episode_progress(
    store: &dyn WatchStore,
    profile_id: Option<Uuid>,
    content_id: Uuid,
) -> AppResult<Vec<WatchRecord>> {
    match profile_id {
        Some(profile_id) => store.list_episodes(profile_id, content_id).await,
        None => Ok(Vec::new()),
    }
}

/// Whether the profile has finished a series
///
/// Counts the profile's records for the series that reached the completion
/// threshold and compares the count with the current number of episodes.
/// Episodes added after a profile finished the series make this false again.
pub async fn series_completed(
    store: &dyn WatchStore,
    content: &Content,
    profile_id: Option<Uuid>,
) -> AppResult<bool> {
    if !content.is_series() || content.episodes.is_empty() {
        return Ok(false);
    }
    let Some(profile_id) = profile_id else {
        return Ok(false);
    };

    let qualifying = store
        .count_reaching(profile_id, content.id, COMPLETION_THRESHOLD)
        .await?;

    Ok(is_series_complete(qualifying, content.episodes.len()))
}

pub fn is_series_complete(qualifying_records: i64, episode_count: usize) -> bool {
    episode_count > 0 && qualifying_records >= episode_count as i64
}

/// Removes the title-level record only; per-episode records are kept
pub async fn delete_progress(
    store: &dyn WatchStore,
    profile_id: Option<Uuid>,
    content_id: Uuid,
) -> AppResult<bool> {
    let profile_id = profile_id.ok_or(AppError::NoActiveProfile)?;
    let removed = store.delete(WatchKey::title(profile_id, content_id)).await?;

    tracing::debug!(
        profile_id = %profile_id,
        content_id = %content_id,
        removed,
        "Deleted watch progress"
    );

    Ok(removed)
}

/// The profile's history, restricted to titles still in the catalog
pub async fn list_watched(
    watch: &dyn WatchStore,
    catalog: &dyn CatalogStore,
    profile_id: Option<Uuid>,
) -> AppResult<Vec<WatchedEntry>> {
    let Some(profile_id) = profile_id else {
        return Ok(Vec::new());
    };

    let records = watch.list_for_profile(profile_id).await?;
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let mut content_ids: Vec<Uuid> = records.iter().map(|r| r.content_id).collect();
    content_ids.sort();
    content_ids.dedup();

    let existing: HashSet<Uuid> = catalog
        .get_contents(&content_ids)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();

    Ok(records
        .iter()
        .filter(|r| existing.contains(&r.content_id))
        .map(WatchedEntry::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MockWatchStore;
    use crate::db::MemoryStore;
    use crate::models::{ContentInput, ContentKind, Episode};
    use tokio_test::{assert_err, assert_ok};

    fn title_report(progress: f64) -> ProgressReport {
        ProgressReport {
            progress: Some(progress),
            timestamp: Some(progress * 10.0),
            ..Default::default()
        }
    }

    fn episode_report(season: i32, number: i32, progress: f64) -> ProgressReport {
        ProgressReport {
            progress: Some(progress),
            timestamp: Some(1.0),
            episode_number: Some(number),
            season: Some(season),
        }
    }

    fn series_with(episode_count: i32) -> Content {
        let mut content = Content::new(ContentInput {
            title: "Severance".to_string(),
            kind: ContentKind::Series,
            ..Default::default()
        });
        for number in 1..=episode_count {
            content.push_episode(Episode {
                id: Uuid::new_v4(),
                season: 1,
                episode_number: Some(number),
                title: format!("Episode {}", number),
                description: None,
                duration: None,
                video_url: None,
                image_url: None,
                air_date: None,
            });
        }
        content
    }

    #[tokio::test]
    async fn test_progress_is_clamped() {
        let store = MemoryStore::new();
        let profile = Some(Uuid::new_v4());

        let high = record_progress(&store, profile, Uuid::new_v4(), &title_report(150.0))
            .await
            .unwrap();
        let low = record_progress(&store, profile, Uuid::new_v4(), &title_report(-5.0))
            .await
            .unwrap();

        assert_eq!(high.progress, 100.0);
        assert_eq!(low.progress, 0.0);
        assert_eq!(low.timestamp, 0.0);
    }

    #[tokio::test]
    async fn test_clamp_stays_in_range() {
        let store = MemoryStore::new();
        let profile = Some(Uuid::new_v4());
        for p in [-1e9, -0.5, 0.0, 42.0, 99.99, 100.0, 100.01, 1e12] {
            let record = record_progress(&store, profile, Uuid::new_v4(), &title_report(p))
                .await
                .unwrap();
            assert!((0.0..=100.0).contains(&record.progress), "{} escaped", p);
        }
    }

    #[tokio::test]
    async fn test_same_key_updates_one_record() {
        let store = MemoryStore::new();
        let profile = Uuid::new_v4();
        let content = Uuid::new_v4();

        let first = record_progress(&store, Some(profile), content, &title_report(10.0))
            .await
            .unwrap();
        let second = record_progress(&store, Some(profile), content, &title_report(40.0))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.progress, 40.0);
        assert_eq!(store.list_for_profile(profile).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_episodes_create_distinct_records() {
        let store = MemoryStore::new();
        let profile = Some(Uuid::new_v4());
        let content = Uuid::new_v4();

        record_progress(&store, profile, content, &episode_report(1, 1, 30.0))
            .await
            .unwrap();
        record_progress(&store, profile, content, &episode_report(1, 2, 30.0))
            .await
            .unwrap();

        let episodes = list_episode_progress(&store, profile, content).await.unwrap();
        assert_eq!(episodes.len(), 2);
    }

    #[tokio::test]
    async fn test_crossing_threshold_completes_and_never_reverts() {
        let store = MemoryStore::new();
        let profile = Some(Uuid::new_v4());
        let content = Uuid::new_v4();

        let below = record_progress(&store, profile, content, &title_report(94.0))
            .await
            .unwrap();
        assert!(!below.completed);

        let crossed = record_progress(&store, profile, content, &title_report(95.0))
            .await
            .unwrap();
        assert!(crossed.completed);

        let rewound = record_progress(&store, profile, content, &title_report(12.0))
            .await
            .unwrap();
        assert_eq!(rewound.progress, 12.0);
        assert!(rewound.completed);
    }

    #[tokio::test]
    async fn test_partial_episode_key_is_rejected() {
        let store = MemoryStore::new();
        let report = ProgressReport {
            progress: Some(50.0),
            episode_number: Some(3),
            ..Default::default()
        };

        let result = record_progress(&store, Some(Uuid::new_v4()), Uuid::new_v4(), &report).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_missing_profile_refused_before_store_access() {
        // A mock with no expectations panics on any call
        let store = MockWatchStore::new();

        let result = record_progress(&store, None, Uuid::new_v4(), &title_report(50.0)).await;
        assert!(matches!(result, Err(AppError::NoActiveProfile)));

        let result = delete_progress(&store, None, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NoActiveProfile)));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_immediately() {
        let mut store = MockWatchStore::new();
        store
            .expect_find()
            .times(1)
            .returning(|_| Err(AppError::Internal("connection reset".to_string())));
        store.expect_upsert().never();

        let result =
            record_progress(&store, Some(Uuid::new_v4()), Uuid::new_v4(), &title_report(50.0))
                .await;
        assert_err!(&result);
        assert!(result.unwrap_err().is_store_failure());
    }

    #[tokio::test]
    async fn test_get_without_episode_returns_title_record_only() {
        let store = MemoryStore::new();
        let profile = Some(Uuid::new_v4());
        let content = Uuid::new_v4();

        record_progress(&store, profile, content, &episode_report(1, 1, 80.0))
            .await
            .unwrap();
        record_progress(&store, profile, content, &title_report(25.0))
            .await
            .unwrap();

        let found = get_progress(&store, profile, content, &ProgressQuery::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.episode_number, None);
        assert_eq!(found.progress, 25.0);

        let lone = ProgressQuery {
            episode: Some(1),
            season: None,
        };
        let degraded = get_progress(&store, profile, content, &lone)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(degraded.id, found.id);

        let exact = ProgressQuery {
            episode: Some(1),
            season: Some(1),
        };
        let episode = get_progress(&store, profile, content, &exact)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(episode.progress, 80.0);
    }

    #[tokio::test]
    async fn test_get_for_unknown_or_missing_profile_is_none() {
        let store = MemoryStore::new();
        let query = ProgressQuery::default();
        assert_eq!(
            get_progress(&store, None, Uuid::new_v4(), &query).await.unwrap(),
            None
        );
        assert_eq!(
            get_progress(&store, Some(Uuid::new_v4()), Uuid::new_v4(), &query)
                .await
                .unwrap(),
            None
        );
        assert!(list_episode_progress(&store, None, Uuid::new_v4())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_series_completion_counts_records() {
        let store = MemoryStore::new();
        let profile = Some(Uuid::new_v4());
        let series = series_with(3);

        for number in 1..=2 {
            record_progress(&store, profile, series.id, &episode_report(1, number, 95.0))
                .await
                .unwrap();
        }
        assert!(!series_completed(&store, &series, profile).await.unwrap());

        record_progress(&store, profile, series.id, &episode_report(1, 3, 95.0))
            .await
            .unwrap();
        assert!(series_completed(&store, &series, profile).await.unwrap());
    }

    #[tokio::test]
    async fn test_series_completion_falls_behind_when_series_grows() {
        let store = MemoryStore::new();
        let profile = Some(Uuid::new_v4());
        let mut series = series_with(2);

        for number in 1..=2 {
            record_progress(&store, profile, series.id, &episode_report(1, number, 100.0))
                .await
                .unwrap();
        }
        assert!(series_completed(&store, &series, profile).await.unwrap());

        let mut extra = series.episodes[0].clone();
        extra.id = Uuid::new_v4();
        extra.episode_number = Some(3);
        series.push_episode(extra);
        assert!(!series_completed(&store, &series, profile).await.unwrap());
    }

    #[tokio::test]
    async fn test_series_completion_needs_series_with_episodes() {
        let store = MemoryStore::new();
        let profile = Some(Uuid::new_v4());

        let empty_series = series_with(0);
        assert!(!series_completed(&store, &empty_series, profile).await.unwrap());

        let mut movie = series_with(1);
        movie.kind = ContentKind::Movie;
        record_progress(&store, profile, movie.id, &title_report(100.0))
            .await
            .unwrap();
        assert!(!series_completed(&store, &movie, profile).await.unwrap());
    }

    #[test]
    fn test_is_series_complete() {
        assert!(is_series_complete(3, 3));
        assert!(is_series_complete(4, 3));
        assert!(!is_series_complete(2, 3));
        assert!(!is_series_complete(0, 0));
    }

    #[tokio::test]
    async fn test_delete_only_removes_title_record() {
        let store = MemoryStore::new();
        let profile = Some(Uuid::new_v4());
        let content = Uuid::new_v4();

        record_progress(&store, profile, content, &title_report(30.0))
            .await
            .unwrap();
        record_progress(&store, profile, content, &episode_report(1, 1, 60.0))
            .await
            .unwrap();
        record_progress(&store, profile, content, &episode_report(1, 2, 70.0))
            .await
            .unwrap();

        assert!(assert_ok!(delete_progress(&store, profile, content).await));

        let title = get_progress(&store, profile, content, &ProgressQuery::default())
            .await
            .unwrap();
        assert_eq!(title, None);
        assert_eq!(
            list_episode_progress(&store, profile, content)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_concurrent_writes_last_write_wins() {
        let store = MemoryStore::new();
        let profile = Uuid::new_v4();
        let content = Uuid::new_v4();
        let a = title_report(20.0);
        let b = title_report(70.0);

        let (ra, rb) = tokio::join!(
            record_progress(&store, Some(profile), content, &a),
            record_progress(&store, Some(profile), content, &b),
        );
        ra.unwrap();
        rb.unwrap();

        let records = store.list_for_profile(profile).await.unwrap();
        assert_eq!(records.len(), 1);
        let stored = &records[0];
        let matches_a = stored.progress == 20.0 && stored.timestamp == 200.0;
        let matches_b = stored.progress == 70.0 && stored.timestamp == 700.0;
        assert!(matches_a || matches_b);
    }

    #[tokio::test]
    async fn test_list_watched_skips_deleted_content() {
        let store = MemoryStore::new();
        let profile = Some(Uuid::new_v4());
        let kept = series_with(1);
        store.insert_content(&kept).await.unwrap();
        let gone = Uuid::new_v4();

        record_progress(&store, profile, kept.id, &episode_report(1, 1, 40.0))
            .await
            .unwrap();
        record_progress(&store, profile, gone, &title_report(40.0))
            .await
            .unwrap();

        let watched = list_watched(&store, &store, profile).await.unwrap();
        assert_eq!(watched.len(), 1);
        assert_eq!(watched[0].content_id, kept.id);
        assert_eq!(watched[0].episode_number, Some(1));
    }
}
