use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lenient;

/// Progress percentage at which a record counts as watched
pub const COMPLETION_THRESHOLD: f64 = 95.0;

/// Which part of a title a record tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EpisodeRef {
    /// A movie, or the trailer of a series
    Title,
    /// A specific series episode
    Episode { season: i32, number: i32 },
}

impl EpisodeRef {
    /// Builds a reference from the optional pair; a lone field is not a key
    pub fn from_parts(episode_number: Option<i32>, season: Option<i32>) -> Option<Self> {
        match (episode_number, season) {
            (Some(number), Some(season)) => Some(EpisodeRef::Episode { season, number }),
            (None, None) => Some(EpisodeRef::Title),
            _ => None,
        }
    }

    pub fn episode_number(&self) -> Option<i32> {
        match self {
            EpisodeRef::Title => None,
            EpisodeRef::Episode { number, .. } => Some(*number),
        }
    }

    pub fn season(&self) -> Option<i32> {
        match self {
            EpisodeRef::Title => None,
            EpisodeRef::Episode { season, .. } => Some(*season),
        }
    }
}

/// Unique key of a watch record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchKey {
    pub profile_id: Uuid,
    pub content_id: Uuid,
    pub episode: EpisodeRef,
}

impl WatchKey {
    pub fn new(profile_id: Uuid, content_id: Uuid, episode: EpisodeRef) -> Self {
        Self {
            profile_id,
            content_id,
            episode,
        }
    }

    /// Key of the movie/trailer-level record
    pub fn title(profile_id: Uuid, content_id: Uuid) -> Self {
        Self::new(profile_id, content_id, EpisodeRef::Title)
    }
}

/// Persisted playback progress for one profile/content/episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchRecord {
    pub id: Uuid,
    #[serde(rename = "profile")]
    pub profile_id: Uuid,
    #[serde(rename = "content")]
    pub content_id: Uuid,
    pub episode_number: Option<i32>,
    pub season: Option<i32>,
    /// Percentage in [0, 100]
    pub progress: f64,
    /// Playhead position in seconds
    pub timestamp: f64,
    pub last_watched: DateTime<Utc>,
    pub completed: bool,
}

impl WatchRecord {
    /// Creates a fresh record for `key`; `completed` is derived from `progress`
    pub fn new(key: WatchKey, progress: f64, timestamp: f64) -> Self {
        let mut record = Self {
            id: Uuid::new_v4(),
            profile_id: key.profile_id,
            content_id: key.content_id,
            episode_number: key.episode.episode_number(),
            season: key.episode.season(),
            progress: 0.0,
            timestamp: 0.0,
            last_watched: Utc::now(),
            completed: false,
        };
        record.apply(progress, timestamp, record.last_watched);
        record
    }

    /// Overwrites position and marks completion; completion is never cleared
    pub fn apply(&mut self, progress: f64, timestamp: f64, at: DateTime<Utc>) {
        self.progress = progress;
        self.timestamp = timestamp;
        self.last_watched = at;
        self.completed = self.completed || reaches_completion(progress);
    }

    pub fn key(&self) -> WatchKey {
        // Records are only written through validated keys, so a lone field cannot occur
        let episode = EpisodeRef::from_parts(self.episode_number, self.season)
            .unwrap_or(EpisodeRef::Title);
        WatchKey::new(self.profile_id, self.content_id, episode)
    }
}

pub fn reaches_completion(progress: f64) -> bool {
    progress >= COMPLETION_THRESHOLD
}

/// Playback report sent by the player
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    #[serde(default, deserialize_with = "lenient::number")]
    pub progress: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub timestamp: Option<f64>,
    #[serde(default, deserialize_with = "lenient::nonzero_int")]
    pub episode_number: Option<i32>,
    #[serde(default, deserialize_with = "lenient::nonzero_int")]
    pub season: Option<i32>,
}

impl ProgressReport {
    /// Progress clamped to [0, 100]; unreadable input counts as 0
    pub fn clamped_progress(&self) -> f64 {
        self.progress.unwrap_or(0.0).clamp(0.0, 100.0)
    }

    /// Playhead clamped to be non-negative; unreadable input counts as 0
    pub fn clamped_timestamp(&self) -> f64 {
        self.timestamp.unwrap_or(0.0).max(0.0)
    }
}

/// Query string for progress lookups
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProgressQuery {
    #[serde(default, deserialize_with = "lenient::nonzero_int")]
    pub episode: Option<i32>,
    #[serde(default, deserialize_with = "lenient::nonzero_int")]
    pub season: Option<i32>,
}

impl ProgressQuery {
    /// Exact episode when both fields are given, otherwise the title-level record
    pub fn target(&self) -> EpisodeRef {
        match (self.episode, self.season) {
            (Some(number), Some(season)) => EpisodeRef::Episode { season, number },
            _ => EpisodeRef::Title,
        }
    }
}

/// Compact view of a profile's history
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchedEntry {
    pub content_id: Uuid,
    pub progress: f64,
    pub episode_number: Option<i32>,
}

impl From<&WatchRecord> for WatchedEntry {
    fn from(record: &WatchRecord) -> Self {
        Self {
            content_id: record.content_id,
            progress: record.progress,
            episode_number: record.episode_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> WatchKey {
        WatchKey::title(Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_new_record_derives_completion() {
        assert!(WatchRecord::new(key(), 95.0, 10.0).completed);
        assert!(!WatchRecord::new(key(), 94.9, 10.0).completed);
    }

    #[test]
    fn test_completion_is_a_ratchet() {
        let mut record = WatchRecord::new(key(), 97.0, 100.0);
        record.apply(10.0, 5.0, Utc::now());
        assert_eq!(record.progress, 10.0);
        assert!(record.completed);
    }

    #[test]
    fn test_report_clamping() {
        let high = ProgressReport {
            progress: Some(150.0),
            ..Default::default()
        };
        let low = ProgressReport {
            progress: Some(-5.0),
            timestamp: Some(-3.0),
            ..Default::default()
        };
        assert_eq!(high.clamped_progress(), 100.0);
        assert_eq!(low.clamped_progress(), 0.0);
        assert_eq!(low.clamped_timestamp(), 0.0);
        assert_eq!(ProgressReport::default().clamped_progress(), 0.0);
    }

    #[test]
    fn test_partial_key_is_not_a_key() {
        assert_eq!(EpisodeRef::from_parts(Some(3), None), None);
        assert_eq!(EpisodeRef::from_parts(None, Some(1)), None);
        assert_eq!(EpisodeRef::from_parts(None, None), Some(EpisodeRef::Title));
    }

    #[test]
    fn test_query_with_lone_field_degrades_to_title() {
        let lone = ProgressQuery {
            episode: Some(3),
            season: None,
        };
        let both = ProgressQuery {
            episode: Some(3),
            season: Some(2),
        };
        assert_eq!(lone.target(), EpisodeRef::Title);
        assert_eq!(
            both.target(),
            EpisodeRef::Episode {
                season: 2,
                number: 3
            }
        );
    }

    #[test]
    fn test_record_serializes_with_player_field_names() {
        let record = WatchRecord::new(key(), 50.0, 12.0);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["episodeNumber"], serde_json::Value::Null);
        assert_eq!(json["progress"], 50.0);
        assert!(json.get("profile").is_some());
        assert!(json.get("lastWatched").is_some());
    }
}
