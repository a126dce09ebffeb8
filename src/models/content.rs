use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

use super::lenient;

/// Kind of catalog entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Movie,
    Series,
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Movie => write!(f, "movie"),
            ContentKind::Series => write!(f, "series"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(ContentKind::Movie),
            "series" => Ok(ContentKind::Series),
            other => Err(format!("unknown content kind '{}'", other)),
        }
    }
}

/// A single episode embedded in a series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: Uuid,
    pub season: i32,
    /// Empty when the admin entered something unparsable
    pub episode_number: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    /// Free text such as "45 min"
    pub duration: Option<String>,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub air_date: Option<NaiveDate>,
}

/// A catalog entry: a standalone movie or a series with episodes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub title: String,
    pub year: Option<i32>,
    pub genres: Vec<String>,
    pub director: Option<String>,
    pub actors: Vec<String>,
    pub description: Option<String>,
    /// Movie file, or the trailer of a series
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub views: i64,
    pub imdb_rating: Option<String>,
    pub rotten_tomatoes_rating: Option<String>,
    pub episodes: Vec<Episode>,
    pub total_episodes: i32,
}

impl Content {
    /// Builds a new catalog entry from admin input
    pub fn new(input: ContentInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: input.kind,
            title: input.title,
            year: input.year,
            genres: input.genres,
            director: input.director,
            actors: input.actors,
            description: input.description,
            video_url: input.video_url,
            image_url: input.image_url,
            created_at: Utc::now(),
            views: 0,
            imdb_rating: input.imdb_rating,
            rotten_tomatoes_rating: input.rotten_tomatoes_rating,
            episodes: Vec::new(),
            total_episodes: 0,
        }
    }

    pub fn is_series(&self) -> bool {
        self.kind == ContentKind::Series
    }

    /// Appends an episode and resynchronizes the episode count
    pub fn push_episode(&mut self, episode: Episode) {
        self.episodes.push(episode);
        self.sync_total_episodes();
    }

    /// Removes the episode with the given id, returning whether one was removed
    pub fn remove_episode(&mut self, episode_id: Uuid) -> bool {
        let before = self.episodes.len();
        self.episodes.retain(|ep| ep.id != episode_id);
        self.sync_total_episodes();
        self.episodes.len() != before
    }

    /// Applies an admin edit; media locators are only replaced when supplied
    pub fn apply_update(&mut self, input: ContentInput) {
        self.kind = input.kind;
        self.title = input.title;
        self.year = input.year;
        self.genres = input.genres;
        self.director = input.director;
        self.actors = input.actors;
        self.description = input.description;
        if input.video_url.is_some() {
            self.video_url = input.video_url;
        }
        if input.image_url.is_some() {
            self.image_url = input.image_url;
        }
        if input.imdb_rating.is_some() {
            self.imdb_rating = input.imdb_rating;
        }
        if input.rotten_tomatoes_rating.is_some() {
            self.rotten_tomatoes_rating = input.rotten_tomatoes_rating;
        }
    }

    /// Numeric IMDb rating, when the stored text is a number
    pub fn imdb_score(&self) -> Option<f64> {
        self.imdb_rating
            .as_deref()
            .and_then(|r| r.trim().parse::<f64>().ok())
    }

    fn sync_total_episodes(&mut self) {
        self.total_episodes = self.episodes.len() as i32;
    }
}

/// Admin form for creating or editing content
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContentInput {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: ContentKind,
    #[serde(default, deserialize_with = "lenient_int")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub genres: Vec<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub actors: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub imdb_rating: Option<String>,
    #[serde(default)]
    pub rotten_tomatoes_rating: Option<String>,
}

/// Admin form for a new episode
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeInput {
    #[serde(default, deserialize_with = "lenient::raw_string")]
    pub season: Option<String>,
    #[serde(default, deserialize_with = "lenient::raw_string")]
    pub episode_number: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Ordering for genre browsing
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenreSort {
    #[default]
    Newest,
    Rating,
    Popular,
}

/// Query string for genre browsing
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BrowseQuery {
    #[serde(default, deserialize_with = "lenient_int")]
    pub skip: Option<i32>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i32>,
    #[serde(default)]
    pub sort: Option<String>,
}

impl BrowseQuery {
    /// Unknown sort names fall back to newest first
    pub fn sort(&self) -> GenreSort {
        match self.sort.as_deref() {
            Some("rating") => GenreSort::Rating,
            Some("popular") => GenreSort::Popular,
            _ => GenreSort::Newest,
        }
    }
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = lenient::raw_string(deserializer)?;
    Ok(raw.as_deref().and_then(lenient::parse_int_prefix))
}

/// Query string for the player
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PlayerQuery {
    #[serde(default, deserialize_with = "lenient::nonzero_int")]
    pub episode: Option<i32>,
    #[serde(default, deserialize_with = "lenient::nonzero_int")]
    pub season: Option<i32>,
}
