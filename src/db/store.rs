//! Storage abstractions
//!
//! Each trait covers one collection of the catalog. Handlers and services only
//! see these traits, so the PostgreSQL/Redis pair and the in-memory backend are
//! interchangeable at startup.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Content, GenreSort, Liker, Profile, Session, User, WatchKey, WatchRecord},
};

/// Content catalog: movies, series and their embedded episodes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts a new entry together with any episodes it already carries
    async fn insert_content(&self, content: &Content) -> AppResult<()>;

    async fn get_content(&self, id: Uuid) -> AppResult<Option<Content>>;

    /// Fetches several entries at once; unknown ids are skipped
    async fn get_contents(&self, ids: &[Uuid]) -> AppResult<Vec<Content>>;

    /// Persists descriptive fields; episodes are written by `save_episodes`
    async fn update_content(&self, content: &Content) -> AppResult<()>;

    /// Replaces the stored episode list and episode count of `content`
    async fn save_episodes(&self, content: &Content) -> AppResult<()>;

    async fn delete_content(&self, id: Uuid) -> AppResult<bool>;

    async fn increment_views(&self, id: Uuid) -> AppResult<bool>;

    /// Newest entries first
    async fn recent(&self, limit: i64) -> AppResult<Vec<Content>>;

    /// Case-insensitive substring match on the title
    async fn search(&self, query: &str, limit: i64) -> AppResult<Vec<Content>>;

    async fn by_genre(
        &self,
        genre: &str,
        sort: GenreSort,
        skip: i64,
        limit: i64,
    ) -> AppResult<Vec<Content>>;

    /// Every distinct genre, sorted
    async fn genres(&self) -> AppResult<Vec<String>>;

    /// Entries sharing at least one genre with `content`, excluding itself
    async fn similar(&self, content: &Content, limit: i64) -> AppResult<Vec<Content>>;
}

/// Watch-progress records keyed by (profile, content, episode, season)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WatchStore: Send + Sync {
    /// Exact key match; absent episode fields only match absent fields
    async fn find(&self, key: WatchKey) -> AppResult<Option<WatchRecord>>;

    /// Writes `record` under its key, keeping the stored id when one exists.
    /// `completed` stays true once any write has set it.
    async fn upsert(&self, record: &WatchRecord) -> AppResult<WatchRecord>;

    /// Records with an episode number for the pair, in no particular order
    async fn list_episodes(&self, profile_id: Uuid, content_id: Uuid)
        -> AppResult<Vec<WatchRecord>>;

    async fn list_for_profile(&self, profile_id: Uuid) -> AppResult<Vec<WatchRecord>>;

    /// Number of records for the pair whose progress reached `threshold`
    async fn count_reaching(
        &self,
        profile_id: Uuid,
        content_id: Uuid,
        threshold: f64,
    ) -> AppResult<i64>;

    async fn delete(&self, key: WatchKey) -> AppResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn insert_profile(&self, profile: &Profile) -> AppResult<()>;

    async fn get_profile(&self, id: Uuid) -> AppResult<Option<Profile>>;

    async fn profiles_for_user(&self, user_id: Uuid) -> AppResult<Vec<Profile>>;

    async fn rename_profile(&self, id: Uuid, name: &str) -> AppResult<bool>;

    async fn delete_profile(&self, id: Uuid) -> AppResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken
    async fn insert_user(&self, user: &User) -> AppResult<()>;

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;

    /// `email` must already be lower-cased
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> AppResult<Option<User>>;

    async fn save_user_profiles(&self, user_id: Uuid, profiles: &[Uuid]) -> AppResult<()>;
}

/// Like sets of users and profiles behind one capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LikeStore: Send + Sync {
    /// `None` when the liker does not exist
    async fn load_likes(&self, liker: Liker) -> AppResult<Option<Vec<Uuid>>>;

    async fn save_likes(&self, liker: Liker, likes: &[Uuid]) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates or replaces the session under its token
    async fn put_session(&self, session: &Session) -> AppResult<()>;

    async fn get_session(&self, token: Uuid) -> AppResult<Option<Session>>;

    async fn delete_session(&self, token: Uuid) -> AppResult<()>;
}
