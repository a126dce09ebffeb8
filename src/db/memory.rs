use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::{CatalogStore, LikeStore, ProfileStore, SessionStore, UserStore, WatchStore},
    error::{AppError, AppResult},
    models::{Content, GenreSort, Liker, Profile, Session, User, WatchKey, WatchRecord},
};

/// In-process backend implementing every store
///
/// Used for local development and tests. Each collection sits behind its own
/// lock; like the database backend, operations spanning two calls are not atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    contents: Arc<RwLock<HashMap<Uuid, Content>>>,
    watch: Arc<RwLock<HashMap<WatchKey, WatchRecord>>>,
    profiles: Arc<RwLock<HashMap<Uuid, Profile>>>,
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(a: &Content, b: &Content) -> Ordering {
    b.created_at.cmp(&a.created_at)
}

fn take_page(mut items: Vec<Content>, skip: i64, limit: i64) -> Vec<Content> {
    let skip = skip.max(0) as usize;
    let limit = limit.max(0) as usize;
    if skip >= items.len() {
        return Vec::new();
    }
    items.drain(..skip);
    items.truncate(limit);
    items
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn insert_content(&self, content: &Content) -> AppResult<()> {
        self.contents
            .write()
            .await
            .insert(content.id, content.clone());
        Ok(())
    }

    async fn get_content(&self, id: Uuid) -> AppResult<Option<Content>> {
        Ok(self.contents.read().await.get(&id).cloned())
    }

    async fn get_contents(&self, ids: &[Uuid]) -> AppResult<Vec<Content>> {
        let contents = self.contents.read().await;
        Ok(ids.iter().filter_map(|id| contents.get(id).cloned()).collect())
    }

    async fn update_content(&self, content: &Content) -> AppResult<()> {
        let mut contents = self.contents.write().await;
        if let Some(stored) = contents.get_mut(&content.id) {
            let episodes = std::mem::take(&mut stored.episodes);
            let total_episodes = stored.total_episodes;
            let views = stored.views;
            *stored = content.clone();
            stored.episodes = episodes;
            stored.total_episodes = total_episodes;
            stored.views = views;
        }
        Ok(())
    }

    async fn save_episodes(&self, content: &Content) -> AppResult<()> {
        let mut contents = self.contents.write().await;
        if let Some(stored) = contents.get_mut(&content.id) {
            stored.episodes = content.episodes.clone();
            stored.total_episodes = content.total_episodes;
        }
        Ok(())
    }

    async fn delete_content(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.contents.write().await.remove(&id).is_some())
    }

    async fn increment_views(&self, id: Uuid) -> AppResult<bool> {
        let mut contents = self.contents.write().await;
        match contents.get_mut(&id) {
            Some(content) => {
                content.views += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn recent(&self, limit: i64) -> AppResult<Vec<Content>> {
        let mut items: Vec<Content> = self.contents.read().await.values().cloned().collect();
        items.sort_by(newest_first);
        Ok(take_page(items, 0, limit))
    }

    async fn search(&self, query: &str, limit: i64) -> AppResult<Vec<Content>> {
        let needle = query.to_lowercase();
        let mut items: Vec<Content> = self
            .contents
            .read()
            .await
            .values()
            .filter(|c| c.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        items.sort_by(newest_first);
        Ok(take_page(items, 0, limit))
    }

    async fn by_genre(
        &self,
        genre: &str,
        sort: GenreSort,
        skip: i64,
        limit: i64,
    ) -> AppResult<Vec<Content>> {
        let mut items: Vec<Content> = self
            .contents
            .read()
            .await
            .values()
            .filter(|c| c.genres.iter().any(|g| g == genre))
            .cloned()
            .collect();

        match sort {
            GenreSort::Newest => items.sort_by(newest_first),
            GenreSort::Popular => {
                items.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| newest_first(a, b)))
            }
            GenreSort::Rating => items.sort_by(|a, b| {
                // Unrated entries go last
                match (a.imdb_score(), b.imdb_score()) {
                    (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
                .then_with(|| newest_first(a, b))
            }),
        }

        Ok(take_page(items, skip, limit))
    }

    async fn genres(&self) -> AppResult<Vec<String>> {
        let genres: BTreeSet<String> = self
            .contents
            .read()
            .await
            .values()
            .flat_map(|c| c.genres.iter().cloned())
            .collect();
        Ok(genres.into_iter().collect())
    }

    async fn similar(&self, content: &Content, limit: i64) -> AppResult<Vec<Content>> {
        let mut items: Vec<Content> = self
            .contents
            .read()
            .await
            .values()
            .filter(|c| c.id != content.id && c.genres.iter().any(|g| content.genres.contains(g)))
            .cloned()
            .collect();
        items.sort_by(newest_first);
        Ok(take_page(items, 0, limit))
    }
}

#[async_trait]
impl WatchStore for MemoryStore {
    async fn find(&self, key: WatchKey) -> AppResult<Option<WatchRecord>> {
        Ok(self.watch.read().await.get(&key).cloned())
    }

    async fn upsert(&self, record: &WatchRecord) -> AppResult<WatchRecord> {
        let mut watch = self.watch.write().await;
        let stored = watch
            .entry(record.key())
            .and_modify(|existing| {
                existing.progress = record.progress;
                existing.timestamp = record.timestamp;
                existing.last_watched = record.last_watched;
                existing.completed = existing.completed || record.completed;
            })
            .or_insert_with(|| record.clone());
        Ok(stored.clone())
    }

    async fn list_episodes(
        &self,
        profile_id: Uuid,
        content_id: Uuid,
    ) -> AppResult<Vec<WatchRecord>> {
        Ok(self
            .watch
            .read()
            .await
            .values()
            .filter(|r| {
                r.profile_id == profile_id && r.content_id == content_id && r.episode_number.is_some()
            })
            .cloned()
            .collect())
    }

    async fn list_for_profile(&self, profile_id: Uuid) -> AppResult<Vec<WatchRecord>> {
        let mut records: Vec<WatchRecord> = self
            .watch
            .read()
            .await
            .values()
            .filter(|r| r.profile_id == profile_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.last_watched.cmp(&a.last_watched));
        Ok(records)
    }

    async fn count_reaching(
        &self,
        profile_id: Uuid,
        content_id: Uuid,
        threshold: f64,
    ) -> AppResult<i64> {
        let count = self
            .watch
            .read()
            .await
            .values()
            .filter(|r| {
                r.profile_id == profile_id && r.content_id == content_id && r.progress >= threshold
            })
            .count();
        Ok(count as i64)
    }

    async fn delete(&self, key: WatchKey) -> AppResult<bool> {
        Ok(self.watch.write().await.remove(&key).is_some())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn insert_profile(&self, profile: &Profile) -> AppResult<()> {
        self.profiles
            .write()
            .await
            .insert(profile.id, profile.clone());
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn profiles_for_user(&self, user_id: Uuid) -> AppResult<Vec<Profile>> {
        let mut profiles: Vec<Profile> = self
            .profiles
            .read()
            .await
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(profiles)
    }

    async fn rename_profile(&self, id: Uuid, name: &str) -> AppResult<bool> {
        let mut profiles = self.profiles.write().await;
        match profiles.get_mut(&id) {
            Some(profile) => {
                profile.name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_profile(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.profiles.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email || u.username == username)
            .cloned())
    }

    async fn save_user_profiles(&self, user_id: Uuid, profiles: &[Uuid]) -> AppResult<()> {
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.profiles = profiles.to_vec();
        }
        Ok(())
    }
}

#[async_trait]
impl LikeStore for MemoryStore {
    async fn load_likes(&self, liker: Liker) -> AppResult<Option<Vec<Uuid>>> {
        Ok(match liker {
            Liker::User(id) => self.users.read().await.get(&id).map(|u| u.likes.clone()),
            Liker::Profile(id) => self.profiles.read().await.get(&id).map(|p| p.likes.clone()),
        })
    }

    async fn save_likes(&self, liker: Liker, likes: &[Uuid]) -> AppResult<()> {
        match liker {
            Liker::User(id) => {
                if let Some(user) = self.users.write().await.get_mut(&id) {
                    user.likes = likes.to_vec();
                }
            }
            Liker::Profile(id) => {
                if let Some(profile) = self.profiles.write().await.get_mut(&id) {
                    profile.likes = likes.to_vec();
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn put_session(&self, session: &Session) -> AppResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.token, session.clone());
        Ok(())
    }

    async fn get_session(&self, token: Uuid) -> AppResult<Option<Session>> {
        Ok(self.sessions.read().await.get(&token).cloned())
    }

    async fn delete_session(&self, token: Uuid) -> AppResult<()> {
        self.sessions.write().await.remove(&token);
        Ok(())
    }
}
