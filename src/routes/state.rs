use std::sync::Arc;

use crate::db::{
    CatalogStore, LikeStore, MemoryStore, PgStore, ProfileStore, RedisSessionStore, SessionStore,
    UserStore, WatchStore,
};

/// Shared handler state: one trait object per collection
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub watch: Arc<dyn WatchStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub users: Arc<dyn UserStore>,
    pub likes: Arc<dyn LikeStore>,
    pub sessions: Arc<dyn SessionStore>,
    /// Default batch size for genre browsing
    pub page_size: i64,
}

impl AppState {
    /// Every collection backed by one in-process store
    pub fn in_memory(page_size: i64) -> Self {
        let store = MemoryStore::new();
        Self {
            catalog: Arc::new(store.clone()),
            watch: Arc::new(store.clone()),
            profiles: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            likes: Arc::new(store.clone()),
            sessions: Arc::new(store),
            page_size,
        }
    }

    /// Records in PostgreSQL, sessions in Redis
    pub fn persistent(store: PgStore, sessions: RedisSessionStore, page_size: i64) -> Self {
        Self {
            catalog: Arc::new(store.clone()),
            watch: Arc::new(store.clone()),
            profiles: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            likes: Arc::new(store),
            sessions: Arc::new(sessions),
            page_size,
        }
    }
}
