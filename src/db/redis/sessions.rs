use async_trait::async_trait;
use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use uuid::Uuid;

use crate::db::SessionStore;
use crate::error::AppError;
use crate::error::AppResult;
use crate::models::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Token(Uuid),
}

impl Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKey::Token(token) => write!(f, "session:{}", token),
        }
    }
}

/// Creates a Redis client for session storage
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Login sessions stored in Redis as JSON with a sliding TTL
#[derive(Clone)]
pub struct RedisSessionStore {
    redis_client: Client,
    ttl: u64,
}

impl RedisSessionStore {
    pub fn new(redis_client: Client, ttl: u64) -> Self {
        Self { redis_client, ttl }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put_session(&self, session: &Session) -> AppResult<()> {
        let json = serde_json::to_string(session)
            .map_err(|e| AppError::Internal(format!("Session serialization error: {}", e)))?;

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .set_ex(SessionKey::Token(session.token).to_string(), json, self.ttl)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Redis set failed");
                e
            })?;

        Ok(())
    }

    async fn get_session(&self, token: Uuid) -> AppResult<Option<Session>> {
        let key = SessionKey::Token(token).to_string();
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(&key).await?;

        match cached {
            Some(json) => {
                let session = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Session deserialization error: {}", e))
                })?;
                // Each use extends the session lifetime
                let _: () = conn.expire(&key, self.ttl as i64).await?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, token: Uuid) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(SessionKey::Token(token).to_string()).await?;
        Ok(())
    }
}
