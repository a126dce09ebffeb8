use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::PgStore;
use crate::{
    db::{LikeStore, ProfileStore, UserStore},
    error::{AppError, AppResult},
    models::{Liker, Profile, User},
};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_admin, profiles, likes, created_at";

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    name: String,
    user_id: Uuid,
    likes: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            name: row.name,
            user_id: row.user_id,
            likes: row.likes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    is_admin: bool,
    profiles: Vec<Uuid>,
    likes: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
            profiles: row.profiles,
            likes: row.likes,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn insert_profile(&self, profile: &Profile) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO profiles (id, name, user_id, likes, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(profile.id)
        .bind(&profile.name)
        .bind(profile.user_id)
        .bind(&profile.likes)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, name, user_id, likes, created_at FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Profile::from))
    }

    async fn profiles_for_user(&self, user_id: Uuid) -> AppResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, name, user_id, likes, created_at FROM profiles
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Profile::from).collect())
    }

    async fn rename_profile(&self, id: Uuid, name: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE profiles SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_profile(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users
                (id, username, email, password_hash, is_admin, profiles, likes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(&user.profiles)
        .bind(&user.likes)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1 OR username = $2 LIMIT 1",
            USER_COLUMNS
        ))
        .bind(email)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn save_user_profiles(&self, user_id: Uuid, profiles: &[Uuid]) -> AppResult<()> {
        sqlx::query("UPDATE users SET profiles = $2 WHERE id = $1")
            .bind(user_id)
            .bind(profiles)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LikeStore for PgStore {
    async fn load_likes(&self, liker: Liker) -> AppResult<Option<Vec<Uuid>>> {
        let (sql, id) = match liker {
            Liker::User(id) => ("SELECT likes FROM users WHERE id = $1", id),
            Liker::Profile(id) => ("SELECT likes FROM profiles WHERE id = $1", id),
        };

        let likes = sqlx::query_scalar::<_, Vec<Uuid>>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(likes)
    }

    async fn save_likes(&self, liker: Liker, likes: &[Uuid]) -> AppResult<()> {
        let (sql, id) = match liker {
            Liker::User(id) => ("UPDATE users SET likes = $2 WHERE id = $1", id),
            Liker::Profile(id) => ("UPDATE profiles SET likes = $2 WHERE id = $1", id),
        };

        sqlx::query(sql)
            .bind(id)
            .bind(likes)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
