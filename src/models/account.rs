use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name given to the profile created alongside every new account
pub const DEFAULT_PROFILE_NAME: &str = "Main";

/// A viewer persona owned by a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(name: String, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            user_id,
            likes: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// An account holder
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Always lower-cased
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub is_admin: bool,
    pub profiles: Vec<Uuid>,
    /// User-level likes from before profiles existed
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            is_admin: false,
            profiles: Vec::new(),
            likes: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Public view of a user; never carries the password hash
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub profiles: Vec<Uuid>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            profiles: user.profiles.clone(),
        }
    }
}

/// A logged-in browser or device.
///
/// Only identifiers live here; the profile itself is looked up on every
/// request so renames and deletions are seen immediately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: Uuid,
    pub user_id: Uuid,
    pub profile_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            token: Uuid::new_v4(),
            user_id,
            profile_id: None,
            created_at: Utc::now(),
        }
    }
}

/// Who a like belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Liker {
    /// Legacy sessions without a selected profile
    User(Uuid),
    Profile(Uuid),
}

impl Liker {
    /// Prefers the active profile, falling back to the account
    pub fn resolve(user_id: Uuid, active_profile: Option<Uuid>) -> Self {
        match active_profile {
            Some(profile_id) => Liker::Profile(profile_id),
            None => Liker::User(user_id),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}
