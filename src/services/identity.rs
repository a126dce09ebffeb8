use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use uuid::Uuid;

use crate::{
    db::{ProfileStore, SessionStore, UserStore},
    error::{AppError, AppResult},
    models::{LoginRequest, Profile, RegisterRequest, Session, User, DEFAULT_PROFILE_NAME},
};

const MIN_PASSWORD_LEN: usize = 6;
const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Hashes `password` into an Argon2id PHC string with a fresh random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| AppError::Internal(format!("Salt encoding error: {}", e)))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing error: {}", e)))?;

    Ok(hash.to_string())
}

/// Checks `password` against a stored PHC string; malformed hashes never match
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

/// Creates an account together with its default profile
pub async fn register(
    users: &dyn UserStore,
    profiles: &dyn ProfileStore,
    request: RegisterRequest,
) -> AppResult<User> {
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_lowercase();

    if username.is_empty()
        || email.is_empty()
        || request.password.is_empty()
        || request.confirm_password.is_empty()
    {
        return Err(AppError::InvalidInput("All fields are required".to_string()));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if request.password != request.confirm_password {
        return Err(AppError::InvalidInput("Passwords do not match".to_string()));
    }

    if users
        .find_by_email_or_username(&email, &username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "A user with this email or username already exists".to_string(),
        ));
    }

    let mut user = User::new(username, email, hash_password(&request.password)?);
    users.insert_user(&user).await?;

    let profile = Profile::new(DEFAULT_PROFILE_NAME.to_string(), user.id);
    profiles.insert_profile(&profile).await?;
    user.profiles.push(profile.id);
    users.save_user_profiles(user.id, &user.profiles).await?;

    tracing::info!(user_id = %user.id, email = %user.email, "New user registered");

    Ok(user)
}

/// Verifies credentials and opens a session
///
/// An account with exactly one profile gets it selected right away.
pub async fn login(
    users: &dyn UserStore,
    sessions: &dyn SessionStore,
    request: LoginRequest,
) -> AppResult<(User, Session)> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || request.password.is_empty() {
        return Err(AppError::InvalidInput("All fields are required".to_string()));
    }

    let user = users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let mut session = Session::new(user.id);
    if let [only] = user.profiles.as_slice() {
        session.profile_id = Some(*only);
    }
    sessions.put_session(&session).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((user, session))
}

pub async fn logout(sessions: &dyn SessionStore, token: Uuid) -> AppResult<()> {
    sessions.delete_session(token).await
}

/// Resolves the session's selected profile against the store
///
/// Returns `None` when nothing is selected, or when the profile has since been
/// deleted or does not belong to the session's user.
pub async fn active_profile(
    profiles: &dyn ProfileStore,
    session: &Session,
) -> AppResult<Option<Profile>> {
    let Some(profile_id) = session.profile_id else {
        return Ok(None);
    };

    Ok(profiles
        .get_profile(profile_id)
        .await?
        .filter(|p| p.user_id == session.user_id))
}

/// Loads a profile only when `user_id` owns it
pub async fn owned_profile(
    profiles: &dyn ProfileStore,
    user_id: Uuid,
    profile_id: Uuid,
) -> AppResult<Profile> {
    profiles
        .get_profile(profile_id)
        .await?
        .filter(|p| p.user_id == user_id)
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

fn clean_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Profile name is required".to_string()));
    }
    Ok(name.to_string())
}

pub async fn create_profile(
    users: &dyn UserStore,
    profiles: &dyn ProfileStore,
    user_id: Uuid,
    name: &str,
) -> AppResult<Profile> {
    let name = clean_name(name)?;
    let mut user = users
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let profile = Profile::new(name, user_id);
    profiles.insert_profile(&profile).await?;
    user.profiles.push(profile.id);
    users.save_user_profiles(user_id, &user.profiles).await?;

    tracing::info!(user_id = %user_id, profile_id = %profile.id, "Profile created");
    Ok(profile)
}

/// Stores `profile_id` as the session's selection after checking ownership
pub async fn select_profile(
    profiles: &dyn ProfileStore,
    sessions: &dyn SessionStore,
    session: &Session,
    profile_id: Uuid,
) -> AppResult<Profile> {
    let profile = owned_profile(profiles, session.user_id, profile_id).await?;

    let mut updated = session.clone();
    updated.profile_id = Some(profile.id);
    sessions.put_session(&updated).await?;

    Ok(profile)
}

pub async fn rename_profile(
    profiles: &dyn ProfileStore,
    user_id: Uuid,
    profile_id: Uuid,
    name: &str,
) -> AppResult<Profile> {
    let name = clean_name(name)?;
    let mut profile = owned_profile(profiles, user_id, profile_id).await?;
    profiles.rename_profile(profile_id, &name).await?;
    profile.name = name;
    Ok(profile)
}

/// Deletes a profile and drops it from its owner's list
pub async fn delete_profile(
    users: &dyn UserStore,
    profiles: &dyn ProfileStore,
    user_id: Uuid,
    profile_id: Uuid,
) -> AppResult<()> {
    owned_profile(profiles, user_id, profile_id).await?;
    profiles.delete_profile(profile_id).await?;

    if let Some(mut user) = users.get_user(user_id).await? {
        user.profiles.retain(|p| *p != profile_id);
        users.save_user_profiles(user_id, &user.profiles).await?;
    }

    tracing::info!(user_id = %user_id, profile_id = %profile_id, "Profile deleted");
    Ok(())
}
