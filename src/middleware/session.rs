use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Liker, Profile, Session, User},
    routes::AppState,
    services::identity,
};

fn bearer_token(parts: &Parts) -> Result<Uuid, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Expected: Bearer <token>".to_string())
    })?;

    Uuid::parse_str(token.trim())
        .map_err(|_| AppError::Unauthorized("Invalid session token".to_string()))
}

/// A valid, unexpired session
pub struct CurrentSession(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let session = state
            .sessions
            .get_session(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Session expired".to_string()))?;

        Ok(CurrentSession(session))
    }
}

/// A logged-in user and the profile they are watching as, if any
///
/// The profile is read from the store on every request; a session pointing at
/// a deleted or foreign profile behaves as if none were selected.
pub struct Viewer {
    pub session: Session,
    pub profile: Option<Profile>,
}

impl Viewer {
    pub fn user_id(&self) -> Uuid {
        self.session.user_id
    }

    pub fn profile_id(&self) -> Option<Uuid> {
        self.profile.as_ref().map(|p| p.id)
    }

    pub fn liker(&self) -> Liker {
        Liker::resolve(self.session.user_id, self.profile_id())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
        let profile = identity::active_profile(state.profiles.as_ref(), &session).await?;

        Ok(Viewer { session, profile })
    }
}

/// A session whose user currently holds the admin flag
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
        let user = state
            .users
            .get_user(session.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

        if !user.is_admin {
            tracing::warn!(user_id = %user.id, "Non-admin attempted admin access");
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/feed");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        let token = Uuid::new_v4();
        let parsed = bearer_token(&parts(Some(&format!("Bearer {}", token)))).unwrap();
        assert_eq!(parsed, token);

        assert!(matches!(bearer_token(&parts(None)), Err(AppError::Unauthorized(_))));
        assert!(matches!(
            bearer_token(&parts(Some("Basic abc"))),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            bearer_token(&parts(Some("Bearer not-a-uuid"))),
            Err(AppError::Unauthorized(_))
        ));
    }
}
