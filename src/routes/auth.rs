use axum::{extract::State, http::StatusCode};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::CurrentSession,
    models::{LoginRequest, RegisterRequest, UserResponse},
    services::identity,
};

use super::{extract::Json, AppState};

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let user = identity::register(state.users.as_ref(), state.profiles.as_ref(), request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "user": UserResponse::from(&user) })),
    ))
}

/// Returns the session token the client sends back as `Authorization: Bearer`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<Value>> {
    let (user, session) =
        identity::login(state.users.as_ref(), state.sessions.as_ref(), request).await?;

    Ok(Json(json!({
        "ok": true,
        "token": session.token,
        "user": UserResponse::from(&user),
        "activeProfile": session.profile_id,
    })))
}

pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<Value>> {
    identity::logout(state.sessions.as_ref(), session.token).await?;
    Ok(Json(json!({ "ok": true })))
}
