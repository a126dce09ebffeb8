use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::{CurrentSession, Viewer},
    services::identity,
};

use super::{
    extract::{Json, Path},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct ProfileNameRequest {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectProfileRequest {
    profile_id: Uuid,
}

pub async fn list(State(state): State<AppState>, viewer: Viewer) -> AppResult<Json<Value>> {
    let profiles = state.profiles.profiles_for_user(viewer.user_id()).await?;

    Ok(Json(json!({
        "ok": true,
        "profiles": profiles,
        "activeProfile": viewer.profile_id(),
    })))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<ProfileNameRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let profile = identity::create_profile(
        state.users.as_ref(),
        state.profiles.as_ref(),
        session.user_id,
        &request.name,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "profile": profile }))))
}

pub async fn select(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<SelectProfileRequest>,
) -> AppResult<Json<Value>> {
    let profile = identity::select_profile(
        state.profiles.as_ref(),
        state.sessions.as_ref(),
        &session,
        request.profile_id,
    )
    .await?;

    Ok(Json(json!({ "ok": true, "profile": profile })))
}

pub async fn rename(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(request): Json<ProfileNameRequest>,
) -> AppResult<Json<Value>> {
    let profile =
        identity::rename_profile(state.profiles.as_ref(), session.user_id, id, &request.name)
            .await?;

    Ok(Json(json!({ "ok": true, "profile": profile })))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    identity::delete_profile(state.users.as_ref(), state.profiles.as_ref(), session.user_id, id)
        .await?;

    Ok(Json(json!({ "ok": true })))
}
