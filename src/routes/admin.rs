use axum::{extract::State, http::StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::AdminUser,
    models::{ContentInput, EpisodeInput},
    services::{catalog, episodes},
};

use super::{
    extract::{Json, Path},
    AppState,
};

pub async fn create_content(
    State(state): State<AppState>,
    _: AdminUser,
    Json(input): Json<ContentInput>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let content = catalog::create_content(state.catalog.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "content": content }))))
}

pub async fn update_content(
    State(state): State<AppState>,
    _: AdminUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ContentInput>,
) -> AppResult<Json<Value>> {
    let content = catalog::update_content(state.catalog.as_ref(), id, input).await?;
    Ok(Json(json!({ "ok": true, "content": content })))
}

pub async fn delete_content(
    State(state): State<AppState>,
    _: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    catalog::delete_content(state.catalog.as_ref(), id).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn list_episodes(
    State(state): State<AppState>,
    _: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let episodes = episodes::list_episodes(state.catalog.as_ref(), id).await?;
    Ok(Json(json!({ "ok": true, "episodes": episodes })))
}

pub async fn add_episode(
    State(state): State<AppState>,
    _: AdminUser,
    Path(id): Path<Uuid>,
    Json(input): Json<EpisodeInput>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let content = episodes::add_episode(state.catalog.as_ref(), id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok": true,
            "episodes": content.episodes,
            "totalEpisodes": content.total_episodes,
        })),
    ))
}

pub async fn remove_episode(
    State(state): State<AppState>,
    _: AdminUser,
    Path((id, episode_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Value>> {
    let content = episodes::remove_episode(state.catalog.as_ref(), id, episode_id).await?;
    Ok(Json(json!({
        "ok": true,
        "episodes": content.episodes,
        "totalEpisodes": content.total_episodes,
    })))
}
