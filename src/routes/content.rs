use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::{CurrentSession, Viewer},
    models::{BrowseQuery, PlayerQuery},
    services::{catalog, likes},
};

use super::{
    extract::{Json, Path, Query},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

pub async fn feed(State(state): State<AppState>, _: CurrentSession) -> AppResult<Json<Value>> {
    let contents = catalog::feed(state.catalog.as_ref()).await?;
    Ok(Json(json!({ "ok": true, "contents": contents })))
}

pub async fn search(
    State(state): State<AppState>,
    _: CurrentSession,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Value>> {
    let results = catalog::search(state.catalog.as_ref(), &params.q).await?;
    Ok(Json(json!({ "ok": true, "results": results })))
}

pub async fn genres(State(state): State<AppState>, _: CurrentSession) -> AppResult<Json<Value>> {
    let genres = catalog::genres(state.catalog.as_ref()).await?;
    Ok(Json(json!({ "ok": true, "genres": genres })))
}

pub async fn browse_genre(
    State(state): State<AppState>,
    _: CurrentSession,
    Path(genre): Path<String>,
    Query(query): Query<BrowseQuery>,
) -> AppResult<Json<Value>> {
    let contents =
        catalog::browse_genre(state.catalog.as_ref(), &genre, &query, state.page_size).await?;
    Ok(Json(json!({ "ok": true, "genre": genre, "contents": contents })))
}

pub async fn detail(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let detail = catalog::content_detail(
        state.catalog.as_ref(),
        state.watch.as_ref(),
        state.likes.as_ref(),
        id,
        viewer.liker(),
        viewer.profile_id(),
    )
    .await?;

    Ok(Json(json!({
        "ok": true,
        "content": detail.content,
        "liked": detail.liked,
        "seriesCompleted": detail.series_completed,
        "similar": detail.similar,
    })))
}

pub async fn player(
    State(state): State<AppState>,
    _: CurrentSession,
    Path(id): Path<Uuid>,
    Query(query): Query<PlayerQuery>,
) -> AppResult<Json<Value>> {
    let view = catalog::play(state.catalog.as_ref(), id, &query).await?;
    Ok(Json(json!({
        "ok": true,
        "content": view.content,
        "episodeNumber": view.episode_number,
        "season": view.season,
    })))
}

/// Likes go to the active profile, or to the account when none is selected
pub async fn toggle_like(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let likes = likes::toggle(state.likes.as_ref(), viewer.liker(), id).await?;
    let liked = likes.contains(&id);

    Ok(Json(json!({ "ok": true, "liked": liked, "likes": likes })))
}

pub async fn liked(State(state): State<AppState>, viewer: Viewer) -> AppResult<Json<Value>> {
    let contents =
        likes::liked_content(state.likes.as_ref(), state.catalog.as_ref(), viewer.liker()).await?;
    Ok(Json(json!({ "ok": true, "contents": contents })))
}
