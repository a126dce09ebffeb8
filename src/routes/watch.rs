use axum::extract::State;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::Viewer,
    models::{ProgressQuery, ProgressReport},
    services::watch,
};

use super::{
    extract::{Json, Path, Query},
    AppState,
};

pub async fn record(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(content_id): Path<Uuid>,
    Json(report): Json<ProgressReport>,
) -> AppResult<Json<Value>> {
    let record =
        watch::record_progress(state.watch.as_ref(), viewer.profile_id(), content_id, &report)
            .await?;
    Ok(Json(json!({ "ok": true, "watch": record })))
}

/// `watch` is null when nothing was recorded or no profile is active
pub async fn fetch(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(content_id): Path<Uuid>,
    Query(query): Query<ProgressQuery>,
) -> AppResult<Json<Value>> {
    let record =
        watch::get_progress(state.watch.as_ref(), viewer.profile_id(), content_id, &query).await?;
    Ok(Json(json!({ "ok": true, "watch": record })))
}

pub async fn episodes(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(content_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let episodes =
        watch::list_episode_progress(state.watch.as_ref(), viewer.profile_id(), content_id)
            .await?;
    Ok(Json(json!({ "ok": true, "episodes": episodes })))
}

pub async fn remove(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(content_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    watch::delete_progress(state.watch.as_ref(), viewer.profile_id(), content_id).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn watched(State(state): State<AppState>, viewer: Viewer) -> AppResult<Json<Value>> {
    let watched =
        watch::list_watched(state.watch.as_ref(), state.catalog.as_ref(), viewer.profile_id())
            .await?;
    Ok(Json(json!({ "ok": true, "watched": watched })))
}
