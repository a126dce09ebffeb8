use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

pub mod admin;
pub mod auth;
pub mod content;
pub mod extract;
pub mod profiles;
pub mod state;
pub mod watch;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .nest("/profiles", profile_routes())
        .nest("/api", api_routes())
        .nest("/admin", admin_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profiles::list).post(profiles::create))
        .route("/select", post(profiles::select))
        .route("/:id", put(profiles::rename).delete(profiles::remove))
}

/// Viewer-facing routes; all require a session
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/feed", get(content::feed))
        .route("/search", get(content::search))
        .route("/genres", get(content::genres))
        .route("/genre/:genre", get(content::browse_genre))
        .route("/content/:id", get(content::detail))
        .route("/content/:id/like", post(content::toggle_like))
        .route("/liked", get(content::liked))
        .route("/player/:id", get(content::player))
        .route(
            "/watch/:content_id",
            post(watch::record).get(watch::fetch).delete(watch::remove),
        )
        .route("/watch/:content_id/episodes", get(watch::episodes))
        .route("/profile/watched", get(watch::watched))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/content", post(admin::create_content))
        .route(
            "/content/:id",
            put(admin::update_content).delete(admin::delete_content),
        )
        .route(
            "/series/:id/episodes",
            get(admin::list_episodes).post(admin::add_episode),
        )
        .route(
            "/series/:id/episodes/:episode_id",
            delete(admin::remove_episode),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
