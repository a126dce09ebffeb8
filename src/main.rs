use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use streamdeck_api::{
    config::{Backend, Config},
    db::{create_pool, create_redis_client, run_migrations, PgStore, RedisSessionStore},
    routes::{create_router, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = match config.backend {
        Backend::Postgres => {
            let pool = create_pool(&config.database_url, config.max_db_connections).await?;
            run_migrations(&pool).await?;
            let redis_client = create_redis_client(&config.redis_url)?;
            AppState::persistent(
                PgStore::new(pool),
                RedisSessionStore::new(redis_client, config.session_ttl_secs),
                config.page_size,
            )
        }
        Backend::Memory => {
            tracing::warn!("Running with the in-memory backend; data is lost on restart");
            AppState::in_memory(config.page_size)
        }
    };

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, backend = ?config.backend, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
