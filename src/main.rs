use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moviechooser_api::{
    api::{create_router, AppState, JwtVerifier},
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, Cache, MovieStore, PgStore, WatchlistStore},
    services::{HttpListingHarvester, IngestService, Normalizer, OmdbProvider, RateLimiter},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moviechooser_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;
    run_migrations(&pool).await.context("Failed to run migrations")?;
    let store = PgStore::new(pool);

    // Cache is optional; without it every ingestion hits OMDB
    let (cache, cache_writer) = match &config.redis_url {
        Some(url) => {
            let client = create_redis_client(url)?;
            let (cache, writer) = Cache::connect(client)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("Redis cache enabled");
            (Some(cache), Some(writer))
        }
        None => {
            tracing::info!("REDIS_URL not set, provider cache disabled");
            (None, None)
        }
    };

    let provider = OmdbProvider::new(config.omdb(), cache)?;
    let movies: Arc<dyn MovieStore> = Arc::new(store.clone());
    let watchlists: Arc<dyn WatchlistStore> = Arc::new(store);
    let (min_delay, max_delay) = config.ingest_delay_range();

    let ingest = IngestService::new(
        Normalizer::new(Arc::new(provider)),
        Arc::clone(&movies),
        Arc::new(HttpListingHarvester::default()),
        RateLimiter::new(min_delay, max_delay),
    );

    let state = AppState::new(movies, watchlists, ingest, JwtVerifier::new(&config.jwt_secret));
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
