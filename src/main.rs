use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use mapmarkers::{app, db, AppState, Config, RateLimiter, StoreKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mapmarkers=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        rate_limit_max_requests = config.rate_limit_max_requests,
        rate_limit_window_secs = config.rate_limit_window.as_secs(),
        "configuration loaded"
    );

    let db_pool = db::connect(&config.database_url, config.max_connections)
        .await
        .context("connecting to database")?;
    db::migrate(&db_pool).await?;

    let store = StoreKind::from_url(config.rate_limit_store_url.as_deref())
        .context("parsing rate limit store url")?
        .connect()
        .await
        .context("connecting to rate limit store")?;
    let limiter = Arc::new(RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window, store));
    tokio::spawn({
        let limiter = limiter.clone();
        async move {
            let mut interval = tokio::time::interval(limiter.window());
            loop {
                interval.tick().await;
                limiter.sweep().await;
            }
        }
    });

    let app_state = AppState {
        db_pool: db_pool.clone(),
        limiter,
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, app(app_state).into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
