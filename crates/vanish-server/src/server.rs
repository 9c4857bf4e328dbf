use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::store::repository;
use crate::{handlers, AppState};

/// Build the application router. Exposed separately so tests can drive
/// it in-process.
pub fn router(state: AppState, timeout: std::time::Duration) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::create))
        .route("/version", get(handlers::version))
        .route("/{key}", get(handlers::prompt).post(handlers::consume))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
}

/// Run the service until a shutdown signal arrives.
pub async fn run(cfg: Config) -> Result<()> {
    let pool = cfg.redis.create_pool()?;

    // Fail fast if the store is unreachable.
    let mut conn = pool.get().await.context("connect to redis")?;
    if !repository::is_ok(&mut conn).await {
        anyhow::bail!("redis did not answer PONG");
    }
    drop(conn);

    let state = AppState {
        pool,
        key: Arc::new(cfg.service_key()?),
        limits: cfg.limits(),
        secure: cfg.secure,
    };
    let app = router(state, cfg.handle_timeout());

    let addr: SocketAddr = cfg.addr().parse().context("invalid host/port")?;
    info!(%addr, "vanish listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind listener")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM; in-flight connections drain afterwards.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, draining connections");
}
