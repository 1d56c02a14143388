use std::sync::Arc;

use task_backend::config::{Config, StoreBackend};
use task_backend::routes::ROUTES;
use task_backend::{router, AppState, InMemoryTaskRepository, RedisTaskRepository, TaskRepository};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;

    let repository: Arc<dyn TaskRepository> = match &config.store {
        StoreBackend::Redis { url, key_prefix } => {
            let repo = RedisTaskRepository::connect(url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to Redis at {url}: {e}"))?
                .with_prefix(key_prefix.clone())
                .with_timeout(config.store_timeout);
            tracing::info!(%url, %key_prefix, "using redis task store");
            Arc::new(repo)
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory task store; data is lost on exit");
            Arc::new(InMemoryTaskRepository::new())
        }
    };

    let state = AppState::new(repository).with_request_timeout(config.request_timeout);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server starting");
    for (method, path) in ROUTES {
        tracing::info!("  {method:<6} {path}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("task_backend=debug,tower_http=debug,info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
