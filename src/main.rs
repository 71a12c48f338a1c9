//! Service entry point: configuration, container wiring, graceful shutdown.

use tracing::info;
use tracing_subscriber::EnvFilter;

use clinicroute::app::{create_router, AppContainer};
use clinicroute::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    let container = match &config.database_url {
        Some(url) => {
            info!("connecting to postgres");
            AppContainer::new_postgres(&config, url).await?
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            AppContainer::new_memory(&config)
        }
    };

    let app = create_router(container);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "clinicroute listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
