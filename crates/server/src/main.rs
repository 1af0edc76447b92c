use std::future::{Future, IntoFuture};

use anyhow::{self, Error as AnyhowError};
use db::DbErr;
use deployment::{Deployment, DeploymentError};
use server::{DeploymentImpl, http};
use strip_ansi_escapes::strip;
use thiserror::Error;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, prelude::*};
use utils_assets::asset_dir;

const GRACEFUL_SHUTDOWN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum CaritasError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

fn spawn_background<F>(task: F) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(task)
}

#[tokio::main]
async fn main() -> Result<(), CaritasError> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},services={level},db={level},deployment={level},local_deployment={level},utils_core={level},tower_http={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).map_err(anyhow::Error::from)?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    if !asset_dir().exists() {
        std::fs::create_dir_all(asset_dir())?;
    }

    let deployment = DeploymentImpl::new().await?;
    deployment.log_cache_settings().await;

    // Sessions that lapsed while the server was down.
    let auth = deployment.auth().clone();
    spawn_background(async move {
        match auth.expire_stale().await {
            Ok(0) => {}
            Ok(expired) => tracing::info!(expired, "Expired stale admin sessions"),
            Err(err) => tracing::warn!("Failed to expire stale sessions: {}", err),
        }
    });

    let app_router = http::router(deployment.clone());

    let port = std::env::var("BACKEND_PORT")
        .or_else(|_| std::env::var("PORT"))
        .ok()
        .and_then(|s| {
            let cleaned = String::from_utf8(strip(s.as_bytes())).ok()?;
            cleaned.trim().parse::<u16>().ok()
        })
        .unwrap_or_else(|| {
            tracing::info!("No PORT environment variable set, using {DEFAULT_PORT}");
            DEFAULT_PORT
        });

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    let actual_port = listener.local_addr()?.port();

    tracing::info!("Server running on http://{host}:{actual_port}");

    let shutdown = spawn_signal_watcher();

    let server = axum::serve(
        listener,
        app_router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(wait_for_signal(shutdown.clone(), 1))
    .into_future();
    tokio::pin!(server);

    tokio::select! {
        res = &mut server => res?,
        _ = wait_for_signal(shutdown.clone(), 2) => {
            tracing::warn!("Second shutdown signal received, exiting immediately");
            std::process::exit(130);
        }
        _ = async {
            wait_for_signal(shutdown.clone(), 1).await;
            tokio::time::sleep(GRACEFUL_SHUTDOWN_TIMEOUT).await;
        } => {
            tracing::warn!(
                timeout = ?GRACEFUL_SHUTDOWN_TIMEOUT,
                "Graceful shutdown timed out, exiting immediately"
            );
            std::process::exit(130);
        }
    }

    Ok(())
}

/// Counts SIGINT/SIGTERM deliveries. The first one drains open requests,
/// the second one aborts the process.
fn spawn_signal_watcher() -> watch::Receiver<u8> {
    let (tx, rx) = watch::channel(0u8);

    tokio::spawn(async move {
        loop {
            if let Err(err) = next_signal().await {
                tracing::error!("Failed to listen for shutdown signals: {err}");
                return;
            }
            let count = *tx.borrow() + 1;
            if count == 1 {
                tracing::info!("Shutting down (press Ctrl+C again to force)");
            }
            if tx.send(count).is_err() || count >= 2 {
                return;
            }
        }
    });

    rx
}

#[cfg(unix)]
async fn next_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = sigterm.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn next_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

async fn wait_for_signal(mut rx: watch::Receiver<u8>, count: u8) {
    if rx.wait_for(|seen| *seen >= count).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::{oneshot, watch};

    use super::{spawn_background, wait_for_signal};

    #[tokio::test]
    async fn spawn_background_returns_immediately() {
        let (tx, rx) = oneshot::channel::<()>();

        let start = std::time::Instant::now();
        let handle = spawn_background(async move {
            let _ = rx.await;
        });
        assert!(start.elapsed() < Duration::from_millis(50));

        let _ = tx.send(());
        let _ = handle.await;
    }

    #[tokio::test]
    async fn wait_for_signal_resolves_once_count_is_reached() {
        let (tx, rx) = watch::channel(0u8);
        let waiter = tokio::spawn(wait_for_signal(rx, 2));
        tx.send(1).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        tx.send(2).unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
