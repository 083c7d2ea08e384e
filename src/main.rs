use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;

use feedboard::cases::case_routes;
use feedboard::config::FeedConfig;
use feedboard::feed::{FeedService, feed_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = FeedConfig::from_env()?;

    // ── Store ───────────────────────────────────────────────────────────
    let service = Arc::new(
        FeedService::open(&config.db_path, config.startup_timeout)
            .await
            .with_context(|| format!("failed to open store at {}", config.db_path.display()))?,
    );

    // ── Listeners ───────────────────────────────────────────────────────
    let feed_listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind feed server on {}", config.bind_addr))?;
    let cases_listener = TcpListener::bind(&config.cases_bind_addr)
        .await
        .with_context(|| format!("failed to bind cases server on {}", config.cases_bind_addr))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let cases_app = case_routes(config.cases_dir.clone());
    let mut cases_shutdown = shutdown_rx.clone();
    tracing::info!(addr = %config.cases_bind_addr, "Starting the cases server");
    let cases_handle = tokio::spawn(async move {
        let result = axum::serve(cases_listener, cases_app)
            .with_graceful_shutdown(async move {
                let _ = cases_shutdown.wait_for(|stop| *stop).await;
            })
            .await;
        if let Err(e) = result {
            tracing::error!(error = %e, "Cases server failed");
        }
    });

    let signal_service = Arc::clone(&service);
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Signal received, shutting down...");
        signal_service.shutdown();
        let _ = shutdown_tx.send(true);
    });

    let feed_app = feed_routes(Arc::clone(&service), config.request_timeout);
    let mut feed_shutdown = shutdown_rx;
    tracing::info!(addr = %config.bind_addr, "Starting the feed server");
    axum::serve(feed_listener, feed_app)
        .with_graceful_shutdown(async move {
            let _ = feed_shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .context("feed server failed")?;

    let _ = cases_handle.await;
    service.shutdown();
    tracing::info!("Finished");
    Ok(())
}

/// Resolve on SIGINT, SIGTERM or SIGQUIT.
#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for SIGTERM");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    let mut quit = match signal(SignalKind::quit()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for SIGQUIT");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
        _ = quit.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
