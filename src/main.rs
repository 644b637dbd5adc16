use std::sync::Arc;

use tokio_util::sync::CancellationToken;

mod api;
mod config;
mod error;
mod handler;
mod manager;
mod recording;
mod resources;
mod storage;

fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}

#[tokio::main]
async fn main() -> ! {
    init_logging();
    let config = config::config();
    log::info!(
        "Starting {} v{} on {}:{} (max concurrent recordings: {}, encoder: {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.server.host,
        config.server.port,
        config.recording.max_concurrent,
        config.recording.encoder_path
    );

    storage::ensure_directories(&[&config.storage.recordings_path, &config.storage.temp_path])
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error preparing storage directories: {}", e);
            std::process::exit(1);
        });

    let manager = manager::RecordingManager::new(
        config.recording.max_concurrent,
        config.recording.encoder_path.clone(),
        config.storage.recordings_path.clone(),
    );

    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    api::start_api_server(Arc::clone(&manager), cancel_clone);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break;
            },
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
            },
            _ = sigterm() => {
                cancel.cancel();
            },
        }
    }

    manager.cleanup().await;
    std::process::exit(0);
}

#[cfg(unix)]
async fn sigterm() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(_) => std::future::pending().await,
    }
}

#[cfg(not(unix))]
async fn sigterm() {
    std::future::pending::<()>().await
}
