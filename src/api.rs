use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use axum::http::{HeaderValue, Method, header};
use chrono::Utc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::config::{CorsConfig, config};
use crate::handler::{recording::recording_router, system::system_router};
use crate::manager::RecordingManager;

pub(crate) fn app(manager: Arc<RecordingManager>) -> Router {
    Router::new()
        .route("/api", get(banner))
        .nest("/api/recordings", recording_router(manager))
        .merge(system_router(Instant::now()))
        .route("/ws", get(ws_upgrade))
        .nest_service(
            "/files",
            ServeDir::new(&config().storage.recordings_path),
        )
        .layer(cors_layer(&config().cors))
}

pub(crate) fn start_api_server(manager: Arc<RecordingManager>, cancel: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = serve(manager, cancel.clone()).await {
            log::error!("API server: {:#}", e);
            cancel.cancel();
        }
    });
}

async fn serve(manager: Arc<RecordingManager>, cancel: CancellationToken) -> anyhow::Result<()> {
    let server = &config().server;
    let addr = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    log::info!("API server started on {}", addr);

    axum::serve(listener, app(manager))
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await
        .context("API server error")?;
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    cancel.cancelled().await;
    log::info!("Shutting down API server...");
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cors
        .origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn banner() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

async fn ws_upgrade(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(handle_socket)
}

/// Greets the peer, then holds the socket open discarding inbound frames
/// until it closes. No further notifications are sent.
async fn handle_socket(mut socket: WebSocket) {
    let greeting = serde_json::json!({
        "type": "connected",
        "timestamp": Utc::now(),
    });
    if socket
        .send(Message::Text(greeting.to_string().into()))
        .await
        .is_err()
    {
        return;
    }
    while let Some(Ok(_)) = socket.recv().await {}
}
