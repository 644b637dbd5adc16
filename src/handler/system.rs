use std::time::Instant;

use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;

use crate::resources;

#[derive(Debug, Clone, Copy)]
struct SystemState {
    started_at: Instant,
}

pub fn system_router(started_at: Instant) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/detailed", get(health_detailed))
        .with_state(SystemState { started_at })
}

async fn health(State(state): State<SystemState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
        "uptimeSecs": state.started_at.elapsed().as_secs(),
    }))
}

async fn health_detailed(State(state): State<SystemState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
        "resources": resources::snapshot(state.started_at),
        "platform": {
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        },
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use reqwest::StatusCode;
    use tower::ServiceExt;

    use super::*;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_liveness() {
        let app = system_router(Instant::now());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert!(json["uptimeSecs"].is_u64());
    }

    #[tokio::test]
    async fn test_detailed_health_includes_resources() {
        let app = system_router(Instant::now());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/detailed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["platform"]["os"], std::env::consts::OS);
        assert!(json["resources"]["uptimeSecs"].is_u64());
    }
}
