use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use reqwest::StatusCode;

use crate::handler::{ApiError, ApiJsonResult, ApiResponse, ApiResult};
use crate::manager::{RecordingManager, RecordingStats, StartAck, StopAck};
use crate::recording::types::{RecordingOptions, SessionView};

pub fn recording_router(manager: Arc<RecordingManager>) -> Router {
    Router::new()
        .route("/", get(list_recordings))
        .route("/start", post(start_recording))
        .route("/admin/stats", get(get_stats))
        .route("/{recording_id}/stop", post(stop_recording))
        .route(
            "/{recording_id}",
            get(get_recording).delete(delete_recording),
        )
        .with_state(manager)
}

async fn start_recording(
    State(manager): State<Arc<RecordingManager>>,
    Json(options): Json<RecordingOptions>,
) -> ApiResult<(StatusCode, Json<ApiResponse<StartAck>>)> {
    if options.room_id.trim().is_empty() {
        return Err(ApiError::Validation("roomId is required".to_string()));
    }
    if options.requested_by.trim().is_empty() {
        return Err(ApiError::Validation("requestedBy is required".to_string()));
    }

    let ack = manager.start_recording(options).await?;
    Ok((StatusCode::CREATED, ApiResponse::data(ack)))
}

async fn stop_recording(
    State(manager): State<Arc<RecordingManager>>,
    Path(recording_id): Path<String>,
) -> ApiJsonResult<StopAck> {
    let ack = manager.stop_recording(&recording_id).await?;
    Ok(ApiResponse::data(ack))
}

async fn get_recording(
    State(manager): State<Arc<RecordingManager>>,
    Path(recording_id): Path<String>,
) -> ApiJsonResult<SessionView> {
    let view = manager.get(&recording_id).await?;
    Ok(ApiResponse::data(view))
}

async fn list_recordings(
    State(manager): State<Arc<RecordingManager>>,
) -> Json<ApiResponse<Vec<SessionView>>> {
    ApiResponse::data(manager.list().await)
}

async fn delete_recording(
    State(manager): State<Arc<RecordingManager>>,
    Path(recording_id): Path<String>,
) -> ApiJsonResult<()> {
    manager.delete_recording(&recording_id).await?;
    Ok(ApiResponse::message("Recording deleted successfully"))
}

async fn get_stats(State(manager): State<Arc<RecordingManager>>) -> Json<ApiResponse<RecordingStats>> {
    ApiResponse::data(manager.stats().await)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;

    fn fake_encoder(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("encoder.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn app(ceiling: usize, dir: &TempDir) -> Router {
        let encoder = fake_encoder(dir.path(), "sleep 600");
        recording_router(RecordingManager::new(
            ceiling,
            encoder.display().to_string(),
            dir.path().join("recordings"),
        ))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn start_one(app: &Router, room: &str) -> String {
        let response = app
            .clone()
            .oneshot(post_json(
                "/start",
                serde_json::json!({"roomId": room, "requestedBy": "u1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["data"]["sessionId"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_start_returns_201_with_ack() {
        let dir = TempDir::new().unwrap();
        let app = app(5, &dir);

        let response = app
            .oneshot(post_json(
                "/start",
                serde_json::json!({"roomId": "r1", "requestedBy": "u1", "layout": "grid"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"], "started");
        assert!(json["data"]["sessionId"].is_string());
    }

    #[tokio::test]
    async fn test_start_with_blank_room_id_is_400() {
        let dir = TempDir::new().unwrap();
        let app = app(5, &dir);

        let response = app
            .oneshot(post_json(
                "/start",
                serde_json::json!({"roomId": "  ", "requestedBy": "u1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Validation Error");
        assert_eq!(json["message"], "roomId is required");
    }

    #[tokio::test]
    async fn test_start_over_capacity_is_429() {
        let dir = TempDir::new().unwrap();
        let app = app(1, &dir);

        start_one(&app, "r1").await;
        let response = app
            .oneshot(post_json(
                "/start",
                serde_json::json!({"roomId": "r2", "requestedBy": "u1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body_json(response).await["error"], "Capacity exceeded");
    }

    #[tokio::test]
    async fn test_stop_returns_duration() {
        let dir = TempDir::new().unwrap();
        let app = app(5, &dir);
        let id = start_one(&app, "r1").await;

        let response = app
            .oneshot(request("POST", &format!("/{}/stop", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["data"]["sessionId"], id.as_str());
        assert_eq!(json["data"]["status"], "stopped");
        assert!(json["data"]["duration"].as_i64().unwrap() >= 0);
    }

    #[tokio::test]
    async fn test_get_returns_the_session_view() {
        let dir = TempDir::new().unwrap();
        let app = app(5, &dir);
        let id = start_one(&app, "r1").await;

        let response = app.oneshot(request("GET", &format!("/{}", id))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["data"]["id"], id.as_str());
        assert_eq!(json["data"]["roomId"], "r1");
        assert_eq!(json["data"]["status"], "recording");
        assert!(json["data"]["duration"].is_i64());
        assert!(json["data"]["outputPath"].is_string());
    }

    #[tokio::test]
    async fn test_get_unknown_is_404() {
        let dir = TempDir::new().unwrap();
        let app = app(5, &dir);

        let response = app.oneshot(request("GET", "/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Recording not found");
    }

    #[tokio::test]
    async fn test_list_returns_all_sessions() {
        let dir = TempDir::new().unwrap();
        let app = app(5, &dir);
        start_one(&app, "r1").await;
        start_one(&app, "r2").await;

        let response = app.oneshot(request("GET", "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_then_delete_again_is_404() {
        let dir = TempDir::new().unwrap();
        let app = app(5, &dir);
        let id = start_one(&app, "r1").await;

        let response = app
            .clone()
            .oneshot(request("DELETE", &format!("/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Recording deleted successfully");

        let response = app
            .oneshot(request("DELETE", &format!("/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stats_reports_counts_and_resources() {
        let dir = TempDir::new().unwrap();
        let app = app(5, &dir);
        start_one(&app, "r1").await;

        let response = app.oneshot(request("GET", "/admin/stats")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["data"]["activeRecordings"], 1);
        assert_eq!(json["data"]["totalRecordings"], 1);
        assert_eq!(json["data"]["completedRecordings"], 0);
        assert_eq!(json["data"]["failedRecordings"], 0);
        assert!(json["data"]["systemResources"]["uptimeSecs"].is_u64());
    }
}
