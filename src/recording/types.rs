use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::recording::supervisor::EncoderHandle;

/// Lifecycle states of one recording attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    Initializing,
    Recording,
    Paused,
    Stopped,
    Completed,
    Failed,
}

impl RecordingStatus {
    /// Terminal states carry an end time and never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Initializing => "initializing",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
            Self::Failed => "failed",
        })
    }
}

/// Caller-supplied start payload. Only `roomId` and `requestedBy` are
/// interpreted; everything else (layout, codec hints, audio/video flags)
/// passes through untouched and is echoed back in session views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingOptions {
    pub room_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    pub requested_by: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One recording attempt. `process` is a termination-only reference; the
/// supervisor's monitor task owns the child itself.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    pub id: String,
    pub options: RecordingOptions,
    pub status: RecordingStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub output_path: PathBuf,
    pub error: Option<String>,
    pub process: Option<EncoderHandle>,
}

impl RecordingSession {
    pub fn new(
        id: String,
        options: RecordingOptions,
        output_path: PathBuf,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            options,
            status: RecordingStatus::Recording,
            start_time,
            end_time: None,
            output_path,
            error: None,
            process: None,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.options.room_id
    }

    /// Milliseconds from start to end, or to `now` while still running.
    pub fn duration_ms(&self, now: DateTime<Utc>) -> i64 {
        (self.end_time.unwrap_or(now) - self.start_time).num_milliseconds()
    }
}

/// Wire shape of a session. Built fresh for every response so `duration`
/// reflects the read instant rather than a cached value.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub room_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    pub status: RecordingStatus,
    pub requested_by: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub output_path: PathBuf,
    pub options: RecordingOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration: i64,
}

impl SessionView {
    pub fn of(session: &RecordingSession, now: DateTime<Utc>) -> Self {
        Self {
            id: session.id.clone(),
            room_id: session.options.room_id.clone(),
            room_name: session.options.room_name.clone(),
            status: session.status,
            requested_by: session.options.requested_by.clone(),
            start_time: session.start_time,
            end_time: session.end_time,
            output_path: session.output_path.clone(),
            options: session.options.clone(),
            error: session.error.clone(),
            duration: session.duration_ms(now),
        }
    }
}
