use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::error::RecordingError;
use crate::recording::registry::SessionRegistry;
use crate::recording::supervisor::{self, EncoderCommand, EncoderEvent, EncoderOutcome};
use crate::recording::types::{RecordingOptions, RecordingSession, RecordingStatus, SessionView};
use crate::resources::{self, ResourceSnapshot};
use crate::storage;

/// Acknowledgment returned by a start request: launch was attempted, nothing
/// more. Whether the encoder produces output shows up later in session state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAck {
    pub session_id: String,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopAck {
    pub session_id: String,
    pub status: &'static str,
    /// Milliseconds from start to end.
    pub duration: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStats {
    pub active_recordings: usize,
    pub total_recordings: usize,
    pub completed_recordings: usize,
    pub failed_recordings: usize,
    pub system_resources: ResourceSnapshot,
}

#[derive(Debug, Default)]
struct ManagerInner {
    registry: SessionRegistry,
    /// Set by `cleanup`; once true no start can reach `recording` again.
    draining: bool,
}

/// Orchestrates the session lifecycle: capacity enforcement, id and output
/// path allocation, registry mutation, and the supervisor hand-off. Every
/// mutation — API-driven or an async exit report — goes through `inner`'s
/// lock, so the capacity check-then-insert and the exit-vs-stop race are both
/// settled at a single serialization point.
#[derive(Debug)]
pub struct RecordingManager {
    inner: RwLock<ManagerInner>,
    events: mpsc::Sender<EncoderEvent>,
    max_concurrent: usize,
    encoder_path: String,
    recordings_path: PathBuf,
    started_at: Instant,
}

impl RecordingManager {
    pub fn new(
        max_concurrent: usize,
        encoder_path: impl Into<String>,
        recordings_path: impl Into<PathBuf>,
    ) -> Arc<Self> {
        let (events, rx) = mpsc::channel(64);
        let manager = Arc::new(Self {
            inner: RwLock::new(ManagerInner::default()),
            events,
            max_concurrent,
            encoder_path: encoder_path.into(),
            recordings_path: recordings_path.into(),
            started_at: Instant::now(),
        });
        tokio::spawn(run_event_loop(Arc::downgrade(&manager), rx));
        manager
    }

    /// Admit a new session and launch its encoder. Refused while draining and
    /// once `max_concurrent` sessions are `recording`; both checks share the
    /// write lock with the insert, so concurrent starts cannot oversubscribe.
    pub async fn start_recording(
        &self,
        options: RecordingOptions,
    ) -> Result<StartAck, RecordingError> {
        let now = Utc::now();
        let output_path = self.output_path(&options.room_id, now);

        let mut inner = self.inner.write().await;
        if inner.draining {
            return Err(RecordingError::ShuttingDown);
        }
        let active = inner
            .registry
            .iter()
            .filter(|s| s.status == RecordingStatus::Recording)
            .count();
        if active >= self.max_concurrent {
            log::warn!(
                "Manager: start refused, {} of {} recordings active",
                active,
                self.max_concurrent
            );
            return Err(RecordingError::CapacityExceeded {
                limit: self.max_concurrent,
            });
        }

        let id = Uuid::new_v4().to_string();
        let mut session = RecordingSession::new(id.clone(), options, output_path.clone(), now);
        let command = EncoderCommand::recording(&self.encoder_path, &output_path);
        session.process = Some(supervisor::launch(id.clone(), command, self.events.clone()));
        log::info!(
            "Manager: recording started [id:{}, room:{}, output:{}]",
            id,
            session.room_id(),
            output_path.display()
        );
        inner.registry.put(session);

        Ok(StartAck {
            session_id: id,
            status: "started",
        })
    }

    /// Interrupt the encoder and mark the session stopped. Repeating a stop,
    /// or stopping a session whose process already exited, changes nothing
    /// and still returns the recorded duration.
    pub async fn stop_recording(&self, id: &str) -> Result<StopAck, RecordingError> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let session = inner
            .registry
            .get_mut(id)
            .ok_or_else(|| RecordingError::not_found(id))?;

        if !session.status.is_terminal() {
            if let Some(handle) = session.process.take() {
                handle.interrupt();
            }
            session.status = RecordingStatus::Stopped;
            session.end_time = Some(now);
            log::info!(
                "Manager: recording stopped [id:{}, room:{}]",
                id,
                session.room_id()
            );
        }

        Ok(StopAck {
            session_id: id.to_string(),
            status: "stopped",
            duration: session.duration_ms(now),
        })
    }

    pub async fn get(&self, id: &str) -> Result<SessionView, RecordingError> {
        let now = Utc::now();
        let inner = self.inner.read().await;
        inner
            .registry
            .get(id)
            .map(|session| SessionView::of(session, now))
            .ok_or_else(|| RecordingError::not_found(id))
    }

    pub async fn list(&self) -> Vec<SessionView> {
        let now = Utc::now();
        let inner = self.inner.read().await;
        inner
            .registry
            .all()
            .iter()
            .map(|session| SessionView::of(session, now))
            .collect()
    }

    /// Remove the session and its output artifact. The artifact removal runs
    /// first: if it fails the registry entry survives and the error reaches
    /// the caller. No attempt is made to stop a still-running encoder; its
    /// eventual exit report finds no session and is dropped.
    pub async fn delete_recording(&self, id: &str) -> Result<(), RecordingError> {
        let mut inner = self.inner.write().await;
        let session = inner
            .registry
            .get(id)
            .ok_or_else(|| RecordingError::not_found(id))?;
        let output_path = session.output_path.clone();

        if storage::path_exists(&output_path).await {
            storage::remove(&output_path)
                .await
                .map_err(|source| RecordingError::Storage {
                    path: output_path.clone(),
                    source,
                })?;
        }

        inner.registry.remove(id);
        log::info!("Manager: recording deleted [id:{}]", id);
        Ok(())
    }

    pub async fn stats(&self) -> RecordingStats {
        let inner = self.inner.read().await;
        let mut active = 0;
        let mut completed = 0;
        let mut failed = 0;
        for session in inner.registry.iter() {
            match session.status {
                RecordingStatus::Recording => active += 1,
                RecordingStatus::Completed => completed += 1,
                RecordingStatus::Failed => failed += 1,
                _ => {}
            }
        }
        RecordingStats {
            active_recordings: active,
            total_recordings: inner.registry.count(),
            completed_recordings: completed,
            failed_recordings: failed,
            system_resources: resources::snapshot(self.started_at),
        }
    }

    /// Shutdown drain: stop every `recording` session, then clear the
    /// registry. The draining flag is raised under the same lock as the
    /// capacity check, so no start admitted after cleanup begins escapes it.
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        inner.draining = true;

        let active: Vec<String> = inner
            .registry
            .iter()
            .filter(|s| s.status == RecordingStatus::Recording)
            .map(|s| s.id.clone())
            .collect();
        for id in &active {
            if let Some(session) = inner.registry.get_mut(id) {
                if let Some(handle) = session.process.take() {
                    handle.interrupt();
                }
                session.status = RecordingStatus::Stopped;
                session.end_time = Some(now);
                log::info!(
                    "Manager: recording stopped by cleanup [id:{}, room:{}]",
                    id,
                    session.room_id()
                );
            }
        }

        let total = inner.registry.count();
        inner.registry.clear();
        log::info!(
            "Manager: cleanup complete ({} active stopped, {} sessions cleared)",
            active.len(),
            total
        );
    }

    /// `<recordings>/recording_<roomId>_<timestamp>.mp4`, timestamp an
    /// RFC 3339 UTC instant with `:` and `.` made path-safe.
    fn output_path(&self, room_id: &str, at: DateTime<Utc>) -> PathBuf {
        let stamp = at
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        self.recordings_path
            .join(format!("recording_{}_{}.mp4", room_id, stamp))
    }

    async fn apply_exit(&self, event: EncoderEvent) {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let Some(session) = inner.registry.get_mut(&event.session_id) else {
            log::debug!(
                "Manager: exit report for unknown session dropped [id:{}]",
                event.session_id
            );
            return;
        };
        // An explicit stop always wins over an exit report that arrives
        // after it; only a still-recording session takes the transition.
        if session.status != RecordingStatus::Recording {
            log::debug!(
                "Manager: late exit report ignored [id:{}, status:{}]",
                event.session_id,
                session.status
            );
            return;
        }

        session.process = None;
        session.end_time = Some(now);
        match event.outcome {
            EncoderOutcome::Exited { success: true, .. } => {
                session.status = RecordingStatus::Completed;
                log::info!(
                    "Manager: recording completed [id:{}, room:{}]",
                    event.session_id,
                    session.room_id()
                );
            }
            EncoderOutcome::Exited { success: false, code } => {
                session.status = RecordingStatus::Failed;
                session.error = Some(match code {
                    Some(code) => format!("encoder exited with status {}", code),
                    None => "encoder terminated by signal".to_string(),
                });
                log::warn!(
                    "Manager: recording failed [id:{}, room:{}, code:{:?}]",
                    event.session_id,
                    session.room_id(),
                    code
                );
            }
            EncoderOutcome::Errored { message } => {
                session.status = RecordingStatus::Failed;
                log::error!(
                    "Manager: recording failed [id:{}, room:{}]: {}",
                    event.session_id,
                    session.room_id(),
                    message
                );
                session.error = Some(message);
            }
        }
    }
}

/// Drains the supervisor's exit reports into session-state transitions. Holds
/// only a weak reference: dropping the manager ends the loop once the last
/// in-flight monitor task has reported.
async fn run_event_loop(manager: Weak<RecordingManager>, mut events: mpsc::Receiver<EncoderEvent>) {
    while let Some(event) = events.recv().await {
        let Some(manager) = manager.upgrade() else {
            break;
        };
        manager.apply_exit(event).await;
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;
