use std::collections::HashMap;

use crate::recording::types::RecordingSession;

/// In-memory store of every known session, keyed by id. Carries no lock of
/// its own: the lifecycle manager serializes all access behind one lock, so
/// no operation here blocks or fails.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, RecordingSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, session: RecordingSession) {
        self.sessions.insert(session.id.clone(), session);
    }

    pub fn get(&self, id: &str) -> Option<&RecordingSession> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut RecordingSession> {
        self.sessions.get_mut(id)
    }

    /// Removing an absent id is a no-op returning `None`.
    pub fn remove(&mut self, id: &str) -> Option<RecordingSession> {
        self.sessions.remove(id)
    }

    /// Cloned snapshot ordered by (start time, id): stable across repeated
    /// listings and detached from later mutation.
    pub fn all(&self) -> Vec<RecordingSession> {
        let mut sessions: Vec<_> = self.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| (a.start_time, &a.id).cmp(&(b.start_time, &b.id)));
        sessions
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordingSession> {
        self.sessions.values()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}
