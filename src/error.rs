use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures reported synchronously to API callers. Encoder launch failures
/// are deliberately not represented here: they surface asynchronously as the
/// session moving to `failed`, never as an error on the start call.
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("maximum concurrent recordings reached ({limit})")]
    CapacityExceeded { limit: usize },

    #[error("recording {id} not found")]
    NotFound { id: String },

    #[error("recording service is shutting down")]
    ShuttingDown,

    #[error("failed to remove artifact {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RecordingError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}
