/// Error types for the instant-camera toy
///
/// Only camera errors gate a feature (the shutter). Storage and export
/// problems degrade: the in-memory wall stays authoritative and the user
/// gets a status message instead of a crash.

use thiserror::Error;

/// Capture source errors. Terminal for the session: the shutter is
/// disabled until the user fixes the device and restarts the feed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CameraError {
    /// No device found or permission denied
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    /// The stream died after it was up
    #[error("camera stream failed: {0}")]
    StreamFailed(String),
}

/// Persistence store errors. Never fatal: a failed read means an empty
/// wall, a failed write means a session-only wall.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access wall snapshot: {0}")]
    Io(#[from] std::io::Error),
    /// Stored snapshot is not a valid photo list
    #[error("wall snapshot is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Wall export errors. Reported as a transient status message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExportError {
    /// User dismissed the save dialog; not really a failure
    #[error("export cancelled")]
    Cancelled,
    #[error("failed to write wall image: {0}")]
    Write(String),
    #[error("export task failed: {0}")]
    Task(String),
}
