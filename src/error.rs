use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid fps: {0} (must be finite and positive)")]
    InvalidFps(f32),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Json Error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Failure reported by a [`crate::sink::SnapshotSink`]. Never aborts a frame.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Io Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Snapshot rejected: {0}")]
    Rejected(String),
}
