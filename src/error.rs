use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the capture-to-WAV pipeline.
///
/// The session controller recovers all of these at its boundary: it logs the
/// failure, abandons the open session and returns to idle.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("I/O error on {}: {source}", .path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid audio format: {0}")]
    InvalidFormat(String),

    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

impl RecorderError {
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }

    /// True for failures of the file system or the byte sink.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_) | Self::IoAt { .. })
    }
}

pub type Result<T, E = RecorderError> = std::result::Result<T, E>;
