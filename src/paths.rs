//! Where recordings are written and what they are called.

use crate::error::{RecorderError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "wav-station";

/// File naming for each new take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum NamingPolicy {
    /// Always the same file; each take silently overwrites the previous one.
    Fixed { name: String },
    /// `<prefix>-YYYYMMDD-HHMMSS.mmm.wav` in local time.
    Timestamped { prefix: String },
    /// `<prefix><N>.wav` for the lowest N not already on disk.
    Numbered { prefix: String },
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self::Fixed {
            name: "recording0.wav".to_string(),
        }
    }
}

impl NamingPolicy {
    pub fn file_name(&self, dir: &Path) -> String {
        match self {
            Self::Fixed { name } => name.clone(),
            Self::Timestamped { prefix } => {
                let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
                format!("{prefix}-{stamp}.wav")
            }
            Self::Numbered { prefix } => (0u64..)
                .map(|n| format!("{prefix}{n}.wav"))
                .find(|name| !dir.join(name).exists())
                .unwrap_or_else(|| format!("{prefix}.wav")),
        }
    }
}

/// Resolves output paths for new recordings
#[derive(Debug, Clone)]
pub struct OutputPaths {
    dir: PathBuf,
    naming: NamingPolicy,
}

impl OutputPaths {
    pub fn new(dir: impl Into<PathBuf>, naming: NamingPolicy) -> Self {
        Self {
            dir: dir.into(),
            naming,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if missing and pick the path for the next take.
    pub fn next_path(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| RecorderError::io_at(&self.dir, e))?;
        Ok(self.dir.join(self.naming.file_name(&self.dir)))
    }
}

/// `$XDG_DATA_HOME/wav-station/recordings`, falling back to
/// `$HOME/.local/share/wav-station/recordings`. `None` when neither variable
/// is set.
pub fn default_recordings_dir() -> Option<PathBuf> {
    let data_dir = match std::env::var_os("XDG_DATA_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(std::env::var_os("HOME")?)
            .join(".local")
            .join("share"),
    };

    Some(data_dir.join(APP_DIR).join("recordings"))
}
