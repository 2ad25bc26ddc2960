use rodio::OutputStreamBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackSoundType {
    Start,
    Stop,
}

/// Short audible cues when a recording starts or stops
///
/// Cues without a configured file are silently skipped.
#[derive(Debug, Default)]
pub struct AudioFeedback {
    paths: HashMap<FeedbackSoundType, PathBuf>,
}

impl AudioFeedback {
    pub fn new(start: Option<PathBuf>, stop: Option<PathBuf>) -> Self {
        let paths = [
            (FeedbackSoundType::Start, start),
            (FeedbackSoundType::Stop, stop),
        ]
        .into_iter()
        .filter_map(|(kind, path)| path.map(|p| (kind, p)))
        .collect();

        Self { paths }
    }

    pub fn is_enabled(&self, sound_type: FeedbackSoundType) -> bool {
        self.paths.contains_key(&sound_type)
    }

    /// Play a cue in the background; playback failures are only logged.
    pub fn play(&self, sound_type: FeedbackSoundType) {
        if let Some(path) = self.paths.get(&sound_type) {
            let path = path.clone();
            tokio::task::spawn_blocking(move || {
                if let Err(e) = play_sound_blocking(&path) {
                    tracing::warn!("Failed to play sound {}: {}", path.display(), e);
                }
            });
        }
    }
}

fn play_sound_blocking(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(path)?;

    let stream_handle = OutputStreamBuilder::open_default_stream()?;
    let sink = rodio::play(stream_handle.mixer(), BufReader::new(file))?;
    sink.sleep_until_end();

    Ok(())
}
