use crate::audio::{AudioFormat, CaptureSource, Quantization, WavSink};
use crate::error::{RecorderError, Result};
use crate::messages::{ControlEvent, RecorderState, TriggerState};
use crate::paths::OutputPaths;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fixed parameters of every session a controller opens
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub paths: OutputPaths,
    pub format: AudioFormat,
    pub quantization: Quantization,
    /// Only zone events for this actor move the trigger state
    pub actor_tag: String,
    pub max_duration: Option<Duration>,
}

/// Outcome of a single event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Started { path: PathBuf },
    Stopped { path: PathBuf, data_bytes: u64 },
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Toggle outside the trigger zone
    NotEligible,
    AlreadyRecording,
    NotRecording,
    /// Zone event for some other actor
    OtherActor,
    /// Zone event that only moved the trigger state
    TriggerOnly,
}

/// One open recording: exclusive owner of the output file until it closes
struct RecordingSession {
    path: PathBuf,
    sink: WavSink<BufWriter<File>>,
    sample_limit: Option<u64>,
    samples_written: u64,
    limit_reported: bool,
}

impl RecordingSession {
    /// Append a delivery, honouring the duration cap.
    fn write(&mut self, samples: &[f32], quantization: Quantization) -> Result<()> {
        let samples = match self.sample_limit {
            Some(limit) => {
                let room = limit.saturating_sub(self.samples_written) as usize;
                if samples.len() > room && !self.limit_reported {
                    tracing::warn!(
                        "Recording reached its maximum length, further audio is discarded: {}",
                        self.path.display()
                    );
                    self.limit_reported = true;
                }
                &samples[..samples.len().min(room)]
            }
            None => samples,
        };

        if samples.is_empty() {
            return Ok(());
        }
        self.sink.write_samples(samples, quantization)?;
        self.samples_written += samples.len() as u64;
        Ok(())
    }
}

/// Recording start/stop state machine
///
/// Idle and Recording are represented by the presence of a
/// [`RecordingSession`], so at most one session can exist per controller.
/// Zone events only move the [`TriggerState`]; a toggle is acted on only
/// while the trigger is eligible. Capture buffers are consumed only while
/// recording and appended in delivery order.
///
/// Every I/O and device failure is logged, abandons the session and leaves
/// the controller idle. The error is still returned so the caller can report
/// it; it is never fatal.
pub struct SessionController<C: CaptureSource> {
    settings: SessionSettings,
    capture: C,
    trigger: TriggerState,
    session: Option<RecordingSession>,
}

impl<C: CaptureSource> SessionController<C> {
    pub fn new(settings: SessionSettings, capture: C) -> Self {
        Self {
            settings,
            capture,
            trigger: TriggerState::Ineligible,
            session: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        if self.session.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn trigger(&self) -> TriggerState {
        self.trigger
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Path of the open recording, if any
    pub fn current_path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.path.as_path())
    }

    pub fn capture_mut(&mut self) -> &mut C {
        &mut self.capture
    }

    /// Dispatch a control event.
    pub fn handle(&mut self, event: &ControlEvent) -> Result<Transition> {
        match event {
            ControlEvent::ZoneEnter { actor } => Ok(self.zone_changed(actor, TriggerState::Eligible)),
            ControlEvent::ZoneExit { actor } => Ok(self.zone_changed(actor, TriggerState::Ineligible)),
            ControlEvent::Toggle => self.toggle(),
            ControlEvent::Shutdown => self.stop(),
        }
    }

    fn zone_changed(&mut self, actor: &str, trigger: TriggerState) -> Transition {
        if actor != self.settings.actor_tag {
            tracing::debug!("Ignoring zone event for actor {:?}", actor);
            return Transition::Ignored(IgnoreReason::OtherActor);
        }
        if self.trigger != trigger {
            tracing::info!("{} trigger zone: {:?}", actor, trigger);
            self.trigger = trigger;
        }
        Transition::Ignored(IgnoreReason::TriggerOnly)
    }

    /// Start when idle, stop when recording; dropped outside the trigger zone.
    pub fn toggle(&mut self) -> Result<Transition> {
        if self.trigger != TriggerState::Eligible {
            tracing::debug!("Toggle outside trigger zone, ignoring");
            return Ok(Transition::Ignored(IgnoreReason::NotEligible));
        }

        match self.state() {
            RecorderState::Idle => self.start(),
            RecorderState::Recording => self.stop(),
        }
    }

    /// Open a new session. A no-op while one is already open.
    pub fn start(&mut self) -> Result<Transition> {
        if self.session.is_some() {
            tracing::debug!("Already recording, ignoring start");
            return Ok(Transition::Ignored(IgnoreReason::AlreadyRecording));
        }

        if let Err(e) = self.capture.start(self.settings.format) {
            tracing::error!("Failed to start capture: {}", e);
            return Err(e);
        }

        let session = match self.open_session() {
            Ok(session) => session,
            Err(e) => {
                self.capture.stop();
                tracing::error!("Failed to open recording: {}", e);
                return Err(e);
            }
        };

        let path = session.path.clone();
        self.session = Some(session);
        tracing::info!("Recording started: {}", path.display());
        Ok(Transition::Started { path })
    }

    fn open_session(&self) -> Result<RecordingSession> {
        let format = self.settings.format;
        let path = self.settings.paths.next_path()?;
        let sink = WavSink::create(&path, format)?;
        let sample_limit = self
            .settings
            .max_duration
            .map(|d| format.samples_for_duration(d.as_secs_f32()) as u64);

        Ok(RecordingSession {
            path,
            sink,
            sample_limit,
            samples_written: 0,
            limit_reported: false,
        })
    }

    /// Close the open session: stop capture, flush what it still holds and
    /// patch the header. A no-op while idle.
    pub fn stop(&mut self) -> Result<Transition> {
        if self.session.is_none() {
            tracing::debug!("Not recording, ignoring stop");
            return Ok(Transition::Ignored(IgnoreReason::NotRecording));
        }

        self.capture.stop();
        self.pump()?;

        let Some(session) = self.session.take() else {
            return Err(RecorderError::InvalidState("session vanished while stopping"));
        };
        let path = session.path;
        let data_bytes = session.sink.data_bytes();
        if let Err(e) = session.sink.finalize() {
            tracing::error!("Failed to finalize {}: {}", path.display(), e);
            return Err(e);
        }

        tracing::info!("Recording saved to {} ({} bytes of audio)", path.display(), data_bytes);
        Ok(Transition::Stopped { path, data_bytes })
    }

    /// Pull whatever the capture source holds and append it.
    pub fn pump(&mut self) -> Result<()> {
        let samples = self.capture.take_samples();
        if samples.is_empty() {
            return Ok(());
        }
        self.deliver(&samples)
    }

    /// Append one capture buffer to the open session; dropped while idle.
    pub fn deliver(&mut self, samples: &[f32]) -> Result<()> {
        let channels = self.settings.format.channels as usize;
        let quantization = self.settings.quantization;
        let Some(session) = self.session.as_mut() else {
            tracing::trace!("Dropping {} samples while idle", samples.len());
            return Ok(());
        };

        let whole = samples.len() - samples.len() % channels;
        if whole != samples.len() {
            tracing::warn!(
                "Dropping {} samples of a partial {}-channel frame",
                samples.len() - whole,
                channels
            );
        }

        if let Err(e) = session.write(&samples[..whole], quantization) {
            self.abandon(&e);
            return Err(e);
        }
        Ok(())
    }

    /// Fail the open session if its capture source has not delivered any
    /// audio yet. The placeholder file is removed since nothing was recorded.
    pub fn check_capture_ready(&mut self) -> Result<()> {
        if self.session.is_none() || self.capture.has_delivered() {
            return Ok(());
        }

        self.capture.stop();
        if let Some(session) = self.session.take() {
            drop(session.sink);
            if let Err(e) = std::fs::remove_file(&session.path) {
                tracing::warn!("Failed to remove {}: {}", session.path.display(), e);
            }
        }

        let error = RecorderError::DeviceUnavailable("capture delivered no audio".to_string());
        tracing::error!("Recording cancelled: {}", error);
        Err(error)
    }

    /// Give up on the open session after a failure. The file keeps its
    /// placeholder header.
    fn abandon(&mut self, error: &RecorderError) {
        self.capture.stop();
        if let Some(session) = self.session.take() {
            tracing::error!(
                "Abandoning recording {}: {}",
                session.path.display(),
                error
            );
        }
    }
}
