use crate::audio::{AudioFeedback, CaptureSource, FeedbackSoundType};
use crate::controller::{SessionController, Transition};
use crate::hooks;
use crate::messages::{ControlEvent, RecorderState};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc, watch};
use tokio::time::Instant;

/// Single-threaded event loop around the session controller
///
/// This service:
/// - Receives zone and toggle events via channel
/// - Drains capture buffers whenever the capture source signals new audio
/// - Cancels a recording whose capture source stays silent past the ready timeout
/// - Plays start/stop cues and runs the post-save hook
/// - Publishes the recorder state on a watch channel
///
/// Each event or capture wake-up is processed to completion before the next
/// one is taken, so the controller is never re-entered.
///
/// Note: with `CpalCapture` this service holds a cpal::Stream, which is !Send,
/// so it must be spawned on a LocalSet using tokio::task::spawn_local.
pub struct Recorder<C: CaptureSource> {
    controller: SessionController<C>,
    capture_ready: Arc<Notify>,
    event_rx: mpsc::Receiver<ControlEvent>,
    state_tx: watch::Sender<RecorderState>,
    feedback: AudioFeedback,
    on_saved: Option<String>,
    ready_timeout: Option<Duration>,
    ready_deadline: Option<Instant>,
}

impl<C: CaptureSource> Recorder<C> {
    pub fn new(
        controller: SessionController<C>,
        capture_ready: Arc<Notify>,
        event_rx: mpsc::Receiver<ControlEvent>,
        state_tx: watch::Sender<RecorderState>,
    ) -> Self {
        Self {
            controller,
            capture_ready,
            event_rx,
            state_tx,
            feedback: AudioFeedback::default(),
            on_saved: None,
            ready_timeout: None,
            ready_deadline: None,
        }
    }

    /// Bound the wait for the first audio after a recording starts.
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = Some(timeout);
        self
    }

    pub fn with_feedback(mut self, feedback: AudioFeedback) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_on_saved(mut self, command: Option<String>) -> Self {
        self.on_saved = command;
        self
    }

    /// Run until a shutdown event arrives or every handle is dropped.
    ///
    /// An open recording is finalized on the way out.
    pub async fn run(mut self) -> SessionController<C> {
        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    match event {
                        Some(ControlEvent::Shutdown) | None => {
                            self.handle_event(ControlEvent::Shutdown);
                            break;
                        }
                        Some(event) => self.handle_event(event),
                    }
                }

                // Drain captured audio (only when recording)
                _ = self.capture_ready.notified(), if self.controller.is_recording() => {
                    if let Err(e) = self.controller.pump() {
                        tracing::error!("Failed to write audio: {}", e);
                        self.publish_state();
                    }
                }

                _ = tokio::time::sleep_until(self.ready_deadline.unwrap_or_else(Instant::now)),
                    if self.ready_deadline.is_some() =>
                {
                    self.ready_deadline = None;
                    if self.controller.check_capture_ready().is_err() {
                        self.publish_state();
                    }
                }
            }
        }

        tracing::info!("Recorder stopped");
        self.controller
    }

    fn handle_event(&mut self, event: ControlEvent) {
        tracing::debug!("Recorder: handling {:?}", event);

        match self.controller.handle(&event) {
            Ok(Transition::Started { .. }) => {
                self.ready_deadline = self.ready_timeout.map(|t| Instant::now() + t);
                self.feedback.play(FeedbackSoundType::Start);
            }
            Ok(Transition::Stopped { path, .. }) => {
                self.ready_deadline = None;
                self.feedback.play(FeedbackSoundType::Stop);
                if let Some(command) = &self.on_saved {
                    hooks::run_on_saved(command, &path);
                }
            }
            Ok(Transition::Ignored(reason)) => {
                tracing::debug!("Recorder: {:?} ignored ({:?})", event, reason);
            }
            Err(e) => {
                tracing::error!("Error handling {:?}: {}", event, e);
            }
        }

        self.publish_state();
    }

    fn publish_state(&self) {
        let state = self.controller.state();
        self.state_tx.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }
}

/// Handle for communicating with the Recorder
#[derive(Clone)]
pub struct RecorderHandle {
    tx: mpsc::Sender<ControlEvent>,
    state_rx: watch::Receiver<RecorderState>,
}

impl RecorderHandle {
    pub fn new(tx: mpsc::Sender<ControlEvent>, state_rx: watch::Receiver<RecorderState>) -> Self {
        Self { tx, state_rx }
    }

    pub async fn send(&self, event: ControlEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send {:?}: recorder is gone", e.0))
    }

    /// Send from a thread outside the runtime.
    pub fn blocking_send(&self, event: ControlEvent) -> Result<()> {
        self.tx
            .blocking_send(event)
            .map_err(|e| anyhow::anyhow!("Failed to send {:?}: recorder is gone", e.0))
    }

    pub async fn zone_enter(&self, actor: &str) -> Result<()> {
        self.send(ControlEvent::ZoneEnter {
            actor: actor.to_string(),
        })
        .await
    }

    pub async fn zone_exit(&self, actor: &str) -> Result<()> {
        self.send(ControlEvent::ZoneExit {
            actor: actor.to_string(),
        })
        .await
    }

    pub async fn toggle(&self) -> Result<()> {
        self.send(ControlEvent::Toggle).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(ControlEvent::Shutdown).await
    }

    pub fn state(&self) -> RecorderState {
        *self.state_rx.borrow()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<RecorderState> {
        self.state_rx.clone()
    }
}
