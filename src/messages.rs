/// Events delivered to the recorder loop by input sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// An actor entered the recording station's trigger zone
    ZoneEnter { actor: String },
    /// An actor left the trigger zone
    ZoneExit { actor: String },
    /// The toggle key went down (auto-repeat is filtered by the source)
    Toggle,
    /// Finish any open recording and exit the loop
    Shutdown,
}

/// Recorder state (observable via watch channel)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

/// Whether a toggle is currently accepted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriggerState {
    #[default]
    Ineligible,
    Eligible,
}
