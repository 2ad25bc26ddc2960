//! Streaming microphone capture to 16-bit PCM WAV, gated by a trigger zone
//! and a toggle key.

pub mod audio;
pub mod config;
pub mod controller;
pub mod error;
pub mod hooks;
pub mod input;
pub mod messages;
pub mod paths;
pub mod services;

pub use controller::{IgnoreReason, SessionController, SessionSettings, Transition};
pub use error::RecorderError;
pub use messages::{ControlEvent, RecorderState, TriggerState};
