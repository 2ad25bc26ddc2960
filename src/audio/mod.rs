pub mod capture;
pub mod feedback;
pub mod format;
pub mod pcm;
pub mod wav_header;
pub mod wav_sink;

pub use capture::{CaptureSource, CpalCapture, ManualCapture};
pub use feedback::{AudioFeedback, FeedbackSoundType};
pub use format::AudioFormat;
pub use pcm::Quantization;
pub use wav_header::WavHeader;
pub use wav_sink::WavSink;
