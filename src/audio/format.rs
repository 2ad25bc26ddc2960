// NOTE: Everything written to disk is 16-bit signed integer PCM.
// Capture delivers f32 samples; the encoder converts them at append time.

use crate::error::{RecorderError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    pub const BITS_PER_SAMPLE: u16 = 16;
    pub const BYTES_PER_SAMPLE: u16 = Self::BITS_PER_SAMPLE / 8;

    pub fn new(sample_rate: u32, channels: u16) -> Result<Self> {
        let format = Self {
            sample_rate,
            channels,
        };
        format.validate()?;
        Ok(format)
    }

    /// Only mono and stereo linear PCM at a non-zero rate is supported.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(RecorderError::InvalidFormat(
                "sample rate must be greater than zero".to_string(),
            ));
        }
        if !(1..=2).contains(&self.channels) {
            return Err(RecorderError::InvalidFormat(format!(
                "channel count must be 1 or 2, got {}",
                self.channels
            )));
        }
        Ok(())
    }

    /// Bytes of one interleaved frame (one sample per channel)
    pub fn block_align(&self) -> u16 {
        self.channels * Self::BYTES_PER_SAMPLE
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    /// Calculate number of interleaved samples for a given duration in seconds
    pub fn samples_for_duration(&self, seconds: f32) -> usize {
        (self.sample_rate as f32 * seconds) as usize * self.channels as usize
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
        }
    }
}
