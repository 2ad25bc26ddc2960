//! Float to 16-bit PCM conversion.
//!
//! Input samples are clamped to [-1.0, 1.0] before scaling, so out-of-range
//! values saturate at `±scale` instead of wrapping. NaN encodes as silence.

use serde::{Deserialize, Serialize};

/// Full-scale multiplier: 1.0 maps to 32767 and -1.0 to -32767.
pub const DEFAULT_SCALE: i16 = i16::MAX;

/// How the scaled sample is reduced to an integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantization {
    /// Round toward zero. Introduces a small bias toward silence.
    #[default]
    Truncate,
    /// Round to nearest, halves away from zero.
    Nearest,
}

pub fn encode_sample(sample: f32, scale: i16, quantization: Quantization) -> i16 {
    let scaled = sample.clamp(-1.0, 1.0) * scale as f32;
    // `as` saturates at the i16 bounds and maps NaN to 0
    match quantization {
        Quantization::Truncate => scaled as i16,
        Quantization::Nearest => scaled.round() as i16,
    }
}

/// Encode with the default scale and truncation.
pub fn encode(samples: &[f32]) -> Vec<i16> {
    encode_with(samples, DEFAULT_SCALE, Quantization::Truncate)
}

pub fn encode_with(samples: &[f32], scale: i16, quantization: Quantization) -> Vec<i16> {
    samples
        .iter()
        .map(|&sample| encode_sample(sample, scale, quantization))
        .collect()
}

/// Append the little-endian byte form of `pcm` to `out`.
pub fn extend_le_bytes(pcm: &[i16], out: &mut Vec<u8>) {
    out.reserve(pcm.len() * 2);
    for value in pcm {
        out.extend_from_slice(&value.to_le_bytes());
    }
}

pub fn to_le_bytes(pcm: &[i16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pcm.len() * 2);
    extend_le_bytes(pcm, &mut out);
    out
}

/// Inverse of [`encode_with`] up to quantization error.
pub fn decode16(pcm: &[i16], scale: i16) -> Vec<f32> {
    pcm.iter().map(|&value| value as f32 / scale as f32).collect()
}
