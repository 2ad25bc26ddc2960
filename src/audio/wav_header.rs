/// Canonical 44-byte RIFF/WAVE header for 16-bit linear PCM.
///
/// Layout (all integers little-endian):
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    chunk size = file length - 8
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (fmt sub-chunk size)
/// [20-21]  1 (PCM)
/// [22-23]  channels
/// [24-27]  sample rate
/// [28-31]  byte rate = sample_rate * channels * 2
/// [32-33]  block align = channels * 2
/// [34-35]  16 (bits per sample)
/// [36-39]  "data"
/// [40-43]  data size in bytes
/// ```
use super::format::AudioFormat;
use crate::error::{RecorderError, Result};

pub const HEADER_SIZE: usize = 44;

const PCM_FORMAT: u16 = 1;
const FMT_CHUNK_SIZE: u32 = 16;

/// Largest data region whose RIFF chunk size still fits in 32 bits.
pub const MAX_DATA_BYTES: u64 = u32::MAX as u64 - (HEADER_SIZE as u64 - 8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub format: AudioFormat,
    pub data_bytes: u32,
}

impl WavHeader {
    pub fn new(format: AudioFormat, data_bytes: u32) -> Self {
        Self { format, data_bytes }
    }

    pub fn chunk_size(&self) -> u32 {
        HEADER_SIZE as u32 - 8 + self.data_bytes
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let format = &self.format;
        let mut header = [0u8; HEADER_SIZE];

        header[0..4].copy_from_slice(b"RIFF");
        header[4..8].copy_from_slice(&self.chunk_size().to_le_bytes());
        header[8..12].copy_from_slice(b"WAVE");

        header[12..16].copy_from_slice(b"fmt ");
        header[16..20].copy_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
        header[20..22].copy_from_slice(&PCM_FORMAT.to_le_bytes());
        header[22..24].copy_from_slice(&format.channels.to_le_bytes());
        header[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
        header[28..32].copy_from_slice(&format.byte_rate().to_le_bytes());
        header[32..34].copy_from_slice(&format.block_align().to_le_bytes());
        header[34..36].copy_from_slice(&AudioFormat::BITS_PER_SAMPLE.to_le_bytes());

        header[36..40].copy_from_slice(b"data");
        header[40..44].copy_from_slice(&self.data_bytes.to_le_bytes());

        header
    }

    /// Parse a header written by [`WavHeader::to_bytes`].
    ///
    /// Anything other than the canonical 16-bit PCM layout is rejected, as are
    /// placeholder headers that were never finalized.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(invalid(format!("header is {} bytes, need {HEADER_SIZE}", bytes.len())));
        }
        if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(invalid("missing RIFF/WAVE tags".to_string()));
        }
        if &bytes[12..16] != b"fmt " || &bytes[36..40] != b"data" {
            return Err(invalid("missing fmt/data sub-chunks".to_string()));
        }
        if read_u32(bytes, 16) != FMT_CHUNK_SIZE || read_u16(bytes, 20) != PCM_FORMAT {
            return Err(invalid("not linear PCM".to_string()));
        }
        if read_u16(bytes, 34) != AudioFormat::BITS_PER_SAMPLE {
            return Err(invalid(format!("{} bits per sample", read_u16(bytes, 34))));
        }

        let format = AudioFormat::new(read_u32(bytes, 24), read_u16(bytes, 22))?;
        if read_u32(bytes, 28) != format.byte_rate() || read_u16(bytes, 32) != format.block_align() {
            return Err(invalid("byte rate or block align disagrees with format".to_string()));
        }

        let header = Self::new(format, read_u32(bytes, 40));
        if read_u32(bytes, 4) != header.chunk_size() {
            return Err(invalid("RIFF chunk size disagrees with data size".to_string()));
        }
        Ok(header)
    }
}

fn invalid(message: String) -> RecorderError {
    RecorderError::InvalidFormat(message)
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
