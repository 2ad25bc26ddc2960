use super::format::AudioFormat;
use super::pcm::{self, DEFAULT_SCALE, Quantization};
use super::wav_header::{HEADER_SIZE, MAX_DATA_BYTES, WavHeader};
use crate::error::{RecorderError, Result};
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// Streaming 16-bit PCM WAV writer
///
/// The total length of a recording is unknown until it stops, so the sink
/// reserves a zeroed header on creation, appends PCM as it arrives and
/// patches the header in place on [`WavSink::finalize`]. Nothing but the
/// current encode buffer is held in memory.
///
/// If an append fails the sink must be abandoned; the file is left with its
/// placeholder header.
pub struct WavSink<W: Write + Seek> {
    writer: W,
    format: AudioFormat,
    data_bytes: u64,
    scratch: Vec<u8>,
}

impl WavSink<BufWriter<File>> {
    /// Create or truncate `path` and reserve the header.
    pub fn create(path: &Path, format: AudioFormat) -> Result<Self> {
        let file = File::create(path).map_err(|e| RecorderError::io_at(path, e))?;
        Self::new(BufWriter::new(file), format).map_err(|e| match e {
            RecorderError::Io(source) => RecorderError::io_at(path, source),
            other => other,
        })
    }
}

impl<W: Write + Seek> WavSink<W> {
    /// Wrap a seekable writer positioned at its start.
    pub fn new(mut writer: W, format: AudioFormat) -> Result<Self> {
        format.validate()?;
        writer.write_all(&[0u8; HEADER_SIZE])?;

        Ok(Self {
            writer,
            format,
            data_bytes: 0,
            scratch: Vec::new(),
        })
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// PCM bytes appended so far
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    /// Append already-encoded samples after everything written so far.
    pub fn append(&mut self, samples: &[i16]) -> Result<()> {
        let mut bytes = std::mem::take(&mut self.scratch);
        bytes.clear();
        pcm::extend_le_bytes(samples, &mut bytes);
        let result = self.append_bytes(&bytes);
        self.scratch = bytes;
        result
    }

    /// Encode float samples and append them.
    pub fn write_samples(&mut self, samples: &[f32], quantization: Quantization) -> Result<()> {
        self.append(&pcm::encode_with(samples, DEFAULT_SCALE, quantization))
    }

    fn append_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let total = self.data_bytes + bytes.len() as u64;
        if total > MAX_DATA_BYTES {
            return Err(RecorderError::Io(std::io::Error::other(
                "recording exceeds the 4 GiB WAV size limit",
            )));
        }

        self.writer.write_all(bytes)?;
        self.data_bytes = total;
        Ok(())
    }

    /// Patch the header with the final lengths and hand back the writer.
    ///
    /// Consumes the sink, so a recording can only be finalized once.
    pub fn finalize(mut self) -> Result<W> {
        let end = self.writer.stream_position()?;
        let data_bytes = end.checked_sub(HEADER_SIZE as u64).ok_or(
            RecorderError::InvalidState("sink shorter than its header"),
        )?;
        debug_assert_eq!(data_bytes, self.data_bytes);

        let header = WavHeader::new(self.format, data_bytes as u32);
        self.writer.seek(SeekFrom::Start(0))?;
        self.writer.write_all(&header.to_bytes())?;
        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;

        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Error, ErrorKind};

    fn mono() -> AudioFormat {
        AudioFormat::default()
    }

    #[test]
    fn reserves_placeholder_on_open() {
        let sink = WavSink::new(Cursor::new(Vec::new()), mono()).unwrap();
        assert_eq!(sink.data_bytes(), 0);

        let bytes = sink.writer.into_inner();
        assert_eq!(bytes, vec![0u8; HEADER_SIZE]);
    }

    #[test]
    fn finalize_patches_lengths() {
        let mut sink = WavSink::new(Cursor::new(Vec::new()), mono()).unwrap();
        sink.write_samples(&[0.0, 0.5, -1.0, 1.0], Quantization::Truncate)
            .unwrap();
        let bytes = sink.finalize().unwrap().into_inner();

        assert_eq!(bytes.len(), HEADER_SIZE + 8);
        let header = WavHeader::parse(&bytes).unwrap();
        assert_eq!(header.data_bytes, 8);
        assert_eq!(header.chunk_size(), 44);
        assert_eq!(&bytes[HEADER_SIZE..], &[0x00, 0x00, 0xFF, 0x3F, 0x01, 0x80, 0xFF, 0x7F]);
    }

    #[test]
    fn empty_recording_is_valid() {
        let sink = WavSink::new(Cursor::new(Vec::new()), mono()).unwrap();
        let bytes = sink.finalize().unwrap().into_inner();

        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(WavHeader::parse(&bytes).unwrap().data_bytes, 0);
    }

    #[test]
    fn appends_keep_delivery_order() {
        let format = AudioFormat::new(22050, 2).unwrap();
        let mut sink = WavSink::new(Cursor::new(Vec::new()), format).unwrap();
        sink.append(&[1, 2]).unwrap();
        sink.append(&[3, 4, 5, 6]).unwrap();
        sink.append(&[-1, -2]).unwrap();
        let bytes = sink.finalize().unwrap().into_inner();

        let data: Vec<i16> = bytes[HEADER_SIZE..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(data, vec![1, 2, 3, 4, 5, 6, -1, -2]);
        assert_eq!(WavHeader::parse(&bytes).unwrap().format, format);
    }

    struct FailingWriter {
        inner: Cursor<Vec<u8>>,
        fail_after: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.inner.get_ref().len() + buf.len() > self.fail_after {
                return Err(Error::new(ErrorKind::StorageFull, "disk full"));
            }
            self.inner.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Seek for FailingWriter {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    #[test]
    fn write_failure_surfaces_as_io_error() {
        let writer = FailingWriter {
            inner: Cursor::new(Vec::new()),
            fail_after: HEADER_SIZE + 4,
        };
        let mut sink = WavSink::new(writer, mono()).unwrap();
        sink.append(&[1, 2]).unwrap();

        let err = sink.append(&[3]).unwrap_err();
        assert!(err.is_io());
        assert_eq!(sink.data_bytes(), 4);
    }

    #[test]
    fn appends_stop_at_riff_size_limit() {
        let mut sink = WavSink::new(Cursor::new(Vec::new()), mono()).unwrap();
        sink.data_bytes = MAX_DATA_BYTES - 2;

        let err = sink.append(&[1, 2]).unwrap_err();
        assert!(err.is_io());
        assert_eq!(sink.data_bytes(), MAX_DATA_BYTES - 2);

        sink.append(&[1]).unwrap();
        assert_eq!(sink.data_bytes(), MAX_DATA_BYTES);
        assert!(sink.append(&[1]).unwrap_err().is_io());
    }

    #[test]
    fn create_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("take.wav");

        let err = WavSink::create(&path, mono()).err().unwrap();
        assert!(matches!(err, RecorderError::IoAt { .. }));
    }
}
