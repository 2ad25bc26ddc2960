use super::format::AudioFormat;
use crate::error::{RecorderError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use ringbuf::{HeapCons, HeapRb, traits::*};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;

/// A source of interleaved f32 sample buffers
///
/// The session controller starts the source when a recording opens and stops
/// it when the recording closes; samples are only pulled in between.
pub trait CaptureSource {
    /// Begin capturing in `format`. Fails with `DeviceUnavailable` when there
    /// is nothing to capture from.
    fn start(&mut self, format: AudioFormat) -> Result<()>;

    /// Stop capturing. Samples already captured stay available to
    /// [`CaptureSource::take_samples`].
    fn stop(&mut self);

    /// Take every whole frame captured since the last call. A trailing
    /// partial frame stays buffered until the rest of it arrives.
    fn take_samples(&mut self) -> Vec<f32>;

    /// Whether any audio has arrived since the last start. A source that
    /// never delivers is treated as an unavailable device.
    fn has_delivered(&self) -> bool {
        true
    }
}

const RING_SECONDS: f32 = 10.0;

/// Microphone capture through cpal
///
/// The stream callback pushes into a lock-free ring buffer and signals a
/// [`Notify`]; the recorder loop waits on that notifier and drains the ring.
/// `start` returns as soon as the stream plays; the recorder loop bounds how
/// long it waits for the first callback.
pub struct CpalCapture {
    device_name: Option<String>,
    ready: Arc<AtomicBool>,
    notify: Arc<Notify>,
    stream: Option<cpal::Stream>,
    consumer: Option<HeapCons<f32>>,
    channels: usize,
    dropped: Arc<AtomicUsize>,
}

impl CpalCapture {
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            ready: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
            stream: None,
            consumer: None,
            channels: 1,
            dropped: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Signalled whenever the stream callback has pushed new samples.
    pub fn notifier(&self) -> Arc<Notify> {
        self.notify.clone()
    }

    fn find_device(&self) -> Result<cpal::Device> {
        let host = cpal::default_host();

        let Some(name) = &self.device_name else {
            return host.default_input_device().ok_or_else(|| {
                RecorderError::DeviceUnavailable("no input audio device available".to_string())
            });
        };

        let mut devices = host
            .input_devices()
            .map_err(|e| RecorderError::DeviceUnavailable(e.to_string()))?;
        devices
            .find(|device| device.name().map(|n| &n == name).unwrap_or(false))
            .ok_or_else(|| RecorderError::DeviceUnavailable(format!("no input device named {name}")))
    }
}

impl CaptureSource for CpalCapture {
    fn start(&mut self, format: AudioFormat) -> Result<()> {
        let device = self.find_device()?;

        let ring = HeapRb::<f32>::new(format.samples_for_duration(RING_SECONDS));
        let (mut producer, consumer) = ring.split();

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: BufferSize::Default,
        };

        self.ready.store(false, Ordering::Release);
        let ready_callback = self.ready.clone();
        let notify_callback = self.notify.clone();
        let dropped = self.dropped.clone();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    let pushed = producer.push_slice(data);
                    if pushed < data.len() {
                        dropped.fetch_add(data.len() - pushed, Ordering::Relaxed);
                    }
                    ready_callback.store(true, Ordering::Release);
                    notify_callback.notify_one();
                },
                move |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| RecorderError::DeviceUnavailable(format!("failed to build input stream: {e}")))?;

        stream
            .play()
            .map_err(|e| RecorderError::DeviceUnavailable(format!("failed to start audio stream: {e}")))?;

        self.stream = Some(stream);
        self.consumer = Some(consumer);
        self.channels = format.channels.max(1) as usize;
        tracing::info!(
            "Audio capture started ({} Hz, {} ch)",
            format.sample_rate,
            format.channels
        );
        Ok(())
    }

    fn stop(&mut self) {
        // Dropping the stream stops the callback
        if self.stream.take().is_some() {
            tracing::info!("Audio capture stopped");
        }
    }

    fn take_samples(&mut self) -> Vec<f32> {
        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            tracing::warn!("Capture ring overflowed, {} samples lost", dropped);
        }

        let Some(consumer) = self.consumer.as_mut() else {
            return Vec::new();
        };

        let available = consumer.occupied_len();
        let whole = available - available % self.channels;
        let mut samples = vec![0.0f32; whole];
        let n = consumer.pop_slice(&mut samples);
        samples.truncate(n);

        if self.stream.is_none() && consumer.occupied_len() < self.channels {
            self.consumer = None;
        }
        samples
    }

    fn has_delivered(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

/// Capture fed by the host, e.g. from an engine mixer callback
///
/// Samples pushed while stopped are discarded. Pushes need not be
/// frame-aligned; a split frame is held back until it is complete.
#[derive(Debug, Default)]
pub struct ManualCapture {
    unavailable: bool,
    active: bool,
    delivered: bool,
    channels: usize,
    pending: Vec<f32>,
}

impl ManualCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose `start` always fails, as if no device were present.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn push(&mut self, samples: &[f32]) {
        if self.active {
            self.pending.extend_from_slice(samples);
            self.delivered = true;
        }
    }
}

impl CaptureSource for ManualCapture {
    fn start(&mut self, format: AudioFormat) -> Result<()> {
        if self.unavailable {
            return Err(RecorderError::DeviceUnavailable(
                "no capture device present".to_string(),
            ));
        }
        self.pending.clear();
        self.channels = format.channels.max(1) as usize;
        self.delivered = false;
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn take_samples(&mut self) -> Vec<f32> {
        let channels = self.channels.max(1);
        let whole = self.pending.len() - self.pending.len() % channels;
        let rest = self.pending.split_off(whole);
        std::mem::replace(&mut self.pending, rest)
    }

    fn has_delivered(&self) -> bool {
        self.delivered
    }
}
