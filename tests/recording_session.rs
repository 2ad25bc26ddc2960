use std::fs;
use std::path::Path;

use wav_station::audio::pcm::{self, DEFAULT_SCALE, Quantization};
use wav_station::audio::wav_header::HEADER_SIZE;
use wav_station::audio::{AudioFormat, ManualCapture, WavHeader};
use wav_station::paths::{NamingPolicy, OutputPaths};
use wav_station::{
    ControlEvent, IgnoreReason, RecorderState, SessionController, SessionSettings, Transition,
    TriggerState,
};

fn station(dir: &Path, format: AudioFormat) -> SessionController<ManualCapture> {
    let settings = SessionSettings {
        paths: OutputPaths::new(dir.join("Player_Recordings"), NamingPolicy::default()),
        format,
        quantization: Quantization::Truncate,
        actor_tag: "Player".to_string(),
        max_duration: None,
    };
    SessionController::new(settings, ManualCapture::new())
}

fn enter_zone(controller: &mut SessionController<ManualCapture>) {
    let event = ControlEvent::ZoneEnter {
        actor: "Player".to_string(),
    };
    controller.handle(&event).unwrap();
    assert_eq!(controller.trigger(), TriggerState::Eligible);
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

#[test]
fn mono_take_from_toggle_to_toggle() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = station(dir.path(), AudioFormat::default());
    enter_zone(&mut controller);

    let Transition::Started { path } = controller.handle(&ControlEvent::Toggle).unwrap() else {
        panic!("toggle inside the zone should start a recording");
    };
    assert_eq!(controller.state(), RecorderState::Recording);
    assert_eq!(fs::read(&path).unwrap(), vec![0u8; HEADER_SIZE]);

    controller.deliver(&[0.0, 0.5, -1.0, 1.0]).unwrap();

    let transition = controller.handle(&ControlEvent::Toggle).unwrap();
    assert_eq!(
        transition,
        Transition::Stopped {
            path: path.clone(),
            data_bytes: 8
        }
    );
    assert_eq!(controller.state(), RecorderState::Idle);

    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), HEADER_SIZE + 8);
    assert_eq!(u32_at(&bytes, 4), 44);
    assert_eq!(u32_at(&bytes, 40), 8);
    assert_eq!(
        &bytes[HEADER_SIZE..],
        &[0x00, 0x00, 0xFF, 0x3F, 0x01, 0x80, 0xFF, 0x7F]
    );

    let reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
    assert_eq!(samples, vec![0, 16383, -32767, 32767]);
}

#[test]
fn buffers_are_concatenated_in_delivery_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = station(dir.path(), AudioFormat::default());
    enter_zone(&mut controller);

    let a: Vec<f32> = (0..300).map(|i| (i as f32 / 300.0).sin()).collect();
    let b: Vec<f32> = vec![-0.25; 17];
    let c: Vec<f32> = (0..64).map(|i| if i % 2 == 0 { 0.9 } else { -0.9 }).collect();

    controller.toggle().unwrap();
    for buffer in [&a, &b, &c] {
        controller.deliver(buffer).unwrap();
    }
    let Transition::Stopped { path, data_bytes } = controller.toggle().unwrap() else {
        panic!("expected the second toggle to stop");
    };

    let mut expected = Vec::new();
    for buffer in [&a, &b, &c] {
        pcm::extend_le_bytes(&pcm::encode(buffer), &mut expected);
    }

    let bytes = fs::read(&path).unwrap();
    assert_eq!(data_bytes, expected.len() as u64);
    assert_eq!(&bytes[HEADER_SIZE..], expected.as_slice());

    let header = WavHeader::parse(&bytes).unwrap();
    assert_eq!(header.data_bytes as usize, expected.len());
    assert_eq!(header.chunk_size() as usize, HEADER_SIZE + expected.len() - 8);
    assert_eq!(bytes.len(), HEADER_SIZE + expected.len());
}

#[test]
fn stereo_take_stays_frame_aligned() {
    let dir = tempfile::tempdir().unwrap();
    let format = AudioFormat::new(48000, 2).unwrap();
    let mut controller = station(dir.path(), format);

    controller.start().unwrap();
    controller.deliver(&[0.5, -0.5, 0.25]).unwrap();
    controller.deliver(&[1.0, -1.0]).unwrap();
    let Transition::Stopped { path, data_bytes } = controller.stop().unwrap() else {
        panic!("expected a stop");
    };
    assert_eq!(data_bytes, 8);

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().channels, 2);
    assert_eq!(reader.spec().sample_rate, 48000);
    let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
    assert_eq!(samples, vec![16383, -16383, 32767, -32767]);
}

#[test]
fn toggle_outside_zone_never_touches_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = station(dir.path(), AudioFormat::default());

    for _ in 0..3 {
        assert_eq!(
            controller.handle(&ControlEvent::Toggle).unwrap(),
            Transition::Ignored(IgnoreReason::NotEligible)
        );
    }
    assert_eq!(controller.state(), RecorderState::Idle);
    assert!(!dir.path().join("Player_Recordings").exists());
}

#[test]
fn fixed_name_takes_overwrite_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = station(dir.path(), AudioFormat::default());
    enter_zone(&mut controller);

    controller.toggle().unwrap();
    controller.deliver(&[0.1; 100]).unwrap();
    let Transition::Stopped { path: first, .. } = controller.toggle().unwrap() else {
        panic!("expected a stop");
    };

    controller.toggle().unwrap();
    controller.deliver(&[0.1; 10]).unwrap();
    let Transition::Stopped { path: second, .. } = controller.toggle().unwrap() else {
        panic!("expected a stop");
    };

    assert_eq!(first, second);
    assert_eq!(fs::metadata(&second).unwrap().len(), (HEADER_SIZE + 20) as u64);
}

#[test]
fn decoded_take_matches_input_within_one_step() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = station(dir.path(), AudioFormat::default());

    let input: Vec<f32> = (0..441).map(|i| (i as f32 * 0.05).sin() * 0.8).collect();
    controller.start().unwrap();
    controller.deliver(&input).unwrap();
    let Transition::Stopped { path, .. } = controller.stop().unwrap() else {
        panic!("expected a stop");
    };

    let reader = hound::WavReader::open(&path).unwrap();
    let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
    let decoded = pcm::decode16(&samples, DEFAULT_SCALE);
    for (original, restored) in input.iter().zip(&decoded) {
        assert!((original - restored).abs() <= 1.0 / 32767.0 + f32::EPSILON);
    }
}
