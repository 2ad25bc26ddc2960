use wav_station::audio::{AudioFeedback, CpalCapture};
use wav_station::config::Config;
use wav_station::input::{console, keyboard};
use wav_station::messages::RecorderState;
use wav_station::services::{Recorder, RecorderHandle};
use wav_station::SessionController;

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::sync::{mpsc, watch};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting wav-station recorder");

    // Load configuration
    let config = match config_path_arg()? {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    config.validate()?;

    // Create LocalSet for !Send futures (needed for Recorder which holds cpal::Stream)
    let local = tokio::task::LocalSet::new();

    local.run_until(async move { run_app(config).await }).await
}

/// `--config <path>` is the only argument.
fn config_path_arg() -> Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => Ok(None),
        Some("--config") => {
            let path = args.next().context("--config needs a path")?;
            Ok(Some(PathBuf::from(path)))
        }
        Some(other) => Err(anyhow::anyhow!("Unexpected argument: {}", other)),
    }
}

async fn run_app(config: Config) -> Result<()> {
    let settings = config.session_settings()?;
    tracing::info!("Recordings go to {}", settings.paths.dir().display());

    let capture = CpalCapture::new(config.input_device.clone());
    let capture_ready = capture.notifier();
    let controller = SessionController::new(settings, capture);

    // Create and spawn Recorder (using spawn_local because it's !Send)
    let (event_tx, event_rx) = mpsc::channel(32);
    let (state_tx, state_rx) = watch::channel(RecorderState::Idle);
    let recorder = Recorder::new(controller, capture_ready, event_rx, state_tx)
        .with_feedback(AudioFeedback::new(
            config.start_sound.clone(),
            config.stop_sound.clone(),
        ))
        .with_on_saved(config.on_saved.clone())
        .with_ready_timeout(config.device_ready_timeout());
    let recorder_handle = RecorderHandle::new(event_tx, state_rx);
    let mut recorder_task = tokio::task::spawn_local(recorder.run());

    // Zone and toggle commands from the host on stdin
    console::spawn_stdin_reader(recorder_handle.clone())?;

    // Setup keyboard monitoring
    if let Some(key_name) = &config.toggle_key {
        let key = keyboard::parse_key(key_name)?;
        let keyboard_handle = recorder_handle.clone();
        tokio::spawn(async move {
            if let Err(e) = keyboard::monitor_keyboards(key, keyboard_handle).await {
                tracing::warn!("Keyboard monitoring disabled: {}", e);
            }
        });
    }

    tracing::info!(
        "Ready! Send 'enter {}' then toggle to start/stop recording",
        config.actor_tag
    );

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            tracing::info!("Received Ctrl+C, shutting down");
            recorder_handle.shutdown().await?;
            recorder_task.await.context("Recorder task failed")?;
        }
        result = &mut recorder_task => {
            result.context("Recorder task failed")?;
        }
    }

    tracing::info!("wav-station shutdown complete");
    Ok(())
}
