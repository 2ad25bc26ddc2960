use crate::services::RecorderHandle;
use anyhow::{Context, Result};
use evdev::{EventType, KeyCode};
use futures::StreamExt;

/// Parse an evdev key name; the `KEY_` prefix is optional (`E`, `key_e`, `KEY_E`).
pub fn parse_key(name: &str) -> Result<KeyCode> {
    let name = name.trim().to_ascii_uppercase();
    let name = if name.starts_with("KEY_") {
        name
    } else {
        format!("KEY_{}", name)
    };

    name.parse::<KeyCode>()
        .map_err(|_| anyhow::anyhow!("Unknown key: {}", name))
}

/// Watch every keyboard that has `key` and send a toggle on each key-down.
///
/// Auto-repeat (value 2) and key-up (value 0) are ignored, so holding the key
/// produces a single toggle. Needs read access to /dev/input.
pub async fn monitor_keyboards(key: KeyCode, recorder: RecorderHandle) -> Result<()> {
    let mut streams = Vec::new();

    for (path, device) in evdev::enumerate() {
        let has_key = device
            .supported_keys()
            .is_some_and(|keys| keys.contains(key));
        if !has_key {
            continue;
        }

        let name = device.name().unwrap_or("unknown").to_string();
        match device.into_event_stream() {
            Ok(stream) => {
                tracing::debug!("Monitoring {} ({})", name, path.display());
                streams.push(stream);
            }
            Err(e) => tracing::warn!("Cannot read {}: {}", path.display(), e),
        }
    }

    if streams.is_empty() {
        return Err(anyhow::anyhow!(
            "No readable keyboard exposes {:?} (is the user in the input group?)",
            key
        ));
    }

    tracing::info!("Press {:?} to start/stop recording", key);

    let mut events = futures::stream::select_all(streams);
    while let Some(event) = events.next().await {
        let event = event.context("Keyboard event stream failed")?;
        if event.event_type() == EventType::KEY && event.code() == key.code() && event.value() == 1
        {
            tracing::debug!("Toggle key pressed");
            if recorder.toggle().await.is_err() {
                break;
            }
        }
    }

    Ok(())
}
