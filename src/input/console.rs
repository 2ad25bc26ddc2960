use crate::messages::ControlEvent;
use crate::services::RecorderHandle;
use anyhow::{Context, Result};
use std::io::BufRead;

/// Parse one line of the control protocol.
///
/// ```text
/// enter <actor>   actor entered the trigger zone
/// exit <actor>    actor left the trigger zone
/// toggle          toggle key pressed
/// quit            finish any recording and exit
/// ```
///
/// Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ControlEvent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default().to_ascii_lowercase();
    let argument = words.next();

    let event = match (command.as_str(), argument) {
        ("enter", Some(actor)) => ControlEvent::ZoneEnter {
            actor: actor.to_string(),
        },
        ("exit", Some(actor)) => ControlEvent::ZoneExit {
            actor: actor.to_string(),
        },
        ("toggle", None) => ControlEvent::Toggle,
        ("quit", None) => ControlEvent::Shutdown,
        _ => return Err(anyhow::anyhow!("Unrecognised command: {:?}", line)),
    };

    Ok(Some(event))
}

/// Forward control commands read line by line until EOF or `quit`.
///
/// Blocking; run it on its own thread (see [`spawn_stdin_reader`]).
pub fn read_commands<R: BufRead>(reader: R, recorder: &RecorderHandle) -> Result<()> {
    for line in reader.lines() {
        let line = line.context("Failed to read control input")?;
        match parse_line(&line) {
            Ok(Some(event)) => {
                let quit = event == ControlEvent::Shutdown;
                recorder.blocking_send(event)?;
                if quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("{}", e),
        }
    }

    tracing::debug!("Control input closed");
    Ok(())
}

/// Read control commands from stdin on a dedicated thread.
///
/// A blocking stdin read cannot be cancelled, so it is kept off the runtime's
/// blocking pool to avoid stalling shutdown.
pub fn spawn_stdin_reader(recorder: RecorderHandle) -> Result<()> {
    std::thread::Builder::new()
        .name("control-input".to_string())
        .spawn(move || {
            if let Err(e) = read_commands(std::io::stdin().lock(), &recorder) {
                tracing::warn!("Control input failed: {}", e);
            }
        })
        .context("Failed to spawn control input thread")?;
    Ok(())
}
