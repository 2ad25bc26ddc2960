use std::path::Path;
use tokio::process::Command;

/// Substitute `{path}` with the shell-quoted recording path.
pub fn expand_command(command: &str, path: &Path) -> String {
    command.replace("{path}", &shell_quote(&path.to_string_lossy()))
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Run the post-save hook for a finished recording in the background.
///
/// The command runs through `sh -c` with `WAV_PATH` set; failures are logged
/// and never affect the recorder.
pub fn run_on_saved(command: &str, path: &Path) {
    let command = expand_command(command, path);
    let wav_path = path.to_path_buf();

    tokio::task::spawn(async move {
        tracing::info!("[on_saved] Running hook: {}", command);

        match Command::new("sh")
            .arg("-c")
            .arg(&command)
            .env("WAV_PATH", &wav_path)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
        {
            Ok(child) => match child.wait_with_output().await {
                Ok(output) => {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    if !stdout.trim().is_empty() {
                        tracing::info!("[on_saved] {}", stdout.trim());
                    }
                    if !output.status.success() {
                        let stderr = String::from_utf8_lossy(&output.stderr);
                        tracing::warn!(
                            "[on_saved] Hook exited with {}: {}",
                            output.status,
                            stderr.trim()
                        );
                    }
                }
                Err(e) => tracing::warn!("[on_saved] Failed to wait on hook: {}", e),
            },
            Err(e) => tracing::warn!("[on_saved] Failed to spawn hook: {}", e),
        }
    });
}
