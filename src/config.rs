use crate::audio::{AudioFormat, Quantization};
use crate::controller::SessionSettings;
use crate::paths::{self, NamingPolicy, OutputPaths};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Destination directory; the platform data directory when unset
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub naming: NamingPolicy,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_channels")]
    pub channels: u16,

    #[serde(default)]
    pub quantization: Quantization,

    #[serde(default = "default_actor_tag")]
    pub actor_tag: String,

    /// evdev key name such as `KEY_E`; `null` disables keyboard monitoring
    #[serde(default = "default_toggle_key")]
    pub toggle_key: Option<String>,

    /// cpal input device name; the default device when unset
    #[serde(default)]
    pub input_device: Option<String>,

    #[serde(default = "default_device_ready_timeout")]
    pub device_ready_timeout_ms: u64,

    #[serde(default)]
    pub max_duration_secs: Option<f32>,

    #[serde(default)]
    pub start_sound: Option<PathBuf>,

    #[serde(default)]
    pub stop_sound: Option<PathBuf>,

    /// Shell command run after each saved recording
    #[serde(default)]
    pub on_saved: Option<String>,
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_channels() -> u16 {
    1
}

fn default_actor_tag() -> String {
    "Player".to_string()
}

fn default_toggle_key() -> Option<String> {
    Some("KEY_E".to_string())
}

fn default_device_ready_timeout() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: None,
            naming: NamingPolicy::default(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            quantization: Quantization::default(),
            actor_tag: default_actor_tag(),
            toggle_key: default_toggle_key(),
            input_device: None,
            device_ready_timeout_ms: default_device_ready_timeout(),
            max_duration_secs: None,
            start_sound: None,
            stop_sound: None,
            on_saved: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/wav-station/config.json)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!(
                "Config file not found at {:?}, creating default config",
                config_path
            );
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        tracing::info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(dir)
        } else {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".config")
        };

        Ok(config_dir.join("wav-station").join("config.json"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.format()?;

        if self.actor_tag.is_empty() {
            return Err(anyhow::anyhow!("actor_tag cannot be empty"));
        }

        if let NamingPolicy::Fixed { name } = &self.naming {
            if name.is_empty() {
                return Err(anyhow::anyhow!("naming.name cannot be empty"));
            }
        }

        if let Some(secs) = self.max_duration_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(anyhow::anyhow!("max_duration_secs must be positive"));
            }
        }

        Ok(())
    }

    pub fn format(&self) -> Result<AudioFormat> {
        AudioFormat::new(self.sample_rate, self.channels).context("Invalid audio format")
    }

    pub fn device_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.device_ready_timeout_ms)
    }

    /// Configured output directory, else the platform data directory
    pub fn output_dir(&self) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => paths::default_recordings_dir()
                .context("Neither XDG_DATA_HOME nor HOME is set; configure output_dir"),
        }
    }

    pub fn session_settings(&self) -> Result<SessionSettings> {
        Ok(SessionSettings {
            paths: OutputPaths::new(self.output_dir()?, self.naming.clone()),
            format: self.format()?,
            quantization: self.quantization,
            actor_tag: self.actor_tag.clone(),
            max_duration: self
                .max_duration_secs
                .and_then(|secs| Duration::try_from_secs_f32(secs).ok()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        config.validate().unwrap();

        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.channels, 1);
        assert_eq!(config.quantization, Quantization::Truncate);
        assert_eq!(config.toggle_key.as_deref(), Some("KEY_E"));
        assert_eq!(config.naming, NamingPolicy::default());
    }

    #[test]
    fn partial_config_overrides() {
        let config: Config = serde_json::from_str(
            r#"{
                "output_dir": "/tmp/takes",
                "channels": 2,
                "quantization": "nearest",
                "toggle_key": null,
                "naming": { "mode": "timestamped", "prefix": "take" }
            }"#,
        )
        .unwrap();

        let settings = config.session_settings().unwrap();
        assert_eq!(settings.paths.dir(), Path::new("/tmp/takes"));
        assert_eq!(settings.format.channels, 2);
        assert_eq!(settings.quantization, Quantization::Nearest);
        assert!(config.toggle_key.is_none());
    }

    #[test]
    fn output_dir_prefers_configured_directory() {
        let config = Config {
            output_dir: Some(PathBuf::from("/srv/takes")),
            ..Config::default()
        };
        assert_eq!(config.output_dir().unwrap(), PathBuf::from("/srv/takes"));

        let fallback = Config::default().output_dir();
        if let Ok(dir) = fallback {
            assert!(dir.ends_with("wav-station/recordings"));
        }
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config {
            channels: 3,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        config.channels = 2;
        config.max_duration_secs = Some(0.0);
        assert!(config.validate().is_err());

        config.max_duration_secs = None;
        config.actor_tag.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            on_saved: Some("echo {path}".to_string()),
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.on_saved, config.on_saved);
    }
}
