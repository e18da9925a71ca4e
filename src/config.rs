// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::engine::{Container, EncodeSettings};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub queue: QueueConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Encoder log level written as `-v N`
    #[serde(default = "default_verbosity")]
    pub verbosity: u8,

    /// Container used when a settings file does not name one
    #[serde(default = "default_container")]
    pub container: String,

    /// x264 RF per quality-slider step (0.2, 0.25, 0.5 or 1.0)
    #[serde(default = "default_cq_step")]
    pub x264_cq_step: f64,

    /// User preset file; defaults to `presets.json` next to the config
    #[serde(default)]
    pub presets_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue file; defaults to `queue.json` next to the config
    #[serde(default)]
    pub queue_file: Option<PathBuf>,
}

fn default_verbosity() -> u8 {
    1
}

fn default_container() -> String {
    "mp4".to_string()
}

fn default_cq_step() -> f64 {
    0.25
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            verbosity: default_verbosity(),
            container: default_container(),
            x264_cq_step: default_cq_step(),
            presets_file: None,
        }
    }
}

impl DefaultsConfig {
    /// Configured container, falling back to MP4 for unknown names.
    pub fn container(&self) -> Container {
        Container::from_cli_token(&self.container).unwrap_or_else(|| {
            warn!(container = %self.container, "unknown default container, using mp4");
            Container::Mp4
        })
    }
}

impl Config {
    /// Directory holding the config, presets and queue files
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("encquery")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("encquery")
        };
        Ok(config_dir)
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn presets_path(&self) -> Result<PathBuf> {
        match &self.defaults.presets_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("presets.json")),
        }
    }

    pub fn queue_path(&self) -> Result<PathBuf> {
        match &self.queue.queue_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("queue.json")),
        }
    }

    /// Load config from disk, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        let config = Config::default();
        // Best effort; the directory may not be writable
        if let Err(e) = config.save() {
            warn!(
                "Could not create default config file: {:#}. Run 'encquery init-config' to create one.",
                e
            );
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Read a JSON settings file, filling container and verbosity from the
    /// defaults when the file does not set them.
    pub fn load_settings(&self, path: &Path) -> Result<EncodeSettings> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;

        let has_container = value.get("container").is_some();
        let has_verbosity = value.get("verbosity").is_some();
        let mut settings: EncodeSettings = serde_json::from_value(value)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        if !has_container {
            settings.set_container(self.defaults.container());
        }
        if !has_verbosity {
            settings.verbosity = self.defaults.verbosity;
        }
        Ok(settings)
    }

    /// Check if config file exists
    pub fn exists() -> bool {
        Self::config_path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Create a default config file if it doesn't exist
    pub fn ensure_default() -> Result<()> {
        if !Self::exists() {
            Config::default().save()?;
        }
        Ok(())
    }
}
