use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External tool locations
    pub tools: ToolsConfig,

    /// Transcript settings
    pub transcript: TranscriptConfig,

    /// Download settings
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// yt-dlp executable
    pub yt_dlp: String,

    /// ffmpeg executable
    pub ffmpeg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Caption languages in order of preference
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Directory used when `--output` is not given
    pub output_dir: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, the usual locations, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!("Loading config from {}", path.display());

        let content = fs_err::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Get configuration file path, if one exists
    fn config_path() -> Option<PathBuf> {
        let local_config = PathBuf::from("yt-cli.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("yt-cli").join("config.yaml"))
            .filter(|path| path.exists())
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.tools.yt_dlp.trim().is_empty() {
            anyhow::bail!("tools.yt_dlp must not be empty");
        }

        if self.tools.ffmpeg.trim().is_empty() {
            anyhow::bail!("tools.ffmpeg must not be empty");
        }

        if self.transcript.languages.is_empty() {
            anyhow::bail!("transcript.languages must list at least one language");
        }

        Ok(())
    }
}
