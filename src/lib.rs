//! YT CLI Tools - a command-line toolkit for YouTube content creators
//!
//! Downloads videos and audio through yt-dlp, fetches and summarizes transcripts,
//! converts and compresses media through FFmpeg, and extracts video metadata.

pub mod cli;
pub mod config;
pub mod convert;
pub mod download;
pub mod engine;
pub mod metadata;
pub mod output;
pub mod transcript;
pub mod utils;

pub use cli::{Cli, Commands, Quality, SummaryLength};
pub use config::Config;
pub use output::Reporter;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Failures the CLI reports to the user as handled errors
#[derive(thiserror::Error, Debug)]
pub enum YtCliError {
    #[error("Invalid YouTube URL")]
    InvalidUrl,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("No video files found in {0}")]
    NoVideoFiles(String),

    #[error("FFmpeg is not installed. Please install FFmpeg to use this feature.")]
    FfmpegMissing,

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Failed to extract metadata: {0}")]
    MetadataFailed(String),

    #[error("Could not generate summary")]
    SummaryUnavailable,
}

impl YtCliError {
    /// Remediation hint printed after the error, if any
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            YtCliError::FfmpegMissing => Some("Download from: https://ffmpeg.org/download.html"),
            _ => None,
        }
    }
}
