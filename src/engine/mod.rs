use async_trait::async_trait;
use serde::Deserialize;

pub mod options;
pub mod ytdlp;

pub use options::{DownloadOptions, PostProcessor};
pub use ytdlp::YtDlp;

/// Errors reported by the fetch engine
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("yt-dlp is not available. Please install it: https://github.com/yt-dlp/yt-dlp")]
    NotInstalled,

    #[error("{0}")]
    Failed(String),

    #[error("failed to run yt-dlp: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse yt-dlp output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The subset of yt-dlp's info JSON this tool reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub channel_id: Option<String>,
    pub duration: Option<f64>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub upload_date: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

impl VideoInfo {
    /// Duration in whole seconds, 0 when unknown
    pub fn duration_secs(&self) -> u64 {
        self.duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| d as u64)
            .unwrap_or(0)
    }
}

/// Progress notification emitted while downloading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Downloading {
        percent: Option<String>,
        speed: Option<String>,
        eta: Option<String>,
    },
    Finished,
}

/// Receives progress events during a download
pub trait ProgressHook: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Video fetch engine: metadata extraction and downloads
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// Fetch video information without downloading
    async fn extract_info(&self, url: &str) -> Result<VideoInfo, EngineError>;

    /// Download a video, reporting progress through `hook`
    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        hook: &dyn ProgressHook,
    ) -> Result<(), EngineError>;
}
