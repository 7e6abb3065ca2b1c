use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use crate::engine::{DownloadOptions, FetchEngine, ProgressEvent, ProgressHook};
use crate::output::Reporter;
use crate::utils::is_valid_youtube_url;
use crate::{Result, YtCliError};

/// Progress display for a running download.
///
/// `Downloading` events redraw a single terminal line; `Finished` clears it and
/// prints a completion notice. A fresh line is started for every file yt-dlp fetches.
pub struct DownloadProgress<'a> {
    reporter: &'a Reporter,
    visible: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl<'a> DownloadProgress<'a> {
    pub fn new(reporter: &'a Reporter, visible: bool) -> Self {
        Self {
            reporter,
            visible,
            bar: Mutex::new(None),
        }
    }

    fn new_bar(&self) -> ProgressBar {
        let bar = if self.visible {
            let bar = ProgressBar::new_spinner();
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        } else {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
        };

        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style);
        }

        bar
    }
}

impl ProgressHook for DownloadProgress<'_> {
    fn on_progress(&self, event: &ProgressEvent) {
        let mut bar = self.bar.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        match event {
            ProgressEvent::Downloading { percent, speed, eta } => {
                let na = || "N/A".to_string();
                bar.get_or_insert_with(|| self.new_bar()).set_message(format!(
                    "Downloading: {} at {} ETA: {}",
                    percent.clone().unwrap_or_else(na),
                    speed.clone().unwrap_or_else(na),
                    eta.clone().unwrap_or_else(na),
                ));
            }
            ProgressEvent::Finished => {
                if let Some(bar) = bar.take() {
                    bar.finish_and_clear();
                }
                self.reporter.info("Download completed, processing...");
            }
        }
    }
}

/// Download a YouTube video, or only its audio as MP3
pub async fn download_video(
    engine: &dyn FetchEngine,
    reporter: &Reporter,
    url: &str,
    audio_only: bool,
    output_dir: &Path,
    show_progress: bool,
) -> Result<()> {
    if !is_valid_youtube_url(url) {
        return Err(YtCliError::InvalidUrl.into());
    }

    fs_err::create_dir_all(output_dir)?;

    let options = if audio_only {
        reporter.info("Downloading audio only...");
        DownloadOptions::audio(output_dir)
    } else {
        reporter.info("Downloading video...");
        DownloadOptions::video(output_dir)
    };

    tracing::info!("Downloading {} into {}", url, output_dir.display());

    let info = engine
        .extract_info(url)
        .await
        .map_err(|e| YtCliError::DownloadFailed(e.to_string()))?;

    reporter.info(format!("Title: {}", info.title.as_deref().unwrap_or("Unknown")));
    reporter.info(format!("Duration: {} seconds", info.duration_secs()));

    let progress = DownloadProgress::new(reporter, show_progress);
    engine
        .download(url, &options, &progress)
        .await
        .map_err(|e| YtCliError::DownloadFailed(e.to_string()))?;

    let file_type = if audio_only { "audio" } else { "video" };
    reporter.success(format!("Successfully downloaded {} to {}", file_type, output_dir.display()));

    Ok(())
}
