use serde::Serialize;

use crate::engine::{FetchEngine, VideoInfo};
use crate::output::Reporter;
use crate::utils::{format_count, format_duration, is_valid_youtube_url};
use crate::{Result, YtCliError};

const NOT_AVAILABLE: &str = "N/A";
const DESCRIPTION_LIMIT: usize = 500;
const TAG_PREVIEW: usize = 5;

/// Flat metadata record printed by the `metadata` command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub title: String,
    pub channel: String,
    pub channel_id: String,
    pub duration: u64,
    pub duration_formatted: String,
    pub view_count: u64,
    pub like_count: u64,
    pub upload_date: String,
    pub description: String,
    pub thumbnail: String,
    pub video_id: String,
    pub url: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

impl VideoMetadata {
    /// Build the record, filling placeholders for anything the engine left out
    pub fn from_info(info: VideoInfo, url: &str) -> Self {
        let or_na = |value: Option<String>| value.unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let duration = info.duration_secs();

        Self {
            title: or_na(info.title),
            channel: or_na(info.uploader),
            channel_id: or_na(info.channel_id),
            duration,
            duration_formatted: format_duration(duration),
            view_count: info.view_count.unwrap_or(0),
            like_count: info.like_count.unwrap_or(0),
            upload_date: or_na(info.upload_date),
            description: or_na(info.description),
            thumbnail: or_na(info.thumbnail),
            video_id: or_na(info.id),
            url: url.to_string(),
            categories: info.categories.unwrap_or_default(),
            tags: info.tags.unwrap_or_default(),
        }
    }

    /// Fixed-layout text report
    pub fn render_text(&self, reporter: &Reporter) {
        reporter.rule('=');
        reporter.line(format!("Title:        {}", self.title));
        reporter.line(format!("Channel:      {}", self.channel));
        reporter.line(format!("Video ID:     {}", self.video_id));
        reporter.line(format!("Duration:     {}", self.duration_formatted));
        reporter.line(format!("Views:        {}", format_count(self.view_count)));
        reporter.line(format!("Likes:        {}", format_count(self.like_count)));
        reporter.line(format!("Upload Date:  {}", self.upload_date));
        reporter.line(format!("Thumbnail:    {}", self.thumbnail));

        if !self.categories.is_empty() {
            reporter.line(format!("Categories:   {}", self.categories.join(", ")));
        }

        if !self.tags.is_empty() {
            reporter.line(format!("Tags:         {}", tags_preview(&self.tags)));
        }

        reporter.line("\nDescription:");
        reporter.rule('-');
        reporter.line(truncate_description(&self.description));
        reporter.rule('=');
    }
}

/// First five tags, with a count of the rest
pub fn tags_preview(tags: &[String]) -> String {
    let mut preview = tags
        .iter()
        .take(TAG_PREVIEW)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    if tags.len() > TAG_PREVIEW {
        preview.push_str(&format!("... (+{} more)", tags.len() - TAG_PREVIEW));
    }

    preview
}

/// Limit the description to its first 500 characters
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() <= DESCRIPTION_LIMIT {
        return description.to_string();
    }

    let mut truncated: String = description.chars().take(DESCRIPTION_LIMIT).collect();
    truncated.push_str("...");
    truncated
}

/// Extract and print metadata for a YouTube video
pub async fn extract_metadata(
    engine: &dyn FetchEngine,
    reporter: &Reporter,
    url: &str,
    output_json: bool,
) -> Result<()> {
    if !is_valid_youtube_url(url) {
        return Err(YtCliError::InvalidUrl.into());
    }

    reporter.info("Extracting metadata...");

    let info = engine
        .extract_info(url)
        .await
        .map_err(|e| YtCliError::MetadataFailed(e.to_string()))?;
    let metadata = VideoMetadata::from_info(info, url);

    if output_json {
        reporter.line(serde_json::to_string_pretty(&metadata)?);
    } else {
        reporter.success("Metadata extracted:\n");
        metadata.render_text(reporter);
    }

    Ok(())
}
