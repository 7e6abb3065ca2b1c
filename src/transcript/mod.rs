use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cli::SummaryLength;
use crate::output::Reporter;
use crate::utils::extract_video_id;
use crate::{Result, YtCliError};

pub mod summary;
pub mod youtube;

pub use summary::summarize_text;
pub use youtube::YoutubeTranscriptApi;

/// One caption segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Segment text
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

/// Why a transcript could not be fetched
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("Transcripts are disabled for this video")]
    Disabled,

    #[error("No transcript found for this video")]
    NotFound,

    #[error("Failed to fetch transcript: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for TranscriptError {
    fn from(err: reqwest::Error) -> Self {
        TranscriptError::Unavailable(err.to_string())
    }
}

/// Service returning the caption segments of a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript for a video id in the first available language
    async fn fetch(&self, video_id: &str, languages: &[String]) -> std::result::Result<Vec<TranscriptSegment>, TranscriptError>;
}

/// Join segment texts with single spaces
pub fn join_segments(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fetch the full transcript text of a video, reporting failures to the user
pub async fn fetch_transcript(
    source: &dyn TranscriptSource,
    reporter: &Reporter,
    url: &str,
    languages: &[String],
) -> Option<String> {
    let Some(video_id) = extract_video_id(url) else {
        reporter.error(YtCliError::InvalidUrl);
        return None;
    };

    reporter.info(format!("Fetching transcript for video ID: {}", video_id));

    match source.fetch(&video_id, languages).await {
        Ok(segments) => {
            tracing::debug!("Fetched {} transcript segments", segments.len());
            Some(join_segments(&segments))
        }
        Err(err) => {
            reporter.error(&err);
            None
        }
    }
}

/// Fetch a transcript and print its summary
pub async fn generate_summary(
    source: &dyn TranscriptSource,
    reporter: &Reporter,
    url: &str,
    tier: SummaryLength,
    languages: &[String],
) -> Result<()> {
    let transcript = fetch_transcript(source, reporter, url, languages)
        .await
        .filter(|text| !text.trim().is_empty())
        .ok_or(YtCliError::SummaryUnavailable)?;

    reporter.info(format!("Generating {} summary...", tier));
    let summary = summarize_text(&transcript, tier);

    reporter.success("Summary generated:\n");
    reporter.rule('=');
    reporter.line(&summary);
    reporter.rule('=');
    reporter.line(format!("\nOriginal length: {} words", transcript.split_whitespace().count()));
    reporter.line(format!("Summary length: {} words", summary.split_whitespace().count()));

    Ok(())
}
