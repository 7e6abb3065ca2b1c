use anyhow::Context;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{TranscriptError, TranscriptSegment, TranscriptSource};

const WATCH_URL: &str = "https://www.youtube.com/watch";
const USER_AGENT: &str = concat!("yt-cli/", env!("CARGO_PKG_VERSION"));

lazy_static! {
    static ref CONSENT_VALUE_RE: Regex = Regex::new(r#"name="v" value="(.*?)""#).expect("valid regex");
    static ref TEXT_RE: Regex = Regex::new(r"(?s)<text\b([^>]*)>(.*?)</text>").expect("valid regex");
    static ref ATTR_RE: Regex = Regex::new(r#"(\w+)="([^"]*)""#).expect("valid regex");
    static ref ENTITY_RE: Regex = Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid regex");
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").expect("valid regex");
}

/// Caption track advertised by the watch page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    /// Automatic speech recognition track
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    caption_tracks: Option<Vec<CaptionTrack>>,
}

/// Transcript source reading YouTube's caption tracks over HTTPS
pub struct YoutubeTranscriptApi {
    client: Client,
}

impl YoutubeTranscriptApi {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    async fn get_text(&self, url: &str, cookie: Option<&str>) -> Result<String, TranscriptError> {
        let mut request = self.client.get(url).header(ACCEPT_LANGUAGE, "en-US");
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Fetch the watch page, accepting the cookie consent interstitial if shown
    async fn fetch_watch_html(&self, video_id: &str) -> Result<String, TranscriptError> {
        let url = Url::parse_with_params(WATCH_URL, &[("v", video_id)])
            .map_err(|e| TranscriptError::Unavailable(e.to_string()))?;

        let html = self.get_text(url.as_str(), None).await?;
        let Some(token) = consent_token(&html) else {
            return Ok(html);
        };

        tracing::debug!("Accepting cookie consent for {}", video_id);
        let cookie = format!("CONSENT=YES+{}", token);
        let html = self.get_text(url.as_str(), Some(&cookie)).await?;

        if consent_token(&html).is_some() {
            return Err(TranscriptError::Unavailable(
                "could not get past the cookie consent page".to_string(),
            ));
        }

        Ok(html)
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptApi {
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let html = self.fetch_watch_html(video_id).await?;
        let tracks = parse_caption_tracks(&html)?;

        let Some(track) = select_track(&tracks, languages) else {
            tracing::debug!("No caption track for languages {:?}", languages);
            return Err(TranscriptError::NotFound);
        };

        tracing::debug!(
            "Using {} caption track ({})",
            track.language_code,
            if track.is_generated() { "generated" } else { "manual" }
        );

        let xml = self.get_text(&track.base_url, None).await?;
        transcript_segments(&xml)
    }
}

fn consent_token(html: &str) -> Option<String> {
    if !html.contains("action=\"https://consent.youtube.com/s\"") {
        return None;
    }

    CONSENT_VALUE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Pull the caption track list out of the watch page's player response
pub fn parse_caption_tracks(html: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
    let Some((_, rest)) = html.split_once("\"captions\":") else {
        if html.contains("class=\"g-recaptcha\"") {
            return Err(TranscriptError::Unavailable(
                "YouTube is rate limiting requests from this IP".to_string(),
            ));
        }
        if !html.contains("\"playabilityStatus\":") {
            return Err(TranscriptError::Unavailable("the video is no longer available".to_string()));
        }
        return Err(TranscriptError::Disabled);
    };

    let json = rest
        .split(",\"videoDetails")
        .next()
        .unwrap_or(rest)
        .replace('\n', "");

    let captions: Captions = serde_json::from_str(&json)
        .map_err(|e| TranscriptError::Unavailable(format!("could not parse caption data: {}", e)))?;

    match captions.renderer.and_then(|r| r.caption_tracks) {
        Some(tracks) if !tracks.is_empty() => Ok(tracks),
        _ => Err(TranscriptError::Disabled),
    }
}

/// First track matching the language preference, manual tracks before generated ones
pub fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|lang| {
        let matching = || tracks.iter().filter(move |t| &t.language_code == lang);
        matching()
            .find(|t| !t.is_generated())
            .or_else(|| matching().find(|t| t.is_generated()))
    })
}

/// Segments of a timed-text response; a body without any is a refused request
pub fn transcript_segments(xml: &str) -> Result<Vec<TranscriptSegment>, TranscriptError> {
    let segments = parse_timed_text(xml);
    if segments.is_empty() {
        return Err(TranscriptError::Unavailable("empty transcript response".to_string()));
    }
    Ok(segments)
}

/// Parse YouTube's timed-text XML into segments
pub fn parse_timed_text(xml: &str) -> Vec<TranscriptSegment> {
    TEXT_RE
        .captures_iter(xml)
        .filter_map(|caps| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str());

            // Entities are escaped once for XML and once more for HTML.
            let text = unescape_entities(&unescape_entities(body));
            let text = TAG_RE.replace_all(&text, "").trim().to_string();
            if text.is_empty() {
                return None;
            }

            Some(TranscriptSegment {
                text,
                start: attribute(attrs, "start").unwrap_or(0.0),
                duration: attribute(attrs, "dur").unwrap_or(0.0),
            })
        })
        .collect()
}

fn attribute(attrs: &str, name: &str) -> Option<f64> {
    ATTR_RE
        .captures_iter(attrs)
        .find(|caps| &caps[1] == name)
        .and_then(|caps| caps[2].parse().ok())
}

fn unescape_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };

            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}
