use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Anchored at the start only; anything after the 11-character id is accepted.
    static ref YOUTUBE_URL_RE: Regex = Regex::new(
        r"^(https?://)?(www\.)?(youtube|youtu|youtube-nocookie)\.(com|be)/(watch\?v=|embed/|v/|.+\?v=)?([^&=%\?]{11})"
    )
    .expect("valid YouTube URL regex");
}

/// Check whether the input looks like a YouTube video URL
pub fn is_valid_youtube_url(url: &str) -> bool {
    YOUTUBE_URL_RE.is_match(url)
}

/// Extract the 11-character video id from a YouTube URL
pub fn extract_video_id(url: &str) -> Option<String> {
    YOUTUBE_URL_RE
        .captures(url)
        .and_then(|caps| caps.get(6))
        .map(|m| m.as_str().to_string())
}

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    let mut size = bytes as f64;
    for unit in UNITS {
        if size < THRESHOLD {
            return format!("{:.2} {}", size, unit);
        }
        size /= THRESHOLD;
    }

    format!("{:.2} PB", size)
}

/// Format duration as `HH:MM:SS`, or `MM:SS` under an hour
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Format a count with thousands separators
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Check if a command is available by running its version probe
pub async fn check_command_available(command: &str, version_flag: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(version_flag)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
