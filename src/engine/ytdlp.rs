use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use super::{DownloadOptions, EngineError, FetchEngine, ProgressEvent, ProgressHook, VideoInfo};

lazy_static! {
    // [download] 100% of   10.00MiB in 00:00:03 at 3.00MiB/s
    static ref FINISHED_RE: Regex =
        Regex::new(r"^\[download\]\s+100(?:\.0+)?%\s+of\s+~?\s*\S+\s+in\s+").expect("valid regex");
    static ref ALREADY_RE: Regex =
        Regex::new(r"^\[download\].*has already been downloaded").expect("valid regex");
    // [download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)
    static ref PROGRESS_RE: Regex = Regex::new(
        r"^\[download\]\s+(\d+(?:\.\d+)?%)\s+of\s+~?\s*\S+(?:\s+at\s+(.+?))?(?:\s+ETA\s+(\S+))?(?:\s+\(frag\s+\d+/\d+\))?\s*$"
    )
    .expect("valid regex");
}

/// Fetch engine backed by the yt-dlp executable
pub struct YtDlp {
    path: String,
}

impl YtDlp {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl FetchEngine for YtDlp {
    async fn extract_info(&self, url: &str) -> Result<VideoInfo, EngineError> {
        tracing::debug!("Extracting video info for: {}", url);

        let output = Command::new(&self.path)
            .args(["--dump-json", "--no-playlist", "--no-warnings", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(spawn_error)?;

        if !output.status.success() {
            return Err(EngineError::Failed(error_message(&String::from_utf8_lossy(&output.stderr))));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        hook: &dyn ProgressHook,
    ) -> Result<(), EngineError> {
        let mut args = options.to_args();
        args.push("--newline".to_string());
        args.push(url.to_string());

        tracing::debug!("Running {} {:?}", self.path, args);

        let mut child = Command::new(&self.path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Failed("yt-dlp stdout was not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::Failed("yt-dlp stderr was not captured".to_string()))?;

        // Drained separately so a chatty stderr cannot block the child.
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).into_owned()
        });

        // Titles are not always UTF-8 on the console, so lines are decoded lossily.
        let mut lines = BufReader::new(stdout).split(b'\n');
        while let Some(raw) = lines.next_segment().await? {
            let line = String::from_utf8_lossy(&raw);
            match parse_progress_line(&line) {
                Some(event) => hook.on_progress(&event),
                None => tracing::debug!("yt-dlp: {}", line.trim_end()),
            }
        }

        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(EngineError::Failed(error_message(&stderr)));
        }

        Ok(())
    }
}

/// Parse a `--newline` progress line from yt-dlp
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let line = line.trim();

    if FINISHED_RE.is_match(line) || ALREADY_RE.is_match(line) {
        return Some(ProgressEvent::Finished);
    }

    let caps = PROGRESS_RE.captures(line)?;
    let text = |i: usize| caps.get(i).map(|m| m.as_str().trim().to_string());

    Some(ProgressEvent::Downloading {
        percent: text(1),
        speed: text(2),
        eta: text(3),
    })
}

fn spawn_error(err: std::io::Error) -> EngineError {
    if err.kind() == ErrorKind::NotFound {
        EngineError::NotInstalled
    } else {
        EngineError::Io(err)
    }
}

/// Prefer yt-dlp's `ERROR:` lines over warnings and noise
fn error_message(stderr: &str) -> String {
    let errors: Vec<&str> = stderr
        .lines()
        .filter(|line| line.starts_with("ERROR:"))
        .collect();

    if errors.is_empty() {
        let trimmed = stderr.trim();
        if trimmed.is_empty() {
            "yt-dlp exited with an error".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        errors.join("\n")
    }
}
