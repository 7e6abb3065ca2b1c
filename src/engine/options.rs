use std::path::Path;

/// Format selector for audio-only downloads
pub const AUDIO_FORMAT: &str = "bestaudio/best";

/// Format selector preferring mp4 video with m4a audio
pub const VIDEO_FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Post-processing step run by yt-dlp after the download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessor {
    /// Extract the audio track with FFmpeg
    ExtractAudio { codec: String, quality_kbps: u32 },
}

impl PostProcessor {
    fn to_args(&self) -> Vec<String> {
        match self {
            PostProcessor::ExtractAudio { codec, quality_kbps } => vec![
                "--extract-audio".to_string(),
                "--audio-format".to_string(),
                codec.clone(),
                "--audio-quality".to_string(),
                format!("{}K", quality_kbps),
            ],
        }
    }
}

/// Download configuration handed to the fetch engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub format: String,
    pub output_template: String,
    pub postprocessors: Vec<PostProcessor>,
    pub no_playlist: bool,
}

impl DownloadOptions {
    /// Best audio, converted to 192 kbps MP3
    pub fn audio(output_dir: &Path) -> Self {
        Self {
            format: AUDIO_FORMAT.to_string(),
            output_template: output_template(output_dir),
            postprocessors: vec![PostProcessor::ExtractAudio {
                codec: "mp3".to_string(),
                quality_kbps: 192,
            }],
            no_playlist: true,
        }
    }

    /// Best video and audio, mp4 preferred
    pub fn video(output_dir: &Path) -> Self {
        Self {
            format: VIDEO_FORMAT.to_string(),
            output_template: output_template(output_dir),
            postprocessors: Vec::new(),
            no_playlist: true,
        }
    }

    /// Lower the options to yt-dlp arguments (URL not included)
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--format".to_string(),
            self.format.clone(),
            "--output".to_string(),
            self.output_template.clone(),
        ];

        if self.no_playlist {
            args.push("--no-playlist".to_string());
        }

        for postprocessor in &self.postprocessors {
            args.extend(postprocessor.to_args());
        }

        args
    }
}

fn output_template(output_dir: &Path) -> String {
    output_dir
        .join("%(title)s.%(ext)s")
        .to_string_lossy()
        .into_owned()
}
