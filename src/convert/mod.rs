use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::cli::Quality;
use crate::output::Reporter;
use crate::utils::{check_command_available, format_file_size};
use crate::{Result, YtCliError};

/// Extensions picked up by folder compression, in enumeration order
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "flv", "wmv"];

/// Media transcoding binary
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Version probe; false when the binary cannot be run
    async fn is_available(&self) -> bool;

    /// Run with the given arguments, returning stderr on failure
    async fn run(&self, args: Vec<String>) -> std::result::Result<(), String>;
}

/// FFmpeg executable
pub struct Ffmpeg {
    path: String,
}

impl Ffmpeg {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl Transcoder for Ffmpeg {
    async fn is_available(&self) -> bool {
        check_command_available(&self.path, "-version").await
    }

    async fn run(&self, args: Vec<String>) -> std::result::Result<(), String> {
        tracing::debug!("Running {} {:?}", self.path, args);

        let output = Command::new(&self.path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("failed to run {}: {}", self.path, e))?;

        if !output.status.success() {
            return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
        }

        Ok(())
    }
}

/// Convert and compress media files through a transcoder
pub struct Converter<'a> {
    transcoder: &'a dyn Transcoder,
    reporter: &'a Reporter,
}

impl<'a> Converter<'a> {
    pub fn new(transcoder: &'a dyn Transcoder, reporter: &'a Reporter) -> Self {
        Self { transcoder, reporter }
    }

    async fn ensure_transcoder(&self) -> Result<()> {
        if !self.transcoder.is_available().await {
            return Err(YtCliError::FfmpegMissing.into());
        }
        Ok(())
    }

    /// Convert a media file to another container/format, next to the input
    pub async fn convert_file(&self, input: &Path, format: &str) -> Result<PathBuf> {
        self.ensure_transcoder().await?;

        if !input.exists() {
            return Err(YtCliError::FileNotFound(input.display().to_string()).into());
        }

        let format = format.trim_start_matches('.');
        let output = input.with_extension(format);

        self.reporter.info(format!("Converting {} to {}...", display_name(input), format));

        let args = vec![
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-y".to_string(),
            output.to_string_lossy().into_owned(),
        ];
        self.transcoder
            .run(args)
            .await
            .map_err(YtCliError::ConversionFailed)?;

        self.reporter.success(format!("Converted to {}", output.display()));

        let original_size = fs_err::metadata(input)?.len();
        let new_size = fs_err::metadata(&output)?.len();
        self.reporter.info(format!("Original: {}", format_file_size(original_size)));
        self.reporter.info(format!("Converted: {}", format_file_size(new_size)));

        Ok(output)
    }

    /// Re-encode a video with x264 at the CRF for `quality`
    pub async fn compress_file(&self, input: &Path, quality: Quality) -> Result<PathBuf> {
        self.ensure_transcoder().await?;

        if !input.exists() {
            return Err(YtCliError::FileNotFound(input.display().to_string()).into());
        }

        let output = compressed_path(input);

        self.reporter.info(format!("Compressing {} (quality: {})...", display_name(input), quality));

        let args = vec![
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-vcodec".to_string(),
            "libx264".to_string(),
            "-crf".to_string(),
            quality.crf().to_string(),
            "-preset".to_string(),
            "medium".to_string(),
            "-y".to_string(),
            output.to_string_lossy().into_owned(),
        ];
        self.transcoder
            .run(args)
            .await
            .map_err(YtCliError::CompressionFailed)?;

        self.reporter.success(format!("Compressed to {}", output.display()));

        let original_size = fs_err::metadata(input)?.len();
        let new_size = fs_err::metadata(&output)?.len();
        self.reporter.info(format!("Original: {}", format_file_size(original_size)));
        self.reporter.info(format!("Compressed: {}", format_file_size(new_size)));
        self.reporter.info(format!("Size reduction: {:.1}%", size_reduction(original_size, new_size)));

        Ok(output)
    }

    /// Compress every video in a folder, stopping at the first failure
    pub async fn compress_folder(&self, folder: &Path, quality: Quality) -> Result<usize> {
        if !folder.is_dir() {
            return Err(YtCliError::FolderNotFound(folder.display().to_string()).into());
        }

        let videos = find_video_files(folder)?;
        if videos.is_empty() {
            return Err(YtCliError::NoVideoFiles(folder.display().to_string()).into());
        }

        self.reporter.info(format!("Found {} video file(s)", videos.len()));

        for video in &videos {
            self.reporter.line("");
            self.reporter.rule('=');
            self.compress_file(video, quality).await?;
        }

        self.reporter.line("");
        self.reporter.rule('=');
        self.reporter.success(format!("Compressed {} video file(s)", videos.len()));

        Ok(videos.len())
    }

    /// Compress a single file, or every video in a directory
    pub async fn compress_path(&self, path: &Path, quality: Quality) -> Result<()> {
        if path.is_dir() {
            self.compress_folder(path, quality).await?;
        } else {
            self.compress_file(path, quality).await?;
        }
        Ok(())
    }
}

/// Video files directly inside `folder`, grouped by extension order, sorted by name
pub fn find_video_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs_err::read_dir(folder)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let videos = VIDEO_EXTENSIONS
        .iter()
        .flat_map(|ext| {
            files
                .iter()
                .filter(move |path| path.extension().and_then(|e| e.to_str()) == Some(*ext))
                .cloned()
        })
        .collect();

    Ok(videos)
}

/// `<stem>_compressed.<ext>` next to the input
pub fn compressed_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut name = format!("{}_compressed", stem);
    if let Some(ext) = input.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }

    input.with_file_name(name)
}

fn size_reduction(original: u64, new: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - new as f64) / original as f64 * 100.0
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Transcoder mock that is installed and writes `bytes` to the output path
    fn working_transcoder(bytes: usize, calls: Arc<Mutex<Vec<Vec<String>>>>) -> MockTranscoder {
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_is_available().returning(|| true);
        transcoder.expect_run().returning(move |args| {
            let output = args.last().cloned().unwrap();
            fs_err::write(&output, vec![0u8; bytes]).unwrap();
            calls.lock().unwrap().push(args);
            Ok(())
        });
        transcoder
    }

    fn missing_transcoder() -> MockTranscoder {
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_is_available().returning(|| false);
        transcoder.expect_run().never();
        transcoder
    }

    fn is_error(err: &anyhow::Error, check: impl Fn(&YtCliError) -> bool) -> bool {
        err.downcast_ref::<YtCliError>().map(check).unwrap_or(false)
    }

    #[tokio::test]
    async fn test_convert_without_ffmpeg_fails_fast() {
        let transcoder = missing_transcoder();
        let (reporter, _captured) = Reporter::in_memory();
        let converter = Converter::new(&transcoder, &reporter);

        let err = converter.convert_file(Path::new("test.mp4"), "mp3").await.unwrap_err();
        assert!(is_error(&err, |e| matches!(e, YtCliError::FfmpegMissing)));
        assert!(YtCliError::FfmpegMissing.hint().unwrap().contains("ffmpeg.org"));
    }

    #[tokio::test]
    async fn test_compress_without_ffmpeg_fails_fast() {
        let transcoder = missing_transcoder();
        let (reporter, _captured) = Reporter::in_memory();
        let converter = Converter::new(&transcoder, &reporter);

        let err = converter.compress_file(Path::new("test.mp4"), Quality::Medium).await.unwrap_err();
        assert!(is_error(&err, |e| matches!(e, YtCliError::FfmpegMissing)));
    }

    #[tokio::test]
    async fn test_convert_missing_input() {
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_is_available().returning(|| true);
        transcoder.expect_run().never();
        let (reporter, _captured) = Reporter::in_memory();
        let converter = Converter::new(&transcoder, &reporter);

        let dir = tempfile::tempdir().unwrap();
        let err = converter.convert_file(&dir.path().join("absent.mp4"), "mp3").await.unwrap_err();
        assert!(is_error(&err, |e| matches!(e, YtCliError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_convert_swaps_extension_and_reports_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        fs_err::write(&input, vec![0u8; 2048]).unwrap();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let transcoder = working_transcoder(1024, calls.clone());
        let (reporter, captured) = Reporter::in_memory();
        let converter = Converter::new(&transcoder, &reporter);

        let output = converter.convert_file(&input, "mp3").await.unwrap();

        assert_eq!(output, dir.path().join("clip.mp3"));
        assert_eq!(
            calls.lock().unwrap()[0],
            vec![
                "-i".to_string(),
                input.to_string_lossy().into_owned(),
                "-y".to_string(),
                output.to_string_lossy().into_owned(),
            ]
        );

        let out = captured.stdout();
        assert!(out.contains("Converting clip.mp4 to mp3..."));
        assert!(out.contains("Original: 2.00 KB"));
        assert!(out.contains("Converted: 1.00 KB"));
    }

    #[tokio::test]
    async fn test_compress_uses_crf_and_reports_reduction() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mov");
        fs_err::write(&input, vec![0u8; 1000]).unwrap();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let transcoder = working_transcoder(250, calls.clone());
        let (reporter, captured) = Reporter::in_memory();
        let converter = Converter::new(&transcoder, &reporter);

        let output = converter.compress_file(&input, Quality::Low).await.unwrap();

        assert_eq!(output, dir.path().join("clip_compressed.mov"));
        let args = calls.lock().unwrap()[0].clone();
        assert_eq!(&args[2..8], &["-vcodec", "libx264", "-crf", "28", "-preset", "medium"]);
        assert!(captured.stdout().contains("Size reduction: 75.0%"));
    }

    #[tokio::test]
    async fn test_transcoder_failure_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        fs_err::write(&input, b"not really a video").unwrap();

        let mut transcoder = MockTranscoder::new();
        transcoder.expect_is_available().returning(|| true);
        transcoder
            .expect_run()
            .times(1)
            .returning(|_| Err("Invalid data found when processing input".to_string()));
        let (reporter, _captured) = Reporter::in_memory();
        let converter = Converter::new(&transcoder, &reporter);

        let err = converter.convert_file(&input, "avi").await.unwrap_err();
        assert_eq!(err.to_string(), "Conversion failed: Invalid data found when processing input");
    }

    #[tokio::test]
    async fn test_folder_compresses_in_enumeration_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp4", "c.mkv", "a.mp4", "notes.txt", "d.wmv"] {
            fs_err::write(dir.path().join(name), vec![0u8; 100]).unwrap();
        }

        let calls = Arc::new(Mutex::new(Vec::new()));
        let transcoder = working_transcoder(50, calls.clone());
        let (reporter, captured) = Reporter::in_memory();
        let converter = Converter::new(&transcoder, &reporter);

        let count = converter.compress_folder(dir.path(), Quality::Medium).await.unwrap();

        assert_eq!(count, 4);
        let inputs: Vec<String> = calls.lock().unwrap().iter().map(|args| args[1].clone()).collect();
        let expected: Vec<String> = ["a.mp4", "b.mp4", "c.mkv", "d.wmv"]
            .iter()
            .map(|name| dir.path().join(name).to_string_lossy().into_owned())
            .collect();
        assert_eq!(inputs, expected);
        assert!(captured.stdout().contains("Found 4 video file(s)"));
        assert!(captured.stdout().contains("Compressed 4 video file(s)"));
    }

    #[tokio::test]
    async fn test_folder_aborts_on_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.mp4", "b.mp4", "c.mp4"] {
            fs_err::write(dir.path().join(name), vec![0u8; 100]).unwrap();
        }

        let attempts = Arc::new(Mutex::new(Vec::new()));
        let recorded = attempts.clone();
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_is_available().returning(|| true);
        transcoder.expect_run().returning(move |args| {
            let mut recorded = recorded.lock().unwrap();
            recorded.push(args[1].clone());
            if recorded.len() == 2 {
                return Err("encoder crashed".to_string());
            }
            fs_err::write(args.last().unwrap(), b"x").unwrap();
            Ok(())
        });
        let (reporter, captured) = Reporter::in_memory();
        let converter = Converter::new(&transcoder, &reporter);

        let err = converter.compress_folder(dir.path(), Quality::High).await.unwrap_err();

        assert_eq!(err.to_string(), "Compression failed: encoder crashed");
        assert_eq!(attempts.lock().unwrap().len(), 2);
        assert!(!captured.stdout().contains("Compressed 3 video file(s)"));
    }

    #[tokio::test]
    async fn test_folder_without_videos_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs_err::write(dir.path().join("readme.txt"), b"hi").unwrap();

        let mut transcoder = MockTranscoder::new();
        transcoder.expect_is_available().never();
        transcoder.expect_run().never();
        let (reporter, _captured) = Reporter::in_memory();
        let converter = Converter::new(&transcoder, &reporter);

        let err = converter.compress_folder(dir.path(), Quality::Medium).await.unwrap_err();
        assert!(is_error(&err, |e| matches!(e, YtCliError::NoVideoFiles(_))));
    }

    #[tokio::test]
    async fn test_compress_path_rejects_missing_file() {
        let transcoder = working_transcoder(1, Arc::new(Mutex::new(Vec::new())));
        let (reporter, _captured) = Reporter::in_memory();
        let converter = Converter::new(&transcoder, &reporter);

        let dir = tempfile::tempdir().unwrap();
        let err = converter
            .compress_path(&dir.path().join("gone.mp4"), Quality::Medium)
            .await
            .unwrap_err();
        assert!(is_error(&err, |e| matches!(e, YtCliError::FileNotFound(_))));
    }

    #[test]
    fn test_compressed_path() {
        assert_eq!(
            compressed_path(Path::new("videos/holiday.mp4")),
            PathBuf::from("videos/holiday_compressed.mp4")
        );
        assert_eq!(compressed_path(Path::new("raw")), PathBuf::from("raw_compressed"));
    }

    #[test]
    fn test_size_reduction_handles_empty_input() {
        assert_eq!(size_reduction(0, 10), 0.0);
        assert_eq!(size_reduction(200, 50), 75.0);
    }
}
