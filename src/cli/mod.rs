use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "yt-cli",
    about = "YT CLI Tools - A comprehensive toolkit for YouTube content creators",
    version,
    long_about = "Download YouTube videos or audio, summarize transcripts, convert and compress media files, and extract video metadata from your terminal.",
    after_help = "For more information, visit: https://github.com/YOUR_USERNAME/yt-cli-tools"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./yt-cli.yaml, then the user config directory)
    #[arg(long, global = true, env = "YT_CLI_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and summarize YouTube video transcript
    Transcript {
        /// YouTube video URL
        url: String,

        /// Summary length
        #[arg(long, value_enum, default_value = "medium")]
        summary: SummaryLength,
    },

    /// Download YouTube video or audio
    Download {
        /// YouTube video URL
        url: String,

        /// Download audio only (MP3 format)
        #[arg(long)]
        audio: bool,

        /// Output directory (default: current directory)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Convert media file to a different format
    Convert {
        /// Input file path
        file: PathBuf,

        /// Target format (e.g., mp3, mp4, avi)
        #[arg(long, value_name = "FORMAT")]
        to: String,
    },

    /// Compress video file(s)
    Compress {
        /// File or folder path
        path: PathBuf,

        /// Compression quality
        #[arg(long, value_enum, default_value = "medium")]
        quality: Quality,
    },

    /// Extract YouTube video metadata
    Metadata {
        /// YouTube video URL
        url: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Summary length tier
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryLength {
    Short,
    Medium,
    Long,
}

impl SummaryLength {
    /// Hard word ceiling for the tier
    pub fn ceiling(&self) -> usize {
        match self {
            SummaryLength::Short => 100,
            SummaryLength::Medium => 300,
            SummaryLength::Long => 600,
        }
    }

    /// Fraction of the source length, expressed as a divisor
    pub fn divisor(&self) -> usize {
        match self {
            SummaryLength::Short => 10,
            SummaryLength::Medium => 4,
            SummaryLength::Long => 2,
        }
    }
}

impl std::fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryLength::Short => write!(f, "short"),
            SummaryLength::Medium => write!(f, "medium"),
            SummaryLength::Long => write!(f, "long"),
        }
    }
}

/// Compression quality tier
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quality {
    /// More compression, lower quality
    Low,
    /// Balanced
    Medium,
    /// Less compression, higher quality
    High,
}

impl Quality {
    /// x264 constant rate factor (lower = better quality, larger file)
    pub fn crf(&self) -> u8 {
        match self {
            Quality::Low => 28,
            Quality::Medium => 23,
            Quality::High => 18,
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quality::Low => write!(f, "low"),
            Quality::Medium => write!(f, "medium"),
            Quality::High => write!(f, "high"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_transcript_defaults_to_medium() {
        let cli = Cli::try_parse_from(["yt-cli", "transcript", "https://youtu.be/dQw4w9WgXcQ"]).unwrap();
        match cli.command {
            Some(Commands::Transcript { summary, .. }) => assert_eq!(summary, SummaryLength::Medium),
            _ => panic!("expected transcript command"),
        }
    }

    #[test]
    fn test_convert_requires_target_format() {
        assert!(Cli::try_parse_from(["yt-cli", "convert", "clip.mp4"]).is_err());
    }

    #[test]
    fn test_rejects_unknown_quality() {
        assert!(Cli::try_parse_from(["yt-cli", "compress", "clip.mp4", "--quality", "ultra"]).is_err());
    }

    #[test]
    fn test_download_output_short_flag() {
        let cli = Cli::try_parse_from(["yt-cli", "download", "https://youtu.be/dQw4w9WgXcQ", "--audio", "-o", "music"]).unwrap();
        match cli.command {
            Some(Commands::Download { audio, output, .. }) => {
                assert!(audio);
                assert_eq!(output, Some(PathBuf::from("music")));
            }
            _ => panic!("expected download command"),
        }
    }

    #[test]
    fn test_crf_values() {
        assert_eq!(Quality::Low.crf(), 28);
        assert_eq!(Quality::Medium.crf(), 23);
        assert_eq!(Quality::High.crf(), 18);
    }
}
