use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_cli::convert::{Converter, Ffmpeg};
use yt_cli::engine::YtDlp;
use yt_cli::transcript::YoutubeTranscriptApi;
use yt_cli::{download, metadata, transcript};
use yt_cli::{Cli, Commands, Config, Reporter, YtCliError};

/// Exit status for a run cancelled with Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "yt_cli=debug" } else { "yt_cli=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let reporter = Reporter::stdio();

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    tokio::select! {
        result = run(command, cli.config.as_deref(), cli.quiet, &reporter) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                report_error(&reporter, &err);
                ExitCode::FAILURE
            }
        },
        Ok(()) = tokio::signal::ctrl_c() => {
            reporter.line("\n\nOperation cancelled by user.");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}

async fn run(command: Commands, config_path: Option<&Path>, quiet: bool, reporter: &Reporter) -> Result<()> {
    let config = Config::load(config_path)?;

    match command {
        Commands::Transcript { url, summary } => {
            let source = YoutubeTranscriptApi::new()?;
            transcript::generate_summary(&source, reporter, &url, summary, &config.transcript.languages).await
        }
        Commands::Download { url, audio, output } => {
            let engine = YtDlp::new(&config.tools.yt_dlp);
            let output = output.unwrap_or(config.download.output_dir);
            download::download_video(&engine, reporter, &url, audio, &output, !quiet).await
        }
        Commands::Convert { file, to } => {
            let ffmpeg = Ffmpeg::new(&config.tools.ffmpeg);
            Converter::new(&ffmpeg, reporter).convert_file(&file, &to).await?;
            Ok(())
        }
        Commands::Compress { path, quality } => {
            let ffmpeg = Ffmpeg::new(&config.tools.ffmpeg);
            Converter::new(&ffmpeg, reporter).compress_path(&path, quality).await
        }
        Commands::Metadata { url, json } => {
            let engine = YtDlp::new(&config.tools.yt_dlp);
            metadata::extract_metadata(&engine, reporter, &url, json).await
        }
    }
}

fn report_error(reporter: &Reporter, err: &anyhow::Error) {
    tracing::debug!("{:?}", err);

    match err.downcast_ref::<YtCliError>() {
        Some(known) => {
            reporter.error(known);
            if let Some(hint) = known.hint() {
                reporter.info(hint);
            }
        }
        None => reporter.error(format!("Unexpected error: {:#}", err)),
    }
}
