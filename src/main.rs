//! # subs - Subtitle finder CLI
//!
//! Finds and downloads subtitles for media files by extracting the title,
//! year, season and episode from release-style filenames and searching the
//! OpenSubtitles catalog.
//!
//! ## Usage
//!
//! ```bash
//! # Find subtitles for a specific file
//! subs /path/to/movie.mp4
//!
//! # Search a directory for multiple languages
//! subs /path/to/movies/ -l en,pt-BR
//!
//! # Interactive selection with Spanish subtitles
//! subs . -i -l es
//!
//! # Manual search query
//! subs --search "Breaking Bad S01E01"
//!
//! # Preview without downloading
//! subs /path/to/series/ --dry-run -r
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subs::catalog::OpenSubtitlesClient;
use subs::commands::search::{SearchCommand, SearchOptions};
use subs::commands::validate::{print_configuration, Arguments, ValidateCommand};

/// subs - Find and download subtitles for your media files
#[derive(Parser)]
#[command(
    name = "subs",
    about = "Find and download subtitles for your media files",
    long_about = "Parses release-style media filenames (Show.S01E01.720p.x264-GROUP.mkv, \
                  Movie.2023.1080p.BluRay.x264.mp4) and downloads matching subtitles \
                  from OpenSubtitles.",
    version
)]
struct Cli {
    /// Path to a media file or a directory of media files
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Subtitle language codes, e.g. en, pt-BR (comma-separated allowed)
    #[arg(long = "language", short = 'l', value_delimiter = ',')]
    language: Vec<String>,

    /// Choose a subtitle from the list instead of taking the best match
    #[arg(long, short)]
    interactive: bool,

    /// Path to a TOML configuration file
    #[arg(long, short, env = "SUBS_CONFIG")]
    config: Option<PathBuf>,

    /// Show what would be downloaded without downloading anything
    #[arg(long)]
    dry_run: bool,

    /// Manual search query used instead of scanning the path
    #[arg(long, short)]
    search: Option<String>,

    /// Descend into sub-directories when the path is a directory
    #[arg(long, short)]
    recursive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the report on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let validated = ValidateCommand::new(Arguments {
        path: cli.path,
        search: cli.search,
        languages: cli.language,
        config: cli.config,
        interactive: cli.interactive,
        dry_run: cli.dry_run,
    })
    .execute()
    .context("validation error")?;
    ValidateCommand::print_results(&validated.results);

    let options = SearchOptions {
        target: validated.target,
        languages: validated.languages,
        interactive: cli.interactive,
        dry_run: cli.dry_run,
        recursive: cli.recursive,
        output_dir: std::env::current_dir()?,
    };
    print_configuration(&options, validated.config.as_deref());
    let config = validated.settings;

    if !config.opensubtitles.has_credentials() {
        warn!("No OpenSubtitles credentials configured, set SUBS_USERNAME and SUBS_PASSWORD or add them to the config file");
    }

    info!("Starting search for {:?}", options.target);
    let catalog = OpenSubtitlesClient::new(&config.opensubtitles)?;
    let mut command = SearchCommand::new(options, catalog)?;
    let report = command.execute().await?;

    if !report.unparseable.is_empty() {
        warn!("{} file(s) could not be parsed", report.unparseable.len());
    }

    Ok(())
}
