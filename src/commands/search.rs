use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::scan::collect_media_files;
use crate::catalog::SubtitleCatalog;
use crate::media::{MediaRecord, SearchParams, Subtitle};
use crate::parser::Parser;

/// What to search subtitles for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTarget {
    /// A media file or a directory of media files
    Path(PathBuf),
    /// A manual query such as "Breaking Bad S01E01"
    Query(String),
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub target: SearchTarget,
    pub languages: Vec<String>,
    pub interactive: bool,
    pub dry_run: bool,
    pub recursive: bool,
    /// Where subtitles found by a manual query are saved
    pub output_dir: PathBuf,
}

/// Summary of a search run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub files_scanned: usize,
    pub files_parsed: usize,
    pub unparseable: Vec<PathBuf>,
    pub candidates_found: usize,
    pub downloaded: Vec<PathBuf>,
}

/// A single item to look up in the catalog
#[derive(Debug, Clone)]
struct Lookup {
    label: String,
    record: Option<MediaRecord>,
    params: SearchParams,
    /// Directory and file stem the subtitle is saved under
    dir: PathBuf,
    stem: String,
}

/// Command to find and download subtitles for media files or a query
pub struct SearchCommand<C> {
    options: SearchOptions,
    catalog: C,
    parser: Parser,
    input: Box<dyn BufRead + Send>,
}

impl<C: SubtitleCatalog> SearchCommand<C> {
    pub fn new(options: SearchOptions, catalog: C) -> Result<Self> {
        Ok(Self {
            options,
            catalog,
            parser: Parser::new()?,
            input: Box::new(BufReader::new(io::stdin())),
        })
    }

    /// Read interactive selections from `input` instead of stdin
    pub fn with_input(mut self, input: impl BufRead + Send + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub async fn execute(&mut self) -> Result<SearchReport> {
        let mut report = SearchReport::default();

        let lookups = match self.options.target.clone() {
            SearchTarget::Path(root) => self.path_lookups(&root, &mut report)?,
            SearchTarget::Query(query) => vec![self.query_lookup(&query)],
        };

        for lookup in &lookups {
            self.process_lookup(lookup, &mut report).await?;
        }

        info!(
            "✅ Done. Scanned {} file(s), parsed {}, found {} candidate(s), saved {} subtitle(s)",
            report.files_scanned,
            report.files_parsed,
            report.candidates_found,
            report.downloaded.len()
        );

        Ok(report)
    }

    fn path_lookups(&self, root: &Path, report: &mut SearchReport) -> Result<Vec<Lookup>> {
        let files = collect_media_files(root, self.options.recursive)?;
        report.files_scanned = files.len();

        println!("\n--- Media File Processing ---");
        if files.is_empty() {
            println!("No media files found in: {}", root.display());
            return Ok(Vec::new());
        }
        println!("Found {} media file(s)", files.len());

        let parser = &self.parser;
        let parsed: Vec<_> = files
            .par_iter()
            .map(|path| (path, parser.parse(&file_name(path))))
            .collect();

        let mut lookups = Vec::new();
        for (path, result) in parsed {
            match result {
                Ok(record) => {
                    report.files_parsed += 1;
                    lookups.push(Lookup {
                        label: file_name(path),
                        params: SearchParams::from_record(&record, ""),
                        record: Some(record),
                        dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                        stem: path
                            .file_stem()
                            .map(|s| s.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                    });
                }
                Err(e) => {
                    warn!("⚠️ SKIPPING: could not parse '{}'", e.filename);
                    println!("\nProcessing: {}", e.filename);
                    println!("  ❌ Failed to parse filename: {}", e);
                    report.unparseable.push(path.clone());
                }
            }
        }

        Ok(lookups)
    }

    /// A query that parses becomes a structured search, otherwise free text
    fn query_lookup(&self, query: &str) -> Lookup {
        let dir = self.options.output_dir.clone();

        match self.parser.parse(query) {
            Ok(record) => Lookup {
                label: query.to_string(),
                params: SearchParams::from_record(&record, ""),
                stem: file_stem_for(&record.title),
                record: Some(record),
                dir,
            },
            Err(_) => {
                debug!("Query '{}' is not a release name, searching as free text", query);
                Lookup {
                    label: query.to_string(),
                    params: SearchParams::from_query(query, ""),
                    record: None,
                    dir,
                    stem: file_stem_for(query),
                }
            }
        }
    }

    async fn process_lookup(&mut self, lookup: &Lookup, report: &mut SearchReport) -> Result<()> {
        println!("\nProcessing: {}", lookup.label);
        if let Some(record) = &lookup.record {
            print_media_info(record);
        }
        println!("  🔍 Searching for subtitles...");

        let languages = self.options.languages.clone();
        let mut any_candidates = false;

        for language in &languages {
            let params = SearchParams {
                language: language.clone(),
                ..lookup.params.clone()
            };

            let progress = spinner(format!("Searching {} subtitles...", language));
            let result = self.catalog.search(&params).await;
            progress.finish_and_clear();

            let candidates = match result {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("Failed to search for {} subtitles: {}", language, e);
                    println!("    ⚠ Failed to search for {} subtitles: {}", language, e);
                    continue;
                }
            };

            println!("    ✅ Found {} {} subtitle(s)", candidates.len(), language);
            report.candidates_found += candidates.len();
            if candidates.is_empty() {
                continue;
            }
            any_candidates = true;

            println!("\n  📺 Available Subtitles:");
            print!("{}", format_table(&candidates));

            if self.options.dry_run {
                continue;
            }

            let choice = if self.options.interactive {
                self.prompt(&candidates).await?
            } else {
                best_candidate(&candidates)
            };

            let Some(index) = choice else {
                println!("  ⏭ Skipped {} subtitles", language);
                continue;
            };

            let subtitle = &candidates[index];
            match self.catalog.download(subtitle).await {
                Ok(bytes) => {
                    let destination =
                        subtitle_path(&lookup.dir, &lookup.stem, language, &subtitle.extension());
                    fs::write(&destination, &bytes)
                        .with_context(|| format!("Failed to write {}", destination.display()))?;
                    info!("💾 Saved subtitle to {:?}", destination);
                    println!("  💾 Saved: {}", destination.display());
                    report.downloaded.push(destination);
                }
                Err(e) => {
                    warn!("Failed to download {} subtitle {}: {}", language, subtitle.id, e);
                    println!("  ❌ Download failed: {}", e);
                }
            }
        }

        if !any_candidates {
            let title = lookup
                .record
                .as_ref()
                .map(MediaRecord::display_title)
                .unwrap_or_else(|| lookup.label.clone());
            println!("  ❌ No subtitles found for {}", title);
        } else if self.options.dry_run {
            println!(
                "\n  💡 Dry run mode: no files downloaded. Use without --dry-run to download subtitles."
            );
        }

        Ok(())
    }
}

impl<C> SearchCommand<C> {
    /// Run the blocking selection prompt off the async worker
    async fn prompt(&mut self, candidates: &[Subtitle]) -> Result<Option<usize>> {
        let mut input = std::mem::replace(&mut self.input, Box::new(io::empty()));
        let candidates = candidates.to_vec();

        let (input, choice) = tokio::task::spawn_blocking(move || {
            let choice = select_interactive(&candidates, &mut input, &mut io::stdout());
            (input, choice)
        })
        .await?;

        self.input = input;
        choice
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn spinner(message: String) -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_message(message);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

fn print_media_info(record: &MediaRecord) {
    println!("  ✅ Parsed successfully:");
    println!("     Title: {}", record.title);
    if let Some(year) = &record.year {
        println!("     Year: {}", year);
    }
    if let (Some(season), Some(episode)) = (record.season, record.episode) {
        println!("     Season: {}, Episode: {}", season, episode);
    }
    if let Some(quality) = &record.quality {
        println!("     Quality: {}", quality);
    }
    if let Some(source) = &record.source {
        println!("     Source: {}", source);
    }
    if let Some(codec) = &record.codec {
        println!("     Codec: {}", codec);
    }
    println!("     Type: {}", record.kind);
}

/// Turn free text into a single file name component.
///
/// Path separators and characters rejected by common filesystems become
/// `-`, leading dots and surrounding whitespace are dropped. Never empty.
pub fn file_stem_for(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();

    let stem = replaced.trim().trim_start_matches('.').trim();
    if stem.is_empty() {
        "subtitle".to_string()
    } else {
        stem.to_string()
    }
}

/// `<dir>/<stem>.<language>.<ext>`
pub fn subtitle_path(dir: &Path, stem: &str, language: &str, ext: &str) -> PathBuf {
    dir.join(format!("{}.{}.{}", stem, language, ext))
}

/// Shorten to at most `max` characters, ending in "..." when cut
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

pub fn format_rating(rating: f64) -> String {
    if rating > 0.0 {
        format!("{:.1}", rating)
    } else {
        "N/A".to_string()
    }
}

pub fn format_downloads(count: u64) -> String {
    if count >= 1000 {
        format!("{:.1}k", count as f64 / 1000.0)
    } else {
        count.to_string()
    }
}

/// Render the candidate table, numbered from 1
pub fn format_table(candidates: &[Subtitle]) -> String {
    let mut table = format!(
        "  {:<4} {:<8} {:<40} {:<15} {:<8} {:<10}\n  {}\n",
        "#",
        "Language",
        "Release Name",
        "Uploader",
        "Rating",
        "Downloads",
        "-".repeat(85)
    );

    for (i, subtitle) in candidates.iter().enumerate() {
        table.push_str(&format!(
            "  {:<4} {:<8} {:<40} {:<15} {:<8} {:<10}\n",
            i + 1,
            subtitle.language,
            truncate(&subtitle.release_name, 40),
            truncate(&subtitle.uploader, 15),
            format_rating(subtitle.rating),
            format_downloads(subtitle.download_count)
        ));
    }

    table
}

/// Most downloaded candidate, ties broken by rating, then by list order
pub fn best_candidate(candidates: &[Subtitle]) -> Option<usize> {
    let is_better = |a: &Subtitle, b: &Subtitle| {
        a.download_count > b.download_count
            || (a.download_count == b.download_count && a.rating > b.rating)
    };

    candidates
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, &Subtitle)>, (i, candidate)| match best {
            Some((_, current)) if !is_better(candidate, current) => best,
            _ => Some((i, candidate)),
        })
        .map(|(i, _)| i)
}

/// Prompt for a row number. Empty input or end of input skips.
pub fn select_interactive<R: BufRead, W: Write>(
    candidates: &[Subtitle],
    input: &mut R,
    output: &mut W,
) -> Result<Option<usize>> {
    loop {
        write!(
            output,
            "  Select subtitle [1-{}] (Enter to skip): ",
            candidates.len()
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let answer = line.trim();
        if answer.is_empty() {
            return Ok(None);
        }

        match answer.parse::<usize>() {
            Ok(n) if (1..=candidates.len()).contains(&n) => return Ok(Some(n - 1)),
            _ => writeln!(output, "  Invalid selection '{}'", answer)?,
        }
    }
}
