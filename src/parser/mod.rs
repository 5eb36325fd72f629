//! Filename-to-metadata extraction.
//!
//! A filename is normalized into a dot-delimited string and matched against
//! an ordered registry of release naming conventions. The first convention
//! that both matches structurally and produces a valid [`MediaRecord`] wins.

pub mod codec;
pub mod episode;
pub mod normalize;

use anyhow::Result;
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::{debug, trace};

use crate::media::{MediaKind, MediaRecord, MEDIA_EXTENSIONS};

pub use codec::{extract_source_and_codec, CODECS};
pub use episode::resolve_season_episode;
use episode::{EPISODE_RANGE, SEASON_RANGE};
pub use normalize::{clean_title, normalize_filename};

/// Examples shown to the user when a filename cannot be parsed
pub const SUPPORTED_FORMATS: &str = "  TV Show: Series.Name.S01E01.720p.x264-GROUP.mkv\n  \
TV Show with Year: Series.Name.2024.S01E01.1080p.x265-GROUP.mkv\n  \
Alternative TV: Series.Name.1x01.720p.WEB-DL.mkv\n  \
Movie: Movie.Name.2023.1080p.BluRay.x264-GROUP.mp4";

/// No registered convention produced a valid record for the filename
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to parse filename '{filename}': expected formats like:\n{}", SUPPORTED_FORMATS)]
pub struct ParseFailure {
    /// The filename exactly as it was passed in
    pub filename: String,
}

/// Why a structurally matching candidate was discarded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("invalid season number: {0}")]
    Season(String),
    #[error("invalid episode number: {0}")]
    Episode(String),
    #[error("invalid alternative episode format: {0}")]
    Compact(String),
    #[error("season and episode must be specified for TV shows")]
    MissingSeasonEpisode,
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("invalid year: {0}")]
    Year(String),
}

/// Named captures of a matching pattern. Absent and empty captures are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slots {
    pub title: Option<String>,
    pub year: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
    pub alt_episode: Option<String>,
    pub quality: Option<String>,
    pub source: Option<String>,
    pub ext: Option<String>,
}

impl Slots {
    fn from_captures(caps: &Captures<'_>) -> Self {
        let slot = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str().trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            title: slot("title"),
            year: slot("year"),
            season: slot("season"),
            episode: slot("episode"),
            alt_episode: slot("alt_episode"),
            quality: slot("quality"),
            source: slot("source"),
            ext: slot("ext"),
        }
    }
}

/// A single filename convention in the registry
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pub name: &'static str,
    pub kind: MediaKind,
    pub example: &'static str,
    pub regex: Regex,
}

/// Filename parser holding the compiled, ordered pattern registry
#[derive(Debug, Clone)]
pub struct Parser {
    patterns: Vec<PatternMatcher>,
}

const YEAR: &str = r"(?P<year>[0-9]{4})";
const SXXEXX: &str = r"S(?P<season>[0-9]{1,2})E(?P<episode>[0-9]{1,3})";
const NXNN: &str = r"(?P<season>[0-9]{1,2})x(?P<episode>[0-9]{1,3})";
const QUALITY: &str = r"(?:\.(?P<quality>[0-9]+p))?";
const SOURCE: &str = r"(?:\.(?P<source>.+?))?";
const EXT: &str = r"(?:\.(?P<ext>[A-Za-z0-9_]+))?";

impl Parser {
    /// Compile the pattern registry. Order matters: most constrained
    /// conventions first, loose movie heuristics last.
    pub fn new() -> Result<Self> {
        let known_ext = format!(r"\.(?P<ext>{})", MEDIA_EXTENSIONS.join("|"));

        let specs: Vec<(&'static str, MediaKind, &'static str, String)> = vec![
            (
                "TV with Year (SxxExx)",
                MediaKind::Episode,
                "Dark.Matter.2024.S01E01.1080p.x265-ELiTE.mkv",
                format!(r"^(?P<title>.*?)\.{YEAR}\.{SXXEXX}{QUALITY}{SOURCE}{EXT}$"),
            ),
            (
                "TV with Year (xXx format)",
                MediaKind::Episode,
                "Series.Name.2024.1x01.720p.WEB-DL.mkv",
                format!(r"^(?P<title>.*?)\.{YEAR}\.{NXNN}{QUALITY}{SOURCE}{EXT}$"),
            ),
            (
                "TV without Year (SxxExx)",
                MediaKind::Episode,
                "The.Office.S03E07.720p.BluRay.x264.mkv",
                format!(r"^(?P<title>.*?)\.{SXXEXX}{QUALITY}{SOURCE}\.(?P<ext>[A-Za-z0-9_]+)$"),
            ),
            (
                "TV without Year (SxxExx, no ext)",
                MediaKind::Episode,
                "The.Office.S03E07.720p.BluRay.x264",
                format!(r"^(?P<title>.*?)\.{SXXEXX}{QUALITY}{SOURCE}$"),
            ),
            (
                "TV Alternative (xXx format)",
                MediaKind::Episode,
                "Series.Name.1x01.720p.WEB-DL.mkv",
                format!(r"^(?P<title>.*?)\.{NXNN}{QUALITY}{SOURCE}{EXT}$"),
            ),
            (
                "TV Alternative (3-digit format)",
                MediaKind::Episode,
                "Series.Name.101.720p.x264.mkv",
                format!(r"^(?P<title>.*?)\.(?P<alt_episode>[0-9]{{3}}){QUALITY}{SOURCE}{EXT}$"),
            ),
            (
                "Movie",
                MediaKind::Movie,
                "Inception.2010.1080p.BluRay.x264-SPARKS.mkv",
                format!(r"^(?P<title>.*?)\.{YEAR}{QUALITY}(?:\.(?P<source>.+?)){known_ext}$"),
            ),
            (
                "Movie (no extension)",
                MediaKind::Movie,
                "Movie.Name.2023.1080p.BluRay.x264",
                format!(r"^(?P<title>.*?)\.{YEAR}{QUALITY}{SOURCE}$"),
            ),
            (
                "Movie (no quality)",
                MediaKind::Movie,
                "Movie.Name.2023.BluRay.x264-GROUP.mp4",
                format!(r"^(?P<title>.*?)\.{YEAR}\.(?P<source>.+?){known_ext}$"),
            ),
        ];

        let patterns = specs
            .into_iter()
            .map(|(name, kind, example, pattern)| -> Result<PatternMatcher> {
                Ok(PatternMatcher {
                    name,
                    kind,
                    example,
                    regex: Regex::new(&pattern)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Registered conventions in priority order
    pub fn patterns(&self) -> &[PatternMatcher] {
        &self.patterns
    }

    /// Extract metadata from a filename or path
    pub fn parse(&self, filename: &str) -> Result<MediaRecord, ParseFailure> {
        let normalized = normalize_filename(filename);

        for pattern in &self.patterns {
            let Some(caps) = pattern.regex.captures(&normalized) else {
                continue;
            };

            match build_record(&Slots::from_captures(&caps), pattern.kind) {
                Ok(record) => {
                    trace!("'{}' matched pattern '{}'", normalized, pattern.name);
                    return Ok(record);
                }
                Err(rejection) => {
                    debug!(
                        "Pattern '{}' rejected '{}': {}",
                        pattern.name, normalized, rejection
                    );
                }
            }
        }

        Err(ParseFailure {
            filename: filename.to_string(),
        })
    }
}

/// Run the field extractors over the captures and validate the result
fn build_record(slots: &Slots, kind: MediaKind) -> Result<MediaRecord, Rejection> {
    let (season, episode) = match kind {
        MediaKind::Episode => {
            let (season, episode) = resolve_season_episode(slots)?;
            (Some(season), Some(episode))
        }
        MediaKind::Movie => (None, None),
    };

    let (source, codec) = slots
        .source
        .as_deref()
        .map(extract_source_and_codec)
        .unwrap_or_default();

    let record = MediaRecord {
        title: clean_title(slots.title.as_deref().unwrap_or_default()),
        year: slots.year.clone(),
        season,
        episode,
        quality: slots.quality.clone(),
        source: Some(source).filter(|s| !s.is_empty()),
        codec: Some(codec).filter(|c| !c.is_empty()),
        kind,
    };

    validate(&record)?;
    Ok(record)
}

/// Final semantic gate applied to every candidate record
pub fn validate(record: &MediaRecord) -> Result<(), Rejection> {
    if record.title.is_empty() {
        return Err(Rejection::EmptyTitle);
    }

    if record.is_episode() {
        match (record.season, record.episode) {
            (Some(season), Some(episode))
                if SEASON_RANGE.contains(&season) && EPISODE_RANGE.contains(&episode) => {}
            _ => return Err(Rejection::MissingSeasonEpisode),
        }
    }

    if let Some(year) = &record.year {
        match year.parse::<u32>() {
            Ok(value) if (1900..=2030).contains(&value) => {}
            _ => return Err(Rejection::Year(year.clone())),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> Parser {
        Parser::new().unwrap()
    }

    fn movie(title: &str, year: &str) -> MediaRecord {
        MediaRecord {
            title: title.to_string(),
            year: Some(year.to_string()),
            season: None,
            episode: None,
            quality: None,
            source: None,
            codec: None,
            kind: MediaKind::Movie,
        }
    }

    #[test]
    fn test_registry_order() {
        let names: Vec<_> = parser().patterns().iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![
                "TV with Year (SxxExx)",
                "TV with Year (xXx format)",
                "TV without Year (SxxExx)",
                "TV without Year (SxxExx, no ext)",
                "TV Alternative (xXx format)",
                "TV Alternative (3-digit format)",
                "Movie",
                "Movie (no extension)",
                "Movie (no quality)",
            ]
        );
    }

    #[test]
    fn test_every_example_parses_with_its_kind() {
        let parser = parser();
        for pattern in parser.patterns() {
            let record = parser.parse(pattern.example).unwrap();
            assert_eq!(record.kind, pattern.kind, "example {}", pattern.example);
        }
    }

    #[test]
    fn test_tv_with_year() {
        let record = parser()
            .parse("Dark.Matter.2024.S01E01.1080p.x265-ELiTE.mkv")
            .unwrap();
        assert_eq!(
            record,
            MediaRecord {
                title: "Dark Matter".to_string(),
                year: Some("2024".to_string()),
                season: Some(1),
                episode: Some(1),
                quality: Some("1080p".to_string()),
                source: Some("ELiTE".to_string()),
                codec: Some("x265".to_string()),
                kind: MediaKind::Episode,
            }
        );
    }

    #[test]
    fn test_tv_without_year() {
        let record = parser()
            .parse("The.Office.S03E07.720p.BluRay.x264.mkv")
            .unwrap();
        assert_eq!(
            record,
            MediaRecord {
                title: "The Office".to_string(),
                year: None,
                season: Some(3),
                episode: Some(7),
                quality: Some("720p".to_string()),
                source: Some("BluRay".to_string()),
                codec: Some("x264".to_string()),
                kind: MediaKind::Episode,
            }
        );
    }

    #[test]
    fn test_movie_without_quality() {
        let record = parser().parse("Pulp.Fiction.1994.BluRay.x264-GROUP.mp4").unwrap();
        assert_eq!(
            record,
            MediaRecord {
                source: Some("BluRay.GROUP".to_string()),
                codec: Some("x264".to_string()),
                ..movie("Pulp Fiction", "1994")
            }
        );
    }

    #[test]
    fn test_movie_with_quality() {
        let record = parser()
            .parse("Inception.2010.1080p.BluRay.x264-SPARKS.mkv")
            .unwrap();
        assert_eq!(
            record,
            MediaRecord {
                quality: Some("1080p".to_string()),
                source: Some("BluRay.SPARKS".to_string()),
                codec: Some("x264".to_string()),
                ..movie("Inception", "2010")
            }
        );
    }

    #[test]
    fn test_movie_without_extension() {
        let record = parser().parse("Movie.Name.2023.1080p.WEB").unwrap();
        assert_eq!(
            record,
            MediaRecord {
                quality: Some("1080p".to_string()),
                source: Some("WEB".to_string()),
                ..movie("Movie Name", "2023")
            }
        );
    }

    #[test]
    fn test_alternative_numbering() {
        let parser = parser();

        let record = parser.parse("Series.Name.1x01.720p.WEB-DL.mkv").unwrap();
        assert_eq!(record.title, "Series Name");
        assert_eq!((record.season, record.episode), (Some(1), Some(1)));
        assert_eq!(record.quality.as_deref(), Some("720p"));

        let record = parser.parse("Series.Name.2019.12x104.mkv").unwrap();
        assert_eq!(record.year.as_deref(), Some("2019"));
        assert_eq!((record.season, record.episode), (Some(12), Some(104)));
    }

    #[test]
    fn test_compact_numbering() {
        let record = parser().parse("Series.Name.315.720p.x264.mkv").unwrap();
        assert_eq!(record.kind, MediaKind::Episode);
        assert_eq!(record.title, "Series Name");
        assert_eq!((record.season, record.episode), (Some(3), Some(15)));
        assert_eq!(record.codec.as_deref(), Some("x264"));
    }

    #[test]
    fn test_spaces_parse_like_dots() {
        let parser = parser();
        let dotted = parser.parse("Dark.Matter.2024.S01E01.1080p.x265-ELiTE.mkv").unwrap();
        let spaced = parser.parse("Dark Matter 2024 S01E01 1080p x265-ELiTE.mkv").unwrap();
        assert_eq!(dotted, spaced);
    }

    #[test]
    fn test_full_paths_are_accepted() {
        let record = parser()
            .parse("/srv/media/tv/The.Office.S03E07.720p.BluRay.x264.mkv")
            .unwrap();
        assert_eq!(record.title, "The Office");
    }

    #[test]
    fn test_invalid_filename_reports_original_input() {
        let err = parser().parse("invalid_filename_format.mkv").unwrap_err();
        assert_eq!(err.filename, "invalid_filename_format.mkv");
        let message = err.to_string();
        assert!(message.starts_with("unable to parse filename 'invalid_filename_format.mkv'"));
        assert!(message.contains("Series.Name.2024.S01E01.1080p.x265-GROUP.mkv"));
        assert!(message.contains("Movie.Name.2023.1080p.BluRay.x264-GROUP.mp4"));
    }

    #[test]
    fn test_empty_inputs_fail() {
        let parser = parser();
        assert!(parser.parse("").is_err());
        assert!(parser.parse(".mkv").is_err());
    }

    #[test]
    fn test_out_of_range_values_fail() {
        let parser = parser();
        for filename in [
            "Show.S00E01.mkv",
            "Show.S01E00.mkv",
            "Show.S01E1000.mkv",
            "Show.S100E01.mkv",
            "Show.100x01.mkv",
            "Old.Movie.1800.BluRay.x264.mkv",
            "Future.Movie.2050.BluRay.x264.mkv",
        ] {
            assert!(parser.parse(filename).is_err(), "{filename} should not parse");
        }
    }

    #[test]
    fn test_rejected_candidate_falls_through() {
        // The year rule rejects 1850, the looser SxxExx rule keeps it in the title
        let record = parser().parse("Show.1850.S02E03.mkv").unwrap();
        assert_eq!(record.title, "Show 1850");
        assert_eq!(record.year, None);
        assert_eq!((record.season, record.episode), (Some(2), Some(3)));
    }

    #[test]
    fn test_validate() {
        let mut record = movie("Title", "1900");
        assert_eq!(validate(&record), Ok(()));

        record.year = Some("2031".to_string());
        assert_eq!(validate(&record), Err(Rejection::Year("2031".to_string())));

        record.year = None;
        record.title = String::new();
        assert_eq!(validate(&record), Err(Rejection::EmptyTitle));

        let episode = MediaRecord {
            kind: MediaKind::Episode,
            season: Some(100),
            episode: Some(1),
            ..movie("Show", "2020")
        };
        assert_eq!(validate(&episode), Err(Rejection::MissingSeasonEpisode));
    }

    #[test]
    fn test_parser_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Parser>();
    }
}
