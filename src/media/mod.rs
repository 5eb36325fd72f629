use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Media container extensions recognized both when scanning directories and
/// by the movie patterns that require a known extension
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp",
];

/// Check whether a path carries one of the known media container extensions
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| MEDIA_EXTENSIONS.contains(&ext.as_str()))
}

/// What kind of release a filename describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A single TV episode, always carries season and episode numbers
    Episode,
    Movie,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Episode => "episode",
            MediaKind::Movie => "movie",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata extracted from a media filename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    pub kind: MediaKind,
}

impl MediaRecord {
    pub fn is_episode(&self) -> bool {
        self.kind == MediaKind::Episode
    }

    pub fn is_movie(&self) -> bool {
        self.kind == MediaKind::Movie
    }

    /// True when both season and episode are set to positive numbers
    pub fn has_season_episode(&self) -> bool {
        matches!((self.season, self.episode), (Some(s), Some(e)) if s > 0 && e > 0)
    }

    /// Title with the year appended in parentheses when known
    pub fn display_title(&self) -> String {
        match &self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}

/// Parameters for a single catalog search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub language: String,
    pub kind: Option<MediaKind>,
    pub year: Option<u16>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub movie_hash: Option<String>,
}

impl SearchParams {
    /// Build search parameters for a parsed record in one language
    pub fn from_record(record: &MediaRecord, language: &str) -> Self {
        let mut params = Self {
            query: record.title.clone(),
            language: language.to_string(),
            kind: Some(record.kind),
            year: record.year.as_deref().and_then(|y| y.parse().ok()),
            ..Default::default()
        };

        if record.is_episode() {
            params.season = record.season;
            params.episode = record.episode;
        }

        params
    }

    /// Free-text search with no structured metadata
    pub fn from_query(query: &str, language: &str) -> Self {
        Self {
            query: query.trim().to_string(),
            language: language.to_string(),
            ..Default::default()
        }
    }
}

/// A subtitle candidate returned by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    pub id: String,
    pub language: String,
    pub release_name: String,
    pub file_name: String,
    /// Identifier passed to the download endpoint
    pub file_id: Option<u64>,
    pub uploader: String,
    pub rating: f64,
    pub download_count: u64,
    pub upload_date: Option<DateTime<Utc>>,
    pub fps: f64,
    pub format: String,
}

impl Subtitle {
    /// File extension to use when saving this subtitle
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| self.format.clone())
    }
}
