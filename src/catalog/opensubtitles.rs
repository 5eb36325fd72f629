use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{CatalogError, SubtitleCatalog};
use crate::config::CatalogConfig;
use crate::media::{SearchParams, Subtitle};

pub const DEFAULT_BASE_URL: &str = "https://api.opensubtitles.com/api/v1";
pub const DEFAULT_USER_AGENT: &str = concat!("subs/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
    status: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SubtitleItem>,
}

#[derive(Debug, Deserialize)]
struct SubtitleItem {
    id: String,
    #[serde(default)]
    attributes: SubtitleAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SubtitleAttributes {
    language: Option<String>,
    download_count: Option<u64>,
    ratings: Option<f64>,
    fps: Option<f64>,
    upload_date: Option<String>,
    release: Option<String>,
    uploader: Option<Uploader>,
    files: Vec<SubtitleFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Uploader {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SubtitleFile {
    file_id: Option<u64>,
    file_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct DownloadRequest {
    file_id: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DownloadResponse {
    link: Option<String>,
    remaining: Option<i64>,
    message: Option<String>,
}

impl SubtitleItem {
    fn into_subtitle(self) -> Subtitle {
        let attrs = self.attributes;
        let file = attrs.files.into_iter().next().unwrap_or_default();

        Subtitle {
            id: self.id,
            language: attrs.language.unwrap_or_default(),
            release_name: attrs.release.unwrap_or_default(),
            file_name: file.file_name.unwrap_or_default(),
            file_id: file.file_id,
            uploader: attrs.uploader.and_then(|u| u.name).unwrap_or_default(),
            rating: attrs.ratings.unwrap_or_default(),
            download_count: attrs.download_count.unwrap_or_default(),
            upload_date: attrs.upload_date.as_deref().and_then(parse_upload_date),
            fps: attrs.fps.unwrap_or_default(),
            format: "srt".to_string(),
        }
    }
}

/// Upload dates come either as RFC 3339 or as a bare UTC timestamp
fn parse_upload_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Client for the OpenSubtitles REST API.
///
/// Holds a session token obtained from `/login`. A request rejected with
/// 401 drops the token, logs in again and is retried exactly once.
pub struct OpenSubtitlesClient {
    http: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
}

impl OpenSubtitlesClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &config.api_key {
            let value = HeaderValue::from_str(api_key)
                .map_err(|e| CatalogError::Auth(format!("invalid API key: {e}")))?;
            headers.insert("Api-Key", value);
        }

        let http = Client::builder()
            .user_agent(config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            token: None,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Result<&str, CatalogError> {
        self.token.as_deref().ok_or(CatalogError::Unauthorized)
    }

    /// Exchange the configured credentials for a session token
    pub async fn authenticate(&mut self) -> Result<(), CatalogError> {
        let (Some(username), Some(password)) = (self.username.as_deref(), self.password.as_deref())
        else {
            return Err(CatalogError::Auth(
                "username and password are required for authentication".to_string(),
            ));
        };

        debug!("Logging in to {} as {}", self.base_url, username);
        let resp = self
            .http
            .post(self.url("/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Auth(format!(
                "login failed with status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let login: LoginResponse = resp.json().await?;
        match (login.status, login.token) {
            (Some(200), Some(token)) if !token.is_empty() => {
                self.token = Some(token);
                Ok(())
            }
            _ => Err(CatalogError::Auth("invalid credentials".to_string())),
        }
    }

    async fn ensure_authenticated(&mut self) -> Result<(), CatalogError> {
        if self.token.is_none() {
            self.authenticate().await?;
        }
        Ok(())
    }

    async fn reauthenticate(&mut self) -> Result<(), CatalogError> {
        warn!("Catalog session expired, logging in again");
        self.token = None;
        self.authenticate().await
    }

    /// Map 401 to [`CatalogError::Unauthorized`] and other failures to
    /// [`CatalogError::Api`] with the response body
    async fn check_response(resp: Response) -> Result<Response, CatalogError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(CatalogError::Unauthorized);
        }
        let message = resp.text().await.unwrap_or_default();
        Err(CatalogError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn search_once(&self, params: &SearchParams) -> Result<Vec<Subtitle>, CatalogError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if !params.query.is_empty() {
            query.push(("query", params.query.clone()));
        }
        if !params.language.is_empty() {
            query.push(("languages", params.language.clone()));
        }
        if let Some(kind) = params.kind {
            query.push(("type", kind.to_string()));
        }
        if let Some(year) = params.year {
            query.push(("year", year.to_string()));
        }
        if let Some(season) = params.season {
            query.push(("season_number", season.to_string()));
        }
        if let Some(episode) = params.episode {
            query.push(("episode_number", episode.to_string()));
        }
        if let Some(hash) = &params.movie_hash {
            query.push(("moviehash", hash.clone()));
        }

        debug!("Searching subtitles with {:?}", query);
        let resp = self
            .http
            .get(self.url("/subtitles"))
            .bearer_auth(self.bearer()?)
            .query(&query)
            .send()
            .await?;

        let search: SearchResponse = Self::check_response(resp).await?.json().await?;
        Ok(search
            .data
            .into_iter()
            .map(SubtitleItem::into_subtitle)
            .collect())
    }

    async fn request_download_link(&self, file_id: u64) -> Result<String, CatalogError> {
        let resp = self
            .http
            .post(self.url("/download"))
            .bearer_auth(self.bearer()?)
            .json(&DownloadRequest { file_id })
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_ACCEPTABLE {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<DownloadResponse>(&body)
                .ok()
                .and_then(|r| r.message)
                .unwrap_or(body);
            return Err(CatalogError::DownloadLimit(message));
        }

        let download: DownloadResponse = Self::check_response(resp).await?.json().await?;
        if let Some(remaining) = download.remaining {
            debug!("{} downloads remaining today", remaining);
        }
        download
            .link
            .filter(|link| !link.is_empty())
            .ok_or(CatalogError::MissingLink)
    }

    async fn fetch(&self, link: &str) -> Result<Vec<u8>, CatalogError> {
        let resp = self.http.get(link).send().await?;
        let bytes = Self::check_response(resp).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

impl SubtitleCatalog for OpenSubtitlesClient {
    async fn search(&mut self, params: &SearchParams) -> Result<Vec<Subtitle>, CatalogError> {
        self.ensure_authenticated().await?;

        match self.search_once(params).await {
            Err(CatalogError::Unauthorized) => {
                self.reauthenticate().await?;
                self.search_once(params).await
            }
            result => result,
        }
    }

    async fn download(&mut self, subtitle: &Subtitle) -> Result<Vec<u8>, CatalogError> {
        let file_id = subtitle
            .file_id
            .ok_or_else(|| CatalogError::MissingFileId(subtitle.id.clone()))?;
        self.ensure_authenticated().await?;

        let link = match self.request_download_link(file_id).await {
            Err(CatalogError::Unauthorized) => {
                self.reauthenticate().await?;
                self.request_download_link(file_id).await?
            }
            result => result?,
        };

        self.fetch(&link).await
    }
}
