use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Language used when neither the command line nor the config names one
pub const DEFAULT_LANGUAGE: &str = "en";

/// Connection settings for the OpenSubtitles catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub api_key: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_agent: Option<String>,
    pub base_url: Option<String>,
}

impl CatalogConfig {
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

/// Application configuration loaded from TOML with environment overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub languages: Vec<String>,
    pub opensubtitles: CatalogConfig,
}

impl Config {
    /// Platform config file location, e.g. `~/.config/subs/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "subs").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist and parse. Without one the default
    /// location is tried and built-in defaults are used when it is absent.
    /// Environment variables are applied last in both cases.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(anyhow!("Config file does not exist: {}", path.display()));
                }
                Self::from_file(path)?
            }
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override catalog settings from `SUBS_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let catalog = &mut self.opensubtitles;
        let slots = [
            ("SUBS_API_KEY", &mut catalog.api_key),
            ("SUBS_USERNAME", &mut catalog.username),
            ("SUBS_PASSWORD", &mut catalog.password),
            ("SUBS_BASE_URL", &mut catalog.base_url),
        ];
        for (key, slot) in slots {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *slot = Some(value);
            }
        }
    }

    /// Languages to search: the command line wins, then the config file,
    /// then [`DEFAULT_LANGUAGE`]
    pub fn effective_languages(&self, cli: &[String]) -> Vec<String> {
        if !cli.is_empty() {
            cli.to_vec()
        } else if !self.languages.is_empty() {
            self.languages.clone()
        } else {
            vec![DEFAULT_LANGUAGE.to_string()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
languages = ["en", "pt-BR"]

[opensubtitles]
api_key = "abc123"
username = "alice"
password = "secret"
"#;

    #[test]
    fn test_parse_toml() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.languages, vec!["en", "pt-BR"]);
        assert_eq!(config.opensubtitles.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.opensubtitles.username.as_deref(), Some("alice"));
        assert!(config.opensubtitles.has_credentials());
        assert_eq!(config.opensubtitles.base_url, None);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.opensubtitles.has_credentials());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::from_toml_str("languages = en").is_err());
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = Config::from_toml_str(SAMPLE).unwrap();
        let env: HashMap<&str, &str> = [
            ("SUBS_USERNAME", "bob"),
            ("SUBS_BASE_URL", "http://localhost:9999"),
            ("SUBS_PASSWORD", "  "),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.opensubtitles.username.as_deref(), Some("bob"));
        assert_eq!(
            config.opensubtitles.base_url.as_deref(),
            Some("http://localhost:9999")
        );
        // blank values are ignored
        assert_eq!(config.opensubtitles.password.as_deref(), Some("secret"));
        assert_eq!(config.opensubtitles.api_key.as_deref(), Some("abc123"));
    }

    #[test]
    #[serial]
    fn test_load_explicit_file_with_env() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, SAMPLE).unwrap();

        env::set_var("SUBS_API_KEY", "from-env");
        let config = Config::load(Some(&path));
        env::remove_var("SUBS_API_KEY");

        let config = config.unwrap();
        assert_eq!(config.opensubtitles.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.languages.len(), 2);
    }

    #[test]
    #[serial]
    fn test_load_missing_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load(Some(&temp_dir.path().join("missing.toml")));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_effective_languages() {
        let mut config = Config::default();
        assert_eq!(config.effective_languages(&[]), vec!["en"]);

        config.languages = vec!["fr".to_string()];
        assert_eq!(config.effective_languages(&[]), vec!["fr"]);
        assert_eq!(
            config.effective_languages(&["de".to_string()]),
            vec!["de"]
        );
    }
}
