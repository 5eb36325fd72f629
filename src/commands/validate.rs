use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::search::{SearchOptions, SearchTarget};
use crate::config::Config;
use crate::media::MEDIA_EXTENSIONS;

/// Outcome of a single argument check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub success: bool,
    pub message: Option<String>,
    pub warning: Option<String>,
}

impl ValidationResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            warning: None,
        }
    }

    fn note(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            warning: None,
        }
    }
}

/// Raw command-line arguments to be checked before any work starts
#[derive(Debug, Clone)]
pub struct Arguments {
    pub path: PathBuf,
    pub search: Option<String>,
    /// Languages given on the command line, empty to use the config
    pub languages: Vec<String>,
    pub config: Option<PathBuf>,
    pub interactive: bool,
    pub dry_run: bool,
}

/// Arguments after validation, with paths made absolute
#[derive(Debug, Clone)]
pub struct ValidatedArguments {
    pub target: SearchTarget,
    pub languages: Vec<String>,
    pub config: Option<PathBuf>,
    /// Configuration loaded from the validated file, or the default location
    pub settings: Config,
    pub results: Vec<ValidationResult>,
}

/// Command to validate arguments before searching
pub struct ValidateCommand {
    args: Arguments,
}

impl ValidateCommand {
    pub fn new(args: Arguments) -> Self {
        Self { args }
    }

    pub fn execute(&self) -> Result<ValidatedArguments> {
        let mut results = Vec::new();

        let target = match &self.args.search {
            Some(query) => SearchTarget::Query(query.trim().to_string()),
            None => {
                let (path, result) = validate_path(&self.args.path)?;
                results.push(result);
                SearchTarget::Path(path)
            }
        };

        let config = match &self.args.config {
            Some(config) => {
                let path = validate_config_file(config)?;
                results.push(ValidationResult::ok(format!(
                    "Config file validated: {}",
                    path.display()
                )));
                Some(path)
            }
            None => None,
        };
        let settings = Config::load(config.as_deref())?;

        let languages = validate_languages(&settings.effective_languages(&self.args.languages))?;
        results.push(ValidationResult::ok(format!(
            "Language codes validated: {:?}",
            languages
        )));

        results.push(self.validate_mode_consistency()?);

        Ok(ValidatedArguments {
            target,
            languages,
            config,
            settings,
            results,
        })
    }

    fn validate_mode_consistency(&self) -> Result<ValidationResult> {
        let mut messages = Vec::new();

        if let Some(query) = &self.args.search {
            if query.trim().is_empty() {
                bail!("search query cannot be empty when using search mode");
            }
            if self.args.path != Path::new(".") {
                messages.push(format!(
                    "Manual search mode enabled: path argument '{}' will be ignored",
                    self.args.path.display()
                ));
            }
        }

        if self.args.interactive {
            messages.push(
                "Interactive mode enabled: you'll be able to select from multiple subtitle options"
                    .to_string(),
            );
        }

        if self.args.dry_run {
            messages.push(
                "Dry run mode: no files will be downloaded, only preview what would happen"
                    .to_string(),
            );
        }

        if messages.is_empty() {
            Ok(ValidationResult {
                success: true,
                ..Default::default()
            })
        } else {
            Ok(ValidationResult::note(messages.join("\n")))
        }
    }

    /// Print validation results as ✓ / ⚠ / ℹ lines
    pub fn print_results(results: &[ValidationResult]) {
        for result in results {
            match (&result.message, result.success) {
                (Some(message), true) => println!("✓ {}", message),
                (Some(message), false) => println!("ℹ {}", message),
                (None, _) => {}
            }
            if let Some(warning) = &result.warning {
                println!("⚠ Warning: {}", warning);
            }
        }
    }
}

/// Resolve the path to an absolute one and check that it exists
pub fn validate_path(path: &Path) -> Result<(PathBuf, ValidationResult)> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("invalid path '{}'", path.display()))?;

    if !absolute.exists() {
        return Err(anyhow!("path does not exist: {}", absolute.display()));
    }

    if absolute.is_dir() {
        let result = ValidationResult::ok(format!(
            "Directory path validated: {}",
            absolute.display()
        ));
        return Ok((absolute, result));
    }

    let mut result = ValidationResult::ok(format!("File path validated: {}", absolute.display()));
    if let Some(ext) = absolute.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        if !MEDIA_EXTENSIONS.contains(&ext.as_str()) {
            result.warning = Some(format!(
                "File extension '.{}' may not be a supported media format",
                ext
            ));
        }
    }

    Ok((absolute, result))
}

/// Trim and check every language code, dropping blank entries
pub fn validate_languages(languages: &[String]) -> Result<Vec<String>> {
    if languages.is_empty() {
        bail!("at least one language must be specified");
    }

    let mut valid = Vec::with_capacity(languages.len());
    for lang in languages.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        if lang.len() < 2 || lang.len() > 5 {
            bail!(
                "invalid language code '{}': must be 2-5 characters (e.g., 'en', 'pt-BR')",
                lang
            );
        }
        if !is_valid_language_code(lang) {
            bail!(
                "invalid language code format '{}': expected format like 'en' or 'pt-BR'",
                lang
            );
        }
        valid.push(lang.to_string());
    }

    if valid.is_empty() {
        bail!("no valid language codes provided");
    }

    debug!("Languages: {:?}", valid);
    Ok(valid)
}

/// Two or three ASCII letters, or `xx-yy`, case-insensitive
pub fn is_valid_language_code(code: &str) -> bool {
    let letters = |s: &str| s.bytes().all(|b| b.is_ascii_alphabetic());

    match code.len() {
        2 | 3 => letters(code),
        5 => match code.split_once('-') {
            Some((lang, region)) => lang.len() == 2 && letters(lang) && letters(region),
            None => false,
        },
        _ => false,
    }
}

pub fn validate_config_file(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("invalid config file path '{}'", path.display()))?;

    if !absolute.is_file() {
        return Err(anyhow!("config file does not exist: {}", absolute.display()));
    }

    Ok(absolute)
}

/// Print the effective configuration before processing starts
pub fn print_configuration(options: &SearchOptions, config: Option<&Path>) {
    println!("\n--- Configuration ---");

    match &options.target {
        SearchTarget::Query(query) => {
            println!("Mode: Manual search");
            println!("Search query: {}", query);
        }
        SearchTarget::Path(path) => {
            println!("Mode: Path-based search");
            println!("Target path: {}", path.display());
            println!("Recursive: {}", options.recursive);
        }
    }

    println!("Languages: {:?}", options.languages);
    println!("Interactive: {}", options.interactive);
    println!("Dry run: {}", options.dry_run);

    match config {
        Some(path) => println!("Config file: {}", path.display()),
        None => match Config::default_path() {
            Some(path) => println!("Config file: default ({})", path.display()),
            None => println!("Config file: none"),
        },
    }
}
