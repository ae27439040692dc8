//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use bookshelf_core::HttpTimeouts;
use bookshelf_core::library::{DEFAULT_API_BASE_URL, default_token_path};

/// Config file name inside the app config directory.
const CONFIG_FILE_NAME: &str = "config.toml";
/// App config directory name.
const APP_DIR_NAME: &str = "bookshelf";

/// `key = value` file configuration for bookshelf defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Library backend base URL.
    pub api_base_url: Option<String>,
    /// Google Books API key.
    pub google_books_api_key: Option<String>,
    /// Session token file location.
    pub token_path: Option<PathBuf>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
    /// Bibliographic source connect timeout in seconds.
    pub lookup_connect_timeout_secs: Option<u64>,
    /// Bibliographic source read timeout in seconds.
    pub lookup_read_timeout_secs: Option<u64>,
    /// Library backend connect timeout in seconds.
    pub api_connect_timeout_secs: Option<u64>,
    /// Library backend read timeout in seconds.
    pub api_read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.api_base_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            bail!("Invalid config value for `api_base_url`: '{url}'. Expected an http(s) URL");
        }
        validate_timeout_secs(
            "lookup_connect_timeout_secs",
            self.lookup_connect_timeout_secs,
        )?;
        validate_timeout_secs("lookup_read_timeout_secs", self.lookup_read_timeout_secs)?;
        validate_timeout_secs("api_connect_timeout_secs", self.api_connect_timeout_secs)?;
        validate_timeout_secs("api_read_timeout_secs", self.api_read_timeout_secs)?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Verbose => "verbose",
            Self::Quiet => "quiet",
            Self::Debug => "debug",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/bookshelf/config.toml`
/// 2. `$HOME/.config/bookshelf/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(APP_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    };

    if !path_ref.exists() {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    }

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
        loaded_from_file: true,
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_no = line_index + 1;

        match key {
            "api_base_url" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `api_base_url` value on line {line_no}"))?;
                cfg.api_base_url = Some(parsed);
            }
            "google_books_api_key" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `google_books_api_key` value on line {line_no}")
                })?;
                cfg.google_books_api_key = Some(parsed).filter(|key| !key.trim().is_empty());
            }
            "token_path" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `token_path` value on line {line_no}"))?;
                cfg.token_path = Some(PathBuf::from(parsed));
            }
            "verbosity" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `verbosity` value on line {line_no}"))?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            "lookup_connect_timeout_secs" => {
                cfg.lookup_connect_timeout_secs = Some(parse_timeout_line(key, value, line_no)?);
            }
            "lookup_read_timeout_secs" => {
                cfg.lookup_read_timeout_secs = Some(parse_timeout_line(key, value, line_no)?);
            }
            "api_connect_timeout_secs" => {
                cfg.api_connect_timeout_secs = Some(parse_timeout_line(key, value, line_no)?);
            }
            "api_read_timeout_secs" => {
                cfg.api_read_timeout_secs = Some(parse_timeout_line(key, value, line_no)?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn parse_timeout_line(key: &str, value: &str, line_no: usize) -> Result<u64> {
    parse_integer_u64(value).with_context(|| format!("Invalid `{key}` value on line {line_no}"))
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

// ==================== Effective Settings ====================

/// Where an effective setting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    /// Command-line flag or environment variable.
    Cli,
    /// Config file.
    File,
    /// Built-in default.
    Default,
}

impl SettingSource {
    /// Returns the label used by `config show`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cli => "cli/env",
            Self::File => "config file",
            Self::Default => "default",
        }
    }
}

/// Settings after applying flag/env > config file > default precedence.
#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    /// Library backend base URL.
    pub api_base_url: String,
    /// Where `api_base_url` came from.
    pub api_base_url_source: SettingSource,
    /// Google Books API key, if any.
    pub google_books_api_key: Option<String>,
    /// Where the API key came from (`Default` means none).
    pub google_books_api_key_source: SettingSource,
    /// Token file path; `None` when no config directory is known.
    pub token_path: Option<PathBuf>,
    /// Timeouts for bibliographic sources.
    pub lookup_timeouts: HttpTimeouts,
    /// Timeouts for the library backend.
    pub api_timeouts: HttpTimeouts,
    /// Verbosity from the config file.
    pub verbosity: Option<VerbositySetting>,
}

/// Values taken from flags and environment variables.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `--api-url` / `BOOKSHELF_API_URL`.
    pub api_url: Option<String>,
    /// `--google-books-api-key` / `GOOGLE_BOOKS_API_KEY`.
    pub google_books_api_key: Option<String>,
}

/// Merges CLI overrides, file config and defaults.
#[must_use]
pub fn resolve_effective_settings(
    overrides: &CliOverrides,
    file: Option<&FileConfig>,
) -> EffectiveSettings {
    let non_blank = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

    let (api_base_url, api_base_url_source) = non_blank(&overrides.api_url)
        .map(|url| (url, SettingSource::Cli))
        .or_else(|| {
            file.and_then(|f| non_blank(&f.api_base_url))
                .map(|url| (url, SettingSource::File))
        })
        .unwrap_or_else(|| (DEFAULT_API_BASE_URL.to_string(), SettingSource::Default));

    let (google_books_api_key, google_books_api_key_source) =
        match non_blank(&overrides.google_books_api_key) {
            Some(key) => (Some(key), SettingSource::Cli),
            None => match file.and_then(|f| non_blank(&f.google_books_api_key)) {
                Some(key) => (Some(key), SettingSource::File),
                None => (None, SettingSource::Default),
            },
        };

    let token_path = file
        .and_then(|f| f.token_path.clone())
        .or_else(|| default_token_path().ok());

    let defaults = HttpTimeouts::default();
    let lookup_timeouts = HttpTimeouts::new(
        file.and_then(|f| f.lookup_connect_timeout_secs)
            .unwrap_or(defaults.connect_secs),
        file.and_then(|f| f.lookup_read_timeout_secs)
            .unwrap_or(defaults.read_secs),
    );
    let api_timeouts = HttpTimeouts::new(
        file.and_then(|f| f.api_connect_timeout_secs)
            .unwrap_or(defaults.connect_secs),
        file.and_then(|f| f.api_read_timeout_secs)
            .unwrap_or(defaults.read_secs),
    );

    EffectiveSettings {
        api_base_url,
        api_base_url_source,
        google_books_api_key,
        google_books_api_key_source,
        token_path,
        lookup_timeouts,
        api_timeouts,
        verbosity: file.and_then(|f| f.verbosity),
    }
}
