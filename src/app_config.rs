//! Config file loading and merging with command-line flags.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use animirror_core::api::{ApiConfig, DEFAULT_BASE_URL, RetryPolicy};
use serde::Deserialize;

use crate::cli::Args;

const CONFIG_DIR_NAME: &str = "animirror";
const CONFIG_FILE_NAME: &str = "config.toml";

/// TOML-backed file configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Upstream API base URL.
    pub base_url: Option<String>,
    /// Rate limiter admissions per window.
    pub max_requests: Option<usize>,
    /// Rate limiter window length in milliseconds.
    pub window_ms: Option<u64>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP per-attempt timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Retry backoff table in milliseconds; its length is the attempt budget.
    pub backoff_ms: Option<Vec<u64>>,
    /// Default verbosity.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against the same ranges the CLI accepts.
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url
            && base_url.trim().is_empty()
        {
            bail!("Invalid config value for `base_url`: must not be empty");
        }

        if let Some(max_requests) = self.max_requests
            && !(1..=100).contains(&max_requests)
        {
            bail!("Invalid config value for `max_requests`: {max_requests}. Expected range: 1..=100");
        }

        if let Some(window_ms) = self.window_ms
            && !(1..=60_000).contains(&window_ms)
        {
            bail!("Invalid config value for `window_ms`: {window_ms}. Expected range: 1..=60000");
        }

        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        validate_backoff(self.backoff_ms.as_deref())?;

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

fn validate_backoff(value: Option<&[u64]>) -> Result<()> {
    let Some(delays) = value else {
        return Ok(());
    };
    if !(1..=10).contains(&delays.len()) {
        bail!(
            "Invalid config value for `backoff_ms`: {} entries. Expected 1..=10 entries",
            delays.len()
        );
    }
    if let Some(delay) = delays.iter().find(|delay| **delay > 60_000) {
        bail!("Invalid config value for `backoff_ms`: {delay}. Each entry must be <= 60000");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Default tracing filter for this setting.
    #[must_use]
    pub fn filter(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Path that was consulted, if one could be resolved.
    pub path: Option<PathBuf>,
    /// Parsed file config; default when no file exists.
    pub config: FileConfig,
    /// Whether a file was actually read.
    pub loaded_from_file: bool,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/animirror/config.toml`
/// 2. `$HOME/.config/animirror/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from `explicit` or, failing that, the default path.
///
/// A missing default file is not an error; a missing explicit file is.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config,
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config,
                loaded_from_file: true,
            })
        }
        _ => Ok(LoadedConfig {
            path,
            ..LoadedConfig::default()
        }),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let cfg: FileConfig = toml::from_str(raw)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Merges flags over file values over built-in defaults.
///
/// `ANIMIRROR_BASE_URL` is already folded into `args.base_url` by clap.
#[must_use]
pub fn resolve_api_config(args: &Args, file: &FileConfig) -> ApiConfig {
    let defaults = ApiConfig::default();

    let base_url = args
        .base_url
        .clone()
        .or_else(|| file.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let max_per_window = args
        .max_requests
        .map(usize::from)
        .or(file.max_requests)
        .unwrap_or(defaults.max_per_window);
    let window = args
        .window_ms
        .or(file.window_ms)
        .map_or(defaults.window, Duration::from_millis);
    let retry = file
        .backoff_ms
        .as_deref()
        .map_or(defaults.retry, RetryPolicy::from_millis);

    ApiConfig {
        base_url,
        connect_timeout: file
            .connect_timeout_secs
            .map_or(defaults.connect_timeout, Duration::from_secs),
        read_timeout: file
            .read_timeout_secs
            .map_or(defaults.read_timeout, Duration::from_secs),
        max_per_window,
        window,
        retry,
    }
}
