//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::session::{Credentials, DEFAULT_PASSWORD, DEFAULT_USERNAME};

pub use cli::{
    AuthArgs, ClearArgs, CliArgs, Command, CommentArgs, FeedArgs, GlobalOverrides, LikeArgs,
    PostArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "corkboard";
pub const DEFAULT_REMOTE_BASE_URL: &str = "https://api.jsonbin.io/v3/b";
pub const DEFAULT_DOCUMENT_ID: &str = "connecthub-messages";
pub const DEFAULT_CACHE_KEY: &str = "connecthub_posts";
const DEFAULT_CACHE_DIR: &str = ".corkboard";

#[derive(Debug, Clone)]
pub struct Settings {
    pub remote: RemoteSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
    pub auth: Credentials,
}

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub enabled: bool,
    pub base_url: Url,
    pub document_id: String,
    pub access_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub key: String,
    pub directory: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    load_layers(cli, environment())
}

fn environment() -> Environment {
    Environment::with_prefix("CORKBOARD").separator("__")
}

fn load_layers(cli: &CliArgs, environment: Environment) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(environment);

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    remote: RawRemoteSettings,
    cache: RawCacheSettings,
    logging: RawLoggingSettings,
    auth: RawAuthSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enabled) = overrides.remote_enabled {
            self.remote.enabled = Some(enabled);
        }
        if let Some(url) = overrides.remote_base_url.as_ref() {
            self.remote.base_url = Some(url.clone());
        }
        if let Some(directory) = overrides.cache_directory.as_ref() {
            self.cache.directory = Some(directory.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            remote,
            cache,
            logging,
            auth,
        } = raw;

        let remote = build_remote_settings(remote)?;
        let cache = build_cache_settings(cache)?;
        let logging = build_logging_settings(logging)?;
        let auth = build_auth_settings(auth)?;

        Ok(Self {
            remote,
            cache,
            logging,
            auth,
        })
    }
}

fn build_remote_settings(remote: RawRemoteSettings) -> Result<RemoteSettings, LoadError> {
    let raw_url = remote
        .base_url
        .unwrap_or_else(|| DEFAULT_REMOTE_BASE_URL.to_string());
    let base_url = Url::parse(raw_url.trim())
        .map_err(|err| LoadError::invalid("remote.base_url", format!("failed to parse: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "remote.base_url",
            "scheme must be http or https",
        ));
    }

    let document_id = remote
        .document_id
        .unwrap_or_else(|| DEFAULT_DOCUMENT_ID.to_string())
        .trim()
        .to_string();
    if document_id.is_empty() || document_id.contains('/') {
        return Err(LoadError::invalid(
            "remote.document_id",
            "must be a single non-empty path segment",
        ));
    }

    let access_key = remote.access_key.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    Ok(RemoteSettings {
        enabled: remote.enabled.unwrap_or(true),
        base_url,
        document_id,
        access_key,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let key = cache
        .key
        .unwrap_or_else(|| DEFAULT_CACHE_KEY.to_string())
        .trim()
        .to_string();
    if !is_safe_file_stem(&key) {
        return Err(LoadError::invalid(
            "cache.key",
            "must contain only letters, digits, `-` or `_`",
        ));
    }

    let directory = cache
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "cache.directory",
            "path must not be empty",
        ));
    }

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        key,
        directory,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_auth_settings(auth: RawAuthSettings) -> Result<Credentials, LoadError> {
    let username = auth
        .username
        .unwrap_or_else(|| DEFAULT_USERNAME.to_string());
    if username.trim().is_empty() {
        return Err(LoadError::invalid("auth.username", "must not be empty"));
    }
    let password = auth
        .password
        .unwrap_or_else(|| DEFAULT_PASSWORD.to_string());
    if password.is_empty() {
        return Err(LoadError::invalid("auth.password", "must not be empty"));
    }

    Ok(Credentials { username, password })
}

fn is_safe_file_stem(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRemoteSettings {
    enabled: Option<bool>,
    base_url: Option<String>,
    document_id: Option<String>,
    access_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    key: Option<String>,
    directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAuthSettings {
    username: Option<String>,
    password: Option<String>,
}
