use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "https://localhost:7267";
pub const DEFAULT_SESSION_COOKIE: &str = ".EliteCars.Session";
pub const DEFAULT_BACKEND_SESSION_COOKIE: &str = ".AspNetCore.Session";
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 30 * 1024 * 1024;
const API_BASE_URL_ENV: &str = "API_BASE_URL";

#[derive(Debug, Parser)]
#[command(
    name = "elitecars-web",
    version,
    about = "Admin and visitor front-end for the EliteCars listing API"
)]
pub struct Cli {
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    #[arg(long, value_name = "URL")]
    pub api_base_url: Option<String>,

    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    /// Largest request body accepted on the car forms, in bytes.
    pub max_upload_size: usize,
    pub backend: BackendConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base address without trailing slash, e.g. `https://localhost:7267`.
    pub base_url: String,
    pub request_timeout: Duration,
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub idle_timeout: Duration,
    pub secure: bool,
    /// Name under which the browser session is presented to the backend.
    pub backend_cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: String::from(DEFAULT_SESSION_COOKIE),
            idle_timeout: Duration::from_secs(3600),
            secure: true,
            backend_cookie_name: String::from(DEFAULT_BACKEND_SESSION_COOKIE),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid API base URL {value}: must be an absolute http(s) URL")]
    InvalidBaseUrl { value: String },
    #[error("invalid duration for {key}: {value}")]
    InvalidDuration { key: &'static str, value: String },
    #[error("max_upload_size must be greater than zero")]
    InvalidUploadSize,
    #[error("invalid value for env var {key}: {value}")]
    InvalidEnv { key: String, value: String },
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind: Option<SocketAddr>,
    api_base_url: Option<String>,
    request_timeout: Option<String>,
    max_upload_size: Option<usize>,
    accept_invalid_certs: Option<bool>,
    #[serde(default)]
    session: FileSessionConfig,
}

#[derive(Debug, Default, Deserialize)]
struct FileSessionConfig {
    cookie_name: Option<String>,
    idle_timeout: Option<String>,
    secure: Option<bool>,
    backend_cookie_name: Option<String>,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let from_file = read_file_config(cli.config.as_deref())?;
        let env_base_url = read_env_string(API_BASE_URL_ENV)?;
        Self::resolve(cli, env_base_url, from_file)
    }

    fn resolve(
        cli: Cli,
        env_base_url: Option<String>,
        from_file: FileConfig,
    ) -> Result<Self, ConfigError> {
        let bind = cli
            .bind
            .or(from_file.bind)
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

        let raw_base_url = cli
            .api_base_url
            .or(env_base_url)
            .or(from_file.api_base_url)
            .unwrap_or_else(|| String::from(DEFAULT_API_BASE_URL));
        let base_url = normalize_base_url(&raw_base_url)?;

        let request_timeout = parse_duration(
            "request_timeout",
            from_file.request_timeout.as_deref(),
            Duration::from_secs(30),
        )?;

        let max_upload_size = match from_file.max_upload_size {
            Some(0) => return Err(ConfigError::InvalidUploadSize),
            Some(size) => size,
            None => DEFAULT_MAX_UPLOAD_SIZE,
        };

        let defaults = SessionConfig::default();
        let session = SessionConfig {
            cookie_name: non_blank(from_file.session.cookie_name).unwrap_or(defaults.cookie_name),
            idle_timeout: parse_duration(
                "session.idle_timeout",
                from_file.session.idle_timeout.as_deref(),
                defaults.idle_timeout,
            )?,
            secure: from_file.session.secure.unwrap_or(defaults.secure),
            backend_cookie_name: non_blank(from_file.session.backend_cookie_name)
                .unwrap_or(defaults.backend_cookie_name),
        };

        Ok(Self {
            bind,
            max_upload_size,
            backend: BackendConfig {
                base_url,
                request_timeout,
                accept_invalid_certs: from_file.accept_invalid_certs.unwrap_or(false),
            },
            session,
        })
    }
}

fn read_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn read_env_string(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnv {
            key: String::from(key),
            value: String::from("<non-unicode>"),
        }),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_duration(
    key: &'static str,
    raw: Option<&str>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match humantime::parse_duration(raw.trim()) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        _ => Err(ConfigError::InvalidDuration {
            key,
            value: String::from(raw),
        }),
    }
}

/// Trims whitespace and trailing slashes; rejects anything that is not an
/// absolute http(s) URL with a host.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(trimmed).map_err(|_| ConfigError::InvalidBaseUrl {
        value: String::from(raw),
    })?;
    let scheme_ok = matches!(parsed.scheme(), "http" | "https");
    if !scheme_ok || parsed.host_str().is_none() {
        return Err(ConfigError::InvalidBaseUrl {
            value: String::from(raw),
        });
    }
    Ok(trimmed.to_string())
}
