use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "classroom.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse settings file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid api base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub page_size: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://classroom.googleapis.com/".into(),
            access_token: None,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            page_size: 50,
        }
    }
}

impl ClientSettings {
    /// Base url with a trailing slash so relative paths join under it.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = self.api_base_url.trim();
        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };
        Url::parse(&normalized).map_err(|source| ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            source,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    access_token: Option<String>,
    request_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    page_size: Option<u32>,
}

/// Defaults, then the TOML file at `path` when it exists, then `APP__*`
/// variables looked up through `env`.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientSettings, ConfigError> {
    let mut settings = ClientSettings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings =
                toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            apply_file(&mut settings, file_cfg);
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    apply_env(&mut settings, env)?;
    settings.base_url()?;
    Ok(settings)
}

fn apply_file(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.access_token {
        settings.access_token = Some(v);
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.connect_timeout_secs {
        settings.connect_timeout_secs = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
}

fn apply_env(
    settings: &mut ClientSettings,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("CLASSROOM_ACCESS_TOKEN") {
        settings.access_token = Some(v);
    }
    if let Some(v) = env("APP__ACCESS_TOKEN") {
        settings.access_token = Some(v);
    }
    if settings
        .access_token
        .as_deref()
        .is_some_and(|token| token.trim().is_empty())
    {
        settings.access_token = None;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = parse_number("APP__REQUEST_TIMEOUT_SECS", &v)?;
    }
    if let Some(v) = env("APP__CONNECT_TIMEOUT_SECS") {
        settings.connect_timeout_secs = parse_number("APP__CONNECT_TIMEOUT_SECS", &v)?;
    }
    if let Some(v) = env("APP__PAGE_SIZE") {
        settings.page_size = parse_number("APP__PAGE_SIZE", &v)?;
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
