//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Whether bearer tokens are actually checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Enforced,
    /// Every session counts as authenticated and no credentials are sent.
    Disabled,
}

/// How the document list maps onto the backend's `skip`/`limit` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingMode {
    /// Request one backend page and filter/sort only that page.
    ServerPage,
    /// Fetch the full set, then filter, sort and paginate locally.
    ClientSide,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: Url,
    pub state_file: PathBuf,
    pub export_dir: PathBuf,
    pub log_level: Level,
    pub auth_mode: AuthMode,
    pub paging_mode: PagingMode,
    pub page_size: usize,
    pub copy_feedback: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Backend ---
        let api_url_str = lookup("PRDGEN_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(&api_url_str)
            .map_err(|e| ConfigError::InvalidValue("PRDGEN_API_URL".to_string(), e.to_string()))?;

        // --- Local state ---
        let state_file = match lookup("PRDGEN_STATE_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_state_file()?,
        };
        let export_dir = lookup("PRDGEN_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Behavior toggles ---
        let auth_mode = match lookup("PRDGEN_AUTH_DISABLED") {
            Some(value) if parse_bool("PRDGEN_AUTH_DISABLED", &value)? => AuthMode::Disabled,
            _ => AuthMode::Enforced,
        };

        let paging_mode = match lookup("PRDGEN_PAGING").as_deref() {
            None | Some("server") => PagingMode::ServerPage,
            Some("client") => PagingMode::ClientSide,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "PRDGEN_PAGING".to_string(),
                    format!("'{}' is not one of 'server' or 'client'", other),
                ))
            }
        };

        let page_size = parse_number("PRDGEN_PAGE_SIZE", lookup("PRDGEN_PAGE_SIZE"), 10)?;
        if page_size == 0 {
            return Err(ConfigError::InvalidValue(
                "PRDGEN_PAGE_SIZE".to_string(),
                "page size must be at least 1".to_string(),
            ));
        }

        let copy_feedback_ms =
            parse_number("PRDGEN_COPY_FEEDBACK_MS", lookup("PRDGEN_COPY_FEEDBACK_MS"), 2000)?;

        Ok(Self {
            api_url,
            state_file,
            export_dir,
            log_level,
            auth_mode,
            paging_mode,
            page_size,
            copy_feedback: Duration::from_millis(copy_feedback_ms as u64),
        })
    }
}

fn default_state_file() -> Result<PathBuf, ConfigError> {
    dirs::data_local_dir()
        .map(|dir| dir.join("prdgen").join("session.json"))
        .ok_or_else(|| ConfigError::MissingVar("PRDGEN_STATE_FILE".to_string()))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a boolean", value),
        )),
    }
}

fn parse_number(name: &str, value: Option<String>, default: usize) -> Result<usize, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[("PRDGEN_STATE_FILE", "/tmp/prdgen.json")]).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/api/v1");
        assert_eq!(config.auth_mode, AuthMode::Enforced);
        assert_eq!(config.paging_mode, PagingMode::ServerPage);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.copy_feedback, Duration::from_millis(2000));
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn toggles_are_read() {
        let config = config_from(&[
            ("PRDGEN_STATE_FILE", "/tmp/prdgen.json"),
            ("PRDGEN_AUTH_DISABLED", "true"),
            ("PRDGEN_PAGING", "client"),
            ("PRDGEN_PAGE_SIZE", "25"),
        ])
        .unwrap();
        assert_eq!(config.auth_mode, AuthMode::Disabled);
        assert_eq!(config.paging_mode, PagingMode::ClientSide);
        assert_eq!(config.page_size, 25);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("PRDGEN_STATE_FILE", "x"), ("PRDGEN_PAGE_SIZE", "0")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "PRDGEN_PAGE_SIZE"
        ));
        assert!(matches!(
            config_from(&[("PRDGEN_STATE_FILE", "x"), ("PRDGEN_PAGING", "infinite")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "PRDGEN_PAGING"
        ));
        assert!(matches!(
            config_from(&[("PRDGEN_STATE_FILE", "x"), ("PRDGEN_API_URL", "not a url")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "PRDGEN_API_URL"
        ));
        assert!(matches!(
            config_from(&[("PRDGEN_STATE_FILE", "x"), ("PRDGEN_AUTH_DISABLED", "maybe")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "PRDGEN_AUTH_DISABLED"
        ));
    }
}
