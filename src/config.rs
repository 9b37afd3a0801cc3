//! Env-based service settings.
//!
//! Call `dotenvy::dotenv().ok()` once at process start (the binary does);
//! `Settings::from_env` then reads plain env vars. Invalid values are
//! `ConfigurationError`s and fail startup before any batch is processed.

use std::str::FromStr;
use tracing::info;

use crate::error::ConfigurationError;

pub const ENV_API_PORT: &str = "API_PORT";
pub const ENV_DEFAULT_WINDOW_HOURS: &str = "DEFAULT_WINDOW_HOURS";
pub const ENV_MAX_TEXT_LENGTH: &str = "MAX_TEXT_LENGTH";
pub const ENV_MAX_UPLOAD_ROWS: &str = "MAX_UPLOAD_ROWS";
pub const ENV_CLASSIFIER_BACKEND: &str = "CLASSIFIER_BACKEND";
pub const ENV_CLASSIFIER_URL: &str = "CLASSIFIER_URL";
pub const ENV_CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";

/// Which `ClassifierAdapter` implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierBackend {
    /// Deterministic offline stand-in.
    Mock,
    /// HTTP client against a model-backed inference sidecar.
    Remote,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_port: u16,
    pub default_window_hours: i64,
    pub max_text_length: usize,
    pub max_upload_rows: usize,
    pub classifier_backend: ClassifierBackend,
    pub classifier_url: Option<String>,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_port: 8000,
            default_window_hours: 24,
            max_text_length: 5000,
            max_upload_rows: 10_000,
            classifier_backend: ClassifierBackend::Mock,
            classifier_url: None,
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let defaults = Settings::default();

        let settings = Settings {
            api_port: env_parse(ENV_API_PORT)?.unwrap_or(defaults.api_port),
            default_window_hours: env_parse(ENV_DEFAULT_WINDOW_HOURS)?
                .unwrap_or(defaults.default_window_hours),
            max_text_length: env_parse(ENV_MAX_TEXT_LENGTH)?.unwrap_or(defaults.max_text_length),
            max_upload_rows: env_parse(ENV_MAX_UPLOAD_ROWS)?.unwrap_or(defaults.max_upload_rows),
            classifier_backend: parse_backend()?,
            classifier_url: std::env::var(ENV_CLASSIFIER_URL)
                .ok()
                .filter(|s| !s.trim().is_empty()),
            cors_allowed_origins: std::env::var(ENV_CORS_ALLOWED_ORIGINS)
                .ok()
                .map(|s| split_csv(&s))
                .unwrap_or(defaults.cors_allowed_origins),
        };

        if settings.max_text_length < 1 {
            return Err(ConfigurationError::InvalidEnv {
                var: ENV_MAX_TEXT_LENGTH,
                reason: "must be >= 1".to_string(),
            });
        }
        if settings.default_window_hours < 1 {
            return Err(ConfigurationError::InvalidEnv {
                var: ENV_DEFAULT_WINDOW_HOURS,
                reason: "must be >= 1".to_string(),
            });
        }
        if settings.classifier_backend == ClassifierBackend::Remote
            && settings.classifier_url.is_none()
        {
            return Err(ConfigurationError::InvalidEnv {
                var: ENV_CLASSIFIER_URL,
                reason: "required when CLASSIFIER_BACKEND=remote".to_string(),
            });
        }

        info!(
            port = settings.api_port,
            window_hours = settings.default_window_hours,
            backend = ?settings.classifier_backend,
            "config loaded"
        );
        Ok(settings)
    }
}

fn parse_backend() -> Result<ClassifierBackend, ConfigurationError> {
    match std::env::var(ENV_CLASSIFIER_BACKEND) {
        Err(_) => Ok(ClassifierBackend::Mock),
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "" | "mock" => Ok(ClassifierBackend::Mock),
            "remote" => Ok(ClassifierBackend::Remote),
            other => Err(ConfigurationError::InvalidEnv {
                var: ENV_CLASSIFIER_BACKEND,
                reason: format!("unknown backend '{other}' (expected mock|remote)"),
            }),
        },
    }
}

fn env_parse<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigurationError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Err(_) => Ok(None),
        Ok(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(None);
            }
            raw.parse::<T>()
                .map(Some)
                .map_err(|e| ConfigurationError::InvalidEnv {
                    var,
                    reason: e.to_string(),
                })
        }
    }
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
