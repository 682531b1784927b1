use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use quote_engine::{GeneratorSettings, DEFAULT_ENDPOINT};
use quote_logging::LogDestination;
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "./quote_app.ron";
/// Environment variable that overrides `api_key`.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Contents of the RON settings file. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub bridge_timeout_ms: u64,
    pub log_destination: LogDestination,
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        let generator = GeneratorSettings::default();
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: generator.temperature,
            request_timeout_secs: generator.request_timeout.as_secs(),
            bridge_timeout_ms: 5_000,
            log_destination: LogDestination::default(),
            log_level: LogLevel::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid settings in {path:?}: {field} must be greater than zero")]
    ZeroTimeout { path: PathBuf, field: &'static str },
}

impl Settings {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let settings = Self::parse(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        match settings.zero_timeout() {
            Some(field) => Err(SettingsError::ZeroTimeout {
                path: path.to_path_buf(),
                field,
            }),
            None => Ok(settings),
        }
    }

    /// First timeout field set to zero; such a timeout fails every call.
    fn zero_timeout(&self) -> Option<&'static str> {
        if self.request_timeout_secs == 0 {
            Some("request_timeout_secs")
        } else if self.bridge_timeout_ms == 0 {
            Some("bridge_timeout_ms")
        } else {
            None
        }
    }

    pub fn parse(content: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(content)
    }

    /// A non-blank environment value replaces the configured key.
    /// Returns whether the key was replaced.
    pub fn apply_api_key_override(&mut self, value: Option<String>) -> bool {
        match value.filter(|value| !value.trim().is_empty()) {
            Some(value) => {
                self.api_key = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn generator_settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            endpoint: self.endpoint.clone(),
            temperature: self.temperature,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..GeneratorSettings::default()
        }
    }

    pub fn bridge_timeout(&self) -> Duration {
        Duration::from_millis(self.bridge_timeout_ms)
    }
}
