use std::{
    fs, io,
    path::{Path, PathBuf},
};

use getset::{CopyGetters, Getters};
use serde::Deserialize;
use thiserror::Error;
use tracing::Level;

use crate::forecast::DEFAULT_STEPS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to deserialize {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize, Getters)]
#[serde(default)]
pub struct Endpoints {
    #[getset(get = "pub")]
    observations: String,

    #[getset(get = "pub")]
    forecast: String,

    #[getset(get = "pub")]
    analysis: String,

    #[getset(get = "pub")]
    geolocation: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            observations: "https://opendata-download-metobs.smhi.se/api/version/latest".into(),
            forecast: "https://opendata-download-metfcst.smhi.se/api".into(),
            analysis: "https://opendata-download-metanalys.smhi.se/api".into(),
            geolocation: "https://ipapi.co/json/".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Getters, CopyGetters)]
#[serde(default)]
pub struct AppConfig {
    #[getset(get = "pub")]
    endpoints: Endpoints,

    #[getset(get = "pub")]
    favorites: PathBuf,

    #[getset(get = "pub")]
    level: Option<String>,

    #[getset(get_copy = "pub")]
    forecast_steps: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            endpoints: Endpoints::default(),
            favorites: PathBuf::from("weather_favorites.json"),
            level: None,
            forecast_steps: DEFAULT_STEPS,
        }
    }
}

impl AppConfig {
    /// Reads `path`; a missing file means all defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Configured log level, `WARN` when absent or unparsable.
    pub fn log_level(&self) -> Level {
        self.level
            .as_deref()
            .and_then(|level| level.parse().ok())
            .unwrap_or(Level::WARN)
    }
}
