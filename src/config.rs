//! Application-level configuration: storage backend selection and the
//! default descriptions seeded into every store.

use std::{
    env, fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = "config/app.json";
const CONFIG_PATH_ENV: &str = "SCOREBOARD_CONFIG_PATH";
const STORE_BACKEND_ENV: &str = "STORE_BACKEND";

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    default_descriptions: Vec<DefaultDescription>,
}

/// A system-provided description inserted as read-only when a store connects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DefaultDescription {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file `{}`", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl AppConfig {
    /// Load `config/app.json` (or `$SCOREBOARD_CONFIG_PATH`), falling back to
    /// [`AppConfig::builtin`] when the file is absent or unusable.
    pub fn load() -> Self {
        let path = config_path();
        match Self::from_file(&path) {
            Ok(Some(config)) => {
                info!(
                    path = %path.display(),
                    count = config.default_descriptions.len(),
                    "loaded default descriptions"
                );
                config
            }
            Ok(None) => {
                info!(path = %path.display(), "no config file; using built-in descriptions");
                Self::builtin()
            }
            Err(err) => {
                warn!(error = %err, "ignoring config file; using built-in descriptions");
                Self::builtin()
            }
        }
    }

    /// Read a config file; `Ok(None)` when it does not exist.
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_owned(),
                    source,
                });
            }
        };

        Self::from_json(&contents)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_owned(),
                source,
            })
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    /// Configuration shipped with the binary.
    pub fn builtin() -> Self {
        Self {
            default_descriptions: builtin_descriptions(),
        }
    }

    pub fn with_default_descriptions(default_descriptions: Vec<DefaultDescription>) -> Self {
        Self {
            default_descriptions,
        }
    }

    /// Descriptions that every store must expose as read-only templates.
    pub fn default_descriptions(&self) -> &[DefaultDescription] {
        &self.default_descriptions
    }
}

/// Storage backend selected through `STORE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Couch,
    Memory,
}

impl StoreBackend {
    /// Read the backend from the environment, defaulting to MongoDB.
    pub fn from_env() -> Self {
        match env::var(STORE_BACKEND_ENV) {
            Ok(value) => Self::parse(&value).unwrap_or_else(|| {
                warn!(value = %value, "unknown storage backend; using mongo");
                StoreBackend::Mongo
            }),
            Err(_) => StoreBackend::Mongo,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Some(StoreBackend::Mongo),
            "couch" | "couchdb" => Some(StoreBackend::Couch),
            "memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

fn config_path() -> PathBuf {
    match env::var_os(CONFIG_PATH_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

fn builtin_descriptions() -> Vec<DefaultDescription> {
    vec![
        DefaultDescription {
            name: "Classic".into(),
            description: "Every round each player records the points they scored. Scores add up \
                          across rounds and the player with the highest total when the game ends \
                          is the winner."
                .into(),
        },
        DefaultDescription {
            name: "Lowest wins".into(),
            description: "Every round each player records their penalty points. Penalties add up \
                          across rounds and the game ends once someone passes the agreed limit; the \
                          player with the lowest total wins."
                .into(),
        },
    ]
}
