use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{info, warn};

use crate::settings::Settings;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where the settings returned by [`ConfigStore::load`] came from.
#[derive(Debug)]
pub enum LoadSource {
    File,
    /// The file was readable but had out-of-range values; they were clamped.
    Normalized,
    Missing,
    Corrupt(StoreError),
}

impl LoadSource {
    pub fn is_default(&self) -> bool {
        matches!(self, LoadSource::Missing | LoadSource::Corrupt(_))
    }
}

#[derive(Debug)]
pub struct Loaded {
    pub settings: Settings,
    pub source: LoadSource,
}

/// Settings persisted as a single JSON file.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the settings file, never failing: a missing or unreadable file is
    /// replaced with defaults, which are written back best-effort.
    pub fn load(&self) -> Loaded {
        let (settings, source) = match self.read() {
            Ok(Some(raw)) => {
                let fixed = raw.normalized();
                if fixed != raw {
                    warn!(
                        "settings in {} were out of range; clamped and re-saved",
                        self.path.display()
                    );
                    self.save_best_effort(&fixed);
                    (fixed, LoadSource::Normalized)
                } else {
                    (fixed, LoadSource::File)
                }
            }
            Ok(None) => {
                info!(
                    "no settings at {}; writing defaults",
                    self.path.display()
                );
                let defaults = Settings::default();
                self.save_best_effort(&defaults);
                (defaults, LoadSource::Missing)
            }
            Err(err) => {
                warn!("{err}; falling back to defaults");
                let defaults = Settings::default();
                self.save_best_effort(&defaults);
                (defaults, LoadSource::Corrupt(err))
            }
        };
        Loaded { settings, source }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        let serialized = serde_json::to_string_pretty(settings)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, serialized).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Persistence never blocks the caller; failures are logged only.
    pub fn save_best_effort(&self, settings: &Settings) -> bool {
        match self.save(settings) {
            Ok(()) => true,
            Err(err) => {
                warn!("settings not saved: {err}");
                false
            }
        }
    }

    fn read(&self) -> Result<Option<Settings>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}
