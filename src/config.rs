use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::curriculum::DrillCategory;
use crate::runtime::{DEFAULT_REFRESH_MS, MIN_REFRESH_MS};

/// Preferences remembered between launches. Session results are never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Drill bank for mixed practice; `None` means the warm-up course
    pub category: Option<DrillCategory>,
    /// Live stats refresh interval in milliseconds
    pub refresh_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            category: None,
            refresh_ms: DEFAULT_REFRESH_MS,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("keystride_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or unreadable files fall back to defaults
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        let mut cfg = serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|err| {
            warn!(%err, path = %self.path.display(), "ignoring malformed config");
            Config::default()
        });
        cfg.refresh_ms = cfg.refresh_ms.max(MIN_REFRESH_MS);
        cfg
    }

    fn save(&self, cfg: &Config) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(io::Error::other)?;
        fs::write(&self.path, data)
    }
}
