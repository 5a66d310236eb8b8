/*!
 * Confinement Configuration
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::vfs::paths;

/// Environment variable read by [`ConfineConfig::from_env`] for the base directory
pub const ENV_BASE_DIR: &str = "CONFINEFS_BASE_DIR";

/// Environment variable overriding the fallback temp directory
pub const ENV_TEMP_DIR: &str = "CONFINEFS_TEMP_DIR";

/// Settings for a confined filesystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfineConfig {
    /// Absolute host directory that becomes the virtual root
    pub base_dir: PathBuf,
    /// Virtual path reported by `temp_dir` when the backend's is unusable
    pub temp_fallback: PathBuf,
    /// Virtual working directory at construction
    pub initial_cwd: PathBuf,
}

impl Default for ConfineConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::new(),
            temp_fallback: PathBuf::from(paths::DEFAULT_TEMP_DIR),
            initial_cwd: PathBuf::from(paths::ROOT),
        }
    }
}

impl ConfineConfig {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_temp_fallback<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.temp_fallback = dir.as_ref().to_path_buf();
        self
    }

    #[must_use]
    pub fn with_initial_cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.initial_cwd = dir.as_ref().to_path_buf();
        self
    }

    /// Build from `CONFINEFS_BASE_DIR` / `CONFINEFS_TEMP_DIR`
    ///
    /// Returns `None` when no base directory is set.
    pub fn from_env() -> Option<Self> {
        let base = std::env::var_os(ENV_BASE_DIR).filter(|v| !v.is_empty())?;
        let mut config = Self::new(PathBuf::from(base));
        if let Some(tmp) = std::env::var_os(ENV_TEMP_DIR).filter(|v| !v.is_empty()) {
            config.temp_fallback = PathBuf::from(tmp);
        }
        Some(config)
    }
}
