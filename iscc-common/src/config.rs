//! Configuration loading and default locations
//!
//! Resolution order used by both binaries:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Steps 1 and 2 are handled by clap; this module covers the TOML file and the
//! compiled defaults. A missing or broken TOML file never stops startup.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::units::{validate_bits, UnitKind};
use crate::{Error, Result};

/// Application directory name under the platform config/data dirs
pub const APP_DIR: &str = "iscc";

/// Bit length requested for each unit kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitBits {
    pub content: u32,
    pub data: u32,
    pub instance: u32,
}

impl Default for UnitBits {
    fn default() -> Self {
        Self {
            content: 64,
            data: 64,
            instance: 64,
        }
    }
}

impl UnitBits {
    pub fn for_kind(&self, kind: UnitKind) -> u32 {
        match kind {
            UnitKind::Content => self.content,
            UnitKind::Data => self.data,
            UnitKind::Instance => self.instance,
        }
    }

    /// Reject bit lengths the unit computations cannot produce
    pub fn validate(&self) -> Result<()> {
        for kind in UnitKind::ALL {
            validate_bits(self.for_kind(kind))
                .map_err(|e| Error::Config(format!("{} bits: {}", kind, e)))?;
        }
        Ok(())
    }
}

/// Load a TOML config file, falling back to defaults
///
/// Missing file → info + defaults. Unreadable or invalid file → warning + defaults.
pub fn load_toml_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        info!(path = %path.display(), "No config file found, using defaults");
        return T::default();
    }

    match read_toml(path) {
        Ok(config) => {
            info!(path = %path.display(), "Loaded config file");
            config
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring config file, using defaults");
            T::default()
        }
    }
}

/// Read and parse a TOML config file
pub fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Default path of a config file, e.g. `~/.config/iscc/<file_name>`
pub fn default_config_path(file_name: &str) -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR).join(file_name))
        .unwrap_or_else(|| PathBuf::from(file_name))
}

/// Default data directory, e.g. `~/.local/share/iscc`
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./iscc_data"))
}

/// Default worker count: available parallelism, at least one
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
