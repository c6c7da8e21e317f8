//! CLI configuration
//!
//! **Priority:** CLI argument → environment variable → TOML file → default

use std::path::PathBuf;

use iscc_common::config::{default_workers, UnitBits};
use serde::Deserialize;

use crate::scheduler::BatchConfig;

/// Default config file name under the platform config dir
pub const CONFIG_FILE_NAME: &str = "iscc-cli.toml";

/// Optional settings read from the TOML file
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub workers: Option<usize>,
    pub bits: UnitBits,
    pub max_file_bytes: Option<u64>,
}

/// Values given on the command line or through the environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub workers: Option<usize>,
    pub content_bits: Option<u32>,
    pub data_bits: Option<u32>,
    pub instance_bits: Option<u32>,
    pub max_file_bytes: Option<u64>,
    pub config: Option<PathBuf>,
}

/// Merge overrides over the TOML file over defaults
pub fn resolve(overrides: &Overrides, file: FileConfig) -> BatchConfig {
    let bits = UnitBits {
        content: overrides.content_bits.unwrap_or(file.bits.content),
        data: overrides.data_bits.unwrap_or(file.bits.data),
        instance: overrides.instance_bits.unwrap_or(file.bits.instance),
    };

    BatchConfig {
        workers: overrides
            .workers
            .or(file.workers)
            .unwrap_or_else(default_workers)
            .max(1),
        bits,
        max_file_bytes: overrides.max_file_bytes.or(file.max_file_bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_per_field() {
        let file = FileConfig {
            workers: Some(3),
            bits: UnitBits {
                content: 128,
                data: 128,
                instance: 128,
            },
            max_file_bytes: Some(1 << 20),
        };
        let overrides = Overrides {
            data_bits: Some(256),
            ..Default::default()
        };

        let config = resolve(&overrides, file);
        assert_eq!(config.workers, 3);
        assert_eq!(config.bits.content, 128);
        assert_eq!(config.bits.data, 256);
        assert_eq!(config.max_file_bytes, Some(1 << 20));
    }

    #[test]
    fn test_defaults() {
        let config = resolve(&Overrides::default(), FileConfig::default());
        assert!(config.workers >= 1);
        assert_eq!(config.bits, UnitBits::default());
        assert_eq!(config.max_file_bytes, None);
    }
}
