//! Service configuration
//!
//! **Priority:** CLI argument → environment variable → TOML file → default
//!
//! clap resolves the first two tiers (every argument carries an `env` name);
//! anything still unset is taken from the TOML file, then from the compiled
//! defaults below.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use iscc_common::config::{default_config_path, default_data_dir, default_workers, UnitBits};
use serde::Deserialize;
use tracing::info;

/// Default config file name under the platform config dir
pub const CONFIG_FILE_NAME: &str = "iscc-api.toml";

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Command-line arguments for iscc-api
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "iscc-api")]
#[command(about = "Composite ISCC identifier service")]
#[command(version)]
pub struct CliArgs {
    /// Address to bind
    #[arg(long, env = "ISCC_HOST")]
    pub host: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long, env = "ISCC_PORT")]
    pub port: Option<u16>,

    /// Directory for thumbnails
    #[arg(long = "path", env = "ISCC_DIR")]
    pub thumbnail_dir: Option<PathBuf>,

    /// Storage service URL (records are not stored when unset)
    #[arg(long = "db", env = "ISCC_STORAGE_URL")]
    pub storage_url: Option<String>,

    /// Registry URL used for digest lookups (deduplication disabled when unset)
    #[arg(long = "registry", env = "ISCC_REGISTRY_URL")]
    pub registry_url: Option<String>,

    /// Notification service URL (no notification when unset)
    #[arg(long = "notify", env = "ISCC_NOTIFY_URL")]
    pub notify_url: Option<String>,

    /// Maximum concurrent unit computations across all requests
    #[arg(long, env = "ISCC_WORKERS")]
    pub workers: Option<usize>,

    /// Per-request deadline for the unit fan-out, in seconds
    #[arg(long, env = "ISCC_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// TOML config file
    #[arg(long, env = "ISCC_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Optional settings read from the TOML file
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub host: Option<IpAddr>,
    pub port: Option<u16>,
    pub thumbnail_dir: Option<PathBuf>,
    pub storage_url: Option<String>,
    pub registry_url: Option<String>,
    pub notify_url: Option<String>,
    pub workers: Option<usize>,
    pub timeout_secs: Option<u64>,
    /// Timeout for calls to the external services
    pub http_timeout_secs: Option<u64>,
    pub bits: UnitBits,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub thumbnail_dir: PathBuf,
    pub storage_url: Option<String>,
    pub registry_url: Option<String>,
    pub notify_url: Option<String>,
    pub workers: usize,
    pub compute_timeout: Duration,
    pub http_timeout: Duration,
    pub bits: UnitBits,
}

impl ServiceConfig {
    /// Merge CLI/ENV values over the TOML file over defaults
    pub fn resolve(args: CliArgs, file: FileConfig) -> Self {
        let host = args
            .host
            .or(file.host)
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let port = args.port.or(file.port).unwrap_or(DEFAULT_PORT);

        let thumbnail_dir = args
            .thumbnail_dir
            .or(file.thumbnail_dir)
            .unwrap_or_else(|| default_data_dir().join("thumbnails"));

        Self {
            bind: SocketAddr::new(host, port),
            thumbnail_dir,
            storage_url: non_empty(args.storage_url.or(file.storage_url)),
            registry_url: non_empty(args.registry_url.or(file.registry_url)),
            notify_url: non_empty(args.notify_url.or(file.notify_url)),
            workers: args
                .workers
                .or(file.workers)
                .unwrap_or_else(default_workers)
                .max(1),
            compute_timeout: Duration::from_secs(
                args.timeout_secs
                    .or(file.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            http_timeout: Duration::from_secs(
                file.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
            bits: file.bits,
        }
    }

    /// Parse process arguments and load the TOML file they point at
    pub fn load() -> Self {
        let args = CliArgs::parse();
        let path = args
            .config
            .clone()
            .unwrap_or_else(|| default_config_path(CONFIG_FILE_NAME));
        let file: FileConfig = iscc_common::config::load_toml_or_default(&path);

        let config = Self::resolve(args, file);
        info!(
            bind = %config.bind,
            thumbnails = %config.thumbnail_dir.display(),
            workers = config.workers,
            registry = config.registry_url.is_some(),
            storage = config.storage_url.is_some(),
            notify = config.notify_url.is_some(),
            "Configuration resolved"
        );
        config
    }
}

/// Treat an empty URL setting as unset
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = ServiceConfig::resolve(CliArgs::default(), FileConfig::default());

        assert_eq!(config.bind.port(), DEFAULT_PORT);
        assert!(config.bind.ip().is_loopback());
        assert!(config.registry_url.is_none());
        assert!(config.workers >= 1);
        assert_eq!(config.compute_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.bits, UnitBits::default());
        assert!(config.thumbnail_dir.ends_with("thumbnails"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let args = CliArgs {
            port: Some(9100),
            registry_url: Some("http://cli-registry".to_string()),
            ..Default::default()
        };
        let file = FileConfig {
            port: Some(9200),
            registry_url: Some("http://file-registry".to_string()),
            storage_url: Some("http://file-storage".to_string()),
            ..Default::default()
        };

        let config = ServiceConfig::resolve(args, file);
        assert_eq!(config.bind.port(), 9100);
        assert_eq!(config.registry_url.as_deref(), Some("http://cli-registry"));
        assert_eq!(config.storage_url.as_deref(), Some("http://file-storage"));
    }

    #[test]
    fn test_empty_url_counts_as_unset() {
        let args = CliArgs {
            notify_url: Some("  ".to_string()),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(args, FileConfig::default());
        assert!(config.notify_url.is_none());
    }

    #[test]
    fn test_file_config_parses_bits_table() {
        let file: FileConfig = toml::from_str(
            r#"
            port = 8123
            workers = 2
            [bits]
            content = 128
            "#,
        )
        .unwrap();

        assert_eq!(file.port, Some(8123));
        assert_eq!(file.workers, Some(2));
        assert_eq!(file.bits.content, 128);
        assert_eq!(file.bits.instance, 64);
    }

    #[test]
    fn test_zero_workers_clamped() {
        let args = CliArgs {
            workers: Some(0),
            ..Default::default()
        };
        assert_eq!(ServiceConfig::resolve(args, FileConfig::default()).workers, 1);
    }
}
