//! iscc - batch and single-file identifier tool
//!
//! Exit status is 1 only when the folder or file argument is unusable;
//! individual batch failures are logged and the run still succeeds.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressDrawTarget;
use iscc_common::codec::decompose;
use iscc_common::config::{default_config_path, load_toml_or_default};
use iscc_common::{UnitPool, UnitSummary};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iscc_cli::config::{resolve, FileConfig, Overrides, CONFIG_FILE_NAME};
use iscc_cli::{identify_file, progress_bar, render, run_batch, walk, BatchWorkItem};

/// Command-line arguments for iscc
#[derive(Parser, Debug)]
#[command(name = "iscc")]
#[command(about = "Compute composite ISCC identifiers for files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Content unit length in bits
    #[arg(long, global = true, env = "ISCC_CONTENT_BITS")]
    content_bits: Option<u32>,

    /// Data unit length in bits
    #[arg(long, global = true, env = "ISCC_DATA_BITS")]
    data_bits: Option<u32>,

    /// Instance unit length in bits
    #[arg(long, global = true, env = "ISCC_INSTANCE_BITS")]
    instance_bits: Option<u32>,

    /// TOML config file
    #[arg(long, global = true, env = "ISCC_CLI_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process every unprocessed file below a folder
    Batch {
        folder: PathBuf,

        /// Files processed in parallel
        #[arg(short, long, env = "ISCC_WORKERS")]
        workers: Option<usize>,

        /// Fail files larger than this many bytes without reading them
        #[arg(long, env = "ISCC_MAX_FILE_BYTES")]
        max_file_bytes: Option<u64>,
    },
    /// Print the metadata of one file
    Create { file: PathBuf },
    /// Decompose a code into its units
    Explain { code: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iscc_cli=info,iscc_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let (workers, max_file_bytes) = match &cli.command {
        Command::Batch {
            workers,
            max_file_bytes,
            ..
        } => (*workers, *max_file_bytes),
        _ => (None, None),
    };
    let overrides = Overrides {
        workers,
        max_file_bytes,
        content_bits: cli.content_bits,
        data_bits: cli.data_bits,
        instance_bits: cli.instance_bits,
        config: cli.config.clone(),
    };
    let path = overrides
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(CONFIG_FILE_NAME));
    let file: FileConfig = load_toml_or_default(&path);
    let config = resolve(&overrides, file);
    config.bits.validate().context("Invalid unit bit configuration")?;

    match cli.command {
        Command::Batch { folder, .. } => {
            let items: Vec<BatchWorkItem> = match walk(&folder) {
                Ok(walker) => walker.collect(),
                Err(e) => {
                    error!(error = %e, "Invalid folder");
                    eprintln!("Invalid folder: {}", e);
                    return Ok(ExitCode::from(1));
                }
            };
            let total_bytes: u64 = items.iter().map(|item| item.size).sum();
            info!(
                folder = %folder.display(),
                files = items.len(),
                bytes = total_bytes,
                workers = config.workers,
                "Starting batch"
            );

            let bar = progress_bar(total_bytes, ProgressDrawTarget::stderr());
            let summary = run_batch(items, config, |_, snapshot| render(&bar, snapshot)).await;
            bar.finish();

            println!(
                "Processed {} files ({} bytes): {} succeeded, {} failed",
                summary.total_files,
                summary.total_bytes,
                summary.succeeded,
                summary.failed()
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Create { file } => {
            if !file.is_file() {
                eprintln!("Invalid file: {}", file.display());
                return Ok(ExitCode::from(1));
            }
            let pool = UnitPool::standard(config.workers, config.bits);
            let metadata = identify_file(&pool, &file)
                .await
                .with_context(|| format!("Failed to identify {}", file.display()))?;
            println!("{}", metadata.to_json_pretty()?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Explain { code } => match decompose(&code) {
            Ok(units) => {
                let summaries: Vec<UnitSummary> = units.iter().map(UnitSummary::from).collect();
                println!("{}", serde_json::to_string_pretty(&summaries)?);
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("Invalid code: {}", e);
                Ok(ExitCode::from(1))
            }
        },
    }
}
