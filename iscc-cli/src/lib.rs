//! iscc-cli library interface
//!
//! Batch engine: walker, scheduler, progress and result markers.

pub mod config;
pub mod error;
pub mod marker;
pub mod progress;
pub mod scheduler;
pub mod walker;

pub use error::{BatchItemError, ScanError};
pub use progress::{progress_bar, render, ProgressSnapshot, ProgressState};
pub use scheduler::{identify_file, run_batch, run_folder, BatchConfig, BatchSummary};
pub use walker::{walk, BatchWalker, BatchWorkItem};
