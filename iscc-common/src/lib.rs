//! # ISCC Common Library
//!
//! Shared code for the ISCC service and batch tool including:
//! - Byte sources and content digests
//! - Unit codes and their default computations
//! - Code encoding, composition and decomposition
//! - The bounded fan-out pool used to compute the three units of one asset
//! - Configuration loading and the common error type

pub mod codec;
pub mod compose;
pub mod config;
pub mod error;
pub mod fanout;
pub mod metadata;
pub mod source;
pub mod units;

pub use compose::{compose, CompositeIdentifier, UnitTriple};
pub use error::{Error, Result};
pub use fanout::UnitPool;
pub use metadata::{IsccMetadata, UnitSummary};
pub use source::{ByteSource, ContentDigest};
pub use units::{compute_unit, ComputationError, StandardUnits, UnitCode, UnitComputer, UnitKind};
