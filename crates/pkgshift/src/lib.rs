//! pkgshift - phased package reorganization for Java source trees.
//!
//! This crate provides the CLI binary for pkgshift.
//!
//! ## Modules
//!
//! - `cli` - Command implementations (run, check, scan, phases)
//! - `report` - Human-readable console output

pub mod cli;
pub mod report;

// Re-export core types for convenience
pub use pkgshift_core::error::{OutputErrorCode, ShiftError, ShiftResult};
pub use pkgshift_core::output::{ErrorInfo, ErrorResponse, SCHEMA_VERSION};
pub use pkgshift_core::plan::{Phase, Plan};
