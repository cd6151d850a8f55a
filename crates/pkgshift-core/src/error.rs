//! Error types and exit code mapping for pkgshift.
//!
//! `ShiftError` is the single error type surfaced by the engine. Missing
//! source files are *not* errors: they are reported as `not_found`
//! outcomes and processing continues. Everything in this enum either
//! rejects a plan before any file is touched, or aborts a pass.
//!
//! ## Exit Codes
//!
//! - `2`: Invalid arguments or an invalid plan
//! - `3`: Run completed but some entries were skipped (`--strict` only)
//! - `4`: Apply errors (a source could not be read or a destination written)
//! - `10`: Internal errors

use std::fmt;
use std::io;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable numeric codes used for exit status and JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Bad input from the caller: flags, plan file, rule table.
    InvalidArguments = 2,
    /// The run finished but left entries unprocessed.
    Incomplete = 3,
    /// Reading a source or writing a destination failed.
    ApplyError = 4,
    /// Bugs, unexpected state.
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Error type for every fallible engine operation.
#[derive(Debug, Error)]
pub enum ShiftError {
    /// Invalid arguments from the caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// The plan file could not be read, parsed, or failed validation.
    #[error("invalid plan: {message}")]
    InvalidPlan { message: String },

    /// A manifest path would escape the tree root.
    #[error("unsafe path '{path}': {reason}")]
    UnsafePath { path: String, reason: String },

    /// A source file exists but could not be read as text.
    #[error("failed to read {path}: {source}")]
    ReadFailure {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A destination could not be created or written.
    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A pass stopped at `entry` because of `source`.
    #[error("phase '{phase}' aborted at {entry}: {source}")]
    Aborted {
        phase: String,
        entry: String,
        #[source]
        source: Box<ShiftError>,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl From<&ShiftError> for OutputErrorCode {
    fn from(err: &ShiftError) -> Self {
        match err {
            ShiftError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            ShiftError::InvalidPlan { .. } => OutputErrorCode::InvalidArguments,
            ShiftError::UnsafePath { .. } => OutputErrorCode::InvalidArguments,
            ShiftError::ReadFailure { .. } => OutputErrorCode::ApplyError,
            ShiftError::WriteFailure { .. } => OutputErrorCode::ApplyError,
            ShiftError::Aborted { source, .. } => OutputErrorCode::from(source.as_ref()),
            ShiftError::Internal { .. } => OutputErrorCode::InternalError,
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl ShiftError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        ShiftError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an invalid plan error.
    pub fn invalid_plan(message: impl Into<String>) -> Self {
        ShiftError::InvalidPlan {
            message: message.into(),
        }
    }

    /// Create an unsafe path error.
    pub fn unsafe_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ShiftError::UnsafePath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ShiftError::Internal {
            message: message.into(),
        }
    }

    /// Wrap an entry-level failure with the phase and entry it happened in.
    pub fn aborted(phase: impl Into<String>, entry: impl Into<String>, source: ShiftError) -> Self {
        ShiftError::Aborted {
            phase: phase.into(),
            entry: entry.into(),
            source: Box::new(source),
        }
    }

    /// The path a read/write failure refers to, looking through `Aborted`.
    pub fn failed_path(&self) -> Option<&str> {
        match self {
            ShiftError::ReadFailure { path, .. } | ShiftError::WriteFailure { path, .. } => {
                Some(path)
            }
            ShiftError::UnsafePath { path, .. } => Some(path),
            ShiftError::Aborted { source, .. } => source.failed_path(),
            _ => None,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

pub type ShiftResult<T> = Result<T, ShiftError>;

// ============================================================================
// Tests
// ============================================================================
