//! Unified error types for the courseflow pipeline.
//!
//! This module provides a common error type [`CourseflowError`] that can
//! represent errors from any engine (loaders, binning, flow, aggregation,
//! orchestration). Each variant maps to one entry in the error taxonomy
//! (spec §7) and to the HTTP status code the external request-handling
//! layer would use, though that translation itself lives outside this
//! crate.
//!
//! # Example
//!
//! ```ignore
//! use courseflow_core::{CourseflowError, CourseflowResult};
//!
//! fn bin_day(day: &str) -> CourseflowResult<()> {
//!     if day.is_empty() {
//!         return Err(CourseflowError::Config("day tag must not be empty".into()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all courseflow operations.
///
/// Variants `Config`, `Data`, `Budget`, `Reconcile`, and `Timeout`
/// correspond 1:1 to spec §7's taxonomy. `Io` and `Parse` cover the
/// ambient file/serialization failures the taxonomy does not itemize
/// but that the I/O layer still needs to represent.
#[derive(Error, Debug)]
pub enum CourseflowError {
    /// Invalid or missing request fields, unknown events, cross-day flow
    /// pairs, missing required columns in static files. HTTP 422.
    #[error("configuration error: {0}")]
    Config(String),

    /// Per-event file missing, duplicate runner_ids across events,
    /// negative pace, missing segment width. HTTP 422.
    #[error("data error: {0}")]
    Data(String),

    /// Cannot satisfy `max_bins` even after maximal coarsening. HTTP 500.
    #[error("budget error: {0}")]
    Budget(String),

    /// Canonical vs. recomputed density differs more than the
    /// reconciliation threshold. HTTP 500.
    #[error("reconcile error: {0}")]
    Reconcile(String),

    /// Per-day wall-clock ceiling exceeded. HTTP 503.
    #[error("timeout error: {0}")]
    Timeout(String),

    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors (CSV, JSON, YAML).
    #[error("parse error: {0}")]
    Parse(String),
}

/// Convenience type alias for Results using CourseflowError.
pub type CourseflowResult<T> = Result<T, CourseflowError>;

impl CourseflowError {
    /// The error-taxonomy tag used in structured log fields and
    /// `metadata.json` (spec §7).
    pub fn kind(&self) -> &'static str {
        match self {
            CourseflowError::Config(_) => "ConfigError",
            CourseflowError::Data(_) => "DataError",
            CourseflowError::Budget(_) => "BudgetError",
            CourseflowError::Reconcile(_) => "ReconcileError",
            CourseflowError::Timeout(_) => "TimeoutError",
            CourseflowError::Io(_) => "IoError",
            CourseflowError::Parse(_) => "ParseError",
        }
    }

    /// The HTTP status code the (external) request boundary would use
    /// to surface this error, per spec §7.
    pub fn http_status(&self) -> u16 {
        match self {
            CourseflowError::Config(_) | CourseflowError::Data(_) => 422,
            CourseflowError::Budget(_) | CourseflowError::Reconcile(_) => 500,
            CourseflowError::Timeout(_) => 503,
            CourseflowError::Io(_) | CourseflowError::Parse(_) => 500,
        }
    }
}

impl From<anyhow::Error> for CourseflowError {
    fn from(err: anyhow::Error) -> Self {
        CourseflowError::Data(err.to_string())
    }
}

impl From<String> for CourseflowError {
    fn from(s: String) -> Self {
        CourseflowError::Data(s)
    }
}

impl From<&str> for CourseflowError {
    fn from(s: &str) -> Self {
        CourseflowError::Data(s.to_string())
    }
}

impl From<serde_json::Error> for CourseflowError {
    fn from(err: serde_json::Error) -> Self {
        CourseflowError::Parse(err.to_string())
    }
}

impl From<csv::Error> for CourseflowError {
    fn from(err: csv::Error) -> Self {
        CourseflowError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CourseflowError::Data("negative pace".into());
        assert!(err.to_string().contains("data error"));
        assert!(err.to_string().contains("negative pace"));
    }

    #[test]
    fn test_kind_and_status_mapping() {
        assert_eq!(CourseflowError::Config("x".into()).kind(), "ConfigError");
        assert_eq!(CourseflowError::Config("x".into()).http_status(), 422);
        assert_eq!(CourseflowError::Budget("x".into()).http_status(), 500);
        assert_eq!(CourseflowError::Timeout("x".into()).http_status(), 503);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CourseflowError = io_err.into();
        assert!(matches!(err, CourseflowError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> CourseflowResult<()> {
            Err(CourseflowError::Config("test".into()))
        }
        fn outer() -> CourseflowResult<()> {
            inner()?;
            Ok(())
        }
        assert!(outer().is_err());
    }
}
