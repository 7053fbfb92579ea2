//! Error handling utilities shared across the crate.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = NerconvError> = std::result::Result<T, E>;

/// Domain-specific error describing failures during configuration, IO, or corpus conversion.
///
/// `PathDerivation` and `MalformedLine` are recoverable: the conversion driver counts them in
/// [`crate::report::Diagnostics`] and keeps going unless strict validation is enabled.
#[derive(Debug, Error)]
pub enum NerconvError {
    /// Conversion configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A document-id list could not be read.
    #[error("unable to read document list {path:?}: {source}")]
    ListFile {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// List file that failed to load.
        path: PathBuf,
    },
    /// A corpus path does not contain the anchor used to derive document ids.
    #[error("path {path:?} does not contain anchor {anchor:?}; corpus layout appears invalid")]
    PathDerivation {
        /// Offending corpus file.
        path: PathBuf,
        /// Anchor that was searched for.
        anchor: String,
    },
    /// An annotation line could not be interpreted.
    #[error("{}line {line}: {reason}", location(.path.as_deref()))]
    MalformedLine {
        /// File containing the line, if known.
        path: Option<PathBuf>,
        /// 1-based line number.
        line: usize,
        /// Human readable description of the problem.
        reason: String,
    },
    /// Filesystem IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// Directory traversal failed.
    #[error("corpus traversal failed: {0}")]
    Walk(String),
}

fn location(path: Option<&Path>) -> String {
    path.map(|path| format!("{}: ", path.display()))
        .unwrap_or_default()
}

impl From<walkdir::Error> for NerconvError {
    fn from(err: walkdir::Error) -> Self {
        Self::Walk(err.to_string())
    }
}

impl NerconvError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }

    /// Returns `true` for errors the corpus driver skips and counts instead of aborting on.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PathDerivation { .. } | Self::MalformedLine { .. })
    }
}
