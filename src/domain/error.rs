//! Error types for editor sessions.
//!
//! This module defines the centralized error type [`SessionError`], the
//! engine-level failure [`EngineError`], and a [`Result`] alias used throughout
//! the crate. All errors are implemented using the `thiserror` crate.

use thiserror::Error;

/// A failure reported by a modeling engine.
///
/// Engines report failures through completion callbacks and the `error` event.
/// The type is cloneable so one failure can be routed both to the caller that
/// requested an operation and to the host's error log.
///
/// # Examples
///
/// ```
/// use modeler_session::EngineError;
///
/// let error = EngineError::new("unparsable content");
/// assert_eq!(error.to_string(), "unparsable content");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    /// Human-readable description of what went wrong.
    pub message: String,
}

impl EngineError {
    /// Creates an engine error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The main error type for editor session operations.
///
/// Nothing in this crate is fatal to the process. The worst outcome of any
/// variant is a single session falling back to its source view.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The engine could not import the document source.
    ///
    /// The session stays usable: the fallback sheet is opened and the host is
    /// asked to show the import error dialog.
    #[error("Import error: {0}")]
    Import(EngineError),

    /// Exporting the document source or an image failed.
    ///
    /// Returned to the caller that requested the export and routed to the
    /// host's error hook.
    #[error("Export error: {0}")]
    Export(EngineError),

    /// The engine raised an error outside an explicit call.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// A sheet id could not be resolved against the current sheets.
    #[error("Unknown sheet: {0}")]
    UnknownSheet(String),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A TOML configuration file could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization or parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for editor session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
