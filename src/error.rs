//! Error types for MARC mapping and editing operations.
//!
//! This module provides the [`MarcError`] type for all library operations
//! and the [`Result`] convenience type.
//!
//! Two families of errors exist side by side. Per-record data problems
//! ([`MarcError::UnresolvedPath`], [`MarcError::ValueConversion`],
//! [`MarcError::Function`], [`MarcError::Script`]) are caught inside the
//! engines, logged, and turned into a skipped rule. [`MarcError::Configuration`]
//! reports caller misuse and is always returned to the caller.

use thiserror::Error;

/// Error type for all MARC library operations.
#[derive(Error, Debug)]
pub enum MarcError {
    /// Error indicating an invalid or malformed MARC record.
    #[error("Invalid MARC record: {0}")]
    InvalidRecord(String),

    /// Error indicating an invalid leader (24-character header).
    #[error("Invalid leader: {0}")]
    InvalidLeader(String),

    /// Error indicating an invalid field structure.
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// A rule document entry is malformed.
    #[error("Invalid rule document: {0}")]
    RuleDocument(String),

    /// A dotted target path names a segment the target shape does not have,
    /// or uses a segment of the wrong kind.
    #[error("Unresolved path '{path}': {reason}")]
    UnresolvedPath {
        /// The full dotted path as written in the rule document
        path: String,
        /// What went wrong while resolving it
        reason: String,
    },

    /// A produced value cannot be converted to the scalar type of its target.
    #[error("Cannot convert '{value}' for '{target}': {reason}")]
    ValueConversion {
        /// The produced text
        value: String,
        /// The target path
        target: String,
        /// What went wrong
        reason: String,
    },

    /// A mapping function is unknown or received bad parameters.
    #[error("Function '{name}' failed: {reason}")]
    Function {
        /// Function name as written in the rule document
        name: String,
        /// What went wrong
        reason: String,
    },

    /// A custom script failed to compile or to evaluate.
    #[error("Script error: {0}")]
    Script(String),

    /// The caller used an engine incorrectly (missing input, wrong record kind).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MarcError {
    /// Returns `true` for errors that indicate caller misuse rather than bad data.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, MarcError::Configuration(_))
    }
}

/// Convenience type alias for [`std::result::Result`] with [`MarcError`].
pub type Result<T> = std::result::Result<T, MarcError>;
