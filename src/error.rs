//! Error types for pipeline configuration.
//!
//! This module contains the error type returned by configuration
//! constructors and builders.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and
//! actionable.
//!
//! # Example
//!
//! ```rust
//! use jsonapi_pipeline::{ApiBasePath, ConfigError};
//!
//! let result = ApiBasePath::new("no-leading-slash");
//! assert!(matches!(result, Err(ConfigError::InvalidBasePath { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur while configuring the pipeline.
///
/// Each variant provides a clear, actionable error message. Configuration
/// errors are deployment problems, not request problems: they should be
/// surfaced at startup rather than per request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The API base path is not a valid path prefix.
    #[error("Invalid API base path '{path}'. Expected an absolute path without a trailing slash (e.g., '/api/v1').")]
    InvalidBasePath {
        /// The invalid path that was provided.
        path: String,
    },

    /// A page size of zero was supplied.
    #[error("Page size cannot be zero. Provide a positive page size.")]
    ZeroPageSize,

    /// A resource limit of zero was supplied.
    #[error("The per-document resource limit cannot be zero.")]
    ZeroResourceLimit,

    /// A required field is missing from a builder.
    #[error("Missing required field: '{field}'. This field must be set before building.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}
