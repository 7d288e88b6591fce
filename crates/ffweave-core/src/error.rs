//! Unified error type for ffweave.
//!
//! Every structural problem is reported when an object is constructed or
//! mutated. Rendering (`to_tokens`, `Display`) never fails, so the variants
//! here only ever come out of builders, job loading and configuration.

use std::fmt;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building commands, loading jobs or reading config.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed option argument, malformed stream list, or a value handed
    /// to an API that only accepts filters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A stream specifier was pointed at something that is neither an input
    /// nor a filter chain.
    #[error("invalid entity: {0}")]
    InvalidEntity(String),

    /// A stream specifier could not be resolved against its owner.
    #[error("cannot resolve stream specifier '{specifier}' against {owner}: {message}")]
    Resolution {
        /// The raw specifier as supplied by the caller.
        specifier: String,
        /// Human-readable description of the owning entity.
        owner: String,
        /// Why resolution failed.
        message: String,
    },

    /// An entity was built without a field it cannot live without.
    #[error("{entity} requires a non-empty {field}")]
    RequiredFieldMissing {
        /// The kind of entity (e.g. "output", "input").
        entity: String,
        /// The missing field.
        field: String,
    },

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A job description was not valid JSON for its schema.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying serde_json error.
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// Convenience constructor for [`Error::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Convenience constructor for [`Error::InvalidEntity`].
    pub fn invalid_entity(message: impl Into<String>) -> Self {
        Error::InvalidEntity(message.into())
    }

    /// Convenience constructor for [`Error::Resolution`].
    pub fn resolution(
        specifier: impl fmt::Display,
        owner: impl fmt::Display,
        message: impl Into<String>,
    ) -> Self {
        Error::Resolution {
            specifier: specifier.to_string(),
            owner: owner.to_string(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::RequiredFieldMissing`].
    pub fn missing(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Error::RequiredFieldMissing {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::InvalidEntity(_) => "InvalidEntity",
            Error::Resolution { .. } => "ResolutionError",
            Error::RequiredFieldMissing { .. } => "RequiredFieldMissing",
            Error::Config(_) => "Config",
            Error::Io { .. } => "Io",
            Error::Json { .. } => "Json",
        }
    }
}
