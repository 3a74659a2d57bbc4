//! Error types for redcat.

use thiserror::Error;

/// The main error type for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The target configuration cannot produce a catalog.
    ///
    /// Raised before any statement is sent to the database.
    #[error("Compilation Error: {0}")]
    Config(String),

    /// Failed to parse a relation name.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement failed, or its result could not be decoded.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Config file could not be decoded.
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Error raised when a result set lacks a column the decoder needs.
    pub fn missing_column(statement: &str, column: &str) -> Self {
        Self::Execution(format!(
            "{} result is missing column '{}'",
            statement, column
        ))
    }

    /// True for configuration errors, which are raised before any query runs.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Toml(_))
    }
}

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
