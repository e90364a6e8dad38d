//! Error types for the runtime.

use norm_core::{CoreError, Dialect, ValueError};

/// Errors surfaced by connections, collections and the configurator.
#[derive(Debug, thiserror::Error)]
pub enum OrmError {
    /// Metadata or SQL synthesis error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Error reported by the database driver.
    #[error("Transport error: {0}")]
    Transport(#[from] sqlx::Error),

    /// A payload, transaction or option does not belong to this dialect or
    /// connection.
    #[error("Provider incompatible: {0}")]
    ProviderIncompatible(String),

    /// A value read from a row could not be assigned to a field.
    #[error("Error setting field '{field}' with value '{value}' (type {value_type})")]
    FieldAssignmentFailed {
        /// Rust field name.
        field: &'static str,
        /// The offending value, rendered.
        value: String,
        /// Kind of the offending value.
        value_type: &'static str,
        /// Underlying conversion error.
        #[source]
        source: ValueError,
    },

    /// The connection is not open.
    #[error("Connection is not open")]
    NotConnected,

    /// The connection configuration cannot produce a connection.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// IO error (starting the connection runtime, reading a config file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl OrmError {
    pub(crate) fn wrong_dialect(expected: Dialect, found: Dialect) -> Self {
        Self::ProviderIncompatible(format!(
            "payload built for {found} cannot run on a {expected} connection"
        ))
    }
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, OrmError>;
