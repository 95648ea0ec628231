//! # Pbiux
//!
//! A Power BI Desktop companion that generates HTML/CSS styled DAX measures.
//!
//! Pbiux attaches to the local analytics-server process behind Power BI
//! Desktop, scans the tabular model schema, and renders DAX expressions that
//! embed HTML/CSS markup for the "HTML Content" visual. Generated measures
//! can optionally be written back into the live model through the tabular
//! write session.
//!
//! ## Features
//!
//! - Automatic discovery of the local analytics-server port
//! - Ranked search for the native query and write client libraries
//! - Schema scan (tables, columns, measures) over the query connection
//! - Four visual components rendered from a shared template representation
//! - Measure write-back with assignment-style expression stripping
//! - MCP server integration for IDE/agent interoperability
//!
//! ## Example
//!
//! ```rust,ignore
//! use pbiux::{PbiuxConfig, VisualService};
//!
//! let mut service = VisualService::new(PbiuxConfig::load());
//! let schema = service.connect_and_scan_schema()?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod connector;
pub mod mcp;
pub mod models;
pub mod observability;
pub mod rendering;
pub mod services;

// Re-exports for convenience
pub use config::PbiuxConfig;
pub use connector::PowerBiConnector;
pub use models::{ModelSchema, TableInfo};
pub use rendering::{ComponentKind, FormatKind, Theme};
pub use services::VisualService;

/// Error type for pbiux operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `ProcessNotFound` | No analytics-server process with a loopback listener exists |
/// | `LibraryLoad` | A native client library cannot be resolved or loaded |
/// | `Connection` | Opening or using the query/write session fails (wraps the cause) |
/// | `InvalidInput` | Caller supplied an unresolvable table, component, or theme name |
/// | `OperationFailed` | I/O errors, commit failures, malformed bridge payloads |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The host analytics-server process is not running.
    ///
    /// Raised when process enumeration finds no executable matching the
    /// server name with a listening loopback socket.
    #[error("analytics server not found: {0}")]
    ProcessNotFound(String),

    /// A native client library could not be resolved or loaded.
    ///
    /// Raised when:
    /// - No provider in the ranked search yields an existing path
    /// - The dynamic loader rejects the resolved library
    /// - A required symbol is missing from the loaded library
    #[error("failed to load client library '{library}': {cause}")]
    LibraryLoad {
        /// The library that failed to load.
        library: String,
        /// The underlying cause.
        cause: String,
    },

    /// Opening or using a query/write session failed.
    ///
    /// All connect-path failures (locator, loader, native open) surface as
    /// this one kind; the original cause is preserved in the message.
    #[error("connection failed: {cause}")]
    Connection {
        /// The underlying cause.
        cause: String,
    },

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A table name cannot be resolved in the write-side model
    /// - An unknown component type or theme name is requested
    /// - JSON deserialization fails in MCP tool handlers
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Filesystem I/O errors occur (preview files, config files)
    /// - A model commit is rejected by the underlying store
    /// - The native bridge returns a malformed payload
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Wraps any displayable cause as an [`Error::Connection`].
    pub fn connection(cause: impl std::fmt::Display) -> Self {
        Self::Connection {
            cause: cause.to_string(),
        }
    }

    /// Builds an [`Error::OperationFailed`] for the named operation.
    pub fn operation(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for pbiux operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::Connection {
            cause: "refused".to_string(),
        };
        assert_eq!(err.to_string(), "connection failed: refused");

        let err = Error::operation("commit", "model is read-only");
        assert_eq!(
            err.to_string(),
            "operation 'commit' failed: model is read-only"
        );
    }

    #[test]
    fn test_connection_wraps_cause() {
        let inner = Error::ProcessNotFound("no msmdsrv running".to_string());
        let err = Error::connection(&inner);
        assert!(err.to_string().contains("no msmdsrv running"));
    }
}
