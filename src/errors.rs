/*!
 * Error types for the captionlex library.
 *
 * This module contains custom error types for the different collaborators
 * of the annotation engine, using the thiserror crate for ergonomic error
 * definitions. Most of these never reach a caller: the gateway, the
 * translation service and the pipeline absorb them at their boundary.
 */

use thiserror::Error;

use crate::surface::NodeId;

/// Errors that can occur when talking to a translation provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Errors raised by a dictionary store backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// The hosting context has been unloaded
    #[error("Execution context invalidated")]
    ContextInvalidated,

    /// The backend failed to read or write
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// A persisted value could not be (de)serialized
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Backend(error.to_string())
    }
}

/// Errors raised by a caption surface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The node id does not belong to this surface
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    /// The node was removed from the tree by the host
    #[error("Node {0} is detached")]
    Detached(NodeId),

    /// The operation needs an element but got a text node
    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    /// A selector could not be parsed
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// The offending selector text
        selector: String,
        /// What went wrong
        reason: String,
    },

    /// A mount point never appeared
    #[error("Timed out waiting for '{0}'")]
    MountTimeout(String),
}

/// Errors that abort a single annotation pass
#[derive(Error, Debug)]
pub enum AnnotationError {
    /// Error while rewriting caption nodes
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a configuration or file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the dictionary store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from the caption surface
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
