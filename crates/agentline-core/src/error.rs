//! Error types for Agentline Core

use thiserror::Error;

/// Result type alias using Agentline Error
pub type Result<T> = std::result::Result<T, Error>;

/// Agentline error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport-specific errors
///
/// Every variant is collapsed into a single failed turn by the session
/// controller; the detail only reaches the logs.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP error: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response body: {0}")]
    Decode(String),
}
