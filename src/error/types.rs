//! Error types
//!
//! Domain-specific error types for the data channel and server startup.
//! Command handlers translate these into protocol replies; they never
//! escape the dispatch loop.

use std::fmt;
use std::io;

/// Data channel errors, each mapping to a distinct protocol reply.
#[derive(Debug)]
pub enum DataChannelError {
    /// The ephemeral-port listener could not be bound (reply 421)
    Bind(io::Error),
    /// Local address introspection on a socket failed (reply 421)
    Query(io::Error),
    /// No passive listener is open, so there is nothing to accept on
    NotListening,
    /// No peer connected within the accept window (reply 425)
    AcceptTimeout,
    /// Accepting the data connection failed (reply 426)
    Accept(io::Error),
}

impl fmt::Display for DataChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataChannelError::Bind(e) => write!(f, "failed to bind passive listener: {}", e),
            DataChannelError::Query(e) => write!(f, "failed to query socket address: {}", e),
            DataChannelError::NotListening => write!(f, "no passive listener open"),
            DataChannelError::AcceptTimeout => write!(f, "timed out waiting for data connection"),
            DataChannelError::Accept(e) => write!(f, "failed to accept data connection: {}", e),
        }
    }
}

impl std::error::Error for DataChannelError {}

/// Server startup errors.
#[derive(Debug)]
pub enum ServerError {
    /// The control listener could not be bound to the requested address
    Bind { addr: String, source: io::Error },
    /// The configured server root does not resolve to a directory
    InvalidRoot { path: String, source: io::Error },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Bind { addr, source } => {
                write!(f, "failed to bind control socket {}: {}", addr, source)
            }
            ServerError::InvalidRoot { path, source } => {
                write!(f, "invalid server root {}: {}", path, source)
            }
        }
    }
}

impl std::error::Error for ServerError {}
