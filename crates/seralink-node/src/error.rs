//! Error types for the demo node.

use seralink_protocol::SecureError;

/// Errors that can occur while loading configuration or running the demo.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid key material in [security].{field}: expected {expected} hex characters")]
    InvalidKey {
        field: &'static str,
        expected: usize,
    },
    #[error("send error: {0}")]
    Send(#[from] SecureError),
}
