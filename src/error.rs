//! Error types for SBS configuration and host-side reply decoding.
//!
//! The slave-side protocol engine never fails: unknown commands produce an
//! empty frame. These errors come from loading a pack configuration or from
//! checking a reply the way a host would.

use thiserror::Error;

/// Result type alias for SBS operations.
pub type Result<T> = std::result::Result<T, SbsError>;

/// Error types for smart battery emulation.
#[derive(Error, Debug)]
pub enum SbsError {
    /// The device returned no bytes (command not implemented)
    #[error("Empty response")]
    EmptyResponse,

    /// Reply checksum did not match the frame contents
    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch {
        /// Checksum computed over the received frame
        expected: u8,
        /// Checksum byte found on the wire
        actual: u8,
    },

    /// Block length byte disagrees with the number of bytes received
    #[error("Length mismatch: declared {declared} bytes, {available} available")]
    LengthMismatch {
        /// Length announced by the device
        declared: usize,
        /// Payload bytes actually present
        available: usize,
    },

    /// Response didn't match expected format
    #[error("Invalid response: expected {expected}, got {actual}")]
    InvalidResponse {
        /// Expected response format
        expected: String,
        /// Actual response received
        actual: String,
    },

    /// Identity string does not fit in a reply
    #[error("{field} is {length} bytes (max 20)")]
    StringTooLong {
        /// Configuration field name
        field: &'static str,
        /// Length of the offending string
        length: usize,
    },

    /// Value outside the 4-bit error code range
    #[error("Invalid error code: {0:#04x}")]
    InvalidErrorCode(u8),

    /// Pack configuration is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
