//! Error types for live replay tailing.
//!
//! All errors implement `std::error::Error` and carry enough context (byte offsets, tags,
//! frame indices) to locate the offending record in the replay file.
//!
//! ## Error Categories
//!
//! - **File Errors**: the replay file could not be read
//! - **Header Errors**: the payload-size header is malformed
//! - **Protocol Errors**: a record could not be framed or decoded
//! - **Stream Errors**: the file shrank underneath the cursor
//!
//! Soft terminations (game end, an unexpected top-level event) are not errors; they are
//! reported through [`StopReason`](crate::StopReason).
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use slippi_live::LiveError;
//!
//! let error = LiveError::malformed_header("first record is not the payload table");
//! assert!(!error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::slp::DecodeError;

/// Result type alias for live tailing operations.
pub type Result<T, E = LiveError> = std::result::Result<T, E>;

/// Main error type for live tailing.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LiveError {
    #[error("Replay file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed replay header: {details}")]
    MalformedHeader { details: String },

    #[error("Event tag {tag:#04x} at offset {offset:#x} is missing from the payload size table")]
    UnknownEventTag { tag: u8, offset: usize },

    #[error("Failed to decode record at offset {offset:#x}")]
    Decode {
        offset: usize,
        #[source]
        source: DecodeError,
    },

    #[error("Frame {frame} carries unrecognized payload kind {tag:#04x}")]
    UnknownPayloadVariant { tag: u8, frame: i32 },

    #[error("Frame {frame} references port {port}, expected 0-3")]
    InvalidPort { port: u8, frame: i32 },

    #[error("Replay file shrank to {len} bytes, behind the stream cursor at {cursor}")]
    StreamTruncated { cursor: usize, len: usize },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Invalid configuration: {details}")]
    Config { details: String },
}

impl LiveError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// A failed session is never resumed in place; this tells the caller whether starting a
    /// fresh session against the same file is worth attempting.
    pub fn is_retryable(&self) -> bool {
        match self {
            LiveError::File { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            LiveError::Timeout { .. } => true,
            LiveError::MalformedHeader { .. } => false,
            LiveError::UnknownEventTag { .. } => false,
            LiveError::Decode { .. } => false,
            LiveError::UnknownPayloadVariant { .. } => false,
            LiveError::InvalidPort { .. } => false,
            LiveError::StreamTruncated { .. } => false,
            LiveError::Config { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            LiveError::File { .. } => vec![
                "Check the replay file exists and is readable",
                "Verify the replay directory configured in Slippi",
                "Check file permissions",
            ],
            LiveError::MalformedHeader { .. } => vec![
                "Verify the file is a Slippi replay (.slp)",
                "Wait for the game to write its header before starting",
            ],
            LiveError::UnknownEventTag { .. } | LiveError::Decode { .. } => vec![
                "Verify the replay was produced by a supported Slippi version",
                "Check the file is not being written by more than one process",
            ],
            LiveError::UnknownPayloadVariant { .. } => vec![
                "Use a decoder that understands this Slippi version",
                "Check the decoder maps frame records to pre or post data",
            ],
            LiveError::InvalidPort { .. } => vec![
                "Verify source data integrity",
                "Check the decoder reads the port byte at the right offset",
            ],
            LiveError::StreamTruncated { .. } => vec![
                "Do not tail a replay that is being rewritten",
                "Start a new session once the game has restarted",
            ],
            LiveError::Timeout { .. } => vec![
                "Increase the bootstrap timeout",
                "Verify the game is recording the replay",
            ],
            LiveError::Config { .. } => vec![
                "Check configuration values are positive",
                "Ensure the maximum poll interval is not below the poll interval",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        LiveError::File { path, source }
    }

    /// Helper constructor for header errors.
    pub fn malformed_header(details: impl Into<String>) -> Self {
        LiveError::MalformedHeader { details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        LiveError::Config { details: details.into() }
    }
}

impl From<std::io::Error> for LiveError {
    fn from(err: std::io::Error) -> Self {
        LiveError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}
