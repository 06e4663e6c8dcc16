//! Decode errors.

use thiserror::Error;

/// A raw buffer that could not be turned into a [`Message`](crate::Message).
///
/// Malformed hardware input is expected: callers drop the buffer and keep
/// going rather than treating this as fatal.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty MIDI buffer")]
    Empty,

    #[error("truncated MIDI message: status {status:#04X} needs {expected} bytes, got {actual}")]
    TruncatedMessage {
        status: u8,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
