//! Error types for the framing layer.

use thiserror::Error;

/// Errors surfaced by a [`crate::Transport`] implementation.
///
/// These are fatal to the session: the pump has no retry policy for a
/// transport that cannot be written to or read from.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport failed to accept a write.
    #[error("transport write failed: {0}")]
    Write(String),

    /// The transport failed to service a read.
    #[error("transport read failed: {0}")]
    Read(String),
}

/// Errors raised by [`crate::Frame`] encoding.
///
/// Decode-time corruption (bad checksum, truncated frame) is handled inside
/// [`crate::Framer::poll`] by logging and dropping — it never reaches the
/// caller as an error, per the protocol's error policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The payload given to `encode_and_send` was outside `1..=65535`
    /// bytes.
    #[error("payload length {0} is outside the allowed range 1..=65535")]
    InvalidPayloadLength(usize),
}

/// Errors from [`crate::Framer::encode_and_send`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The payload itself was invalid.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The transport rejected the write.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
