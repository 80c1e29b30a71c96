//! Error types for the bootloader interface.

use picboot_wire::TransportError;
use thiserror::Error;

/// Errors surfaced to a direct caller of [`crate::BootloaderInterface`].
///
/// Transport errors are fatal to the session (see the pump's failure
/// policy); the others are raised to the immediate caller and do not tear
/// anything down.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BliError {
    /// A write/read/write_max call was made before identification
    /// completed.
    #[error("device identification has not completed")]
    ProfileIncomplete,

    /// A caller-supplied argument failed validation (wrong row width, odd
    /// word address, oversized `write_max`).
    #[error("invalid argument: {0}")]
    ArgumentError(String),

    /// The transport failed; the pump has stopped and the session is over.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
