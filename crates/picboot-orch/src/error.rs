//! Error types for the orchestrator.

use picboot_core::BliError;
use thiserror::Error;

use crate::hex::HexError;

/// Errors surfaced by the top-level `identify` / `erase` / `load` / `verify`
/// procedures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    /// `identify` did not observe `device_identified` before its timeout.
    #[error("device identification timed out")]
    IdentificationTimeout,

    /// The bootloader interface rejected a command or hit a fatal
    /// transport error.
    #[error(transparent)]
    Bli(#[from] BliError),

    /// The HEX image oracle rejected an address.
    #[error(transparent)]
    Hex(#[from] HexError),
}
