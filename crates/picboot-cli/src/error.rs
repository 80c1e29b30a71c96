//! Top-level CLI error type; each variant maps to one of the process exit
//! codes documented on [`crate::cli::Args`].

use picboot_orch::OrchestratorError;
use thiserror::Error;

/// Errors that can terminate the CLI before a clean, orchestrated exit.
#[derive(Debug, Error)]
pub enum CliError {
    /// The HEX file could not be read from disk.
    #[error("failed to read hex file {path}: {source}")]
    HexFileIo {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The HEX file's contents could not be parsed.
    #[error("failed to parse intel hex: {0}")]
    HexParse(String),

    /// The serial port could not be opened.
    #[error("failed to open serial port: {0}")]
    Serial(#[from] serialport::Error),

    /// An orchestrator procedure failed.
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    /// Verification completed but found disagreements against the HEX image.
    #[error("verification found {0} mismatch(es)")]
    VerificationFailed(usize),
}

impl CliError {
    /// Process exit code for this failure: 2 for identification/transport
    /// failures, 1 for everything else (a requested phase failed on its
    /// own terms).
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Orchestrator(OrchestratorError::IdentificationTimeout | OrchestratorError::Bli(_)) => 2,
            Self::VerificationFailed(_) => 1,
            _ => 1,
        }
    }
}
