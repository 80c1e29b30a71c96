//! The flash-programming orchestrator: `identify`, `erase`, `load`, and
//! `verify`, each a stateless procedure built on a
//! [`picboot_core::BootloaderInterface`].

mod drain;
pub mod erase;
pub mod error;
pub mod hex;
pub mod identify;
pub mod load;
pub mod verify;

pub use erase::erase;
pub use error::OrchestratorError;
pub use hex::{AddressSegment, HexError, HexImage};
pub use identify::identify;
pub use load::load;
pub use verify::{Mismatch, VerifyReport, verify};
