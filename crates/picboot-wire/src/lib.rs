//! Stuffed, checksummed serial framing for the PIC24/dsPIC bootloader
//! protocol.
//!
//! This crate is deliberately ignorant of bootloader semantics: it knows how
//! to turn a byte slice into a frame and back, over anything implementing
//! [`Transport`]. The command/response vocabulary built on top lives in
//! `picboot-core`.

pub mod checksum;
pub mod error;
pub mod frame;
pub mod le;
pub mod opcode;
pub mod stuffing;
pub mod transport;

pub use error::{EncodeError, FrameError, TransportError};
pub use frame::Framer;
pub use opcode::Opcode;
pub use transport::Transport;

/// Start-of-frame marker.
pub const SOF: u8 = 0xF7;
/// End-of-frame marker.
pub const EOF: u8 = 0x7F;
/// Escape byte.
pub const ESC: u8 = 0xF6;
/// XOR mask applied to an escaped byte's value.
pub const ESC_XOR: u8 = 0x20;
