//! The byte-duplex link the [`crate::Framer`] is built on.
//!
//! A `Transport` knows nothing about frames, opcodes, or checksums — it is
//! the thinnest possible abstraction over a serial port, a TCP socket, or an
//! in-memory loopback used in tests.

use crate::TransportError;

/// A blocking, byte-duplex link to the device.
///
/// Implementations are driven from inside the bootloader interface's pump
/// task; `write` and `read_available` should return promptly (a real serial
/// port with a short read timeout is the expected shape).
pub trait Transport: Send {
    /// Writes `bytes` to the link. Must either write all of `bytes` or
    /// fail — partial writes are not a supported outcome.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Write`] if the underlying link rejects the
    /// write.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Returns whatever bytes are currently available without blocking.
    /// An empty vector means "nothing to read right now", not an error.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Read`] if the underlying link is broken.
    fn read_available(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Advisory count of bytes waiting to be read. The default
    /// implementation returns 0; callers must not rely on this being
    /// accurate and should always call [`Transport::read_available`]
    /// instead of gating on this value.
    fn bytes_waiting(&mut self) -> usize {
        0
    }
}
