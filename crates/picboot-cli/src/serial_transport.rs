//! [`picboot_wire::Transport`] over a real serial port.

use std::time::Duration;

use picboot_wire::{Transport, TransportError};

/// A short read timeout so `read_available` never blocks the pump for
/// long; the pump's own tick sleep governs polling cadence.
const READ_TIMEOUT: Duration = Duration::from_millis(20);

/// Wraps an open [`serialport::SerialPort`] for use by the framer.
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    /// Opens `port_name` at `baud_rate`.
    ///
    /// # Errors
    ///
    /// Returns [`serialport::Error`] if the port cannot be opened.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, serialport::Error> {
        let port = serialport::new(port_name, baud_rate).timeout(READ_TIMEOUT).open()?;
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        use std::io::Write;
        self.port.write_all(bytes).map_err(|e| TransportError::Write(e.to_string()))
    }

    fn read_available(&mut self) -> Result<Vec<u8>, TransportError> {
        use std::io::Read;

        let waiting = self.port.bytes_to_read().unwrap_or(0) as usize;
        if waiting == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; waiting];
        match self.port.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(Vec::new()),
            Err(e) => Err(TransportError::Read(e.to_string())),
        }
    }

    fn bytes_waiting(&mut self) -> usize {
        self.port.bytes_to_read().unwrap_or(0) as usize
    }
}
