//! An in-memory, bidirectional transport pair for exercising the framer and
//! the bootloader interface without a real serial port.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use picboot_wire::{Transport, TransportError};

#[derive(Debug, Default)]
struct Pipe(Mutex<VecDeque<u8>>);

impl Pipe {
    fn push(&self, bytes: &[u8]) {
        let mut guard = self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.extend(bytes);
    }

    fn drain(&self) -> Vec<u8> {
        let mut guard = self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.drain(..).collect()
    }

    fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }
}

/// One end of a loopback pair. `host_to_device` and `device_to_host` name
/// the pipes from this end's point of view.
#[derive(Clone)]
pub struct LoopbackTransport {
    outbound: Arc<Pipe>,
    inbound: Arc<Pipe>,
}

impl Transport for LoopbackTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.outbound.push(bytes);
        Ok(())
    }

    fn read_available(&mut self) -> Result<Vec<u8>, TransportError> {
        Ok(self.inbound.drain())
    }

    fn bytes_waiting(&mut self) -> usize {
        self.inbound.len()
    }
}

/// Builds a connected pair: bytes written to the host side become readable
/// on the device side, and vice versa.
#[must_use]
pub fn loopback_pair() -> (LoopbackTransport, LoopbackTransport) {
    let host_to_device = Arc::new(Pipe::default());
    let device_to_host = Arc::new(Pipe::default());

    let host = LoopbackTransport { outbound: Arc::clone(&host_to_device), inbound: Arc::clone(&device_to_host) };
    let device = LoopbackTransport { outbound: device_to_host, inbound: host_to_device };

    (host, device)
}
