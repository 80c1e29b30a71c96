//! A fake device: answers canned responses to incoming commands over its
//! own [`Framer`], for exercising the bootloader interface end to end.

use std::collections::HashMap;

use picboot_wire::{Framer, Transport};
use tracing::trace;

/// Services one side of a [`crate::loopback_pair`], replying to commands by
/// opcode with a fixed canned payload.
pub struct ScriptedDevice<T: Transport> {
    framer: Framer<T>,
    responses: HashMap<u8, Vec<u8>>,
}

impl<T: Transport> ScriptedDevice<T> {
    /// Wraps the device-side transport.
    pub fn new(transport: T) -> Self {
        Self { framer: Framer::new(transport), responses: HashMap::new() }
    }

    /// Registers the canned response payload to send whenever a command
    /// with this opcode byte arrives.
    pub fn on(&mut self, opcode: u8, response: Vec<u8>) -> &mut Self {
        self.responses.insert(opcode, response);
        self
    }

    /// Polls for incoming commands and answers every one it has a canned
    /// response for. Returns the number of responses sent.
    ///
    /// # Panics
    ///
    /// Panics if the underlying transport read or write fails — a failing
    /// in-memory loopback indicates a harness bug, not a real device fault.
    pub fn service(&mut self) -> usize {
        let commands = self.framer.poll_and_drain().expect("loopback transport never fails");
        let mut sent = 0;
        for command in commands {
            let Some(&opcode) = command.first() else { continue };
            trace!(opcode, "scripted device received command");
            if let Some(response) = self.responses.get(&opcode) {
                self.framer.encode_and_send(response).expect("loopback transport never fails");
                sent += 1;
            }
        }
        sent
    }
}
