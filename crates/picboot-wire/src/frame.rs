//! The self-synchronising frame codec.
//!
//! Wire format of one frame:
//!
//! ```text
//! SOF | stuffed([len_lo, len_hi] ++ payload ++ [sum1, sum2]) | EOF
//! ```
//!
//! `poll` is tolerant of garbage preceding a frame and of multiple frames
//! arriving back to back; corrupt frames are logged and dropped rather than
//! surfaced as errors.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::{
    EOF, SOF, Transport,
    checksum::{fletcher16, pack},
    error::{EncodeError, FrameError, TransportError},
    le,
    stuffing::{stuff, unstuff},
};

/// Minimum and maximum payload length the framing layer will transmit.
const MIN_PAYLOAD_LEN: usize = 1;
const MAX_PAYLOAD_LEN: usize = 65535;

/// Smallest possible unstuffed body: 2-byte length prefix + 2-byte checksum,
/// with no payload bytes in between.
const MIN_BODY_LEN: usize = 4;

/// Encodes outbound payloads and decodes the inbound byte stream into
/// validated payloads, over a single [`Transport`].
pub struct Framer<T: Transport> {
    transport: T,
    raw: VecDeque<u8>,
    payloads: VecDeque<Vec<u8>>,
}

impl<T: Transport> Framer<T> {
    /// Wraps `transport` in a new, empty framer.
    pub fn new(transport: T) -> Self {
        Self { transport, raw: VecDeque::new(), payloads: VecDeque::new() }
    }

    /// Encodes `payload` as a stuffed, checksummed frame and writes it to
    /// the transport in one call.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidPayloadLength`] if `payload` is empty or
    /// exceeds 65535 bytes, or the transport's error if the write fails.
    pub fn encode_and_send(&mut self, payload: &[u8]) -> Result<(), EncodeError> {
        if payload.len() < MIN_PAYLOAD_LEN || payload.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::InvalidPayloadLength(payload.len()).into());
        }

        #[allow(clippy::cast_possible_truncation)]
        let len = payload.len() as u16;

        let mut body = Vec::with_capacity(payload.len() + 4);
        le::push_u16(&mut body, len);
        body.extend_from_slice(payload);

        let (sum1, sum2) = fletcher16(&body);
        body.push(sum1);
        body.push(sum2);

        let stuffed = stuff(&body);

        let mut wire = Vec::with_capacity(stuffed.len() + 2);
        wire.push(SOF);
        wire.extend_from_slice(&stuffed);
        wire.push(EOF);

        self.transport.write(&wire)?;
        Ok(())
    }

    /// Drains whatever bytes are currently available on the transport and
    /// attempts to extract as many complete, valid frames as possible.
    /// Decoded payloads are appended to the internal queue; malformed
    /// frames are logged and discarded.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the underlying read fails.
    pub fn poll(&mut self) -> Result<(), TransportError> {
        let incoming = self.transport.read_available()?;
        self.raw.extend(incoming);

        loop {
            self.discard_until_sof();
            if self.raw.is_empty() {
                return Ok(());
            }

            let Some(eof_index) = self.raw.iter().skip(1).position(|&b| b == EOF).map(|i| i + 1)
            else {
                return Ok(());
            };

            let stuffed_body: Vec<u8> = self.raw.iter().skip(1).take(eof_index - 1).copied().collect();

            // Consume SOF..=EOF inclusive; leave any trailing bytes for the
            // next iteration.
            for _ in 0..=eof_index {
                self.raw.pop_front();
            }

            self.decode_frame_body(&stuffed_body);
        }
    }

    /// Pops one decoded payload, if any are queued.
    pub fn try_receive(&mut self) -> Option<Vec<u8>> {
        self.payloads.pop_front()
    }

    /// True if no decoded payloads are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Convenience for tests and the harness: polls once, then drains every
    /// payload that became available.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the underlying read fails.
    pub fn poll_and_drain(&mut self) -> Result<Vec<Vec<u8>>, TransportError> {
        self.poll()?;
        let mut out = Vec::new();
        while let Some(p) = self.try_receive() {
            out.push(p);
        }
        Ok(out)
    }

    fn discard_until_sof(&mut self) {
        while self.raw.front().is_some_and(|&b| b != SOF) {
            self.raw.pop_front();
        }
    }

    fn decode_frame_body(&mut self, stuffed_body: &[u8]) {
        let body = unstuff(stuffed_body);
        if body.len() < MIN_BODY_LEN {
            debug!(len = body.len(), "dropping frame shorter than the minimum body length");
            return;
        }

        let split = body.len() - 2;
        let (remainder, trailer) = body.split_at(split);
        let (sum1, sum2) = (trailer[0], trailer[1]);
        let expected = pack(sum1, sum2);

        let (c1, c2) = fletcher16(remainder);
        let calculated = pack(c1, c2);

        if expected != calculated {
            warn!(expected, calculated, "checksum mismatch, discarding frame");
            return;
        }

        // remainder is [len_lo, len_hi] ++ payload; the length field is not
        // separately validated against remainder's actual length, only fed
        // into the checksum above.
        let payload = remainder[2..].to_vec();
        trace!(len = payload.len(), "decoded frame");
        self.payloads.push_back(payload);
    }
}
