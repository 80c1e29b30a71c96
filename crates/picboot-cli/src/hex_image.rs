//! [`picboot_orch::HexImage`] backed by a parsed Intel HEX file.

use std::collections::BTreeMap;

use ihex::{Reader, Record};
use picboot_orch::{AddressSegment, HexError, HexImage};

/// A HEX image flattened to a sparse byte map, with word-address segments
/// derived from its contiguous byte runs.
pub struct IhexImage {
    bytes: BTreeMap<u32, u8>,
    segments: Vec<AddressSegment>,
}

impl IhexImage {
    /// Parses `contents` (the full text of an Intel HEX file).
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed record encountered.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let mut bytes = BTreeMap::new();
        let mut upper_base: u32 = 0;

        for record in Reader::new(contents) {
            match record.map_err(|e| e.to_string())? {
                Record::Data { offset, value } => {
                    let base = upper_base + u32::from(offset);
                    for (i, byte) in value.into_iter().enumerate() {
                        bytes.insert(base + i as u32, byte);
                    }
                }
                Record::ExtendedLinearAddress(upper) => {
                    upper_base = u32::from(upper) << 16;
                }
                Record::ExtendedSegmentAddress(segment) => {
                    upper_base = u32::from(segment) << 4;
                }
                Record::StartLinearAddress(_) | Record::StartSegmentAddress { .. } => {}
                Record::EndOfFile => break,
            }
        }

        let segments = Self::coalesce_segments(&bytes);
        Ok(Self { bytes, segments })
    }

    fn coalesce_segments(bytes: &BTreeMap<u32, u8>) -> Vec<AddressSegment> {
        let mut segments = Vec::new();
        let mut run_start: Option<u32> = None;
        let mut prev: Option<u32> = None;

        for &byte_addr in bytes.keys() {
            match (run_start, prev) {
                (Some(_), Some(p)) if byte_addr == p + 1 => {}
                (Some(start), Some(p)) => {
                    segments.push(byte_run_to_word_segment(start, p + 1));
                    run_start = Some(byte_addr);
                }
                _ => run_start = Some(byte_addr),
            }
            prev = Some(byte_addr);
        }

        if let (Some(start), Some(p)) = (run_start, prev) {
            segments.push(byte_run_to_word_segment(start, p + 1));
        }

        segments
    }
}

fn byte_run_to_word_segment(start_byte: u32, end_byte: u32) -> AddressSegment {
    AddressSegment { start: start_byte / 2, end: end_byte.div_ceil(2) }
}

impl HexImage for IhexImage {
    fn segments(&self) -> Vec<AddressSegment> {
        self.segments.clone()
    }

    fn opcode(&self, word_addr: u32) -> Result<u32, HexError> {
        let byte_addr = word_addr << 1;
        let mut word = [0u8; 4];
        for (i, slot) in word.iter_mut().enumerate() {
            *slot = self.bytes.get(&(byte_addr + i as u32)).copied().unwrap_or(0xFF);
        }
        Ok(u32::from_le_bytes(word) & 0x00FF_FFFF)
    }
}
