//! The external HEX-image oracle the orchestrator consumes: an ordered set
//! of word-address segments plus opcode lookup. Decoding an actual `.hex`
//! file is `picboot-cli`'s job; this crate only needs the interface.

use thiserror::Error;

/// A half-open word-address range `[start, end)` present in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressSegment {
    /// First word address in the segment.
    pub start: u32,
    /// One past the last word address in the segment.
    pub end: u32,
}

/// Errors from [`HexImage::opcode`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HexError {
    /// `opcode` was asked for an odd word address.
    #[error("word address {0:#x} is odd")]
    OddAddress(u32),
}

/// A parsed Intel HEX image, abstracted down to what the orchestrator
/// needs: which word addresses exist, and what instruction sits at each.
pub trait HexImage {
    /// The image's address segments, in ascending order, non-overlapping.
    fn segments(&self) -> Vec<AddressSegment>;

    /// Returns the four consecutive bytes at byte-address `word_addr << 1`,
    /// packed little-endian, with the high byte always zero.
    ///
    /// # Errors
    ///
    /// Returns [`HexError::OddAddress`] if `word_addr` is odd.
    fn opcode(&self, word_addr: u32) -> Result<u32, HexError>;
}
