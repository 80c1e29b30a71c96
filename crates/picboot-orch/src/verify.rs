//! `verify`: reads flash back through the mirror and compares it against
//! the HEX image.

use std::time::Duration;

use picboot_core::{BootloaderInterface, IdentifiedProfile, UNREAD};
use tracing::warn;

use crate::{drain::await_drain, error::OrchestratorError, hex::HexImage};

const RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(200);
const WHITELIST: &[u32] = &[0x0000_0000];
const OPCODE_MASK: u32 = 0x00FF_FFFF;

/// One address where the mirror disagreed with the HEX image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    /// Word address of the disagreement.
    pub addr: u32,
    /// Opcode expected per the HEX image.
    pub expected: u32,
    /// Opcode actually found in the mirror.
    pub actual: u32,
}

/// Outcome of a verify pass: every mismatch found, in scan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Accumulated mismatches; empty means the image verified clean.
    pub mismatches: Vec<Mismatch>,
}

impl VerifyReport {
    /// True iff no mismatches were found.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }
}

fn total_prog_words(profile: &IdentifiedProfile) -> u32 {
    0x200u32 * u32::from(profile.prog_length) / 2
}

/// Reads every program page back into the mirror, then compares each HEX
/// segment's opcodes against it, retrying a still-unread cell up to
/// [`RETRIES`] times before concluding it genuinely disagrees.
///
/// # Errors
///
/// Returns the HEX oracle's error if it rejects an address, or the
/// bootloader interface's error if the mirror was never allocated.
pub async fn verify(
    bli: &BootloaderInterface,
    profile: &IdentifiedProfile,
    hex: &dyn HexImage,
    poll_interval: Duration,
) -> Result<VerifyReport, OrchestratorError> {
    let max_prog_size = u32::from(profile.max_prog_size);
    let page_length = u32::from(profile.page_length);
    let highest_prog_address = total_prog_words(profile).saturating_sub(page_length);

    let mut addr = 0;
    while addr < highest_prog_address {
        bli.read_page(addr);
        addr += max_prog_size;
    }
    await_drain(bli, poll_interval).await;

    let mut mismatches = Vec::new();
    for segment in hex.segments() {
        for word_addr in segment.start..segment.end {
            if WHITELIST.contains(&word_addr) {
                continue;
            }

            let expected = hex.opcode(word_addr)? & OPCODE_MASK;
            let actual = read_with_retries(bli, word_addr).await?;

            if actual != expected {
                warn!(addr = word_addr, expected, actual, "verification mismatch");
                mismatches.push(Mismatch { addr: word_addr, expected, actual });
            }
        }
    }

    Ok(VerifyReport { mismatches })
}

async fn read_with_retries(bli: &BootloaderInterface, word_addr: u32) -> Result<u32, OrchestratorError> {
    let mut value = bli.get_opcode(word_addr)?;
    let mut attempt = 0;
    while value == UNREAD && attempt < RETRIES {
        tokio::time::sleep(RETRY_DELAY).await;
        value = bli.get_opcode(word_addr)?;
        attempt += 1;
    }
    Ok(value & OPCODE_MASK)
}
