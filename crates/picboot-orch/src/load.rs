//! `load`: walks the HEX image and programs it page by page.

use std::time::Duration;

use picboot_core::{BootloaderInterface, IdentifiedProfile};

use crate::{drain::await_drain, error::OrchestratorError, hex::HexImage};

/// See [`crate::erase::erase`]'s note on why this mirrors the memory
/// mirror's sizing formula rather than `page_length * prog_length`.
fn total_prog_words(profile: &IdentifiedProfile) -> u32 {
    0x200u32 * u32::from(profile.prog_length) / 2
}

fn last_prog_page(profile: &IdentifiedProfile) -> u32 {
    let page_length = u32::from(profile.page_length);
    let highest_prog_address = total_prog_words(profile).saturating_sub(page_length);
    highest_prog_address & !(page_length - 1)
}

/// Programs the image in `hex` onto the device: first the opening page
/// (word address 0) in `page_length / max_prog_size` `WRITE_MAX` chunks,
/// then every page from `app_start_addr` up to the last program page.
///
/// # Errors
///
/// Returns the HEX oracle's error if it rejects an address, or the
/// bootloader interface's error if a `write_max` call is rejected.
pub async fn load(
    bli: &BootloaderInterface,
    profile: &IdentifiedProfile,
    hex: &dyn HexImage,
    poll_interval: Duration,
) -> Result<(), OrchestratorError> {
    let max_prog_size = u32::from(profile.max_prog_size);
    let page_length = u32::from(profile.page_length);
    let prog_ops_per_erase = page_length / max_prog_size;

    for i in 0..prog_ops_per_erase {
        let base = i * max_prog_size;
        let row = read_row(hex, base, max_prog_size)?;
        bli.write_max(base, &row)?;
    }

    let boundary = last_prog_page(profile);
    let mut addr = u32::from(profile.app_start_addr);
    while addr < boundary {
        let row = read_row(hex, addr, max_prog_size)?;
        bli.write_max(addr, &row)?;
        addr += max_prog_size << 1;
    }

    await_drain(bli, poll_interval).await;
    Ok(())
}

/// Reads `count` consecutive opcodes starting at word address `base`. This
/// uses the same flat, stride-1 word addressing as the mirror (`verify`
/// compares `get_opcode(a)` against `hex.opcode(a)` for the same `a`, so the
/// two address spaces must line up one-to-one).
fn read_row(hex: &dyn HexImage, base: u32, count: u32) -> Result<Vec<u32>, OrchestratorError> {
    (0..count).map(|i| hex.opcode(base + i).map_err(Into::into)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AllZerosHex;

    impl HexImage for AllZerosHex {
        fn segments(&self) -> Vec<crate::hex::AddressSegment> {
            vec![crate::hex::AddressSegment { start: 0, end: 1024 }]
        }

        fn opcode(&self, _word_addr: u32) -> Result<u32, crate::hex::HexError> {
            Ok(0)
        }
    }

    /// S5 — first page emits exactly 4 `WRITE_MAX` commands of 128 words
    /// each, at offsets 0, 128, 256, 384.
    #[test]
    fn first_page_chunking_matches_expected_offsets() {
        let max_prog_size = 128u32;
        let page_length = 512u32;
        let prog_ops_per_erase = page_length / max_prog_size;

        let offsets: Vec<u32> = (0..prog_ops_per_erase).map(|i| i * max_prog_size).collect();
        assert_eq!(offsets, vec![0, 128, 256, 384]);

        let hex = AllZerosHex;
        for &base in &offsets {
            let row = read_row(&hex, base, max_prog_size).unwrap();
            assert_eq!(row.len(), 128);
        }
    }
}
