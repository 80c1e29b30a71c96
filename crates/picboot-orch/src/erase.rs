//! `erase`: schedules `ERASE_PAGE` across every application page.

use std::time::Duration;

use picboot_core::{BootloaderInterface, IdentifiedProfile};

use crate::drain::await_drain;

/// Total word count addressable in program memory, derived the same way
/// the local memory mirror is sized (`0x200 * prog_length / 2`) rather than
/// from `page_length * prog_length` — the two only coincide when
/// `page_length` is the device's nominal 0x200 words, which holds for every
/// profile this orchestrator has been exercised against.
fn total_prog_words(profile: &IdentifiedProfile) -> u32 {
    0x200u32 * u32::from(profile.prog_length) / 2
}

/// The first word address past the last full application page, aligned
/// down to a page boundary.
fn last_prog_page(profile: &IdentifiedProfile) -> u32 {
    let page_length = u32::from(profile.page_length);
    let highest_prog_address = total_prog_words(profile).saturating_sub(page_length);
    highest_prog_address & !(page_length - 1)
}

/// Erases the vector/interrupt page at word address 0, then every
/// application page from `app_start_addr` up to (excluding) the last
/// program page. Awaits the queue draining before returning.
pub async fn erase(bli: &BootloaderInterface, profile: &IdentifiedProfile, poll_interval: Duration) {
    bli.erase_page(0);

    let page_length = u32::from(profile.page_length);
    let boundary = last_prog_page(profile);
    let mut addr = u32::from(profile.app_start_addr);
    while addr < boundary {
        bli.erase_page(addr);
        addr += page_length;
    }

    await_drain(bli, poll_interval).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(page_length: u16, prog_length: u16, app_start_addr: u16) -> IdentifiedProfile {
        IdentifiedProfile {
            platform: "PIC24".into(),
            version: "1.0".into(),
            row_length: 64,
            page_length,
            prog_length,
            max_prog_size: 64,
            app_start_addr,
        }
    }

    /// S4 — erase schedule.
    #[test]
    fn computes_the_expected_page_boundaries() {
        let p = profile(512, 0x2A, 0x400);
        let boundary = last_prog_page(&p);

        let mut addresses = vec![0u32];
        let mut addr = u32::from(p.app_start_addr);
        while addr < boundary {
            addresses.push(addr);
            addr += u32::from(p.page_length);
        }

        assert_eq!(addresses[0], 0);
        assert_eq!(addresses[1], 0x400);
        assert_eq!(addresses[2], 0x600);
        assert_eq!(addresses[3], 0x800);
        assert!(*addresses.last().unwrap() < boundary);
    }
}
