//! Dispatches decoded frame payloads by opcode, updating the profile and
//! the flash mirror as responses arrive.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use picboot_wire::{Opcode, le};
use tracing::{debug, trace, warn};

use crate::{memory::LocalMemoryMap, profile::DeviceProfile};

/// Applies one decoded response payload to `profile` and `memory`, and
/// flips `identified` once every profile field has been populated.
///
/// Unrecognised opcodes are logged and discarded, matching the protocol's
/// "no expected response" treatment of write/erase/start-app commands.
pub fn dispatch(
    payload: &[u8],
    profile: &Mutex<DeviceProfile>,
    memory: &Mutex<Option<LocalMemoryMap>>,
    identified: &AtomicBool,
) {
    let Some(&opcode_byte) = payload.first() else {
        warn!("dropping empty response payload");
        return;
    };

    let Ok(opcode) = Opcode::try_from(opcode_byte) else {
        warn!(opcode = opcode_byte, "dropping response with unrecognised opcode");
        return;
    };

    let tail = &payload[1..];

    match opcode {
        Opcode::ReadPlatform => {
            let mut guard = lock(profile);
            guard.platform = Some(String::from_utf8_lossy(tail).into_owned());
        }
        Opcode::ReadVersion => {
            let mut guard = lock(profile);
            guard.version = Some(String::from_utf8_lossy(tail).into_owned());
        }
        Opcode::ReadRowLen => {
            if let Some(v) = le::read_u16(tail) {
                lock(profile).row_length = Some(v);
            }
        }
        Opcode::ReadPageLen => {
            if let Some(v) = le::read_u16(tail) {
                lock(profile).page_length = Some(v);
            }
        }
        Opcode::ReadProgLen => {
            if let Some(v) = le::read_u16(tail) {
                lock(profile).prog_length = Some(v);
                let mut mem_guard = lock(memory);
                if mem_guard.is_none() {
                    *mem_guard = Some(LocalMemoryMap::new(v));
                    debug!(prog_length = v, "allocated local memory mirror");
                }
            }
        }
        Opcode::ReadMaxProgSize => {
            if let Some(v) = le::read_u16(tail) {
                lock(profile).max_prog_size = Some(v);
            }
        }
        Opcode::ReadAppStartAddress => {
            if let Some(v) = le::read_u16(tail) {
                lock(profile).app_start_addr = Some(v);
            }
        }
        Opcode::ReadAddr | Opcode::ReadPage => {
            apply_readback(tail, memory);
        }
        Opcode::ErasePage
        | Opcode::EraseAll
        | Opcode::WriteRow
        | Opcode::WriteMax
        | Opcode::StartApp => {
            trace!(?opcode, "command opcode echoed back, no response expected; ignoring");
        }
    }

    let complete = lock(profile).is_complete();
    if complete && !identified.load(Ordering::SeqCst) {
        identified.store(true, Ordering::SeqCst);
        debug!("device identification complete");
    }
}

/// `READ_ADDR` / `READ_PAGE` tail: a 4-byte LE base word-address followed by
/// one or more 4-byte LE words, each stored at `base_word_addr + i` (flat,
/// stride-1 — the same addressing `get_opcode`/`read_page`/`load` use).
fn apply_readback(tail: &[u8], memory: &Mutex<Option<LocalMemoryMap>>) {
    let Some(base_word_addr) = le::read_u32(tail) else {
        warn!("dropping readback response with missing base address");
        return;
    };

    let base_word_addr = base_word_addr as usize;
    let words = &tail[4..];

    let mut mem_guard = lock(memory);
    let Some(map) = mem_guard.as_mut() else {
        warn!("dropping readback response: memory mirror not yet allocated");
        return;
    };

    for (i, chunk) in words.chunks_exact(4).enumerate() {
        let Some(value) = le::read_u32(chunk) else { continue };
        map.set(base_word_addr + i, value);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (Mutex<DeviceProfile>, Mutex<Option<LocalMemoryMap>>, AtomicBool) {
        (Mutex::new(DeviceProfile::default()), Mutex::new(None), AtomicBool::new(false))
    }

    #[test]
    fn identification_completes_after_all_seven_fields() {
        let (profile, memory, identified) = fresh();
        dispatch(&[0x00, b'P', b'I', b'C'], &profile, &memory, &identified);
        dispatch(&[0x01, b'1', b'.', b'0'], &profile, &memory, &identified);
        dispatch(&[0x02, 0x10, 0x00], &profile, &memory, &identified);
        dispatch(&[0x03, 0x00, 0x02], &profile, &memory, &identified);
        assert!(!identified.load(Ordering::SeqCst));
        dispatch(&[0x04, 0x2A, 0x00], &profile, &memory, &identified);
        dispatch(&[0x05, 0x40, 0x00], &profile, &memory, &identified);
        dispatch(&[0x07, 0x00, 0x04], &profile, &memory, &identified);
        assert!(identified.load(Ordering::SeqCst));
        assert!(lock(&profile).is_complete());
    }

    /// Invariant 7: once identified, stays identified even if a later
    /// malformed response is fed in.
    #[test]
    fn identification_is_monotonic() {
        let (profile, memory, identified) = fresh();
        for payload in [
            vec![0x00, b'X'],
            vec![0x01, b'Y'],
            vec![0x02, 0x10, 0x00],
            vec![0x03, 0x00, 0x02],
            vec![0x04, 0x2A, 0x00],
            vec![0x05, 0x40, 0x00],
            vec![0x07, 0x00, 0x04],
        ] {
            dispatch(&payload, &profile, &memory, &identified);
        }
        assert!(identified.load(Ordering::SeqCst));

        dispatch(&[0x99], &profile, &memory, &identified);
        assert!(identified.load(Ordering::SeqCst));
    }

    #[test]
    fn readback_response_stores_words_at_offset_addresses() {
        let (profile, memory, identified) = fresh();
        dispatch(&[0x04, 0x04, 0x00], &profile, &memory, &identified); // prog_length=4

        let mut payload = vec![0x20u8];
        payload.extend_from_slice(&0x0008u32.to_le_bytes()); // base word addr 8
        payload.extend_from_slice(&0x00AB_CDEFu32.to_le_bytes());
        payload.extend_from_slice(&0x0011_2233u32.to_le_bytes());
        dispatch(&payload, &profile, &memory, &identified);

        let mem_guard = lock(&memory);
        let map = mem_guard.as_ref().unwrap();
        assert_eq!(map.get(8), Some(0x00AB_CDEF));
        assert_eq!(map.get(9), Some(0x0011_2233));
    }

    #[test]
    fn unknown_opcode_is_dropped_without_panicking() {
        let (profile, memory, identified) = fresh();
        dispatch(&[0xAA, 0x01, 0x02], &profile, &memory, &identified);
        assert!(!identified.load(Ordering::SeqCst));
    }
}
