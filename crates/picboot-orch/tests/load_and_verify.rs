//! End-to-end: identify against a scripted device, load a tiny image, then
//! verify it — both the clean round trip (invariant 9) and corruption
//! detection (S6).

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use picboot_core::{BootloaderInterface, IdentifiedProfile, SettleConfig};
use picboot_harness::{LoopbackTransport, loopback_pair};
use picboot_orch::{AddressSegment, HexImage, erase, identify, load, verify};
use picboot_wire::{Framer, Opcode, le};

const PAGE_LENGTH: u16 = 512;
const PROG_LENGTH: u16 = 4; // total_prog_words = 0x200 * 4 / 2 = 1024
const MAX_PROG_SIZE: u16 = 128;
const APP_START_ADDR: u16 = 256;

/// A device that actually stores `WRITE_MAX` payloads and reflects them
/// back out of `READ_PAGE`/`READ_ADDR`, so `load` followed by `verify`
/// exercises a real round trip rather than canned responses.
struct SimulatedDevice {
    memory: Arc<Mutex<HashMap<u32, u32>>>,
}

impl SimulatedDevice {
    fn spawn(transport: LoopbackTransport) -> Arc<Mutex<HashMap<u32, u32>>> {
        let memory: Arc<Mutex<HashMap<u32, u32>>> = Arc::new(Mutex::new(HashMap::new()));
        let mem_for_task = Arc::clone(&memory);
        tokio::spawn(Self::run(transport, mem_for_task));
        memory
    }

    async fn run(transport: LoopbackTransport, memory: Arc<Mutex<HashMap<u32, u32>>>) {
        let mut framer = Framer::new(transport);
        loop {
            if let Ok(commands) = framer.poll_and_drain() {
                for command in commands {
                    Self::handle(&mut framer, &memory, &command);
                }
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    fn handle(framer: &mut Framer<LoopbackTransport>, memory: &Mutex<HashMap<u32, u32>>, command: &[u8]) {
        let Some(&opcode_byte) = command.first() else { return };
        let Ok(opcode) = Opcode::try_from(opcode_byte) else { return };
        let tail = &command[1..];

        let reply = match opcode {
            Opcode::ReadPlatform => Some(vec![0x00, b'S', b'I', b'M']),
            Opcode::ReadVersion => Some(vec![0x01, b'0', b'.', b'1']),
            Opcode::ReadRowLen => response_u16(0x02, 64),
            Opcode::ReadPageLen => response_u16(0x03, PAGE_LENGTH),
            Opcode::ReadProgLen => response_u16(0x04, PROG_LENGTH),
            Opcode::ReadMaxProgSize => response_u16(0x05, MAX_PROG_SIZE),
            Opcode::ReadAppStartAddress => response_u16(0x07, APP_START_ADDR),
            Opcode::WriteMax | Opcode::WriteRow => {
                let Some(addr) = le::read_u32(tail) else { return };
                let mut mem = memory.lock().unwrap();
                for (i, chunk) in tail[4..].chunks_exact(4).enumerate() {
                    if let Some(value) = le::read_u32(chunk) {
                        mem.insert(addr + i as u32, value & 0x00FF_FFFF);
                    }
                }
                None
            }
            Opcode::ReadAddr | Opcode::ReadPage => {
                let Some(addr) = le::read_u32(tail) else { return };
                let mem = memory.lock().unwrap();
                let mut out = vec![opcode.as_u8()];
                le::push_u32(&mut out, addr);
                for i in 0..u32::from(MAX_PROG_SIZE) {
                    let value = mem.get(&(addr + i)).copied().unwrap_or(0x00FF_FFFF);
                    le::push_u32(&mut out, value);
                }
                Some(out)
            }
            Opcode::ErasePage | Opcode::EraseAll | Opcode::StartApp => None,
        };

        if let Some(payload) = reply {
            let _ = framer.encode_and_send(&payload);
        }
    }
}

fn response_u16(opcode: u8, value: u16) -> Option<Vec<u8>> {
    let mut out = vec![opcode];
    le::push_u16(&mut out, value);
    Some(out)
}

struct FlatHex {
    values: HashMap<u32, u32>,
    segment: AddressSegment,
}

impl HexImage for FlatHex {
    fn segments(&self) -> Vec<AddressSegment> {
        vec![self.segment]
    }

    fn opcode(&self, word_addr: u32) -> Result<u32, picboot_orch::HexError> {
        Ok(self.values.get(&word_addr).copied().unwrap_or(0))
    }
}

async fn identified_session()
-> (BootloaderInterface, IdentifiedProfile, Arc<Mutex<HashMap<u32, u32>>>) {
    let (host, device_transport) = loopback_pair();
    let memory = SimulatedDevice::spawn(device_transport);

    let bli = BootloaderInterface::spawn(host, SettleConfig::default());
    let profile = identify::identify(&bli, Duration::from_secs(5), Duration::from_millis(50))
        .await
        .expect("simulated device always identifies");
    (bli, profile, memory)
}

/// Invariant 9: loading an image and verifying it back returns no
/// mismatches, for a simulated device that faithfully stores and reflects
/// every `WRITE_MAX`.
#[tokio::test(flavor = "multi_thread")]
async fn load_then_verify_round_trips_clean() {
    let (bli, profile, _memory) = identified_session().await;

    let mut values = HashMap::new();
    for addr in 0..u32::from(PAGE_LENGTH) {
        values.insert(addr, 0x00_0000 + addr);
    }
    let hex = FlatHex { values, segment: AddressSegment { start: 0, end: u32::from(PAGE_LENGTH) } };

    erase::erase(&bli, &profile, Duration::from_millis(20)).await;
    load::load(&bli, &profile, &hex, Duration::from_millis(20)).await.unwrap();
    let report = verify::verify(&bli, &profile, &hex, Duration::from_millis(20)).await.unwrap();

    assert!(report.is_ok(), "unexpected mismatches: {:?}", report.mismatches);

    bli.shutdown(false).await.unwrap();
}

/// S6: a single corrupted word is detected and reported, while the
/// whitelisted address 0x000000 is skipped even though it is never
/// written.
#[tokio::test(flavor = "multi_thread")]
async fn verify_detects_a_single_corrupted_word() {
    let (bli, profile, memory) = identified_session().await;

    let corrupt_addr = u32::from(APP_START_ADDR) + 4;
    let mut values = HashMap::new();
    for addr in 0..u32::from(PAGE_LENGTH) {
        values.insert(addr, addr);
    }
    let hex = FlatHex { values, segment: AddressSegment { start: 0, end: u32::from(PAGE_LENGTH) } };

    erase::erase(&bli, &profile, Duration::from_millis(20)).await;
    load::load(&bli, &profile, &hex, Duration::from_millis(20)).await.unwrap();

    // Flip one word directly in the simulated device's backing store,
    // bypassing the host entirely, so verify must catch it on readback.
    memory.lock().unwrap().insert(corrupt_addr, 0x00DE_AD00);

    let report = verify::verify(&bli, &profile, &hex, Duration::from_millis(20)).await.unwrap();
    assert!(!report.is_ok());
    assert!(report.mismatches.iter().any(|m| m.addr == corrupt_addr));
    // The whitelisted vector address is skipped even though it was never
    // written by load() (its page is excluded from the load/erase range).
    assert!(!report.mismatches.iter().any(|m| m.addr == 0));

    bli.shutdown(false).await.unwrap();
}
